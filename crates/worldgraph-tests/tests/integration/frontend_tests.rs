use worldgraph_frontend::{keep_well_formed, parse_clause, parse_reference, ClauseKind, QuantityArg, Vocabulary};

#[test]
fn keeps_every_clause_kind_in_order() {
    let lin = "<s> container ( tom , 5 , apple , none , none ) \
               transfer ( ann , tom , 2 , apple , none , none ) \
               rate ( box , 6 , pencil , none , none , box , none , none ) \
               part ( basket , fruit , none , none , basket , apple , none , none ) \
               difference ( ann , tom , 3 , apple , none , none , apple , none , none ) \
               explicit ( ann , tom , 2 , apple , none , none , apple , none , none ) </s>";
    let keywords: Vec<_> = keep_well_formed(lin, None).iter().map(|c| c.keyword()).collect();
    assert_eq!(keywords, vec!["container", "transfer", "rate", "part", "difference", "explicit"]);
}

#[test]
fn clause_spans_point_into_lowercased_input() {
    let lin = "Noise CONTAINER ( Tom , 5 , Apple , none , none ) more";
    let clauses = keep_well_formed(lin, None);
    assert_eq!(clauses.len(), 1);
    let (start, end) = clauses[0].span;
    assert_eq!(&lin.to_lowercase()[start..end], clauses[0].text);
    assert_eq!(clauses[0].text, "container ( tom , 5 , apple , none , none )");
}

#[test]
fn multi_word_labels_are_kept_whole() {
    let clause = parse_clause("container ( mrs. smith , 2.5 , flour , none , cup )").unwrap();
    match clause.kind {
        ClauseKind::Container(c) => {
            assert_eq!(c.label, "mrs. smith");
            assert_eq!(c.tuple.unit.as_deref(), Some("cup"));
            assert!(matches!(c.quantity, QuantityArg::Number(_)));
        }
        other => panic!("expected container, got {other:?}"),
    }
}

#[test]
fn vocabulary_admits_lemmas_and_special_tokens() {
    let vocab = Vocabulary::from_text("Mrs. Smith bakes 3 cakes for her children.");
    let lin = "container ( mrs. smith , 3 , cake , none , none ) \
               container ( world , none , child , none , none ) \
               container ( bakery , 1 , cake , none , none )";
    let clauses = keep_well_formed(lin, Some(&vocab));
    assert_eq!(clauses.len(), 2);
    assert!(clauses.iter().all(|c| !c.text.contains("bakery")));
}

#[test]
fn garbage_yields_no_clauses() {
    for lin in ["", "container", "container ( )", "part ( a , b , c , d )", "ünïcödé container ( ä"] {
        assert!(keep_well_formed(lin, None).is_empty(), "{lin}");
    }
}

#[test]
fn references_parse_with_parentheses() {
    assert!(parse_reference("(x1 + x2) * 3").is_ok());
    assert!(parse_reference("x1 +").is_err());
}
