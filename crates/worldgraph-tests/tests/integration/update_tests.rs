use worldgraph_core::{
    update_world_model, Expr, GraphId, ModelError, Problem, Quantity, RelationType, UpdateConfig,
};

fn problem(spans: &[&str], question: &str) -> Problem {
    Problem::new(
        "it",
        spans.join(" "),
        question,
        spans.iter().map(|s| s.to_string()).collect(),
    )
}

fn parse(p: &mut Problem, lins: &[&str]) {
    for lin in lins {
        let report = update_world_model(p, lin, &UpdateConfig::default()).expect("update");
        assert!(report.is_clean(), "{lin}: {:?}", report.diagnostics);
    }
}

#[test]
fn transfer_story_builds_before_and_after_containers() {
    let mut p = problem(&["Tom has 8 apples.", "He gives 3 apples to Ann."], "How many apples does Tom have now?");
    parse(
        &mut p,
        &[
            "container ( tom , 8 , apple , none , none )",
            "transfer ( ann , tom , 3 , apple , none , none )",
            "container ( tom , none , apple , none , none )",
        ],
    );
    assert!(p.is_parsed());
    let s = p.complete_state().unwrap();
    assert_eq!(s.container_count(), 4);
    assert_eq!(s.relation_count(), 2);
    assert!(s.relations().all(|r| r.relation_type() == RelationType::Transfer));
    // Tom's container after the gift holds the reference.
    assert_eq!(s.container(GraphId(5)).map(|c| c.label.as_str()), Some("tom"));
    assert_eq!(p.reference(), Some(&Expr::symbol("x3")));
    // Earlier states are left untouched.
    assert_eq!(p.state(0).unwrap().container_count(), 1);
    assert!(!p.state(1).unwrap().has_ref());
}

#[test]
fn difference_clause_creates_the_missing_result() {
    let mut p = problem(&["Tom has 4 apples.", "Ann has 3 more apples than Tom."], "How many apples does Ann have?");
    parse(
        &mut p,
        &[
            "container ( tom , 4 , apple , none , none )",
            "difference ( ann , tom , 3 , apple , none , none , apple , none , none )",
            "container ( ann , none , apple , none , none )",
        ],
    );
    let s = p.complete_state().unwrap();
    assert_eq!(s.container_count(), 2);
    let r = s.relations().next().unwrap();
    assert_eq!(r.relation_type(), RelationType::ExplicitAdd);
    assert_eq!(r.source().label, "tom");
    assert_eq!(r.target().label, "ann");
    assert_eq!(p.reference(), Some(&Expr::symbol("x1")));
}

#[test]
fn rate_binds_denominator_from_a_later_span() {
    let mut p = problem(&["Each box holds 6 pencils.", "There are 4 boxes."], "How many pencils are there?");
    parse(
        &mut p,
        &[
            "rate ( box , 6 , pencil , none , none , box , none , none )",
            "container ( box , 4 , box , none , none )",
            "container ( box , none , pencil , none , none )",
        ],
    );
    let s = p.complete_state().unwrap();
    assert_eq!(s.container_count(), 2);
    assert_eq!(s.container(GraphId(2)).map(|c| c.quantity.clone()), Some(Quantity::known(4)));
    assert_eq!(p.reference(), Some(&Expr::symbol("x1")));
}

#[test]
fn enforced_vocabulary_rejects_invented_words() {
    let mut p = problem(&["Tom has 8 apples."], "How many apples?");
    let config = UpdateConfig { enforce_vocab: true };
    let report = update_world_model(
        &mut p,
        "container ( tom , 8 , apple , none , none ) container ( jerry , 2 , apple , none , none )",
        &config,
    )
    .unwrap();
    assert_eq!(report.clauses, 1);
    assert_eq!(p.current_state().unwrap().container_count(), 1);
}

#[test]
fn failing_clauses_are_reported_and_skipped() {
    let mut p = problem(&["A basket holds 3 apples."], "How many?");
    let report = update_world_model(
        &mut p,
        "container ( basket , 3 , apple , none , none ) \
         part ( basket , fruit , none , none , box , pear , none , none ) \
         transfer ( none , none , 2 , apple , none , none )",
        &UpdateConfig::default(),
    )
    .unwrap();
    assert_eq!(report.clauses, 3);
    assert_eq!(report.applied, 1);
    assert_eq!(report.diagnostics.len(), 2);
    assert_eq!(report.diagnostics[0].index, 1);
    assert!(matches!(report.diagnostics[0].error, ModelError::Consistency(_)));
    assert!(matches!(report.diagnostics[1].error, ModelError::InvalidArgument(_)));
    assert_eq!(p.current_state().unwrap().container_count(), 1);
    assert_eq!(p.current_state().unwrap().relation_count(), 0);
}

#[test]
fn updates_after_the_question_fail() {
    let mut p = problem(&[], "How many?");
    update_world_model(&mut p, "", &UpdateConfig::default()).unwrap();
    assert!(p.is_parsed());
    assert_eq!(
        update_world_model(&mut p, "", &UpdateConfig::default()),
        Err(ModelError::ProblemComplete)
    );
}
