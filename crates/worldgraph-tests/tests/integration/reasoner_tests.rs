use worldgraph_core::{
    update_world_model, DeterministicReasoner, Expr, ModelError, Number, Problem, ReasonerConfig,
    Resolution, UpdateConfig,
};

fn parsed(spans: &[&str], question: &str, lins: &[&str]) -> Problem {
    let mut p = Problem::new(
        "it",
        spans.join(" "),
        question,
        spans.iter().map(|s| s.to_string()).collect(),
    );
    for lin in lins {
        update_world_model(&mut p, lin, &UpdateConfig::default()).expect("update");
    }
    p
}

fn transfer_story() -> Problem {
    parsed(
        &["Tom has 8 apples.", "He gives 3 apples to Ann."],
        "How many apples does Tom have now?",
        &[
            "container ( tom , 8 , apple , none , none )",
            "transfer ( ann , tom , 3 , apple , none , none )",
            "container ( tom , none , apple , none , none )",
        ],
    )
}

#[test]
fn solves_transfer_story() {
    let mut p = transfer_story();
    let r = DeterministicReasoner::default().solve_problem(&mut p).unwrap();
    assert_eq!(r, Resolution::Value(Number::from(5)));
    assert_eq!(p.answer(), Some(&Number::from(5)));
    assert!(p.is_solved());
}

#[test]
fn solves_comparisons_and_rates() {
    let difference = parsed(
        &["Tom has 4 apples.", "Ann has 3 more apples than Tom."],
        "How many apples does Ann have?",
        &[
            "container ( tom , 4 , apple , none , none )",
            "difference ( ann , tom , 3 , apple , none , none , apple , none , none )",
            "container ( ann , none , apple , none , none )",
        ],
    );
    let rate = parsed(
        &["Each box holds 6 pencils.", "There are 4 boxes."],
        "How many pencils are there?",
        &[
            "rate ( box , 6 , pencil , none , none , box , none , none )",
            "container ( box , 4 , box , none , none )",
            "container ( box , none , pencil , none , none )",
        ],
    );
    let reasoner = DeterministicReasoner::default();
    assert_eq!(reasoner.reason_problem(&difference).unwrap().value(), Some(&Number::from(7)));
    assert_eq!(reasoner.reason_problem(&rate).unwrap().value(), Some(&Number::from(24)));
}

#[test]
fn fractional_quantities_stay_exact() {
    let p = parsed(
        &["A jug holds 3/4 liters of juice.", "Tom pours in 1/2 liters more."],
        "How much juice is in the jug?",
        &[
            "container ( jug , 3/4 , juice , none , liter )",
            "transfer ( jug , none , 1/2 , juice , none , liter )",
            "container ( jug , none , juice , none , liter )",
        ],
    );
    let r = DeterministicReasoner::default().reason_problem(&p).unwrap();
    assert_eq!(r.to_string(), "5/4");
}

#[test]
fn explicit_reference_overrides_the_state() {
    let p = transfer_story();
    let state = p.complete_state().unwrap();
    let reasoner = DeterministicReasoner::default();
    let r = reasoner.reason_with(state, &"x3 * 2".parse::<Expr>().unwrap()).unwrap();
    assert_eq!(r.value(), Some(&Number::from(10)));
    // Ann's containers are only related to each other.
    let r = reasoner.reason_with(state, &Expr::symbol("x2")).unwrap();
    assert!(!r.is_resolved());
    assert_eq!(
        reasoner.reason_with(state, &"4".parse::<Expr>().unwrap()),
        Err(ModelError::InvalidReference("4".to_string()))
    );
}

#[test]
fn inferred_totals_complete_part_whole_stories() {
    let p = parsed(
        &["Tom has 12 marbles in total.", "5 of them are red, the rest are blue."],
        "How many blue marbles does Tom have?",
        &[
            "container ( tom , 12 , marble , total , none )",
            "container ( tom , 5 , marble , red , none )",
            "container ( tom , none , marble , blue , none )",
        ],
    );
    let plain = DeterministicReasoner::default();
    assert!(!plain.reason_problem(&p).unwrap().is_resolved());
    let inferring = DeterministicReasoner::new(ReasonerConfig { infer_part_whole: true });
    assert_eq!(inferring.reason_problem(&p).unwrap().value(), Some(&Number::from(7)));
    // Reasoning works on a copy.
    assert_eq!(p.complete_state().unwrap().relation_count(), 0);
}

#[test]
fn incomplete_problems_cannot_be_solved() {
    let p = parsed(&["Tom has 8 apples."], "How many?", &["container ( tom , 8 , apple , none , none )"]);
    assert_eq!(
        DeterministicReasoner::default().reason_problem(&p),
        Err(ModelError::ProblemIncomplete)
    );
}

#[test]
fn solve_all_keeps_input_order() {
    let mut problems = vec![transfer_story(), parsed(&[], "How many?", &[""]), transfer_story()];
    let results = DeterministicReasoner::default().solve_all(&mut problems);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().ok().and_then(|r| r.value().cloned()), Some(Number::from(5)));
    assert_eq!(results[1], Err(ModelError::MissingReference));
    assert!(problems[2].is_solved());
}
