use worldgraph_core::storage::annotation::{load_problem, load_problems, problem_from_json};
use worldgraph_core::storage::smatch::{to_full, to_topology};
use worldgraph_core::{
    load_and_solve, update_world_model, DeterministicReasoner, ModelError, Number, RelationType,
    Resolution, UpdateConfig,
};

const TRANSFER: &str = include_str!("../../../../fixtures/transfer.json");
const PART_WHOLE: &str = include_str!("../../../../fixtures/part_whole.json");
const EXPLICIT: &str = include_str!("../../../../fixtures/explicit.json");

fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name)
}

#[test]
fn annotation_answers_match_the_reasoner() {
    let reasoner = DeterministicReasoner::default();
    for (json, answer) in [(TRANSFER, 5), (PART_WHOLE, 7), (EXPLICIT, 12)] {
        let p = problem_from_json(json).unwrap();
        assert_eq!(p.answer(), Some(&Number::from(answer)));
        assert_eq!(reasoner.reason_problem(&p).unwrap(), Resolution::Value(Number::from(answer)), "{}", p.id());
    }
}

#[test]
fn metadata_and_spans_come_from_the_records() {
    let p = problem_from_json(TRANSFER).unwrap();
    assert_eq!(p.id(), "t1");
    assert_eq!(p.spans().len(), 3);
    assert_eq!(p.body(), "Tom has 8 apples. He gives 3 apples to Ann.");
    assert_eq!(p.question(), "How many apples does Tom have now?");
    assert_eq!(p.metadata().get("split").and_then(|v| v.as_str()), Some("test"));
    assert!(p.state(1).unwrap().relations().all(|r| r.relation_type() == RelationType::Transfer));
}

#[test]
fn blank_quantities_become_fresh_variables() {
    let p = problem_from_json(EXPLICIT).unwrap();
    let s = p.complete_state().unwrap();
    let ann = s.containers().find(|c| c.label == "ann").unwrap();
    assert_eq!(ann.quantity.to_string(), "x1");
    let r = s.relations().next().unwrap();
    assert_eq!(r.relation_type(), RelationType::ExplicitTimes);
}

#[test]
fn sequence_replays_to_an_equal_model() {
    for json in [TRANSFER, PART_WHOLE] {
        let gold = problem_from_json(json).unwrap();
        let sequence = gold.to_sequence().unwrap();
        let mut built = gold.without_states();
        for line in sequence.lines() {
            let report = update_world_model(&mut built, line, &UpdateConfig::default()).unwrap();
            assert!(report.is_clean(), "{line}");
        }
        assert!(worldgraph_core::metrics::strongly_equal(&gold, &built), "{}", gold.id());
        assert_eq!(built.reference(), gold.reference());
    }
}

#[test]
fn transfer_sequence_hides_generated_containers() {
    let gold = problem_from_json(TRANSFER).unwrap();
    assert_eq!(
        gold.to_sequence().unwrap(),
        "container ( tom , 8 , apple , none , none )\n\
         transfer ( ann , tom , 3 , apple , none , none )\n\
         container ( tom , none , apple , none , none )"
    );
}

#[test]
fn smatch_exports() {
    let p = problem_from_json(TRANSFER).unwrap();
    assert_eq!(
        to_topology(&p).unwrap(),
        "# t1\n\
         (x4 / transfer\n      :source (x2 / container)\n      :destination (x3 / container)\n)\n\
         (x6 / transfer\n      :source (x1 / container)\n      :destination (x5 / container)\n)\n\n"
    );
    let full = to_full(&p).unwrap();
    assert!(full.contains("      :ARG3 (rec4 / ann)\n      :ARG4 (sen4 / tom)\n"));
    assert!(full.contains("(x1 / container\n      :name (n1 / name :op1 \"tom\")\n      :quant 8\n"));

    let explicit = to_full(&problem_from_json(EXPLICIT).unwrap()).unwrap();
    assert!(explicit.contains("(x3 / explicit\n"));
    assert!(explicit.contains("      :ARG6 (res3 / ann)\n      :ARG7 (arg3 / tom)\n"));
}

#[test]
fn files_load_from_disk() {
    let (p, r) = load_and_solve(fixture_path("part_whole.json")).unwrap();
    assert_eq!(p.id(), "pw1");
    assert_eq!(r.value(), Some(&Number::from(7)));

    let results = load_problems(&[fixture_path("transfer.json"), fixture_path("missing.json")]);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ModelError::Load(_))));
    assert!(matches!(load_problem(fixture_path("missing.json")), Err(ModelError::Load(_))));
}

#[test]
fn malformed_annotations_are_load_errors() {
    for json in [
        "not json",
        "[]",
        r#"[{"graph": {"id": "p", "metadata": {}, "nodes": {}, "edges": []}}]"#,
        r#"[{"graph": {"id": "p", "metadata": {"text span": "q"},
             "nodes": {"1": {"label": "a", "metadata": {"entity": "coin", "quantity": "1"}}},
             "edges": [{"id": 2, "source": 1, "target": 1, "relation": "rate", "metadata": {"X1": "2"}}]}}]"#,
    ] {
        assert!(matches!(problem_from_json(json), Err(ModelError::Load(_))), "{json}");
    }
}
