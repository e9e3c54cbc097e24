use worldgraph_core::metrics::{strongly_equal, topology, weakly_equal};
use worldgraph_core::storage::annotation::problem_from_json;
use worldgraph_core::{update_world_model, Problem, UpdateConfig};

const TRANSFER: &str = include_str!("../../../../fixtures/transfer.json");
const PART_WHOLE: &str = include_str!("../../../../fixtures/part_whole.json");

fn replay(gold: &Problem, lins: &[&str]) -> Problem {
    let mut p = gold.without_states();
    for lin in lins {
        update_world_model(&mut p, lin, &UpdateConfig::default()).expect("update");
    }
    p
}

#[test]
fn parsed_transfer_story_matches_its_annotation() {
    let gold = problem_from_json(TRANSFER).unwrap();
    let built = replay(
        &gold,
        &[
            "container ( tom , 8 , apple , none , none )",
            "transfer ( ann , tom , 3 , apple , none , none )",
            "container ( tom , none , apple , none , none )",
        ],
    );
    assert!(strongly_equal(&gold, &built));
    assert!(weakly_equal(&gold, &built));
}

#[test]
fn different_quantities_are_only_weakly_equal() {
    let gold = problem_from_json(TRANSFER).unwrap();
    let built = replay(
        &gold,
        &[
            "container ( tom , 9 , apple , none , none )",
            "transfer ( ann , tom , 4 , apple , none , none )",
            "container ( tom , none , apple , none , none )",
        ],
    );
    assert!(!strongly_equal(&gold, &built));
    assert!(weakly_equal(&gold, &built));
}

#[test]
fn different_relation_types_are_not_equal() {
    let transfer = problem_from_json(TRANSFER).unwrap();
    let part_whole = problem_from_json(PART_WHOLE).unwrap();
    assert!(!weakly_equal(&transfer, &part_whole));
    assert!(!strongly_equal(&transfer, &part_whole));
    assert_eq!(topology(part_whole.complete_state().unwrap()).edge_count(), 2);
}

#[test]
fn unparsed_problems_equal_nothing() {
    let gold = problem_from_json(TRANSFER).unwrap();
    let empty = gold.without_states();
    assert!(!strongly_equal(&empty, &empty));
    assert!(!weakly_equal(&gold, &empty));
}
