//! Equivalence of world models.
//!
//! - `strongly_equal`: final states hold the same containers and relations
//!   up to ids (quantities included).
//! - `weakly_equal`: final states have the same relation-type multiset and
//!   isomorphic undirected topologies.
//!
//! Both compare the final states of parsed problems; an unparsed problem is
//! equal to nothing.

use petgraph::algo::is_isomorphic;
use petgraph::graph::UnGraph;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::{Problem, RelationType, State};

/// Same container and relation counts, and every container and relation of
/// `a` has an equal counterpart in `b`. With equal counts this is a
/// bijection.
pub fn strongly_equal(a: &Problem, b: &Problem) -> bool {
    match (a.complete_state(), b.complete_state()) {
        (Some(s1), Some(s2)) => states_strongly_equal(s1, s2),
        _ => false,
    }
}

pub fn states_strongly_equal(s1: &State, s2: &State) -> bool {
    s1.container_count() == s2.container_count()
        && s1.relation_count() == s2.relation_count()
        && s1.containers().all(|c| s2.containers().any(|d| c == d))
        && s1.relations().all(|r| s2.relations().any(|q| r == q))
}

/// Same relation-type multiset and isomorphic container graphs, relations
/// taken as undirected unlabeled edges.
pub fn weakly_equal(a: &Problem, b: &Problem) -> bool {
    match (a.complete_state(), b.complete_state()) {
        (Some(s1), Some(s2)) => states_weakly_equal(s1, s2),
        _ => false,
    }
}

pub fn states_weakly_equal(s1: &State, s2: &State) -> bool {
    relation_types(s1) == relation_types(s2) && is_isomorphic(&topology(s1), &topology(s2))
}

fn relation_types(state: &State) -> FxHashMap<RelationType, usize> {
    let mut counts = FxHashMap::default();
    for r in state.relations() {
        *counts.entry(r.relation_type()).or_insert(0) += 1;
    }
    counts
}

/// Undirected graph over containers in id order, one edge per related pair.
pub fn topology(state: &State) -> UnGraph<(), ()> {
    let adjacency = state.to_adjacency();
    let n = adjacency.len();
    let mut graph = UnGraph::<(), ()>::with_capacity(n, state.relation_count());
    let nodes: Vec<_> = (0..n).map(|_| graph.add_node(())).collect();
    let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
    for (i, row) in adjacency.iter().enumerate() {
        for (j, &related) in row.iter().enumerate() {
            if related && seen.insert((i.min(j), i.max(j))) {
                graph.add_edge(nodes[i], nodes[j], ());
            }
        }
    }
    graph
}
