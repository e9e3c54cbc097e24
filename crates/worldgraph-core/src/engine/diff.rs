//! Per-span diffs and their linearization.
//!
//! The diff of span `i` holds the containers and relations of state `i`
//! that have no equal counterpart in state `i - 1` (for `i == 0`, all of
//! them). A variable that got bound shows up as a changed container or
//! relation.

use std::collections::BTreeMap;

use crate::engine::errors::ModelError;
use crate::model::state::{merge_by_id, Item};
use crate::model::{Container, GraphId, Problem, Relation, RelationType};

/// Items added or changed by one span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDiff {
    pub containers: BTreeMap<GraphId, Container>,
    pub relations: BTreeMap<GraphId, Relation>,
}

impl StateDiff {
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty() && self.relations.is_empty()
    }
}

impl Problem {
    pub fn compute_diff(&self, i: usize) -> Result<StateDiff, ModelError> {
        let state = self.state(i).ok_or(ModelError::InvalidIndex(i))?;
        let previous = match i {
            0 => None,
            _ => self.state(i - 1),
        };
        let containers = state
            .containers()
            .filter(|c| previous.map_or(true, |p| !p.containers().any(|pc| pc == *c)))
            .map(|c| (c.id, c.clone()))
            .collect();
        let relations = state
            .relations()
            .filter(|r| previous.map_or(true, |p| !p.relations().any(|pr| pr == *r)))
            .map(|r| (r.id(), r.clone()))
            .collect();
        Ok(StateDiff {
            containers,
            relations,
        })
    }

    /// Renders the diff of span `i` in the linearization language.
    ///
    /// Part-whole relations sharing a whole are rendered as one `part`
    /// clause. With `training`, variable containers are omitted when the
    /// step also adds non-part-whole relations, and a transfer rendering
    /// already emitted is not repeated. On the question span, the
    /// containers and relations holding the reference are appended when
    /// missing.
    pub fn linearize_diff(&self, i: usize, training: bool) -> Result<String, ModelError> {
        let diff = self.compute_diff(i)?;
        let has_part_whole = diff.relations.values().any(Relation::is_part_whole);
        let mut out: Vec<String> = Vec::new();
        let mut rendered_wholes: Vec<GraphId> = Vec::new();

        for item in merge_by_id(&diff.containers, &diff.relations) {
            match item {
                Item::Container(c) => {
                    if training && !diff.relations.is_empty() && c.is_variable() && !has_part_whole {
                        continue;
                    }
                    out.push(c.to_string());
                }
                Item::Relation(r) if r.is_part_whole() => {
                    let whole = r.target().id;
                    if !rendered_wholes.contains(&whole) {
                        rendered_wholes.push(whole);
                        out.push(render_part_group(&diff.relations, whole));
                    }
                }
                Item::Relation(r) => {
                    let rendered = r.to_string();
                    if training && r.relation_type() == RelationType::Transfer && out.contains(&rendered) {
                        continue;
                    }
                    out.push(rendered);
                }
            }
        }

        if i + 1 == self.num_states() {
            if let Some(state) = self.state(i) {
                if let Some(reference) = state.reference() {
                    let holders = state
                        .containers()
                        .filter(|c| c.value() == *reference)
                        .map(ToString::to_string)
                        .chain(
                            state
                                .relations()
                                .filter(|r| r.value().as_ref() == Some(reference))
                                .map(ToString::to_string),
                        )
                        .collect::<Vec<_>>();
                    for rendered in holders {
                        if !out.contains(&rendered) {
                            out.push(rendered);
                        }
                    }
                }
            }
        }
        Ok(out.join(" "))
    }

    /// Training linearization of every parsed span, one line per span.
    pub fn to_sequence(&self) -> Result<String, ModelError> {
        let lines = (0..self.states().len())
            .map(|i| self.linearize_diff(i, true))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines.join("\n"))
    }
}

fn render_part_group(relations: &BTreeMap<GraphId, Relation>, whole: GraphId) -> String {
    let mut parts = relations
        .values()
        .filter(|r| r.is_part_whole() && r.target().id == whole)
        .peekable();
    let mut out = match parts.peek() {
        Some(first) => format!("part ( {} , {}", first.target().label, first.target().tuple),
        None => return String::new(),
    };
    for r in parts {
        out.push_str(&format!(" , {} , {}", r.source().label, r.source().tuple));
    }
    out.push_str(" )");
    out
}
