//! # World-Model State
//!
//! One snapshot of the graph for a cumulative text span. A state owns its
//! containers and relations in id-keyed maps; relations refer to
//! containers by id only. Containers and relations share one id space.
//!
//! States are values: the updater clones the previous state and mutates the
//! clone, so superseded states never change.

use std::collections::BTreeMap;

use worldgraph_ir::{Expr, Number, Symbol};

use crate::engine::errors::ModelError;
use crate::model::container::{Container, GraphId};
use crate::model::relation::{Relation, RelationType};

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct State {
    problem_id: String,
    span: String,
    containers: BTreeMap<GraphId, Container>,
    relations: BTreeMap<GraphId, Relation>,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_display"))]
    reference: Option<Expr>,
    answer: Option<Number>,
    vars: Vec<Symbol>,
}

#[cfg(feature = "serde")]
fn serialize_display<S: serde::Serializer>(
    value: &Option<Expr>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(e) => serializer.collect_str(e),
        None => serializer.serialize_none(),
    }
}

impl State {
    pub fn new(problem_id: impl Into<String>, span: impl Into<String>) -> Self {
        State {
            problem_id: problem_id.into(),
            span: span.into(),
            ..State::default()
        }
    }

    pub fn problem_id(&self) -> &str {
        &self.problem_id
    }

    pub fn span(&self) -> &str {
        &self.span
    }

    pub fn set_span(&mut self, span: impl Into<String>) {
        self.span = span.into();
    }

    /// Containers in id order.
    pub fn containers(&self) -> impl DoubleEndedIterator<Item = &Container> {
        self.containers.values()
    }

    /// Relations in id order.
    pub fn relations(&self) -> impl DoubleEndedIterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn container(&self, id: GraphId) -> Option<&Container> {
        self.containers.get(&id)
    }

    pub fn relation(&self, id: GraphId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty() && self.relations.is_empty()
    }

    /// Variable names in order of first appearance.
    pub fn vars(&self) -> &[Symbol] {
        &self.vars
    }

    fn track_var(&mut self, symbol: &Symbol) {
        if !self.vars.contains(symbol) {
            self.vars.push(symbol.clone());
        }
    }

    fn check_fresh_id(&self, id: GraphId) -> Result<(), ModelError> {
        if self.containers.contains_key(&id) || self.relations.contains_key(&id) {
            Err(ModelError::DuplicateId(id))
        } else {
            Ok(())
        }
    }

    pub fn add_container(&mut self, container: Container) -> Result<(), ModelError> {
        self.check_fresh_id(container.id)?;
        if let Some(s) = container.quantity.symbol() {
            self.track_var(s);
        }
        self.containers.insert(container.id, container);
        Ok(())
    }

    /// Binds the variable quantity of container `id` to `value`.
    pub fn update_container(&mut self, id: GraphId, value: Number) -> Result<(), ModelError> {
        self.containers
            .get_mut(&id)
            .ok_or(ModelError::UnknownId(id))?
            .set_value(value)
    }

    /// Adds a relation whose endpoints must already be present.
    pub fn add_relation(&mut self, relation: Relation) -> Result<(), ModelError> {
        self.check_fresh_id(relation.id())?;
        for (role, endpoint) in [("source", relation.source()), ("target", relation.target())] {
            match self.containers.get(&endpoint.id) {
                None => {
                    return Err(ModelError::Consistency(format!(
                        "{role} container {} must exist in the world model",
                        endpoint.id
                    )))
                }
                Some(c) if !endpoint.refers_to(c) => {
                    return Err(ModelError::Consistency(format!(
                        "{role} container {} does not match the stored container",
                        endpoint.id
                    )))
                }
                Some(_) => {}
            }
        }
        if !relation.is_part_whole() {
            if let Some(s) = relation.quantity().and_then(|q| q.symbol()) {
                self.track_var(s);
            }
        }
        self.relations.insert(relation.id(), relation);
        Ok(())
    }

    /// Binds the variable quantity of relation `id` to `value`.
    pub fn update_relation(&mut self, id: GraphId, value: Number) -> Result<(), ModelError> {
        self.relations
            .get_mut(&id)
            .ok_or(ModelError::UnknownId(id))?
            .set_value(value)
    }

    /// `max(container and relation ids) + 1`, or 1 for an empty state.
    pub fn incremented_id(&self) -> GraphId {
        let max = self
            .containers
            .keys()
            .chain(self.relations.keys())
            .map(|id| id.0)
            .max();
        GraphId(max.map_or(1, |m| m + 1))
    }

    pub fn exists_relation(
        &self,
        source: GraphId,
        target: GraphId,
        kind: Option<RelationType>,
    ) -> bool {
        self.relations.values().any(|r| {
            r.source().id == source
                && r.target().id == target
                && kind.map_or(true, |k| r.relation_type() == k)
        })
    }

    /// Sets the reference expression. A reference must mention at least
    /// one variable; setting it again overwrites the previous one.
    pub fn set_ref(&mut self, reference: Expr) -> Result<(), ModelError> {
        if reference.free_symbols().is_empty() {
            return Err(ModelError::InvalidReference(reference.to_string()));
        }
        if let Some(_previous) = self.reference.replace(reference) {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "reference {} overwritten with {:?} in problem {}",
                _previous,
                self.reference.as_ref().map(ToString::to_string),
                self.problem_id
            );
        }
        Ok(())
    }

    pub fn set_ref_str(&mut self, reference: &str) -> Result<(), ModelError> {
        let expr: Expr = reference.parse()?;
        self.set_ref(expr)
    }

    pub fn has_ref(&self) -> bool {
        self.reference.is_some()
    }

    pub fn reference(&self) -> Option<&Expr> {
        self.reference.as_ref()
    }

    pub fn set_answer(&mut self, answer: Number) -> Result<(), ModelError> {
        if self.answer.is_some() {
            return Err(ModelError::AnswerAlreadySet);
        }
        self.answer = Some(answer);
        Ok(())
    }

    pub fn has_answer(&self) -> bool {
        self.answer.is_some()
    }

    pub fn answer(&self) -> Option<&Number> {
        self.answer.as_ref()
    }

    /// Id-ordered linearization of the whole state.
    ///
    /// With `train`, containers still holding a variable are left out when
    /// the state has relations but no part-whole relation (the updater
    /// recreates them), and a transfer whose rendering already appeared is
    /// skipped.
    pub fn to_sequence(&self, train: bool) -> String {
        let has_part_whole = self.relations.values().any(Relation::is_part_whole);
        let mut out: Vec<String> = Vec::new();
        for item in self.items() {
            match item {
                Item::Container(c) => {
                    if train && !self.relations.is_empty() && c.is_variable() && !has_part_whole {
                        continue;
                    }
                    out.push(c.to_string());
                }
                Item::Relation(r) => {
                    let rendered = r.to_string();
                    if train
                        && r.relation_type() == RelationType::Transfer
                        && out.contains(&rendered)
                    {
                        continue;
                    }
                    out.push(rendered);
                }
            }
        }
        out.join(" ")
    }

    /// Containers and relations merged in id order.
    pub(crate) fn items(&self) -> impl Iterator<Item = Item<'_>> {
        merge_by_id(&self.containers, &self.relations)
    }

    /// Directed adjacency matrix over containers in id order.
    pub fn to_adjacency(&self) -> Vec<Vec<bool>> {
        let position: BTreeMap<GraphId, usize> = self
            .containers
            .keys()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        let n = position.len();
        let mut adjacency = vec![vec![false; n]; n];
        for r in self.relations.values() {
            if let (Some(&s), Some(&t)) = (position.get(&r.source().id), position.get(&r.target().id)) {
                adjacency[s][t] = true;
            }
        }
        adjacency
    }
}

/// Span, containers and relations; ids, reference and answer are ignored
/// except through the equality of the stored items.
impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.span == other.span
            && self.containers == other.containers
            && self.relations == other.relations
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Item<'a> {
    Container(&'a Container),
    Relation(&'a Relation),
}

pub(crate) fn merge_by_id<'a>(
    containers: &'a BTreeMap<GraphId, Container>,
    relations: &'a BTreeMap<GraphId, Relation>,
) -> impl Iterator<Item = Item<'a>> {
    let mut items: Vec<(GraphId, Item<'a>)> = containers
        .iter()
        .map(|(id, c)| (*id, Item::Container(c)))
        .chain(relations.iter().map(|(id, r)| (*id, Item::Relation(r))))
        .collect();
    items.sort_by_key(|(id, _)| *id);
    items.into_iter().map(|(_, item)| item)
}
