//! # Annotation Ingestion
//!
//! Reads annotated problems: a JSON list with one graph record per text
//! span, the last record being the question.
//!
//! ```json
//! [{"graph": {
//!     "id": "p1",
//!     "metadata": {"text span": "Tom has 5 apples."},
//!     "nodes": {"1": {"label": "tom",
//!                     "metadata": {"entity": "apple", "quantity": "5",
//!                                  "attribute": "-", "unit": "-"}}},
//!     "edges": []}}]
//! ```
//!
//! Node metadata values `"-"`, `""` and `" "` mean absent. Edge metadata is
//! positional (`X1`..`X4`) and depends on the relation type. The node keyed
//! `CQ` in a record carries that state's answer and reference instead of
//! being a container.

use std::path::Path;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use worldgraph_ir::{Number, Symbol};

use crate::engine::errors::ModelError;
use crate::model::{
    Container, EntityTuple, ExplicitArgs, GraphId, Problem, Quantity, Relation, RelationType,
    State,
};

const TEXT_SPAN: &str = "text span";
const QUESTION_NODE: &str = "CQ";
const PLACEHOLDERS: [&str; 3] = ["-", "", " "];

#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub graph: GraphRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphRecord {
    pub id: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub nodes: Map<String, Value>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub label: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRecord {
    pub id: Value,
    pub source: Value,
    pub target: Value,
    pub relation: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Reads and converts one annotation file.
pub fn load_problem(path: impl AsRef<Path>) -> Result<Problem, ModelError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| ModelError::Load(format!("{}: {e}", path.display())))?;
    problem_from_json(&text)
}

/// Loads independent annotation files, in parallel with the `parallel`
/// feature. Results keep the order of `paths`.
pub fn load_problems<P>(paths: &[P]) -> Vec<Result<Problem, ModelError>>
where
    P: AsRef<Path> + Sync,
{
    #[cfg(feature = "parallel")]
    {
        paths.par_iter().map(load_problem).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        paths.iter().map(load_problem).collect()
    }
}

pub fn problem_from_json(text: &str) -> Result<Problem, ModelError> {
    let records: Vec<Record> =
        serde_json::from_str(text).map_err(|e| ModelError::Load(e.to_string()))?;
    problem_from_records(&records)
}

pub fn problem_from_records(records: &[Record]) -> Result<Problem, ModelError> {
    let (first, last) = match (records.first(), records.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(ModelError::Load("annotation has no records".to_string())),
    };
    let spans = records
        .iter()
        .map(|r| text_span(&r.graph))
        .collect::<Result<Vec<_>, _>>()?;
    let question = text_span(&last.graph)?;
    let body = spans[..spans.len() - 1].join(" ");
    let id = scalar_text(&first.graph.id)
        .ok_or_else(|| ModelError::Load("record without an id".to_string()))?;

    let mut problem = Problem::new(id, body.trim(), question, spans);
    for record in records {
        problem.add_state(state_from_record(&record.graph)?)?;
    }
    problem.add_metadata(
        last.graph
            .metadata
            .iter()
            .filter(|(k, _)| k.as_str() != TEXT_SPAN)
            .map(|(k, v)| (k.clone(), v.clone())),
    );

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "loaded problem {} with {} states",
        problem.id(),
        problem.states().len()
    );
    Ok(problem)
}

fn text_span(graph: &GraphRecord) -> Result<String, ModelError> {
    graph
        .metadata
        .get(TEXT_SPAN)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .ok_or_else(|| ModelError::Load("record without a text span".to_string()))
}

/// String or number as text; `None` for placeholders and anything else.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if PLACEHOLDERS.contains(&text.as_str()) {
        None
    } else {
        Some(text.trim().to_string())
    }
}

fn field(metadata: &Map<String, Value>, key: &str) -> Option<String> {
    metadata.get(key).and_then(scalar_text)
}

fn graph_id(value: &Value) -> Result<GraphId, ModelError> {
    scalar_text(value)
        .and_then(|s| s.parse::<u32>().ok())
        .map(GraphId)
        .ok_or_else(|| ModelError::Load(format!("graph ids must be non-negative integers, got {value}")))
}

/// Positional `[entity, attribute, unit]` triple.
fn tuple_field(metadata: &Map<String, Value>, key: &str) -> Result<EntityTuple, ModelError> {
    let items = metadata
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ModelError::Load(format!("edge metadata {key} must be an [entity, attribute, unit] list")))?;
    let slot = |i: usize| items.get(i).and_then(scalar_text);
    let entity = slot(0).ok_or_else(|| ModelError::Load(format!("edge metadata {key} has no entity")))?;
    Ok(EntityTuple::new(entity, slot(1).as_deref(), slot(2).as_deref()))
}

/// Names for quantities the annotators left blank, numbered after every
/// number already used in the record's variable names.
struct FreshVars(u64);

impl FreshVars {
    fn for_record(graph: &GraphRecord) -> Self {
        let node_quantities = graph
            .nodes
            .values()
            .filter_map(|n| n.get("metadata").and_then(Value::as_object))
            .filter(|m| m.get("reference").is_none())
            .filter_map(|m| field(m, "quantity"));
        let edge_quantities = graph.edges.iter().filter_map(|e| field(&e.metadata, "X1"));
        let max = node_quantities
            .chain(edge_quantities)
            .filter(|q| Number::parse(q).is_err())
            .flat_map(|q| Symbol::new(q).digit_runs().collect::<Vec<_>>())
            .max();
        FreshVars(max.map_or(1, |m| m + 1))
    }

    fn quantity(&mut self, literal: Option<String>) -> Result<Quantity, ModelError> {
        match literal {
            Some(text) => Quantity::from_literal(&text),
            None => {
                let q = Quantity::Variable(Symbol::numbered(self.0));
                self.0 += 1;
                Ok(q)
            }
        }
    }
}

fn state_from_record(graph: &GraphRecord) -> Result<State, ModelError> {
    let problem_id = scalar_text(&graph.id).unwrap_or_default();
    let mut state = State::new(problem_id, text_span(graph)?);
    let mut fresh = FreshVars::for_record(graph);

    let mut nodes: Vec<(Option<GraphId>, NodeRecord)> = Vec::with_capacity(graph.nodes.len());
    for (key, value) in &graph.nodes {
        let node: NodeRecord =
            serde_json::from_value(value.clone()).map_err(|e| ModelError::Load(format!("node {key}: {e}")))?;
        let id = match key.as_str() {
            QUESTION_NODE => None,
            _ => Some(graph_id(&Value::String(key.clone()))?),
        };
        nodes.push((id, node));
    }
    nodes.sort_by_key(|(id, _)| id.map_or(u32::MAX, |i| i.0));

    for (id, node) in &nodes {
        match id {
            Some(id) => {
                let entity = field(&node.metadata, "entity")
                    .ok_or_else(|| ModelError::Load(format!("container {id} has no entity")))?;
                let tuple = EntityTuple::new(
                    entity,
                    field(&node.metadata, "attribute").as_deref(),
                    field(&node.metadata, "unit").as_deref(),
                );
                let quantity = fresh.quantity(field(&node.metadata, "quantity"))?;
                let label = scalar_text(&node.label);
                state.add_container(Container::new(*id, label.as_deref(), quantity, tuple))?;
            }
            None => {
                if let Some(answer) = field(&node.metadata, "quantity") {
                    state.set_answer(Number::parse(&answer)?)?;
                }
                if let Some(reference) = field(&node.metadata, "reference") {
                    state.set_ref_str(&reference)?;
                }
            }
        }
    }

    for edge in &graph.edges {
        let relation = relation_from_edge(&state, edge, &mut fresh)?;
        state.add_relation(relation)?;
    }
    Ok(state)
}

fn relation_from_edge(state: &State, edge: &EdgeRecord, fresh: &mut FreshVars) -> Result<Relation, ModelError> {
    let id = graph_id(&edge.id)?;
    let endpoint = |v: &Value| -> Result<Container, ModelError> {
        let cid = graph_id(v)?;
        state
            .container(cid)
            .cloned()
            .ok_or_else(|| ModelError::Load(format!("edge {id} refers to undefined container {cid}")))
    };
    let source = endpoint(&edge.source)?;
    let target = endpoint(&edge.target)?;
    let m = &edge.metadata;

    match edge.relation.parse::<RelationType>()? {
        RelationType::PartWhole => Ok(Relation::part_whole(id, &source, &target)),
        RelationType::Transfer => Relation::transfer(
            id,
            &source,
            &target,
            fresh.quantity(field(m, "X1"))?,
            tuple_field(m, "X2")?,
            field(m, "X3").as_deref(),
            field(m, "X4").as_deref(),
        ),
        RelationType::Rate => Ok(Relation::rate(
            id,
            &source,
            &target,
            fresh.quantity(field(m, "X1"))?,
            tuple_field(m, "X2")?,
            tuple_field(m, "X3")?,
        )),
        kind @ (RelationType::ExplicitAdd | RelationType::ExplicitTimes) => {
            let quantity = fresh.quantity(field(m, "X1"))?;
            let result = field(m, "X3").ok_or_else(|| ModelError::Load(format!("edge {id} has no result")))?;
            let argument =
                field(m, "X4").ok_or_else(|| ModelError::Load(format!("edge {id} has no argument")))?;
            // Comparisons within one label take the tuples of the containers.
            let (result_tuple, argument_tuple) = if result == argument {
                (target.tuple.clone(), source.tuple.clone())
            } else {
                let t = tuple_field(m, "X2")?;
                (t.clone(), t)
            };
            let args = ExplicitArgs {
                result,
                argument,
                result_tuple,
                argument_tuple,
            };
            if kind == RelationType::ExplicitAdd {
                Relation::explicit_add(id, &source, &target, quantity, args)
            } else {
                Relation::explicit_times(id, &source, &target, quantity, args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldgraph_ir::Expr;

    const SAMPLE: &str = r#"[
      {"graph": {"id": "p7", "metadata": {"text span": "Tom has 5 apples."},
        "nodes": {"1": {"label": "Tom", "metadata": {"entity": "apple", "quantity": "5", "attribute": "-", "unit": ""}}},
        "edges": []}},
      {"graph": {"id": "p7", "metadata": {"text span": "How many after giving 2 away?", "source": "test"},
        "nodes": {
          "1": {"label": "tom", "metadata": {"entity": "apple", "quantity": "5", "attribute": "-", "unit": "-"}},
          "2": {"label": "tom", "metadata": {"entity": "apple", "quantity": "x1", "attribute": "-", "unit": "-"}},
          "CQ": {"label": "-", "metadata": {"quantity": "3", "reference": "x1"}}},
        "edges": [{"id": 3, "source": 1, "target": 2, "relation": "transfer",
                   "metadata": {"X1": "2", "X2": ["apple", "-", "-"], "X3": "-", "X4": "tom"}}]}}
    ]"#;

    #[test]
    fn loads_states_answer_and_reference() {
        let p = problem_from_json(SAMPLE).unwrap();
        assert_eq!(p.id(), "p7");
        assert_eq!(p.body(), "Tom has 5 apples.");
        assert_eq!(p.num_states(), 2);
        assert!(p.is_solved());
        assert_eq!(p.answer(), Some(&Number::from(3)));
        assert_eq!(p.reference(), Some(&Expr::symbol("x1")));
        let s = p.complete_state().unwrap();
        assert_eq!(s.container_count(), 2);
        assert_eq!(s.relation_count(), 1);
        assert_eq!(p.metadata().get("source"), Some(&Value::from("test")));
        assert!(!p.metadata().contains_key(TEXT_SPAN));
        assert_eq!(p.state(0).and_then(|s| s.container(GraphId(1))).map(|c| c.label.as_str()), Some("tom"));
    }

    #[test]
    fn blank_quantities_get_fresh_variables() {
        let json = r#"[{"graph": {"id": 4, "metadata": {"text span": "q"},
            "nodes": {"1": {"label": "a", "metadata": {"entity": "coin", "quantity": "x4"}},
                      "2": {"label": "a", "metadata": {"entity": "coin", "quantity": "-"}}},
            "edges": []}}]"#;
        let p = problem_from_json(json).unwrap();
        assert_eq!(p.id(), "4");
        let c = p.complete_state().and_then(|s| s.container(GraphId(2))).unwrap();
        assert_eq!(c.quantity, Quantity::variable("x5"));
    }

    #[test]
    fn rejects_undefined_endpoints_and_bad_ids() {
        let json = r#"[{"graph": {"id": "p", "metadata": {"text span": "q"},
            "nodes": {"1": {"label": "a", "metadata": {"entity": "coin", "quantity": "1"}}},
            "edges": [{"id": 2, "source": 1, "target": 9, "relation": "part-whole", "metadata": {}}]}}]"#;
        assert!(matches!(problem_from_json(json), Err(ModelError::Load(_))));
        let json = r#"[{"graph": {"id": "p", "metadata": {"text span": "q"},
            "nodes": {"a": {"label": "a", "metadata": {"entity": "coin"}}}, "edges": []}}]"#;
        assert!(matches!(problem_from_json(json), Err(ModelError::Load(_))));
        assert!(matches!(problem_from_json("[]"), Err(ModelError::Load(_))));
    }
}
