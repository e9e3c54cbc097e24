//! PENMAN-style exports of a problem's final state for smatch scoring.
//!
//! Relations become `(x<id> / <type> ...)` instances with `:source` and
//! `:destination` roles. A container is spelled out at its first mention
//! and referred to as `x<id>` afterwards; containers no relation mentions
//! follow the relations in id order.

use std::fmt::Write;

use rustc_hash::FxHashSet;

use crate::engine::errors::ModelError;
use crate::model::{Container, EntityTuple, GraphId, Problem, Relation, RelationKind};

/// Topology only: relation types and which containers they connect.
pub fn to_topology(problem: &Problem) -> Result<String, ModelError> {
    export(problem, |c| format!("(x{} / container)\n", c.id), |_| String::new())
}

/// Topology plus labels, quantities, tuples and relation arguments.
pub fn to_full(problem: &Problem) -> Result<String, ModelError> {
    export(problem, container_term, relation_roles)
}

fn export<C, R>(problem: &Problem, container: C, roles: R) -> Result<String, ModelError>
where
    C: Fn(&Container) -> String,
    R: Fn(&Relation) -> String,
{
    let state = problem.complete_state().ok_or(ModelError::ProblemIncomplete)?;
    let mut visited: FxHashSet<GraphId> = FxHashSet::default();
    let mut out = format!("# {}\n", problem.id());

    for relation in state.relations() {
        let _ = writeln!(out, "(x{} / {}", relation.id(), relation.relation_type());
        for (role, id) in [("source", relation.source().id), ("destination", relation.target().id)] {
            let c = state.container(id).ok_or(ModelError::UnknownId(id))?;
            let term = if visited.insert(id) {
                container(c)
            } else {
                format!("x{id}\n")
            };
            let _ = write!(out, "      :{role} {term}");
        }
        out.push_str(&roles(relation));
        out.push_str(")\n");
    }

    for c in state.containers().filter(|c| !visited.contains(&c.id)) {
        out.push_str(&container(c));
    }
    out.push('\n');
    Ok(out)
}

fn container_term(c: &Container) -> String {
    let id = c.id;
    let mut out = format!("(x{id} / container\n");
    let _ = writeln!(out, "      :name (n{id} / name :op1 \"{}\")", c.label);
    let _ = writeln!(out, "      :quant {}", c.quantity);
    tuple_roles(&mut out, &c.tuple, ["e", "a", "u"], id, 0);
    out.push_str(")\n");
    out
}

/// `:ARG<first>..` roles for a tuple, skipping absent attribute and unit.
fn tuple_roles(out: &mut String, tuple: &EntityTuple, prefixes: [&str; 3], id: GraphId, first: usize) {
    let slots = [Some(tuple.entity.as_str()), tuple.attribute.as_deref(), tuple.unit.as_deref()];
    for (i, (prefix, slot)) in prefixes.iter().zip(slots).enumerate() {
        if let Some(value) = slot {
            let _ = writeln!(out, "      :ARG{} ({prefix}{id} / {value})", first + i);
        }
    }
}

fn relation_roles(relation: &Relation) -> String {
    let id = relation.id();
    let mut out = String::new();
    if let Some(q) = relation.quantity() {
        let _ = writeln!(out, "      :quant {q}");
    }
    match relation.kind() {
        RelationKind::PartWhole => {}
        RelationKind::Transfer {
            tuple,
            recipient,
            sender,
        } => {
            tuple_roles(&mut out, tuple, ["e", "a", "u"], id, 0);
            if let Some(r) = recipient {
                let _ = writeln!(out, "      :ARG3 (rec{id} / {r})");
            }
            if let Some(s) = sender {
                let _ = writeln!(out, "      :ARG4 (sen{id} / {s})");
            }
        }
        RelationKind::Rate {
            numerator,
            denominator,
        } => {
            tuple_roles(&mut out, numerator, ["enum", "anum", "unum"], id, 0);
            tuple_roles(&mut out, denominator, ["eden", "aden", "uden"], id, 3);
        }
        RelationKind::ExplicitAdd(args) | RelationKind::ExplicitTimes(args) => {
            tuple_roles(&mut out, &args.result_tuple, ["er", "ar", "ur"], id, 0);
            tuple_roles(&mut out, &args.argument_tuple, ["ea", "aa", "ua"], id, 3);
            let _ = writeln!(out, "      :ARG6 (res{id} / {})", args.result);
            let _ = writeln!(out, "      :ARG7 (arg{id} / {})", args.argument);
        }
    }
    out
}
