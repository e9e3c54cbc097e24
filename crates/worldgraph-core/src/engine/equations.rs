//! Equation assembly.
//!
//! Each relation contributes one polynomial that must equal zero. All
//! part-whole relations sharing a whole contribute a single equation
//! `whole - (part_1 + ... + part_n)`. Part-whole equations come first,
//! ordered by whole id, followed by the remaining relations in id order.

use std::collections::BTreeMap;

use worldgraph_ir::Polynomial;

use crate::engine::errors::ModelError;
use crate::model::{GraphId, Quantity, Relation, RelationKind, State};

/// One equation `polynomial = 0` and the relations it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub relations: Vec<GraphId>,
    pub polynomial: Polynomial,
}

fn term(quantity: &Quantity) -> Polynomial {
    match quantity {
        Quantity::Known(n) => Polynomial::constant(n.clone()),
        Quantity::Variable(s) => Polynomial::symbol(s.clone()),
    }
}

fn container_term(state: &State, id: GraphId) -> Result<Polynomial, ModelError> {
    state
        .container(id)
        .map(|c| term(&c.quantity))
        .ok_or(ModelError::UnknownId(id))
}

fn relation_term(relation: &Relation) -> Result<Polynomial, ModelError> {
    relation
        .quantity()
        .map(term)
        .ok_or_else(|| ModelError::Consistency(format!("relation {} has no quantity", relation.id())))
}

/// Builds every equation of `state`. Deterministic for a given state.
pub fn assemble_equations(state: &State) -> Result<Vec<Equation>, ModelError> {
    let mut wholes: BTreeMap<GraphId, Vec<GraphId>> = BTreeMap::new();
    let mut equations = Vec::new();
    let mut others = Vec::new();

    for relation in state.relations() {
        if relation.is_part_whole() {
            wholes.entry(relation.target().id).or_default().push(relation.id());
        } else {
            others.push(relation);
        }
    }

    for (whole, relations) in wholes {
        let mut polynomial = container_term(state, whole)?;
        for id in &relations {
            let part = state
                .relation(*id)
                .map(|r| r.source().id)
                .ok_or(ModelError::UnknownId(*id))?;
            polynomial = polynomial - container_term(state, part)?;
        }
        equations.push(Equation { relations, polynomial });
    }

    for relation in others {
        equations.push(Equation {
            relations: vec![relation.id()],
            polynomial: relation_equation(state, relation)?,
        });
    }
    Ok(equations)
}

/// The equation of a single non-part-whole relation.
pub fn relation_equation(state: &State, relation: &Relation) -> Result<Polynomial, ModelError> {
    let source = container_term(state, relation.source().id)?;
    let target = container_term(state, relation.target().id)?;
    let quantity = relation_term(relation)?;
    match relation.kind() {
        RelationKind::Transfer { recipient, sender, .. } => {
            let label = Some(relation.source().label.as_str());
            let receives = recipient.as_deref() == label;
            let gives = sender.as_deref() == label;
            match (receives, gives) {
                (true, false) => Ok(source + quantity - target),
                (false, true) => Ok(source - quantity - target),
                _ => Err(ModelError::IllDefinedTransfer(relation.id())),
            }
        }
        RelationKind::Rate { .. } => Ok(source - target * quantity),
        RelationKind::ExplicitAdd(_) => Ok(source + quantity - target),
        RelationKind::ExplicitTimes(_) => Ok(source * quantity - target),
        RelationKind::PartWhole => Err(ModelError::Consistency(format!(
            "part-whole relation {} has no equation of its own",
            relation.id()
        ))),
    }
}
