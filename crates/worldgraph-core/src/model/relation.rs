//! Relations: typed edges between two containers of the same state.
//!
//! A relation refers to its endpoints by id and keeps a structural snapshot
//! (label and tuple) of each. Labels and tuples of a container never change
//! after creation, so the snapshot stays valid while the container's
//! quantity gets bound; it is what relation equality is defined over and
//! what [`crate::model::State::add_relation`] checks against the state.

use std::fmt;
use std::str::FromStr;

use worldgraph_ir::{Expr, Number};

use crate::engine::errors::ModelError;
use crate::model::container::{Container, GraphId, MatchMode};
use crate::model::quantity::Quantity;
use crate::model::tuple::EntityTuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationType {
    Transfer,
    Rate,
    PartWhole,
    ExplicitAdd,
    ExplicitTimes,
}

impl RelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Transfer => "transfer",
            RelationType::Rate => "rate",
            RelationType::PartWhole => "part-whole",
            RelationType::ExplicitAdd => "difference",
            RelationType::ExplicitTimes => "explicit",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "transfer" => Ok(RelationType::Transfer),
            "rate" => Ok(RelationType::Rate),
            "part-whole" => Ok(RelationType::PartWhole),
            "difference" | "explicit-add" => Ok(RelationType::ExplicitAdd),
            "explicit" | "explicit-times" => Ok(RelationType::ExplicitTimes),
            other => Err(ModelError::InvalidArgument(format!(
                "unknown relation type '{other}'"
            ))),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RelationType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Structural snapshot of a relation endpoint.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Endpoint {
    pub id: GraphId,
    pub label: String,
    pub tuple: EntityTuple,
}

impl Endpoint {
    pub fn of(container: &Container) -> Self {
        Endpoint {
            id: container.id,
            label: container.label.clone(),
            tuple: container.tuple.clone(),
        }
    }

    pub fn equal_structure(&self, other: &Endpoint) -> bool {
        self.label == other.label && self.tuple == other.tuple
    }

    /// True when `container` is the node this endpoint was taken from.
    pub fn refers_to(&self, container: &Container) -> bool {
        self.id == container.id && container.matches(&self.label, &self.tuple, MatchMode::Strict)
    }
}

/// Arguments shared by additive and multiplicative explicit relations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExplicitArgs {
    pub result: String,
    pub argument: String,
    pub result_tuple: EntityTuple,
    pub argument_tuple: EntityTuple,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "kebab-case"))]
pub enum RelationKind {
    /// Quantity moves from `sender` to `recipient`; source and target are the
    /// before and after containers of one of the two labels.
    Transfer {
        tuple: EntityTuple,
        recipient: Option<String>,
        sender: Option<String>,
    },
    /// `source = target * quantity`.
    Rate {
        numerator: EntityTuple,
        denominator: EntityTuple,
    },
    /// Source is a part of the target whole.
    PartWhole,
    /// `target = source + quantity`.
    ExplicitAdd(ExplicitArgs),
    /// `target = source * quantity`.
    ExplicitTimes(ExplicitArgs),
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Relation {
    id: GraphId,
    source: Endpoint,
    target: Endpoint,
    /// `None` only for part-whole relations.
    quantity: Option<Quantity>,
    kind: RelationKind,
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

impl Relation {
    pub fn transfer(
        id: GraphId,
        source: &Container,
        target: &Container,
        quantity: Quantity,
        tuple: EntityTuple,
        recipient: Option<&str>,
        sender: Option<&str>,
    ) -> Result<Self, ModelError> {
        if source.label != target.label {
            return Err(ModelError::Consistency(format!(
                "transfer endpoints must share a label, got '{}' and '{}'",
                source.label, target.label
            )));
        }
        if recipient.is_none() && sender.is_none() {
            return Err(ModelError::InvalidArgument(
                "transfer needs a recipient or a sender".to_string(),
            ));
        }
        Ok(Relation {
            id,
            source: Endpoint::of(source),
            target: Endpoint::of(target),
            quantity: Some(quantity),
            kind: RelationKind::Transfer {
                tuple,
                recipient: recipient.map(normalize),
                sender: sender.map(normalize),
            },
        })
    }

    pub fn rate(
        id: GraphId,
        source: &Container,
        target: &Container,
        quantity: Quantity,
        numerator: EntityTuple,
        denominator: EntityTuple,
    ) -> Self {
        Relation {
            id,
            source: Endpoint::of(source),
            target: Endpoint::of(target),
            quantity: Some(quantity),
            kind: RelationKind::Rate {
                numerator,
                denominator,
            },
        }
    }

    pub fn part_whole(id: GraphId, part: &Container, whole: &Container) -> Self {
        Relation {
            id,
            source: Endpoint::of(part),
            target: Endpoint::of(whole),
            quantity: None,
            kind: RelationKind::PartWhole,
        }
    }

    /// Additive explicit relation, directed from argument to result.
    pub fn explicit_add(
        id: GraphId,
        source: &Container,
        target: &Container,
        quantity: Quantity,
        args: ExplicitArgs,
    ) -> Result<Self, ModelError> {
        let args = check_explicit(source, target, args)?;
        Ok(Relation {
            id,
            source: Endpoint::of(source),
            target: Endpoint::of(target),
            quantity: Some(quantity),
            kind: RelationKind::ExplicitAdd(args),
        })
    }

    /// Multiplicative explicit relation, directed from argument to result.
    pub fn explicit_times(
        id: GraphId,
        source: &Container,
        target: &Container,
        quantity: Quantity,
        args: ExplicitArgs,
    ) -> Result<Self, ModelError> {
        let args = check_explicit(source, target, args)?;
        Ok(Relation {
            id,
            source: Endpoint::of(source),
            target: Endpoint::of(target),
            quantity: Some(quantity),
            kind: RelationKind::ExplicitTimes(args),
        })
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn source(&self) -> &Endpoint {
        &self.source
    }

    pub fn target(&self) -> &Endpoint {
        &self.target
    }

    pub fn kind(&self) -> &RelationKind {
        &self.kind
    }

    pub fn relation_type(&self) -> RelationType {
        match self.kind {
            RelationKind::Transfer { .. } => RelationType::Transfer,
            RelationKind::Rate { .. } => RelationType::Rate,
            RelationKind::PartWhole => RelationType::PartWhole,
            RelationKind::ExplicitAdd(_) => RelationType::ExplicitAdd,
            RelationKind::ExplicitTimes(_) => RelationType::ExplicitTimes,
        }
    }

    pub fn is_part_whole(&self) -> bool {
        matches!(self.kind, RelationKind::PartWhole)
    }

    pub fn quantity(&self) -> Option<&Quantity> {
        self.quantity.as_ref()
    }

    /// The quantity value; `None` for part-whole relations.
    pub fn value(&self) -> Option<Expr> {
        self.quantity.as_ref().map(Quantity::value)
    }

    pub fn is_variable(&self) -> bool {
        self.quantity.as_ref().map_or(false, Quantity::is_variable)
    }

    pub fn is_known(&self) -> bool {
        self.quantity.as_ref().map_or(false, Quantity::is_known)
    }

    /// Binds the quantity. Part-whole relations carry no quantity and
    /// ignore the call.
    pub fn set_value(&mut self, value: Number) -> Result<(), ModelError> {
        match self.quantity.as_mut() {
            Some(q) => q.set_value(value),
            None => Ok(()),
        }
    }

    /// Equality without the quantity: endpoint structure plus the
    /// variant's own fields.
    pub fn equal_structure(&self, other: &Relation) -> bool {
        self.source.equal_structure(&other.source)
            && self.target.equal_structure(&other.target)
            && self.kind == other.kind
    }
}

fn check_explicit(
    source: &Container,
    target: &Container,
    args: ExplicitArgs,
) -> Result<ExplicitArgs, ModelError> {
    let args = ExplicitArgs {
        result: normalize(&args.result),
        argument: normalize(&args.argument),
        ..args
    };
    if source.label != args.argument || target.label != args.result {
        return Err(ModelError::Consistency(format!(
            "explicit relation must point from '{}' to '{}', got '{}' -> '{}'",
            args.argument, args.result, source.label, target.label
        )));
    }
    Ok(args)
}

/// Ids are not compared.
impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.equal_structure(other) && self.quantity == other.quantity
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = self
            .quantity
            .as_ref()
            .map_or_else(|| "none".to_string(), Quantity::render);
        match &self.kind {
            RelationKind::Transfer {
                tuple,
                recipient,
                sender,
            } => write!(
                f,
                "transfer ( {} , {} , {} , {} )",
                recipient.as_deref().unwrap_or("none"),
                sender.as_deref().unwrap_or("none"),
                q,
                tuple
            ),
            RelationKind::Rate {
                numerator,
                denominator,
            } => write!(
                f,
                "rate ( {} , {} , {} , {} )",
                self.source.label, q, numerator, denominator
            ),
            RelationKind::PartWhole => write!(
                f,
                "part ( {} , {} , {} , {} )",
                self.target.label, self.target.tuple, self.source.label, self.source.tuple
            ),
            RelationKind::ExplicitAdd(args) | RelationKind::ExplicitTimes(args) => write!(
                f,
                "{} ( {} , {} , {} , {} , {} )",
                self.relation_type(),
                args.result,
                args.argument,
                q,
                args.result_tuple,
                args.argument_tuple
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(id: u32, label: &str, q: Quantity, entity: &str) -> Container {
        Container::new(GraphId(id), Some(label), q, EntityTuple::entity_only(entity))
    }

    #[test]
    fn transfer_requires_shared_label_and_a_side() {
        let a = c(1, "tom", Quantity::known(5), "apple");
        let b = c(2, "tom", Quantity::variable("x1"), "apple");
        let other = c(3, "ann", Quantity::variable("x2"), "apple");
        let t = EntityTuple::entity_only("apple");
        assert!(Relation::transfer(GraphId(4), &a, &b, Quantity::known(2), t.clone(), None, Some("Ann")).is_ok());
        assert!(Relation::transfer(GraphId(4), &a, &other, Quantity::known(2), t.clone(), Some("tom"), None).is_err());
        assert!(Relation::transfer(GraphId(4), &a, &b, Quantity::known(2), t, None, None).is_err());
    }

    #[test]
    fn explicit_direction_is_checked() {
        let arg = c(1, "tom", Quantity::known(5), "apple");
        let res = c(2, "ann", Quantity::variable("x1"), "apple");
        let args = ExplicitArgs {
            result: "Ann".into(),
            argument: "tom".into(),
            result_tuple: EntityTuple::entity_only("apple"),
            argument_tuple: EntityTuple::entity_only("apple"),
        };
        assert!(Relation::explicit_add(GraphId(3), &arg, &res, Quantity::known(2), args.clone()).is_ok());
        assert!(Relation::explicit_times(GraphId(3), &res, &arg, Quantity::known(2), args).is_err());
    }

    #[test]
    fn equality_ignores_ids_and_structure_ignores_quantity() {
        let a = c(1, "tom", Quantity::known(5), "apple");
        let b = c(2, "tom", Quantity::variable("x1"), "apple");
        let a2 = c(10, "tom", Quantity::known(5), "apple");
        let b2 = c(20, "tom", Quantity::variable("x1"), "apple");
        let t = EntityTuple::entity_only("apple");
        let r1 = Relation::transfer(GraphId(3), &a, &b, Quantity::known(2), t.clone(), None, Some("ann")).unwrap();
        let r2 = Relation::transfer(GraphId(30), &a2, &b2, Quantity::known(2), t.clone(), None, Some("ann")).unwrap();
        let r3 = Relation::transfer(GraphId(3), &a, &b, Quantity::variable("x9"), t, None, Some("ann")).unwrap();
        assert_eq!(r1, r2);
        assert_ne!(r1, r3);
        assert!(r1.equal_structure(&r3));
    }

    #[test]
    fn part_whole_has_no_quantity() {
        let part = c(1, "basket", Quantity::known(3), "apple");
        let whole = c(2, "basket", Quantity::known(10), "fruit");
        let mut r = Relation::part_whole(GraphId(3), &part, &whole);
        assert!(r.quantity().is_none());
        assert!(!r.is_variable());
        assert!(r.set_value(Number::from(4)).is_ok());
        assert_eq!(
            r.to_string(),
            "part ( basket , fruit , none , none , basket , apple , none , none )"
        );
    }

    #[test]
    fn relation_type_names() {
        assert_eq!("explicit-add".parse::<RelationType>().unwrap(), RelationType::ExplicitAdd);
        assert_eq!(RelationType::PartWhole.as_str(), "part-whole");
        assert!("merge".parse::<RelationType>().is_err());
    }
}
