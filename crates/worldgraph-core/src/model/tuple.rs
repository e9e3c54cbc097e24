//! Entity / attribute / unit triples.

use std::fmt;

use worldgraph_frontend::TupleArgs;

/// What a quantity counts: `(entity, attribute, unit)`, e.g.
/// `("apple", Some("red"), None)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EntityTuple {
    pub entity: String,
    pub attribute: Option<String>,
    pub unit: Option<String>,
}

impl EntityTuple {
    pub fn new(entity: impl Into<String>, attribute: Option<&str>, unit: Option<&str>) -> Self {
        EntityTuple {
            entity: entity.into().trim().to_string(),
            attribute: attribute.map(|a| a.trim().to_string()),
            unit: unit.map(|u| u.trim().to_string()),
        }
    }

    pub fn entity_only(entity: impl Into<String>) -> Self {
        EntityTuple::new(entity, None, None)
    }
}

impl From<&TupleArgs> for EntityTuple {
    fn from(args: &TupleArgs) -> Self {
        EntityTuple::new(
            args.entity.as_str(),
            args.attribute.as_deref(),
            args.unit.as_deref(),
        )
    }
}

/// Renders `entity , attribute , unit` with `none` for absent slots.
impl fmt::Display for EntityTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} , {} , {}",
            self.entity,
            self.attribute.as_deref().unwrap_or("none"),
            self.unit.as_deref().unwrap_or("none")
        )
    }
}
