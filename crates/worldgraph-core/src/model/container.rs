//! Containers: graph nodes holding a quantity of some entity under a label.

use std::fmt;

use worldgraph_ir::{Expr, Number};

use crate::engine::errors::ModelError;
use crate::model::quantity::Quantity;
use crate::model::tuple::EntityTuple;

/// Label used when a container has none.
pub const DEFAULT_LABEL: &str = "world";

/// Identifier shared by containers and relations of one state.
///
/// Ids are monotonic: a newer node or edge always has a larger id, which is
/// what recency-biased matching relies on.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GraphId(pub u32);

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structural matching mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Label, entity, attribute and unit.
    #[default]
    Strict,
    /// Label and entity only.
    Soft,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Container {
    pub id: GraphId,
    pub label: String,
    pub quantity: Quantity,
    pub tuple: EntityTuple,
}

/// Lowercases and trims a label, defaulting to [`DEFAULT_LABEL`].
pub fn normalize_label(label: Option<&str>) -> String {
    match label.map(str::trim) {
        Some(l) if !l.is_empty() => l.to_lowercase(),
        _ => DEFAULT_LABEL.to_string(),
    }
}

impl Container {
    pub fn new(id: GraphId, label: Option<&str>, quantity: Quantity, tuple: EntityTuple) -> Self {
        Container {
            id,
            label: normalize_label(label),
            quantity,
            tuple,
        }
    }

    pub fn is_known(&self) -> bool {
        self.quantity.is_known()
    }

    pub fn is_variable(&self) -> bool {
        self.quantity.is_variable()
    }

    pub fn value(&self) -> Expr {
        self.quantity.value()
    }

    pub fn set_value(&mut self, value: Number) -> Result<(), ModelError> {
        self.quantity.set_value(value)
    }

    /// Structural equality, ignoring id and quantity.
    pub fn equal_structure(&self, other: &Container, mode: MatchMode) -> bool {
        self.matches(&other.label, &other.tuple, mode)
    }

    pub(crate) fn matches(&self, label: &str, tuple: &EntityTuple, mode: MatchMode) -> bool {
        self.label == label
            && match mode {
                MatchMode::Strict => self.tuple == *tuple,
                MatchMode::Soft => self.tuple.entity == tuple.entity,
            }
    }
}

/// Equality over label, quantity and tuple; ids are not compared.
impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.quantity == other.quantity && self.tuple == other.tuple
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "container ( {} , {} , {} )",
            self.label,
            self.quantity.render(),
            self.tuple
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apples(id: u32, label: &str, q: Quantity, attr: Option<&str>) -> Container {
        Container::new(
            GraphId(id),
            Some(label),
            q,
            EntityTuple::new("apple", attr, None),
        )
    }

    #[test]
    fn label_is_normalized_and_defaulted() {
        let c = apples(1, "  Tom ", Quantity::known(3), None);
        assert_eq!(c.label, "tom");
        let w = Container::new(GraphId(2), None, Quantity::known(1), EntityTuple::entity_only("x"));
        assert_eq!(w.label, "world");
    }

    #[test]
    fn equality_ignores_id() {
        let a = apples(1, "tom", Quantity::known(3), None);
        let b = apples(9, "tom", Quantity::known(3), None);
        assert_eq!(a, b);
        assert_ne!(a, apples(1, "tom", Quantity::known(4), None));
    }

    #[test]
    fn structure_modes() {
        let a = apples(1, "tom", Quantity::known(3), Some("red"));
        let b = apples(2, "tom", Quantity::variable("x1"), Some("red"));
        let c = apples(3, "tom", Quantity::known(3), Some("green"));
        assert!(a.equal_structure(&b, MatchMode::Strict));
        assert!(!a.equal_structure(&c, MatchMode::Strict));
        assert!(a.equal_structure(&c, MatchMode::Soft));
        assert!(!a.equal_structure(&apples(4, "ann", Quantity::known(3), Some("red")), MatchMode::Soft));
    }

    #[test]
    fn renders_linearization() {
        let c = apples(1, "tom", Quantity::variable("x1"), Some("red"));
        assert_eq!(c.to_string(), "container ( tom , none , apple , red , none )");
    }
}
