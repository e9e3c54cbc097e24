//! Container and relation quantities.

use std::fmt;

use worldgraph_ir::{Expr, Number, Symbol};

use crate::engine::errors::ModelError;

/// Either a known number or a free variable.
///
/// A variable can be bound to a number once; binding a known quantity
/// again fails with [`ModelError::AlreadyKnown`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Quantity {
    Known(Number),
    Variable(Symbol),
}

impl Quantity {
    pub fn known(value: impl Into<Number>) -> Self {
        Quantity::Known(value.into())
    }

    pub fn variable(name: impl AsRef<str>) -> Self {
        Quantity::Variable(Symbol::new(name))
    }

    /// Interprets an annotation literal: a fraction, integer or decimal
    /// becomes a known number, anything else names a variable.
    pub fn from_literal(text: &str) -> Result<Self, ModelError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::InvalidArgument("empty quantity".to_string()));
        }
        Ok(match Number::parse(text) {
            Ok(n) => Quantity::Known(n),
            Err(_) => Quantity::Variable(Symbol::new(text)),
        })
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Quantity::Known(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Quantity::Variable(_))
    }

    pub fn number(&self) -> Option<&Number> {
        match self {
            Quantity::Known(n) => Some(n),
            Quantity::Variable(_) => None,
        }
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Quantity::Variable(s) => Some(s),
            Quantity::Known(_) => None,
        }
    }

    /// The number if known, otherwise the variable as an expression.
    pub fn value(&self) -> Expr {
        match self {
            Quantity::Known(n) => Expr::Num(n.clone()),
            Quantity::Variable(s) => Expr::Sym(s.clone()),
        }
    }

    pub fn set_value(&mut self, value: Number) -> Result<(), ModelError> {
        match self {
            Quantity::Known(n) => Err(ModelError::AlreadyKnown(n.to_string())),
            Quantity::Variable(_) => {
                *self = Quantity::Known(value);
                Ok(())
            }
        }
    }

    /// Linearization slot: the number, or `none` while unknown.
    pub fn render(&self) -> String {
        match self {
            Quantity::Known(n) => n.to_string(),
            Quantity::Variable(_) => "none".to_string(),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Known(n) => write!(f, "{n}"),
            Quantity::Variable(s) => write!(f, "{s}"),
        }
    }
}
