//! Error types for linearization parsing.

use thiserror::Error;

/// Errors produced while parsing clauses, literals, or reference expressions.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrontendError {
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),
}
