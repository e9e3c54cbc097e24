//! Error types for world-model construction and reasoning.

use thiserror::Error;

use crate::model::GraphId;

impl From<worldgraph_frontend::FrontendError> for ModelError {
    fn from(err: worldgraph_frontend::FrontendError) -> Self {
        match err {
            worldgraph_frontend::FrontendError::ParseError(msg) => ModelError::ParseError(msg),
            worldgraph_frontend::FrontendError::InvalidLiteral(msg) => {
                ModelError::InvalidArgument(format!("invalid literal '{msg}'"))
            }
            _ => ModelError::InvalidArgument(format!("unexpected frontend error: {err:?}")),
        }
    }
}

/// Errors raised by the model, the updater and the reasoner.
///
/// During incremental updates these are caught per clause and reported as
/// [`crate::engine::update::ClauseDiagnostic`]s; raised directly against the
/// model API they are returned to the caller.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// Reference expression could not be parsed.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Wrong shape or content passed to a constructor.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Graph invariant violated (relation endpoints, label constraints).
    #[error("consistency error: {0}")]
    Consistency(String),

    /// Second `set_value` on a known quantity.
    #[error("quantity already has value {0}")]
    AlreadyKnown(String),

    #[error("answer has already been set")]
    AnswerAlreadySet,

    /// Reference expression without free symbols.
    #[error("invalid reference '{0}': must contain at least one variable")]
    InvalidReference(String),

    #[error("state has no reference")]
    MissingReference,

    #[error("id {0} is already in use")]
    DuplicateId(GraphId),

    #[error("no container or relation with id {0}")]
    UnknownId(GraphId),

    #[error("all states already added")]
    ProblemComplete,

    #[error("problem is not fully parsed")]
    ProblemIncomplete,

    #[error("invalid state index {0}")]
    InvalidIndex(usize),

    /// Transfer whose container label is neither (or both) of recipient and sender.
    #[error("transfer {0} ill-defined")]
    IllDefinedTransfer(GraphId),

    /// Annotation could not be read or does not describe a world model.
    #[error("load error: {0}")]
    Load(String),
}
