//! # Worldgraph Core
//!
//! World models for arithmetic word problems: a graph of quantity holders
//! and typed relations built span by span from linearizations, and a
//! deterministic equation reasoner over it.

pub mod engine;
pub mod metrics;
pub mod model;
pub mod storage;

// Re-export commonly used types
pub use engine::errors::ModelError;
pub use engine::reasoner::{DeterministicReasoner, ReasonerConfig, Resolution};
pub use engine::update::{update_world_model, ClauseDiagnostic, UpdateConfig, UpdateReport};
pub use model::{
    Container, EntityTuple, GraphId, MatchMode, Problem, Quantity, Relation, RelationKind,
    RelationType, State,
};
pub use worldgraph_ir::{Expr, Number, Symbol};

/// Loads an annotation file and solves its final state.
///
/// Convenience wrapper combining [`storage::annotation::load_problem`] and
/// [`DeterministicReasoner::solve_problem`] with default configuration.
pub fn load_and_solve(path: impl AsRef<std::path::Path>) -> Result<(Problem, Resolution), ModelError> {
    let mut problem = storage::annotation::load_problem(path)?;
    let resolution = DeterministicReasoner::default().solve_problem(&mut problem)?;
    Ok((problem, resolution))
}
