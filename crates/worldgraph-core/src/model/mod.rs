//! World-model data types.
//!
//! - **tuple**: entity / attribute / unit triples
//! - **quantity**: known number or free variable
//! - **container**: graph nodes holding a quantity
//! - **relation**: typed edges between containers
//! - **state**: one graph snapshot per text span
//! - **problem**: the ordered sequence of states of one word problem

pub mod container;
pub mod problem;
pub mod quantity;
pub mod relation;
pub mod state;
pub mod tuple;

pub use container::{Container, GraphId, MatchMode};
pub use problem::Problem;
pub use quantity::Quantity;
pub use relation::{Endpoint, ExplicitArgs, Relation, RelationKind, RelationType};
pub use state::State;
pub use tuple::EntityTuple;
