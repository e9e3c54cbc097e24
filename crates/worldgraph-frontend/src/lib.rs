//! # Worldgraph Frontend
//!
//! Grammar, clause AST, and well-formedness validation for world-model
//! linearizations.

pub mod ast;
pub mod errors;
pub mod parser;
pub mod vocab;

// Re-export commonly used types
pub use ast::*;
pub use errors::FrontendError;
pub use parser::{keep_well_formed, parse_clause, parse_reference};
pub use vocab::Vocabulary;
