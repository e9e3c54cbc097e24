//! # Worldgraph IR
//!
//! Numeric and symbolic building blocks shared by the world model and the
//! reasoner: exact-or-float numbers, symbols, reference expressions and
//! equation polynomials.

pub mod expr;
pub mod number;
pub mod polynomial;
pub mod symbol;

// Re-export commonly used types
pub use expr::Expr;
pub use number::Number;
pub use polynomial::{Monomial, Polynomial};
pub use symbol::Symbol;
