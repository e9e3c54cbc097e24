//! Loading and exporting world models.
//!
//! - **annotation**: JSON annotation records to [`crate::Problem`]s
//! - **smatch**: PENMAN-style exports of a problem's final state

pub mod annotation;
pub mod smatch;
