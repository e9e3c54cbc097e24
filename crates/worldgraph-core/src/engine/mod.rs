//! The world-model engine.
//!
//! This module provides:
//! - **errors**: Error types for model and update failures
//! - **matching**: Strict and soft structural lookups on a state
//! - **update**: Incremental updater applying linearizations span by span
//! - **equations**: Equation assembly from relations
//! - **reasoner**: Deterministic recursive solver for the reference
//! - **diff**: Per-span structural diffs and their linearization

pub mod diff;
pub mod equations;
pub mod errors;
pub mod matching;
pub mod reasoner;
pub mod update;
