//! Deterministic, pure logic shared by the engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod arg_tree;
pub mod dependencies;
pub mod reconcile;
pub mod spec_lint;
pub mod state;
pub mod types;
