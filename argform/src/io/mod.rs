//! I/O helpers: spec and batch files, configuration, external validators.

pub mod batch;
pub mod config;
pub mod process;
pub mod spec_store;
pub mod validator;
