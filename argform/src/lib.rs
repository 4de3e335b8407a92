//! Argument form and validation engine.
//!
//! Turns a declarative args spec into a live form session: values, touched
//! flags, visibility overrides from gating arguments, display grouping, and
//! per-argument validity fed by an external validator. The architecture
//! keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (initialization, dependency
//!   gating, grouping, reconciling validator responses). No I/O.
//! - **[`io`]**: Side-effecting operations (spec and batch files, config,
//!   the process-backed validator).
//!
//! [`session`], [`validation`] and [`import`] tie the two together into the
//! [`ArgsSession`] a renderer drives.

pub mod args_spec;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod import;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validation;

pub use args_spec::{ArgSpec, ArgType, ArgsSpec};
pub use error::SessionError;
pub use session::{ArgsSession, SessionEvent, SessionOptions, SessionSnapshot};
pub use validation::{RoundOutcome, RoundReport, ValidationReport};
