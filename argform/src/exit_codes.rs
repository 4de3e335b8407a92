//! Stable exit codes for `argform` CLI commands.

/// Command succeeded; for `validate`/`import`, every argument is valid.
pub const OK: i32 = 0;
/// Command failed: unreadable spec/config/batch, validator failure, or mismatch.
pub const ERROR: i32 = 1;
/// Validation completed and at least one argument is invalid.
pub const INVALID: i32 = 2;
