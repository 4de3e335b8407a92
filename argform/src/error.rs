//! Errors a renderer needs to tell apart.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The key is not in the spec, or is the reserved worker-count key.
    #[error("unknown argument '{0}'")]
    UnknownArg(String),

    /// A batch payload was built for a different module.
    #[error("batch targets module '{found}' but this session is for '{expected}'")]
    ModuleMismatch { expected: String, found: String },

    /// The external validator could not be reached or answered garbage.
    #[error("validator failed: {0:#}")]
    Validator(anyhow::Error),
}
