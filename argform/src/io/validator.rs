//! Validator abstraction for argument checking.
//!
//! The [`Validator`] trait decouples the session from whatever actually
//! judges argument values. Tests use scripted validators; production sessions
//! use [`CommandValidator`], which talks to an external command over
//! stdin/stdout.

use std::process::Command;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::core::types::{ArgValues, ValidationIssue};
use crate::io::config::ValidatorConfig;
use crate::io::process::run_with_input;

/// Outbound validation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub model_id: String,
    pub args: ArgValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_to: Option<String>,
}

/// Something that can judge a set of argument values.
///
/// Implementations must be side-effect free from the session's perspective;
/// the same request may be sent more than once.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Return the problems found. An empty list means no problems among the
    /// checked keys. Transport failures are errors, never an empty list.
    async fn validate(&self, request: &ValidationRequest) -> Result<Vec<ValidationIssue>>;
}

/// Validator that spawns a configured command per round.
///
/// The request is written to stdin as JSON. Stdout must hold the JSON array
/// of `[[keys...], "message"]` pairs.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    config: ValidatorConfig,
}

impl CommandValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    fn build_command(&self) -> Result<Command> {
        let (program, rest) = self
            .config
            .command
            .split_first()
            .ok_or_else(|| anyhow!("validator command is empty"))?;
        let mut cmd = Command::new(program);
        cmd.args(rest);
        Ok(cmd)
    }
}

#[async_trait]
impl Validator for CommandValidator {
    #[instrument(skip_all, fields(model_id = %request.model_id, limit_to = ?request.limit_to))]
    async fn validate(&self, request: &ValidationRequest) -> Result<Vec<ValidationIssue>> {
        let payload = serde_json::to_vec(request).context("serialize validation request")?;
        let cmd = self.build_command()?;
        let timeout = self.config.timeout();
        let limit = self.config.output_limit_bytes;

        let output =
            tokio::task::spawn_blocking(move || run_with_input(cmd, &payload, timeout, limit))
                .await
                .context("join validator task")?
                .context("run validator command")?;

        if output.timed_out {
            return Err(anyhow!("validator timed out after {:?}", timeout));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "validator failed");
            return Err(anyhow!(
                "validator failed with status {:?}: {}",
                output.status.code(),
                output.stderr_tail()
            ));
        }
        if output.stdout_truncated > 0 {
            return Err(anyhow!(
                "validator response exceeded {} bytes",
                self.config.output_limit_bytes
            ));
        }

        let issues: Vec<ValidationIssue> =
            serde_json::from_slice(&output.stdout).context("parse validator response")?;
        debug!(issues = issues.len(), "validator responded");
        Ok(issues)
    }
}
