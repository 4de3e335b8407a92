//! Engine configuration stored in `argform.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Engine configuration (TOML).
///
/// Intended to be edited by humans. Missing fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormConfig {
    /// Drop validator responses from rounds that are no longer the latest.
    ///
    /// When false, the last round to complete wins even if it was issued
    /// earlier than one that already landed.
    pub discard_stale_rounds: bool,

    /// Capacity of the session change-notification channel.
    pub event_buffer: usize,

    pub validator: ValidatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Command that reads a validation request on stdin and answers on stdout.
    pub command: Vec<String>,

    /// Wall-clock budget for one validator call, in seconds.
    pub timeout_secs: u64,

    /// Truncate validator stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "python".to_string(),
                "-m".to_string(),
                "argform_validate".to_string(),
            ],
            timeout_secs: 30,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl ValidatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            discard_stale_rounds: true,
            event_buffer: 64,
            validator: ValidatorConfig::default(),
        }
    }
}

impl FormConfig {
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer == 0 {
            return Err(anyhow!("event_buffer must be > 0"));
        }
        if self.validator.timeout_secs == 0 {
            return Err(anyhow!("validator.timeout_secs must be > 0"));
        }
        if self.validator.output_limit_bytes == 0 {
            return Err(anyhow!("validator.output_limit_bytes must be > 0"));
        }
        if self.validator.command.is_empty() || self.validator.command[0].trim().is_empty() {
            return Err(anyhow!("validator.command must be a non-empty array"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `FormConfig::default()`.
pub fn load_config(path: &Path) -> Result<FormConfig> {
    if !path.exists() {
        let cfg = FormConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: FormConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, FormConfig::default());
    }

    #[test]
    fn stale_round_policy_can_be_turned_off() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("argform.toml");
        fs::write(&path, "discard_stale_rounds = false\nevent_buffer = 8\n").expect("write");

        let cfg = load_config(&path).expect("load");
        assert!(!cfg.discard_stale_rounds);
        assert_eq!(cfg.event_buffer, 8);
        assert_eq!(cfg.validator, ValidatorConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("argform.toml");
        fs::write(&path, "[validator]\ncommand = [\"./check\"]\n").expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.validator.command, vec!["./check"]);
        assert_eq!(cfg.validator.timeout_secs, 30);
        assert!(cfg.discard_stale_rounds);
    }

    #[test]
    fn rejects_empty_command() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("argform.toml");
        fs::write(&path, "[validator]\ncommand = []\n").expect("write");

        let err = load_config(&path).expect_err("empty command");
        assert!(err.to_string().contains("validator.command"));
    }
}
