//! Batch argument files: saved parameter sets and run logs.
//!
//! A parameter set is a JSON object `{"model_name": ..., "args": {...}}`. A
//! run log carries the same information as text: a header line naming the
//! emitting module, an `Arguments:` line, then one `key  value` line per
//! argument up to the next blank line.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::types::ArgValues;

/// A complete argument set destined for one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPayload {
    /// Target module; saved parameter sets call this `model_name`.
    #[serde(alias = "model_name")]
    pub module: String,
    #[serde(default)]
    pub args: ArgValues,
}

/// Load a batch payload from a parameter set or run log file.
pub fn load_batch(path: &Path) -> Result<BatchPayload> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read batch {}", path.display()))?;
    let payload =
        parse_batch(&contents).with_context(|| format!("parse batch {}", path.display()))?;
    debug!(
        path = %path.display(),
        module = %payload.module,
        args = payload.args.len(),
        "batch loaded"
    );
    Ok(payload)
}

/// Parse batch contents, picking the format from the first non-blank byte.
pub fn parse_batch(contents: &str) -> Result<BatchPayload> {
    if contents.trim_start().starts_with('{') {
        serde_json::from_str(contents).context("parse parameter set json")
    } else {
        parse_run_log(contents)
    }
}

/// Parse the `Arguments:` block of a run log.
///
/// The module is the logger name on the closest non-blank line above the
/// block (`<date> <time> <logger> <level>`). Values are kept as strings.
pub fn parse_run_log(contents: &str) -> Result<BatchPayload> {
    let lines: Vec<&str> = contents.lines().collect();
    let marker = lines
        .iter()
        .position(|line| line.trim() == "Arguments:")
        .ok_or_else(|| anyhow!("run log has no Arguments: block"))?;
    let header = lines[..marker]
        .iter()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| anyhow!("run log has no header before Arguments:"))?;
    let module = header
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| anyhow!("run log header has no logger name: '{}'", header.trim()))?;

    let mut args = ArgValues::new();
    for line in lines[marker + 1..]
        .iter()
        .map(|line| line.trim())
        .take_while(|line| !line.is_empty())
    {
        let (key, value) = match line.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (line, ""),
        };
        args.insert(key.to_string(), Value::String(value.to_string()));
    }

    Ok(BatchPayload {
        module: module.to_string(),
        args,
    })
}

/// True for files a drop directory should pick up.
pub fn is_batch_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("json" | "log")
    )
        && !path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'))
}
