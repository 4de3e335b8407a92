//! Args spec loading with schema validation and lint.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;
use tracing::{debug, warn};

use crate::args_spec::ArgsSpec;
use crate::core::spec_lint::lint_spec;

/// Bundled JSON Schema for args spec documents.
pub const ARGS_SPEC_SCHEMA: &str = include_str!("../../../schemas/args_spec/v1.schema.json");

/// Load an args spec from disk (schema check + lint warnings).
pub fn load_args_spec(path: &Path) -> Result<ArgsSpec> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read args spec {}", path.display()))?;
    parse_args_spec(&contents).with_context(|| format!("load args spec {}", path.display()))
}

/// Parse an args spec document from a JSON string.
///
/// Lint findings are logged, not returned as errors.
pub fn parse_args_spec(contents: &str) -> Result<ArgsSpec> {
    let value: Value = serde_json::from_str(contents).context("parse args spec json")?;
    validate_schema(&value)?;
    let spec: ArgsSpec = serde_json::from_value(value).context("deserialize args spec")?;

    for warning in lint_spec(&spec) {
        warn!(module = %spec.module, "{warning}");
    }
    debug!(module = %spec.module, args = spec.args.len(), "args spec loaded");
    Ok(spec)
}

fn validate_schema(spec: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(ARGS_SPEC_SCHEMA).context("parse bundled args spec schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(spec) {
        let messages = compiled
            .iter_errors(spec)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "args spec schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}
