//! Shared deterministic types for the engine core.
//!
//! These types define stable contracts between core components and the
//! renderer. They do not depend on external state or I/O.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mutable per-argument form state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgState {
    /// Current value; `None` when the field has never been given one.
    pub value: Option<Value>,
    /// Set once the user or an import has written this field.
    pub touched: bool,
    /// Display-mode override while a gating argument is unset.
    pub active_ui_option: Option<String>,
}

/// Validity of a single argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEntry {
    /// `None` until the first round that covers this key completes.
    pub valid: Option<bool>,
    pub validation_message: String,
}

impl ValidationEntry {
    pub fn valid() -> Self {
        Self {
            valid: Some(true),
            validation_message: String::new(),
        }
    }

    pub fn invalid(message: &str) -> Self {
        Self {
            valid: Some(false),
            validation_message: message.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid == Some(true)
    }
}

/// Argument key → form state, in spec order.
pub type ArgsState = IndexMap<String, ArgState>;

/// Argument key → validity, in spec order.
pub type ValidationState = IndexMap<String, ValidationEntry>;

/// Flattened key → value dictionary exchanged with the validator and exporters.
pub type ArgValues = IndexMap<String, Value>;

/// One validator finding: the keys a message applies to.
///
/// Serialized as the two-element array `[[keys...], "message"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue(pub Vec<String>, pub String);

impl ValidationIssue {
    pub fn new<I, S>(keys: I, message: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect(), message.to_string())
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn message(&self) -> &str {
        &self.1
    }
}

/// Which keys a validation round reports on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundScope {
    Full,
    LimitedTo(String),
}

impl RoundScope {
    pub fn from_limit(limit_to: Option<&str>) -> Self {
        match limit_to {
            Some(key) => RoundScope::LimitedTo(key.to_string()),
            None => RoundScope::Full,
        }
    }

    pub fn limit_to(&self) -> Option<&str> {
        match self {
            RoundScope::Full => None,
            RoundScope::LimitedTo(key) => Some(key),
        }
    }
}

/// Result of folding one validator response into the validation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Recomputed overall flag; `None` for scoped rounds.
    pub all_valid: Option<bool>,
    /// Keys marked invalid by this round, in validation-state order.
    pub invalid: Vec<String>,
    /// Keys named by the validator that this session does not manage.
    pub ignored: Vec<String>,
    /// A scoped round cleared the last invalid key; a full round must follow.
    pub needs_full_round: bool,
}
