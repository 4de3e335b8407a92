//! Folding validator responses into per-argument validity.

use tracing::warn;

use crate::core::state::all_valid;
use crate::core::types::{
    ReconcileSummary, RoundScope, ValidationEntry, ValidationIssue, ValidationState,
};

/// Apply one validator response to `validation`.
///
/// Every managed key named by an issue becomes invalid with that issue's
/// message; a key named twice keeps the last message. A full round marks all
/// other keys valid and recomputes the overall flag. A scoped round with no
/// issues marks only its key valid and asks for a full round once every key
/// is valid, because scoped rounds never set the overall flag.
pub fn reconcile(
    validation: &mut ValidationState,
    issues: &[ValidationIssue],
    scope: &RoundScope,
) -> ReconcileSummary {
    let mut named: Vec<&str> = Vec::new();
    let mut ignored: Vec<String> = Vec::new();

    for issue in issues {
        for key in issue.keys() {
            match validation.get_mut(key) {
                Some(entry) => {
                    *entry = ValidationEntry::invalid(issue.message());
                    if !named.contains(&key.as_str()) {
                        named.push(key);
                    }
                }
                None => {
                    if !ignored.contains(key) {
                        ignored.push(key.clone());
                    }
                }
            }
        }
    }

    if !ignored.is_empty() {
        warn!(keys = ?ignored, "validator named unknown keys, ignoring");
    }

    let mut needs_full_round = false;
    let summary_all_valid = match scope {
        RoundScope::Full => {
            for (key, entry) in validation.iter_mut() {
                if !named.contains(&key.as_str()) {
                    *entry = ValidationEntry::valid();
                }
            }
            Some(all_valid(validation))
        }
        RoundScope::LimitedTo(key) => {
            if issues.is_empty() {
                if let Some(entry) = validation.get_mut(key) {
                    *entry = ValidationEntry::valid();
                }
                needs_full_round = all_valid(validation);
            }
            None
        }
    };

    let invalid = validation
        .iter()
        .filter(|(key, _)| named.contains(&key.as_str()))
        .map(|(key, _)| key.clone())
        .collect();

    ReconcileSummary {
        all_valid: summary_all_valid,
        invalid,
        ignored,
        needs_full_round,
    }
}
