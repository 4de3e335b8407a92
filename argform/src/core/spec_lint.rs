//! Semantic checks on an args spec not expressible via JSON Schema.
//!
//! Findings are warnings: a spec provider that breaks these rules still loads,
//! and the engine degrades as documented (unknown dependents are skipped).

use std::collections::HashSet;

use crate::args_spec::{ArgType, ArgsSpec, WORKERS_KEY, is_managed};

/// Check semantic rules:
/// - `ui_control` names only keys present in the spec
/// - no argument gates itself or the worker-count key
/// - no duplicate entries inside one `ui_control`
/// - `option_string` arguments list their options
pub fn lint_spec(spec: &ArgsSpec) -> Vec<String> {
    let mut warnings = Vec::new();

    for (key, arg) in &spec.args {
        let mut seen = HashSet::new();
        for dependent in &arg.ui_control {
            if !seen.insert(dependent.as_str()) {
                warnings.push(format!("{key}: ui_control lists '{dependent}' more than once"));
            }
            if dependent == key {
                warnings.push(format!("{key}: ui_control gates itself"));
            } else if dependent == WORKERS_KEY {
                warnings.push(format!("{key}: ui_control gates reserved key '{WORKERS_KEY}'"));
            } else if !spec.args.contains_key(dependent) {
                warnings.push(format!("{key}: ui_control references unknown key '{dependent}'"));
            }
        }

        if is_managed(key) && arg.arg_type == ArgType::OptionString && arg.options.is_empty() {
            warnings.push(format!("{key}: option_string without options"));
        }
    }

    warnings
}
