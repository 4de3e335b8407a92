//! Visibility gating between arguments.
//!
//! Gating is one level deep: when `a` gates `b` and `b` gates `c`, changing
//! `a` never touches `c`.

use tracing::debug;

use crate::args_spec::ArgsSpec;
use crate::core::state::is_truthy;
use crate::core::types::ArgsState;

/// Apply `changed_key`'s `ui_control` to its dependents.
///
/// A falsy value sets each dependent's `active_ui_option` to that dependent's
/// own declared `ui_option` (or `None` if it declares none); a truthy value
/// clears it. Returns the dependent keys whose override actually changed.
pub fn apply_dependencies(
    spec: &ArgsSpec,
    args: &mut ArgsState,
    changed_key: &str,
) -> Vec<String> {
    let Some(gating) = spec.get(changed_key) else {
        return Vec::new();
    };
    if !gating.is_gating() {
        return Vec::new();
    }

    let enabled = is_truthy(args.get(changed_key).and_then(|state| state.value.as_ref()));
    let mut changed = Vec::new();

    for dependent in &gating.ui_control {
        let Some(state) = args.get_mut(dependent) else {
            debug!(gating = changed_key, %dependent, "dependent not in state, skipping");
            continue;
        };
        let next = if enabled {
            None
        } else {
            spec.get(dependent).and_then(|dep| dep.ui_option.clone())
        };
        if state.active_ui_option != next {
            state.active_ui_option = next;
            changed.push(dependent.clone());
        }
    }

    debug!(gating = changed_key, enabled, changed = changed.len(), "dependencies applied");
    changed
}

/// Apply every gating argument in spec order.
pub fn apply_all_dependencies(spec: &ArgsSpec, args: &mut ArgsState) -> Vec<String> {
    let gating: Vec<String> = spec.gating_keys().map(str::to_string).collect();
    let mut changed = Vec::new();
    for key in gating {
        for dependent in apply_dependencies(spec, args, &key) {
            if !changed.contains(&dependent) {
                changed.push(dependent);
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::initialize;
    use crate::core::types::ArgValues;
    use crate::test_support::{dependent, gating, spec_with, text_arg, values};
    use serde_json::json;

    #[test]
    fn falsy_gate_hides_dependents_and_truthy_clears() {
        let spec = spec_with(vec![("a", gating(&["b"])), ("b", dependent("hidden"))]);
        let (mut args, _) = initialize(&spec, &values(vec![("a", json!(""))]));

        let changed = apply_dependencies(&spec, &mut args, "a");
        assert_eq!(changed, vec!["b".to_string()]);
        assert_eq!(args["b"].active_ui_option.as_deref(), Some("hidden"));

        args["a"].value = Some(json!("x"));
        apply_dependencies(&spec, &mut args, "a");
        assert_eq!(args["b"].active_ui_option, None);
    }

    #[test]
    fn dependent_without_ui_option_gets_no_override() {
        let spec = spec_with(vec![("a", gating(&["b"])), ("b", text_arg())]);
        let (mut args, _) = initialize(&spec, &ArgValues::new());

        let changed = apply_dependencies(&spec, &mut args, "a");
        assert!(changed.is_empty());
        assert_eq!(args["b"].active_ui_option, None);
    }

    #[test]
    fn apply_is_idempotent() {
        let spec = spec_with(vec![
            ("a", gating(&["b", "c"])),
            ("b", dependent("disable")),
            ("c", dependent("hide")),
        ]);
        let (mut args, _) = initialize(&spec, &values(vec![("a", json!(false))]));

        apply_dependencies(&spec, &mut args, "a");
        let first = args.clone();
        let changed = apply_dependencies(&spec, &mut args, "a");
        assert_eq!(args, first);
        assert!(changed.is_empty());
    }

    #[test]
    fn gating_does_not_cascade() {
        let mut b = dependent("disable");
        b.ui_control = vec!["c".to_string()];
        let spec = spec_with(vec![("a", gating(&["b"])), ("b", b), ("c", dependent("hide"))]);
        let (mut args, _) = initialize(&spec, &ArgValues::new());
        args["b"].value = Some(json!("set"));

        apply_dependencies(&spec, &mut args, "a");
        assert_eq!(args["b"].active_ui_option.as_deref(), Some("disable"));
        assert_eq!(args["c"].active_ui_option, None);
    }

    #[test]
    fn unknown_dependent_is_skipped() {
        let spec = spec_with(vec![("a", gating(&["ghost", "b"])), ("b", dependent("hide"))]);
        let (mut args, _) = initialize(&spec, &ArgValues::new());

        let changed = apply_dependencies(&spec, &mut args, "a");
        assert_eq!(changed, vec!["b".to_string()]);
        assert!(!args.contains_key("ghost"));
    }

    #[test]
    fn non_gating_key_is_a_no_op() {
        let spec = spec_with(vec![("a", text_arg()), ("b", dependent("hide"))]);
        let (mut args, _) = initialize(&spec, &ArgValues::new());
        assert!(apply_dependencies(&spec, &mut args, "a").is_empty());
        assert!(apply_dependencies(&spec, &mut args, "missing").is_empty());
    }

    #[test]
    fn apply_all_resolves_every_gate() {
        let spec = spec_with(vec![
            ("a", gating(&["b"])),
            ("b", dependent("hide")),
            ("c", gating(&["d"])),
            ("d", dependent("disable")),
        ]);
        let (mut args, _) = initialize(&spec, &values(vec![("c", json!(true))]));

        let changed = apply_all_dependencies(&spec, &mut args);
        assert_eq!(changed, vec!["b".to_string()]);
        assert_eq!(args["b"].active_ui_option.as_deref(), Some("hide"));
        assert_eq!(args["d"].active_ui_option, None);
    }
}
