//! Args state construction and flattening.

use serde_json::Value;

use crate::args_spec::ArgsSpec;
use crate::core::types::{ArgState, ArgValues, ArgsState, ValidationEntry, ValidationState};

/// Build fresh args and validation state for every managed key.
///
/// Values come from `initial`; keys missing there start absent. Fields are
/// marked touched only when `initial` is non-empty (a pre-filled session), so
/// a fresh form does not show invalid styling before any interaction.
pub fn initialize(spec: &ArgsSpec, initial: &ArgValues) -> (ArgsState, ValidationState) {
    let touched = !initial.is_empty();
    let mut args = ArgsState::new();
    let mut validation = ValidationState::new();

    for key in spec.managed_keys() {
        args.insert(
            key.to_string(),
            ArgState {
                value: initial.get(key).cloned(),
                touched,
                active_ui_option: None,
            },
        );
        validation.insert(key.to_string(), ValidationEntry::default());
    }

    (args, validation)
}

/// Strip form metadata, keeping only present values.
pub fn to_value_dict(args: &ArgsState) -> ArgValues {
    args.iter()
        .filter_map(|(key, state)| state.value.clone().map(|value| (key.clone(), value)))
        .collect()
}

/// Truthiness of a form value as the renderer's scripting layer sees it.
///
/// Absent, `null`, `false`, `0`, `NaN` and `""` are falsy. Arrays and
/// objects are truthy even when empty.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Overall flag: true iff every entry is definitely valid.
pub fn all_valid(validation: &ValidationState) -> bool {
    validation.values().all(ValidationEntry::is_valid)
}
