//! One form session: args state store, validation state, and notifications.
//!
//! A session is built once per args spec load and shared by handle
//! (`Arc<ArgsSession>`). Mutable state lives behind a mutex that is only held
//! for short synchronous sections, never across a validator call, so edits
//! are recorded while a validation round is in flight.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::args_spec::{ArgsSpec, is_managed};
use crate::core::arg_tree::{ArgGroup, build_arg_tree};
use crate::core::dependencies::{apply_all_dependencies, apply_dependencies};
use crate::core::state::{initialize, to_value_dict};
use crate::core::types::{ArgState, ArgValues, ArgsState, ValidationEntry, ValidationState};
use crate::error::SessionError;
use crate::io::config::FormConfig;
use crate::io::validator::Validator;
use crate::validation::ValidationReport;

/// Session tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// See [`FormConfig::discard_stale_rounds`].
    pub discard_stale_rounds: bool,
    pub event_buffer: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&FormConfig::default())
    }
}

impl From<&FormConfig> for SessionOptions {
    fn from(config: &FormConfig) -> Self {
        Self {
            discard_stale_rounds: config.discard_stale_rounds,
            event_buffer: config.event_buffer,
        }
    }
}

/// Change notifications for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    ValueChanged { key: String },
    UiOptionsChanged { keys: Vec<String> },
    ValidationUpdated { round: u64, invalid: Vec<String> },
    OverallValidityChanged { all_valid: bool },
    Imported { module: String },
}

/// Point-in-time copy of everything a renderer reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub module: String,
    pub model_name: String,
    pub args: ArgsState,
    pub validation: ValidationState,
    pub all_valid: Option<bool>,
}

#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) args: ArgsState,
    pub(crate) validation: ValidationState,
    pub(crate) all_valid: Option<bool>,
    pub(crate) tree: Vec<ArgGroup>,
    /// Identifier of the most recently issued validation round.
    pub(crate) latest_round: u64,
}

impl SessionState {
    pub(crate) fn build(spec: &ArgsSpec, initial: &ArgValues) -> (Self, Vec<String>) {
        let (mut args, validation) = initialize(spec, initial);
        let hidden = apply_all_dependencies(spec, &mut args);
        let state = Self {
            args,
            validation,
            all_valid: None,
            tree: build_arg_tree(spec),
            latest_round: 0,
        };
        (state, hidden)
    }
}

pub struct ArgsSession {
    pub(crate) spec: ArgsSpec,
    pub(crate) validator: Arc<dyn Validator>,
    pub(crate) discard_stale_rounds: bool,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl ArgsSession {
    /// Initialize state for `spec`, pre-filled from `initial`, and resolve
    /// every gating argument. No validation round runs until asked.
    pub fn new(
        spec: ArgsSpec,
        initial: ArgValues,
        validator: Arc<dyn Validator>,
        options: SessionOptions,
    ) -> Self {
        let (state, hidden) = SessionState::build(&spec, &initial);
        let (events, _) = broadcast::channel(options.event_buffer.max(1));
        info!(
            module = %spec.module,
            args = state.args.len(),
            prefilled = !initial.is_empty(),
            hidden = hidden.len(),
            "session initialized"
        );
        Self {
            spec,
            validator,
            discard_stale_rounds: options.discard_stale_rounds,
            state: Mutex::new(state),
            events,
        }
    }

    pub fn spec(&self) -> &ArgsSpec {
        &self.spec
    }

    pub fn module(&self) -> &str {
        &self.spec.module
    }

    pub fn arg_tree(&self) -> Vec<ArgGroup> {
        self.lock().tree.clone()
    }

    pub fn arg_state(&self, key: &str) -> Option<ArgState> {
        self.lock().args.get(key).cloned()
    }

    pub fn validation_entry(&self, key: &str) -> Option<ValidationEntry> {
        self.lock().validation.get(key).cloned()
    }

    /// Overall flag; `None` until the first full round completes.
    pub fn all_valid(&self) -> Option<bool> {
        self.lock().all_valid
    }

    /// Current values with form metadata stripped.
    pub fn values(&self) -> ArgValues {
        to_value_dict(&self.lock().args)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            module: self.spec.module.clone(),
            model_name: self.spec.model_name.clone(),
            args: state.args.clone(),
            validation: state.validation.clone(),
            all_valid: state.all_valid,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Record an edit and resolve the edited key's dependents.
    ///
    /// Returns the dependents whose display override changed. Does not
    /// validate; see [`ArgsSession::update`].
    pub fn set_value(&self, key: &str, value: Value) -> Result<Vec<String>, SessionError> {
        if !is_managed(key) {
            return Err(SessionError::UnknownArg(key.to_string()));
        }
        let changed = {
            let mut state = self.lock();
            let Some(arg) = state.args.get_mut(key) else {
                return Err(SessionError::UnknownArg(key.to_string()));
            };
            arg.value = Some(value);
            arg.touched = true;
            apply_dependencies(&self.spec, &mut state.args, key)
        };

        debug!(key, ui_changed = changed.len(), "value recorded");
        self.notify(SessionEvent::ValueChanged {
            key: key.to_string(),
        });
        if !changed.is_empty() {
            self.notify(SessionEvent::UiOptionsChanged {
                keys: changed.clone(),
            });
        }
        Ok(changed)
    }

    /// Record an edit, then revalidate the whole argument set.
    pub async fn update(&self, key: &str, value: Value) -> Result<ValidationReport, SessionError> {
        self.set_value(key, value)?;
        self.validate(None).await
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn notify(&self, event: SessionEvent) {
        // No subscribers is fine; renderers re-read on connect.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedValidator, dependent, gating, spec_with, text_arg, values};
    use serde_json::json;

    fn session(spec: ArgsSpec, initial: ArgValues) -> ArgsSession {
        ArgsSession::new(
            spec,
            initial,
            ScriptedValidator::always_valid(),
            SessionOptions::default(),
        )
    }

    #[test]
    fn new_session_resolves_dependencies() {
        let spec = spec_with(vec![("a", gating(&["b"])), ("b", dependent("hidden"))]);
        let session = session(spec, values(vec![("a", json!(""))]));

        let b = session.arg_state("b").expect("b");
        assert_eq!(b.active_ui_option.as_deref(), Some("hidden"));
        assert!(b.touched);
        assert_eq!(session.all_valid(), None);
    }

    #[test]
    fn set_value_marks_touched_and_toggles_dependents() {
        let spec = spec_with(vec![("a", gating(&["b"])), ("b", dependent("hidden"))]);
        let session = session(spec, ArgValues::new());
        let mut rx = session.subscribe();

        let changed = session.set_value("a", json!("x")).expect("set");
        assert!(changed.is_empty());
        assert!(session.arg_state("a").expect("a").touched);

        let changed = session.set_value("a", json!("")).expect("set");
        assert_eq!(changed, vec!["b".to_string()]);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                SessionEvent::ValueChanged { key: "a".to_string() },
                SessionEvent::ValueChanged { key: "a".to_string() },
                SessionEvent::UiOptionsChanged {
                    keys: vec!["b".to_string()]
                },
            ]
        );
    }

    #[test]
    fn set_value_rejects_unknown_and_reserved_keys() {
        let spec = spec_with(vec![("a", text_arg()), ("n_workers", text_arg())]);
        let session = session(spec, ArgValues::new());

        assert!(matches!(
            session.set_value("missing", json!(1)),
            Err(SessionError::UnknownArg(key)) if key == "missing"
        ));
        assert!(matches!(
            session.set_value("n_workers", json!(4)),
            Err(SessionError::UnknownArg(_))
        ));
        assert_eq!(session.values(), ArgValues::new());
    }

    #[test]
    fn snapshot_and_values_reflect_edits() {
        let spec = spec_with(vec![("a", text_arg()), ("b", text_arg())]);
        let session = session(spec, ArgValues::new());
        session.set_value("b", json!(5)).expect("set");

        assert_eq!(session.values(), values(vec![("b", json!(5))]));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.module, "models.test");
        assert!(!snapshot.args["a"].touched);
        assert!(snapshot.args["b"].touched);
    }
}
