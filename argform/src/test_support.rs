//! Test-only helpers: spec builders and scripted validators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Notify, oneshot};

use crate::args_spec::{ArgSpec, ArgType, ArgsSpec};
use crate::core::types::{ArgValues, ValidationIssue};
use crate::io::validator::{ValidationRequest, Validator};

/// Module identifier used by [`spec_with`].
pub const TEST_MODULE: &str = "models.test";

/// Build a spec for [`TEST_MODULE`] with args in the given order.
pub fn spec_with(args: Vec<(&str, ArgSpec)>) -> ArgsSpec {
    ArgsSpec {
        model_name: "Test Model".to_string(),
        module: TEST_MODULE.to_string(),
        userguide: None,
        args: args
            .into_iter()
            .map(|(key, arg)| (key.to_string(), arg))
            .collect(),
    }
}

/// Free-text argument with default order.
pub fn text_arg() -> ArgSpec {
    ArgSpec::new(ArgType::FreestyleString)
}

/// Number argument with an explicit order.
pub fn ordered(order: f64) -> ArgSpec {
    ArgSpec {
        declared_order: Some(order),
        ..ArgSpec::new(ArgType::Number)
    }
}

/// Boolean argument gating `dependents`.
pub fn gating(dependents: &[&str]) -> ArgSpec {
    ArgSpec {
        ui_control: dependents.iter().map(|key| key.to_string()).collect(),
        ..ArgSpec::new(ArgType::Boolean)
    }
}

/// File argument that takes `ui_option` while hidden.
pub fn dependent(ui_option: &str) -> ArgSpec {
    ArgSpec {
        ui_option: Some(ui_option.to_string()),
        ..ArgSpec::new(ArgType::File)
    }
}

pub fn values(pairs: Vec<(&str, Value)>) -> ArgValues {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Scripted response: issues, or a transport error message.
pub type Scripted = std::result::Result<Vec<ValidationIssue>, String>;

/// Validator that replays queued responses and records requests.
///
/// Once the queue is drained every call reports no issues.
#[derive(Debug, Default)]
pub struct ScriptedValidator {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ValidationRequest>>,
}

impl ScriptedValidator {
    pub fn new(responses: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn always_valid() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn requests(&self) -> Vec<ValidationRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl Validator for ScriptedValidator {
    async fn validate(&self, request: &ValidationRequest) -> Result<Vec<ValidationIssue>> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let next = self.responses.lock().expect("responses lock").pop_front();
        match next {
            Some(Ok(issues)) => Ok(issues),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }
}

/// Validator whose calls stay pending until the test releases them.
#[derive(Debug, Default)]
pub struct HeldValidator {
    pending: Mutex<Vec<Option<oneshot::Sender<Scripted>>>>,
    called: Notify,
}

impl HeldValidator {
    /// Wait until at least `count` calls have arrived.
    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let notified = self.called.notified();
            if self.pending.lock().expect("pending lock").len() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Answer the `index`-th call (0-based, arrival order).
    pub fn release(&self, index: usize, response: Scripted) {
        let sender = self.pending.lock().expect("pending lock")[index]
            .take()
            .expect("call already released");
        let _ = sender.send(response);
    }
}

#[async_trait]
impl Validator for HeldValidator {
    async fn validate(&self, _request: &ValidationRequest) -> Result<Vec<ValidationIssue>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().expect("pending lock").push(Some(tx));
        self.called.notify_waiters();
        rx.await
            .map_err(|_| anyhow!("held call dropped"))?
            .map_err(|message| anyhow!(message))
    }
}
