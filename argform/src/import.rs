//! Batch import: replace a session's whole argument set at once.

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::error::SessionError;
use crate::io::batch::{BatchPayload, load_batch};
use crate::session::{ArgsSession, SessionEvent, SessionState};
use crate::validation::ValidationReport;

impl ArgsSession {
    /// Replace every value with `payload.args`, then run a full round.
    ///
    /// A payload for another module is rejected before anything changes.
    /// Keys missing from the payload become absent; nothing is merged with
    /// prior values. Dependencies are re-resolved and the arg tree rebuilt.
    pub async fn batch_update(
        &self,
        payload: BatchPayload,
    ) -> Result<ValidationReport, SessionError> {
        if payload.module != self.spec.module {
            warn!(expected = %self.spec.module, found = %payload.module, "batch rejected");
            return Err(SessionError::ModuleMismatch {
                expected: self.spec.module.clone(),
                found: payload.module,
            });
        }

        let hidden = {
            let mut state = self.lock();
            let (fresh, hidden) = SessionState::build(&self.spec, &payload.args);
            let latest_round = state.latest_round;
            *state = SessionState {
                latest_round,
                ..fresh
            };
            hidden
        };

        info!(module = %payload.module, args = payload.args.len(), "batch imported");
        self.notify(SessionEvent::Imported {
            module: payload.module,
        });
        if !hidden.is_empty() {
            self.notify(SessionEvent::UiOptionsChanged { keys: hidden });
        }

        self.validate(None).await
    }

    /// Load a batch file and import it.
    pub async fn import_file(&self, path: &Path) -> Result<ValidationReport> {
        let payload = load_batch(path)?;
        Ok(self.batch_update(payload).await?)
    }
}
