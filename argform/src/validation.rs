//! Validation orchestration: rounds against the external validator.
//!
//! Each round gets a monotonically increasing id. When stale-round discarding
//! is on, a response whose id is no longer the latest issued is dropped
//! without touching state, so results can't land out of order relative to
//! the edits that triggered them.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::core::reconcile::reconcile;
use crate::core::state::to_value_dict;
use crate::core::types::{ArgValues, RoundScope, ValidationIssue};
use crate::error::SessionError;
use crate::io::validator::ValidationRequest;
use crate::session::{ArgsSession, SessionEvent};

/// What happened to one round's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundOutcome {
    Applied {
        /// Overall flag after the round; `None` for scoped rounds.
        all_valid: Option<bool>,
        invalid: Vec<String>,
    },
    /// A newer round was issued before this one answered.
    Discarded { latest: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub round: u64,
    pub scope: RoundScope,
    pub outcome: RoundOutcome,
}

impl RoundReport {
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, RoundOutcome::Applied { .. })
    }
}

/// Rounds run by one `validate` call, in order.
///
/// Holds two rounds when a scoped round cleared the last invalid key and a
/// full round followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub rounds: Vec<RoundReport>,
}

impl ValidationReport {
    /// Overall flag from the last applied full round, if any.
    pub fn all_valid(&self) -> Option<bool> {
        self.rounds.iter().rev().find_map(|round| match round.outcome {
            RoundOutcome::Applied { all_valid, .. } => all_valid,
            RoundOutcome::Discarded { .. } => None,
        })
    }

    pub fn ran_follow_up(&self) -> bool {
        self.rounds.len() > 1
    }
}

impl ArgsSession {
    /// Run a validation round, scoped to `limit_to` when given.
    ///
    /// A scoped round that clears the last invalid key is followed at once by
    /// a full round over the same values, since only full rounds set the
    /// overall flag. Validator failures propagate and leave state untouched.
    #[instrument(skip(self), fields(module = %self.spec.module))]
    pub async fn validate(&self, limit_to: Option<&str>) -> Result<ValidationReport, SessionError> {
        if let Some(key) = limit_to
            && !self.lock().args.contains_key(key)
        {
            return Err(SessionError::UnknownArg(key.to_string()));
        }

        let (mut round, values) = self.begin_round();
        let mut scope = RoundScope::from_limit(limit_to);
        let mut rounds = Vec::new();

        loop {
            let request = ValidationRequest {
                model_id: self.spec.module.clone(),
                args: values.clone(),
                limit_to: scope.limit_to().map(str::to_string),
            };
            debug!(round, scope = ?scope, "validation round issued");
            let issues = self
                .validator
                .validate(&request)
                .await
                .map_err(SessionError::Validator)?;

            let (report, needs_full_round) = self.finish_round(round, scope, &issues);
            rounds.push(report);
            if !needs_full_round {
                break;
            }
            info!(round, "scoped round cleared last invalid key, running full round");
            scope = RoundScope::Full;
            round = self.next_round_id();
        }

        Ok(ValidationReport { rounds })
    }

    fn begin_round(&self) -> (u64, ArgValues) {
        let mut state = self.lock();
        state.latest_round += 1;
        (state.latest_round, to_value_dict(&state.args))
    }

    fn next_round_id(&self) -> u64 {
        let mut state = self.lock();
        state.latest_round += 1;
        state.latest_round
    }

    fn finish_round(
        &self,
        round: u64,
        scope: RoundScope,
        issues: &[ValidationIssue],
    ) -> (RoundReport, bool) {
        let (summary, previous) = {
            let mut state = self.lock();
            if self.discard_stale_rounds && round != state.latest_round {
                let latest = state.latest_round;
                debug!(round, latest, "discarding stale validation round");
                let report = RoundReport {
                    round,
                    scope,
                    outcome: RoundOutcome::Discarded { latest },
                };
                return (report, false);
            }

            let previous = state.all_valid;
            let summary = reconcile(&mut state.validation, issues, &scope);
            if summary.all_valid.is_some() {
                state.all_valid = summary.all_valid;
            }
            (summary, previous)
        };

        debug!(
            round,
            invalid = summary.invalid.len(),
            all_valid = ?summary.all_valid,
            "validation round applied"
        );
        self.notify(SessionEvent::ValidationUpdated {
            round,
            invalid: summary.invalid.clone(),
        });
        if let Some(all_valid) = summary.all_valid
            && previous != Some(all_valid)
        {
            self.notify(SessionEvent::OverallValidityChanged { all_valid });
        }

        let report = RoundReport {
            round,
            scope,
            outcome: RoundOutcome::Applied {
                all_valid: summary.all_valid,
                invalid: summary.invalid,
            },
        };
        (report, summary.needs_full_round)
    }
}
