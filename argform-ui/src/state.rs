//! Shared application state for the UI server.

use std::sync::Arc;

use argform::ArgsSession;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The single form session this server hosts.
    pub session: Arc<ArgsSession>,
}

impl AppState {
    pub fn new(session: ArgsSession) -> Self {
        Self {
            session: Arc::new(session),
        }
    }
}
