//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the shared session
//! store and the live agent every websocket connection talks to.

use crate::config::Config;
use ego_core::{live::LiveAgent, session::SessionService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionService>,
    pub agent: Arc<dyn LiveAgent>,
}

impl AppState {
    pub fn new(
        config: Config,
        sessions: Arc<dyn SessionService>,
        agent: Arc<dyn LiveAgent>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            agent,
        }
    }
}
