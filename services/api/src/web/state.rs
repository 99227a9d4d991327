//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;
use tutor_core::{ports::AuthSessionStore, TutorPipeline};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Nothing in here is mutated per request; all durable state lives behind the ports.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthSessionStore>,
    pub pipeline: Arc<TutorPipeline>,
}
