use std::sync::Arc;

use crate::matching::orchestrator::CourseMatchOrchestrator;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Record store behind a trait so tests can run against an in-memory
    /// implementation.
    pub store: Arc<dyn RecordStore>,
    pub orchestrator: Arc<CourseMatchOrchestrator>,
}
