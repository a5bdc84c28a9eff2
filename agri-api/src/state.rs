//! Application state for the API server

use std::sync::Arc;

use agri_db::TelemetryRepository;
use agri_ingest::IngestService;

use crate::broadcast::EventBroadcaster;

/// API server state
///
/// `repository` is the read-only handle used by the query endpoints; all
/// writes go through the ingest service.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub repository: Arc<dyn TelemetryRepository>,
    pub broadcaster: EventBroadcaster,
}

impl AppState {
    pub fn new(ingest: Arc<IngestService>, repository: Arc<dyn TelemetryRepository>) -> Self {
        Self {
            ingest,
            repository,
            broadcaster: EventBroadcaster::new(),
        }
    }
}
