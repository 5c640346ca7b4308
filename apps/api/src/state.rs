use std::sync::Arc;

use crate::export::archive::ExportArchive;
use crate::gateway::ResumeGateway;
use crate::store::VersionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Version store, already wrapped in the retry policy.
    pub store: Arc<dyn VersionStore>,
    /// Pluggable generation backend. Default: `LlmGateway`.
    pub gateway: Arc<dyn ResumeGateway>,
    /// Set only when export archiving is configured.
    pub archive: Option<ExportArchive>,
}
