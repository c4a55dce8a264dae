use std::sync::Arc;

use crate::export::ExportPipeline;
use crate::resumes::repository::ResumeRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Local-first résumé persistence with best-effort remote sync.
    pub repository: Arc<ResumeRepository>,
    /// Format conversion. Never touches the repository.
    pub exporter: Arc<ExportPipeline>,
}
