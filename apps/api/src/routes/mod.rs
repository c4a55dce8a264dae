pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::export::handlers as export;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume API
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list).post(resumes::handle_save),
        )
        .route("/api/v1/resumes/rename", post(resumes::handle_rename))
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_load).delete(resumes::handle_delete),
        )
        // Export API
        .route("/api/v1/export", post(export::handle_export))
        .with_state(state)
}
