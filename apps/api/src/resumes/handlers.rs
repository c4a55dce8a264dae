use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, AppJson};
use crate::models::resume::{Collection, ResumeRecord};
use crate::resumes::repository::{ListSource, SaveRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveResumeRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub data: Value,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveResumeResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub data: Collection,
    pub source: ListSource,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Extracts `Authorization: Bearer <token>`, if present.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// POST /api/v1/resumes
///
/// Succeeds as soon as the local write lands; the remote push is detached.
pub async fn handle_save(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(request): AppJson<SaveResumeRequest>,
) -> Result<Json<SaveResumeResponse>, AppError> {
    let token = request.token.or_else(|| bearer_token(&headers));
    let outcome = state
        .repository
        .save(SaveRequest {
            id: request.id,
            title: request.title,
            data: request.data,
            token,
        })
        .await?;

    Ok(Json(SaveResumeResponse {
        success: true,
        id: outcome.id,
    }))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
) -> Json<ListResponse> {
    let token = query.token.or_else(|| bearer_token(&headers));
    let listing = state.repository.list(token.as_deref()).await;
    Json(ListResponse {
        success: true,
        data: listing.records,
        source: listing.source,
    })
}

/// POST /api/v1/resumes/rename
pub async fn handle_rename(
    State(state): State<AppState>,
    AppJson(request): AppJson<RenameRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.repository.rename(&request.id, &request.title).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/v1/resumes/:id
pub async fn handle_load(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResumeRecord>, AppError> {
    let record = state.repository.load_by_id(&id).await?;
    Ok(Json(record))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.repository.delete(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
