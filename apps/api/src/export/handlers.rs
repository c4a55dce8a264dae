//! Axum route handler for the Export API.

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{AppError, AppJson};
use crate::export::{prepare, ExportArtifact, ExportFormat, FALLBACK_NOTICE};
use crate::state::AppState;

pub const FALLBACK_HEADER: HeaderName = HeaderName::from_static("x-export-fallback");
pub const WARNING_HEADER: HeaderName = HeaderName::from_static("x-export-warning");
pub const REASON_HEADER: HeaderName = HeaderName::from_static("x-export-fallback-reason");

const MAX_REASON_LEN: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub resume: Value,
    pub format: String,
    pub styles: Option<Value>,
}

/// POST /api/v1/export
///
/// Returns the artifact body directly. A PDF request that had to fall back is
/// served as HTML with `X-Export-Fallback: html` and an operator warning.
pub async fn handle_export(
    State(state): State<AppState>,
    AppJson(request): AppJson<ExportRequest>,
) -> Result<Response, AppError> {
    let format: ExportFormat = request.format.parse()?;
    let resume = prepare(&request.resume, request.styles.as_ref())?;
    let artifact = state.exporter.export(&resume, format).await?;

    Ok(artifact_response(artifact))
}

/// Header values must be visible ASCII; renderer stderr is not guaranteed to be.
fn header_safe(reason: &str) -> HeaderValue {
    let cleaned: String = reason
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { ' ' })
        .take(MAX_REASON_LEN)
        .collect();
    HeaderValue::from_str(cleaned.trim()).unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

fn artifact_response(artifact: ExportArtifact) -> Response {
    let content_type = HeaderValue::from_static(artifact.content_type());
    let disposition = HeaderValue::from_static(match artifact.file_extension() {
        "pdf" => "attachment; filename=\"resume.pdf\"",
        "json" => "attachment; filename=\"resume.json\"",
        _ => "inline; filename=\"resume.html\"",
    });
    let headers = [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    match artifact {
        ExportArtifact::Pdf(bytes) => (headers, bytes).into_response(),
        ExportArtifact::Html(html) => (headers, html).into_response(),
        ExportArtifact::Json(bytes) => (headers, bytes).into_response(),
        ExportArtifact::HtmlFallback { html, reason } => (
            headers,
            [
                (FALLBACK_HEADER, HeaderValue::from_static("html")),
                (WARNING_HEADER, HeaderValue::from_static(FALLBACK_NOTICE)),
                (REASON_HEADER, header_safe(&reason)),
            ],
            html,
        )
            .into_response(),
    }
}
