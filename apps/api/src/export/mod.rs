// Export pipeline: one validated résumé in, one artifact out.
// JSON and HTML cannot fail for validated input. PDF degrades to HTML on any
// renderer failure and says so in the artifact tag; it is never silently dropped.

pub mod handlers;
pub mod html;
pub mod pdf;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::resume::StructuredResume;
use crate::resumes::validation::{validate, validate_styles, ValidationError};

pub use html::render_html;
pub use pdf::{CommandPdfRenderer, PdfRenderer, RenderError, UnavailablePdfRenderer};

/// Shown to the operator whenever a printable HTML view stands in for a PDF.
pub const FALLBACK_NOTICE: &str =
    "PDF rendering is unavailable; a printable HTML document was returned instead. Use your browser's Print to PDF to save it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Html,
    Json,
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "html" => Ok(ExportFormat::Html),
            "json" => Ok(ExportFormat::Json),
            other => Err(ValidationError::single(
                "format",
                format!("unsupported export format '{other}' (expected pdf, html or json)"),
            )),
        }
    }
}

/// The outcome of an export. `HtmlFallback` is deliberately distinct from `Pdf`
/// so a substituted HTML view can never be mistaken for a real PDF.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportArtifact {
    Pdf(Bytes),
    Html(String),
    Json(Vec<u8>),
    HtmlFallback { html: String, reason: String },
}

impl ExportArtifact {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportArtifact::Pdf(_) => "application/pdf",
            ExportArtifact::Html(_) | ExportArtifact::HtmlFallback { .. } => {
                "text/html; charset=utf-8"
            }
            ExportArtifact::Json(_) => "application/json",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportArtifact::Pdf(_) => "pdf",
            ExportArtifact::Html(_) | ExportArtifact::HtmlFallback { .. } => "html",
            ExportArtifact::Json(_) => "json",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ExportArtifact::HtmlFallback { .. })
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validates an export request body, applying optional `styles` overrides on top
/// of the résumé's own document settings.
pub fn prepare(resume: &Value, styles: Option<&Value>) -> Result<StructuredResume, ValidationError> {
    let mut resume = validate(resume)?;
    if let Some(styles) = styles {
        let overrides = validate_styles(styles)?;
        resume.document_settings = resume.document_settings.merged_with(&overrides);
    }
    Ok(resume)
}

pub struct ExportPipeline {
    pdf: Arc<dyn PdfRenderer>,
    pdf_timeout: Duration,
}

impl ExportPipeline {
    pub fn new(pdf: Arc<dyn PdfRenderer>, pdf_timeout: Duration) -> Self {
        Self { pdf, pdf_timeout }
    }

    pub async fn export(
        &self,
        resume: &StructuredResume,
        format: ExportFormat,
    ) -> Result<ExportArtifact, ExportError> {
        match format {
            ExportFormat::Json => Ok(ExportArtifact::Json(export_json(resume)?)),
            ExportFormat::Html => Ok(ExportArtifact::Html(render_html(resume))),
            ExportFormat::Pdf => Ok(self.export_pdf(resume).await),
        }
    }

    async fn export_pdf(&self, resume: &StructuredResume) -> ExportArtifact {
        let outcome = match tokio::time::timeout(self.pdf_timeout, self.pdf.render(resume)).await
        {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout(self.pdf_timeout)),
        };

        match outcome {
            Ok(bytes) => {
                info!("Rendered PDF export ({} bytes)", bytes.len());
                ExportArtifact::Pdf(bytes)
            }
            Err(e) => {
                warn!("PDF rendering failed, falling back to HTML: {e}");
                ExportArtifact::HtmlFallback {
                    html: render_html(resume),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Pretty JSON in struct field order; byte-identical for equal input.
pub fn export_json(resume: &StructuredResume) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(resume)?)
}
