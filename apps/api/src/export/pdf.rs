//! PDF renderers.
//!
//! `CommandPdfRenderer` shells out to an HTML→PDF converter (for example
//! `wkhtmltopdf --quiet`). The printable HTML is written into a scratch
//! directory, the converter is invoked as `<cmd> <args..> <input.html> <output.pdf>`,
//! and the output must carry the `%PDF` magic to count as a success.
//!
//! The child process is spawned with `kill_on_drop`, so the pipeline deadline
//! also terminates a hung converter.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::export::html::render_html;
use crate::models::resume::StructuredResume;

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No PDF renderer is configured")]
    Unavailable,

    #[error("PDF renderer could not be started: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("PDF renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("PDF renderer produced no valid PDF output")]
    InvalidOutput,

    #[error("PDF rendering timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error during PDF rendering: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, resume: &StructuredResume) -> Result<Bytes, RenderError>;
}

/// Used when no converter is configured; every PDF request degrades to HTML.
pub struct UnavailablePdfRenderer;

#[async_trait]
impl PdfRenderer for UnavailablePdfRenderer {
    async fn render(&self, _resume: &StructuredResume) -> Result<Bytes, RenderError> {
        Err(RenderError::Unavailable)
    }
}

#[derive(Debug, Clone)]
pub struct CommandPdfRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandPdfRenderer {
    /// Parses a whitespace-separated command line. Returns `None` for a blank one.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl PdfRenderer for CommandPdfRenderer {
    async fn render(&self, resume: &StructuredResume) -> Result<Bytes, RenderError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("resume.html");
        let output = workdir.path().join("resume.pdf");

        tokio::fs::write(&input, render_html(resume)).await?;

        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(&input)
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(RenderError::Spawn)?;

        if !result.status.success() {
            return Err(RenderError::Failed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|_| RenderError::InvalidOutput)?;
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(RenderError::InvalidOutput);
        }

        debug!("{} produced {} PDF bytes", self.program, bytes.len());
        Ok(Bytes::from(bytes))
    }
}
