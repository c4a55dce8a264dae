use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; startup fails only on values that do not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// JSON file holding the local résumé collection.
    pub store_path: PathBuf,
    /// Base URL of the remote résumé store. Local-only when unset.
    pub remote_api_url: Option<String>,
    pub sync_timeout: Duration,
    /// HTML→PDF command line, e.g. `wkhtmltopdf --quiet`. PDF exports fall back to HTML when unset.
    pub pdf_renderer_cmd: Option<String>,
    pub pdf_render_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            port: optional("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            store_path: optional("STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/resumes.json")),
            remote_api_url: optional("REMOTE_API_URL"),
            sync_timeout: seconds(optional("SYNC_TIMEOUT_SECS"), 10, "SYNC_TIMEOUT_SECS")?,
            pdf_renderer_cmd: optional("PDF_RENDERER_CMD"),
            pdf_render_timeout: seconds(
                optional("PDF_RENDER_TIMEOUT_SECS"),
                30,
                "PDF_RENDER_TIMEOUT_SECS",
            )?,
        })
    }
}

fn seconds(value: Option<String>, default: u64, key: &str) -> Result<Duration> {
    let secs = match value {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}
