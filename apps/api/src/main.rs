mod config;
mod errors;
mod export;
mod models;
mod resumes;
mod routes;
mod state;
mod store;
mod sync;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::export::{CommandPdfRenderer, ExportPipeline, PdfRenderer, UnavailablePdfRenderer};
use crate::resumes::repository::ResumeRepository;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::FileStore;
use crate::sync::{RemoteSync, SyncClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparseable values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folio API v{}", env!("CARGO_PKG_VERSION"));

    // Local document store
    let store = Arc::new(FileStore::new(&config.store_path));
    info!("Local resume store at {}", store.path().display());

    // Remote sync (optional)
    let remote: Option<Arc<dyn RemoteSync>> = match &config.remote_api_url {
        Some(url) => {
            let client = SyncClient::new(url.clone(), config.sync_timeout)?;
            info!(
                "Remote sync enabled: {url} (timeout {:?})",
                config.sync_timeout
            );
            Some(Arc::new(client))
        }
        None => {
            warn!("REMOTE_API_URL not set; running local-only");
            None
        }
    };

    // PDF renderer (optional; exports degrade to HTML without one)
    let pdf: Arc<dyn PdfRenderer> = match config
        .pdf_renderer_cmd
        .as_deref()
        .and_then(CommandPdfRenderer::from_command_line)
    {
        Some(renderer) => {
            info!("PDF renderer: {}", renderer.program());
            Arc::new(renderer)
        }
        None => {
            warn!("PDF_RENDERER_CMD not set; PDF exports will fall back to HTML");
            Arc::new(UnavailablePdfRenderer)
        }
    };

    // Build app state
    let state = AppState {
        repository: Arc::new(ResumeRepository::new(store, remote)),
        exporter: Arc::new(ExportPipeline::new(pdf, config.pdf_render_timeout)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
