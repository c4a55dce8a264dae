//! Sync client: best-effort replication of local résumé writes to the remote store.
//!
//! RULE: local durability is unconditional, remote durability is advisory.
//! Nothing in this module may fail a request. Push runs as a detached task whose
//! result is only logged; list failures make the caller fall back to the local store.
//!
//! Every remote call is bounded by the client-level timeout so a slow remote
//! cannot stall the local fallback path.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::resume::{Collection, ResumeRecord, StructuredResume};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed remote response: {0}")]
    Malformed(String),

    #[error("Remote reported failure: {0}")]
    Unsuccessful(String),
}

/// Body sent to the remote on push. `id` is omitted for records created locally
/// by this write so the remote assigns its own identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub data: StructuredResume,
    pub token: String,
}

impl PushPayload {
    pub fn from_record(record: &ResumeRecord, newly_created: bool, token: &str) -> Self {
        Self {
            id: (!newly_created).then(|| record.id.clone()),
            title: record.title.clone(),
            data: record.data.clone(),
            token: token.to_string(),
        }
    }
}

/// Port for the remote authoritative store.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn push(&self, payload: &PushPayload) -> Result<(), SyncError>;

    async fn fetch_list(&self, token: &str) -> Result<Collection, SyncError>;
}

/// Spawns a detached push. The handle is never awaited by request handlers;
/// the outcome is only logged.
pub fn spawn_push(remote: Arc<dyn RemoteSync>, payload: PushPayload) -> JoinHandle<()> {
    tokio::spawn(async move {
        let label = payload.id.clone().unwrap_or_else(|| "<new>".to_string());
        match remote.push(&payload).await {
            Ok(()) => info!("Synced resume {label} to remote"),
            Err(e) => warn!("Remote sync of resume {label} failed: {e}"),
        }
    })
}

/// Envelope shared by every remote response: `{success, data?, error?}`.
#[derive(Debug, Deserialize)]
struct RemoteEnvelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

/// reqwest-backed [`RemoteSync`] talking to `{base_url}/resumes`.
#[derive(Clone)]
pub struct SyncClient {
    client: Client,
    base_url: String,
}

impl SyncClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
        })
    }

    fn resumes_url(&self) -> String {
        format!("{}/resumes", self.base_url.trim_end_matches('/'))
    }

    /// Checks status and decodes the envelope, turning every deviation into a `SyncError`.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<RemoteEnvelope<T>, SyncError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SyncError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: RemoteEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| SyncError::Malformed(e.to_string()))?;

        if !envelope.success {
            return Err(SyncError::Unsuccessful(
                envelope
                    .error
                    .clone()
                    .unwrap_or_else(|| "no error message".to_string()),
            ));
        }

        Ok(envelope)
    }
}

#[async_trait]
impl RemoteSync for SyncClient {
    async fn push(&self, payload: &PushPayload) -> Result<(), SyncError> {
        let response = self
            .client
            .post(self.resumes_url())
            .bearer_auth(&payload.token)
            .json(payload)
            .send()
            .await?;

        let _: RemoteEnvelope<serde_json::Value> = Self::decode(response).await?;
        Ok(())
    }

    async fn fetch_list(&self, token: &str) -> Result<Collection, SyncError> {
        let response = self
            .client
            .get(self.resumes_url())
            .bearer_auth(token)
            .send()
            .await?;

        let envelope: RemoteEnvelope<Collection> = Self::decode(response).await?;
        let records = envelope
            .data
            .ok_or_else(|| SyncError::Malformed("missing data".to_string()))?;

        debug!("Fetched {} record(s) from remote", records.len());
        Ok(records)
    }
}
