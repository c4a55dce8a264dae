use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{DocumentStore, StoreError};
use crate::models::resume::Collection;

/// File-backed store holding the whole collection as one pretty-printed JSON array.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `content` and fsyncs it before returning.
async fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.sync_all().await
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn read(&self) -> Collection {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No collection at {}, starting empty", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read {}: {e}; treating as empty", self.path.display());
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Collection>(&bytes) {
            Ok(collection) => collection,
            Err(e) => {
                warn!(
                    "Corrupt collection at {}: {e}; treating as empty",
                    self.path.display()
                );
                Vec::new()
            }
        }
    }

    async fn write(&self, collection: &Collection) -> Result<(), StoreError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).await.map_err(io_error(dir))?;

        let content = serde_json::to_vec_pretty(collection)?;

        // Write-then-rename so readers never observe a half-written file.
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resumes.json");
        let tmp_path = dir.join(format!(".{file_name}-{}.tmp", Uuid::new_v4()));

        if let Err(e) = write_synced(&tmp_path, &content).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(io_error(&tmp_path)(e));
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(io_error(&self.path)(e));
        }

        debug!(
            "Wrote {} record(s) to {}",
            collection.len(),
            self.path.display()
        );
        Ok(())
    }
}
