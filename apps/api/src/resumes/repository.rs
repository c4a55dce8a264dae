//! Résumé repository: the only writer of the local collection.
//!
//! Every mutation is a read-modify-write over the entire collection with no
//! lock. Two overlapping writers race and the later write wins; this store
//! models a single-operator cache.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::resume::{derive_title, Collection, ResumeRecord};
use crate::resumes::validation::{validate, ValidationError};
use crate::store::{DocumentStore, StoreError};
use crate::sync::{spawn_push, PushPayload, RemoteSync};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Resume not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub data: Value,
    pub token: Option<String>,
}

/// Result of a save. `sync` is the detached remote push, if one was started;
/// callers are free to drop it.
#[derive(Debug)]
pub struct SaveOutcome {
    pub id: String,
    pub sync: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSource {
    Remote,
    Local,
}

/// Either the full remote view or the full local view. Never a union of both.
#[derive(Debug, Clone)]
pub struct Listing {
    pub records: Collection,
    pub source: ListSource,
}

pub struct ResumeRepository {
    store: Arc<dyn DocumentStore>,
    remote: Option<Arc<dyn RemoteSync>>,
}

impl ResumeRepository {
    pub fn new(store: Arc<dyn DocumentStore>, remote: Option<Arc<dyn RemoteSync>>) -> Self {
        Self { store, remote }
    }

    /// Validates, upserts by id, persists locally, then detaches a remote push.
    pub async fn save(&self, request: SaveRequest) -> Result<SaveOutcome, RepositoryError> {
        let data = validate(&request.data)?;
        let mut collection = self.store.read().await;
        let now = Utc::now();

        let id = non_blank(request.id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| generate_id(&collection, now));
        let title = non_blank(request.title.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| derive_title(&data));

        let (record, newly_created) = match collection.iter().position(|r| r.id == id) {
            Some(idx) => {
                let existing = &mut collection[idx];
                existing.title = title;
                existing.data = data;
                existing.updated_at = now;
                (existing.clone(), false)
            }
            None => {
                let record = ResumeRecord {
                    id: id.clone(),
                    title,
                    created_at: now,
                    updated_at: now,
                    data,
                };
                collection.insert(0, record.clone());
                (record, true)
            }
        };

        self.store.write(&collection).await?;
        info!(
            "Saved resume {id} ({})",
            if newly_created { "created" } else { "updated" }
        );

        let sync = self.detach_push(&record, newly_created, request.token.as_deref());
        Ok(SaveOutcome { id, sync })
    }

    pub async fn rename(&self, id: &str, title: &str) -> Result<(), RepositoryError> {
        let title = non_blank(Some(title))
            .ok_or_else(|| ValidationError::single("title", "must not be empty"))?;

        let mut collection = self.store.read().await;
        let record = collection
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        record.title = title.to_string();
        record.updated_at = Utc::now();

        self.store.write(&collection).await?;
        info!("Renamed resume {id}");
        Ok(())
    }

    /// Remote-first when a token and a remote are available, otherwise local.
    pub async fn list(&self, token: Option<&str>) -> Listing {
        if let (Some(remote), Some(token)) = (&self.remote, non_blank(token)) {
            match remote.fetch_list(token).await {
                Ok(records) => {
                    return Listing {
                        records,
                        source: ListSource::Remote,
                    }
                }
                Err(e) => warn!("Remote list failed, falling back to local store: {e}"),
            }
        }

        Listing {
            records: self.store.read().await,
            source: ListSource::Local,
        }
    }

    pub async fn load_by_id(&self, id: &str) -> Result<ResumeRecord, RepositoryError> {
        self.store
            .read()
            .await
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    pub async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut collection = self.store.read().await;
        let idx = collection
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        collection.remove(idx);
        self.store.write(&collection).await?;
        info!("Deleted resume {id}");
        Ok(())
    }

    fn detach_push(
        &self,
        record: &ResumeRecord,
        newly_created: bool,
        token: Option<&str>,
    ) -> Option<JoinHandle<()>> {
        let token = non_blank(token)?;
        let Some(remote) = &self.remote else {
            debug!("No remote configured, skipping sync for {}", record.id);
            return None;
        };
        let payload = PushPayload::from_record(record, newly_created, token);
        Some(spawn_push(Arc::clone(remote), payload))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `resume_<unix millis>`, bumped forward until it is unused in `collection`.
fn generate_id(collection: &Collection, now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = format!("resume_{millis}");
        if !collection.iter().any(|r| r.id == candidate) {
            return candidate;
        }
        millis += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{StructuredResume, DEFAULT_TITLE};
    use crate::store::MemoryStore;
    use crate::sync::SyncError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRemote {
        pushes: Mutex<Vec<PushPayload>>,
        list_calls: AtomicUsize,
        remote_records: Option<Collection>,
        fail_push: bool,
    }

    #[async_trait]
    impl RemoteSync for FakeRemote {
        async fn push(&self, payload: &PushPayload) -> Result<(), SyncError> {
            self.pushes.lock().unwrap().push(payload.clone());
            if self.fail_push {
                Err(SyncError::Unsuccessful("remote down".to_string()))
            } else {
                Ok(())
            }
        }

        async fn fetch_list(&self, _token: &str) -> Result<Collection, SyncError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.remote_records
                .clone()
                .ok_or_else(|| SyncError::Malformed("no data".to_string()))
        }
    }

    fn ada() -> Value {
        json!({
            "personal_data": { "firstName": "Ada", "lastName": "Lovelace" },
            "skills": [{ "category": "Math", "skill_name": "Calculus" }]
        })
    }

    fn full_resume() -> Value {
        json!({
            "personal_data": {
                "firstName": "Grace",
                "lastName": "Hopper",
                "email": "grace@navy.mil",
                "summary": "Compiler pioneer"
            },
            "work_experience": [
                { "title": "Rear Admiral", "company": "US Navy", "highlights": ["COBOL", "A-0"] },
                { "title": "Research Fellow", "company": "Harvard" }
            ],
            "education": [{ "institution": "Yale", "degree": "PhD", "field_of_study": "Mathematics" }],
            "projects": [{ "name": "FLOW-MATIC", "technologies": ["UNIVAC"] }],
            "skills": [{ "category": "Languages", "skill_name": "COBOL" }],
            "document_settings": { "font_size": 11 }
        })
    }

    fn seeded(id: &str, created_at: DateTime<Utc>) -> ResumeRecord {
        ResumeRecord {
            id: id.to_string(),
            title: "V1".to_string(),
            created_at,
            updated_at: created_at,
            data: StructuredResume::default(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn local_repo(store: Arc<MemoryStore>) -> ResumeRepository {
        ResumeRepository::new(store, None)
    }

    fn synced_repo(store: Arc<MemoryStore>, remote: Arc<FakeRemote>) -> ResumeRepository {
        ResumeRepository::new(store, Some(remote))
    }

    fn save_data(data: Value) -> SaveRequest {
        SaveRequest {
            data,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_generates_id_and_derives_title() {
        let repo = local_repo(Arc::new(MemoryStore::new()));

        let outcome = repo.save(save_data(ada())).await.unwrap();

        let millis = outcome.id.strip_prefix("resume_").unwrap();
        assert!(millis.parse::<i64>().is_ok());
        let listing = repo.list(None).await;
        assert_eq!(listing.source, ListSource::Local);
        assert!(listing
            .records
            .iter()
            .any(|r| r.id == outcome.id && r.title == "Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let repo = local_repo(Arc::new(MemoryStore::new()));
        let expected = validate(&full_resume()).unwrap();

        let outcome = repo
            .save(SaveRequest {
                title: Some("Navy CV".to_string()),
                data: full_resume(),
                ..Default::default()
            })
            .await
            .unwrap();

        let loaded = repo.load_by_id(&outcome.id).await.unwrap();
        assert_eq!(loaded.id, outcome.id);
        assert_eq!(loaded.title, "Navy CV");
        assert_eq!(loaded.data, expected);
        assert_eq!(loaded.created_at, loaded.updated_at);
    }

    #[tokio::test]
    async fn test_save_existing_id_preserves_created_at() {
        let store = Arc::new(MemoryStore::with_records(vec![seeded("resume_1", t0())]));
        let repo = local_repo(store);

        repo.save(SaveRequest {
            id: Some("resume_1".to_string()),
            title: Some("V2".to_string()),
            data: ada(),
            token: None,
        })
        .await
        .unwrap();

        let listing = repo.list(None).await;
        assert_eq!(listing.records.len(), 1);
        let record = &listing.records[0];
        assert_eq!(record.created_at, t0());
        assert_eq!(record.title, "V2");
        assert!(record.updated_at > t0());
        assert_eq!(record.data.personal_data.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_new_records_are_prepended() {
        let store = Arc::new(MemoryStore::with_records(vec![seeded("resume_1", t0())]));
        let repo = local_repo(store);

        let outcome = repo.save(save_data(ada())).await.unwrap();

        let ids: Vec<_> = repo.list(None).await.records.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![outcome.id, "resume_1".to_string()]);
    }

    #[tokio::test]
    async fn test_rapid_saves_get_distinct_ids() {
        let repo = local_repo(Arc::new(MemoryStore::new()));

        let first = repo.save(save_data(ada())).await.unwrap();
        let second = repo.save(save_data(ada())).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(repo.list(None).await.records.len(), 2);
    }

    #[tokio::test]
    async fn test_save_with_unknown_id_creates_record() {
        let repo = local_repo(Arc::new(MemoryStore::new()));

        let outcome = repo
            .save(SaveRequest {
                id: Some("imported_42".to_string()),
                data: ada(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(outcome.id, "imported_42");
        assert!(repo.load_by_id("imported_42").await.is_ok());
    }

    #[tokio::test]
    async fn test_title_falls_back_to_default() {
        let repo = local_repo(Arc::new(MemoryStore::new()));

        let outcome = repo
            .save(SaveRequest {
                title: Some("   ".to_string()),
                data: json!({ "personal_data": {} }),
                ..Default::default()
            })
            .await
            .unwrap();

        let record = repo.load_by_id(&outcome.id).await.unwrap();
        assert_eq!(record.title, DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_invalid_data_is_rejected_before_writing() {
        let store = Arc::new(MemoryStore::new());
        let repo = local_repo(store.clone());

        let err = repo
            .save(save_data(json!({ "work_experience": [null] })))
            .await
            .unwrap_err();

        match err {
            RepositoryError::Validation(v) => assert_eq!(v.fields.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_fails_save() {
        let store = Arc::new(MemoryStore::new());
        store.set_simulate_write_error(true);
        let repo = local_repo(store);

        let err = repo.save(save_data(ada())).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Store(_)));
    }

    #[tokio::test]
    async fn test_rename_unknown_id_is_not_found() {
        let repo = local_repo(Arc::new(MemoryStore::new()));
        let err = repo.rename("resume_404", "New").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_leaves_data_and_created_at() {
        let store = Arc::new(MemoryStore::with_records(vec![seeded("resume_1", t0())]));
        let repo = local_repo(store);

        repo.rename("resume_1", "  Renamed ").await.unwrap();

        let record = repo.load_by_id("resume_1").await.unwrap();
        assert_eq!(record.title, "Renamed");
        assert_eq!(record.created_at, t0());
        assert!(record.updated_at > t0());
        assert_eq!(record.data, StructuredResume::default());
    }

    #[tokio::test]
    async fn test_rename_rejects_blank_title() {
        let store = Arc::new(MemoryStore::with_records(vec![seeded("resume_1", t0())]));
        let repo = local_repo(store);

        let err = repo.rename("resume_1", " ").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
        assert_eq!(repo.load_by_id("resume_1").await.unwrap().title, "V1");
    }

    #[tokio::test]
    async fn test_delete_twice_second_is_not_found() {
        let store = Arc::new(MemoryStore::with_records(vec![
            seeded("resume_2", t0()),
            seeded("resume_1", t0()),
        ]));
        let repo = local_repo(store);

        repo.delete("resume_1").await.unwrap();
        let err = repo.delete("resume_1").await.unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound(_)));
        let ids: Vec<_> = repo.list(None).await.records.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["resume_2".to_string()]);
    }

    #[tokio::test]
    async fn test_load_unknown_is_not_found() {
        let repo = local_repo(Arc::new(MemoryStore::new()));
        assert!(matches!(
            repo.load_by_id("nope").await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_prefers_remote_without_merging() {
        let store = Arc::new(MemoryStore::with_records(vec![seeded("local_1", t0())]));
        let remote = Arc::new(FakeRemote {
            remote_records: Some(vec![seeded("remote_1", t0()), seeded("remote_2", t0())]),
            ..Default::default()
        });
        let repo = synced_repo(store, remote);

        let listing = repo.list(Some("tok")).await;

        assert_eq!(listing.source, ListSource::Remote);
        let ids: Vec<_> = listing.records.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["remote_1".to_string(), "remote_2".to_string()]);
    }

    #[tokio::test]
    async fn test_list_falls_back_to_local_on_remote_failure() {
        let store = Arc::new(MemoryStore::with_records(vec![seeded("local_1", t0())]));
        let remote = Arc::new(FakeRemote::default());
        let repo = synced_repo(store, remote.clone());

        let listing = repo.list(Some("tok")).await;

        assert_eq!(remote.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(listing.source, ListSource::Local);
        assert_eq!(listing.records.len(), 1);
        assert_eq!(listing.records[0].id, "local_1");
    }

    #[tokio::test]
    async fn test_list_without_token_skips_remote() {
        let remote = Arc::new(FakeRemote {
            remote_records: Some(vec![]),
            ..Default::default()
        });
        let repo = synced_repo(Arc::new(MemoryStore::new()), remote.clone());

        let listing = repo.list(None).await;
        let blank = repo.list(Some("  ")).await;

        assert_eq!(listing.source, ListSource::Local);
        assert_eq!(blank.source, ListSource::Local);
        assert_eq!(remote.list_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_save_pushes_with_token() {
        let remote = Arc::new(FakeRemote::default());
        let repo = synced_repo(Arc::new(MemoryStore::new()), remote.clone());

        let created = repo
            .save(SaveRequest {
                data: ada(),
                token: Some("tok".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        created.sync.unwrap().await.unwrap();

        let updated = repo
            .save(SaveRequest {
                id: Some(created.id.clone()),
                data: ada(),
                token: Some("tok".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        updated.sync.unwrap().await.unwrap();

        let pushes = remote.pushes.lock().unwrap();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes[0].id, None);
        assert_eq!(pushes[0].title, "Ada Lovelace");
        assert_eq!(pushes[0].token, "tok");
        assert_eq!(pushes[1].id.as_deref(), Some(created.id.as_str()));
    }

    #[tokio::test]
    async fn test_save_without_token_does_not_push() {
        let remote = Arc::new(FakeRemote::default());
        let repo = synced_repo(Arc::new(MemoryStore::new()), remote.clone());

        let outcome = repo.save(save_data(ada())).await.unwrap();

        assert!(outcome.sync.is_none());
        assert!(remote.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_without_remote_ignores_token() {
        let repo = local_repo(Arc::new(MemoryStore::new()));
        let outcome = repo
            .save(SaveRequest {
                data: ada(),
                token: Some("tok".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(outcome.sync.is_none());
    }

    #[tokio::test]
    async fn test_push_failure_keeps_local_write() {
        let remote = Arc::new(FakeRemote {
            fail_push: true,
            ..Default::default()
        });
        let repo = synced_repo(Arc::new(MemoryStore::new()), remote.clone());

        let outcome = repo
            .save(SaveRequest {
                data: ada(),
                token: Some("tok".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        outcome.sync.unwrap().await.unwrap();

        assert_eq!(remote.pushes.lock().unwrap().len(), 1);
        assert!(repo.load_by_id(&outcome.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let store = Arc::new(MemoryStore::with_records(vec![seeded("resume_1", t0())]));
        let repo = local_repo(store.clone());

        // A slower writer read the collection before our save landed...
        let stale = store.read().await;
        let outcome = repo.save(save_data(ada())).await.unwrap();
        assert!(repo.load_by_id(&outcome.id).await.is_ok());

        // ...and its full rewrite silently discards the newer record.
        store.write(&stale).await.unwrap();

        assert!(matches!(
            repo.load_by_id(&outcome.id).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert_eq!(repo.list(None).await.records.len(), 1);
    }

    #[test]
    fn test_generate_id_skips_taken_values() {
        let now = t0();
        let taken = format!("resume_{}", now.timestamp_millis());
        let collection = vec![seeded(&taken, now)];
        assert_eq!(
            generate_id(&collection, now),
            format!("resume_{}", now.timestamp_millis() + 1)
        );
    }
}
