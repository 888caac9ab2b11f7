use super::{sort_newest_first, NoteRemote};
use crate::attachments::{Reference, Uploader};
use crate::error::RemoteError;
use crate::model::NoteRecord;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// In-memory note store and uploader for tests.
///
/// Uses `Mutex` rather than `RefCell` because uploads run on spawned tasks.
#[derive(Default)]
pub struct MemoryStore {
    notes: Mutex<HashMap<Uuid, NoteRecord>>,
    attachments: Mutex<HashMap<String, Bytes>>,
    rejected_payloads: Mutex<Vec<Bytes>>,
    simulate_write_error: AtomicBool,
    uploads: AtomicUsize,
    writes: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Makes every upload of exactly `payload` fail.
    pub fn reject_payload(&self, payload: impl Into<Bytes>) {
        lock(&self.rejected_payloads).push(payload.into());
    }

    /// Seeds a record directly, bypassing `put_note`.
    pub fn insert_record(&self, record: NoteRecord) {
        lock(&self.notes).insert(record.id, record);
    }

    pub fn record(&self, id: &Uuid) -> Option<NoteRecord> {
        lock(&self.notes).get(id).cloned()
    }

    pub fn attachment(&self, reference: &str) -> Option<Bytes> {
        lock(&self.attachments).get(reference).cloned()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NoteRemote for MemoryStore {
    async fn put_note(&self, record: &NoteRecord) -> Result<(), RemoteError> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected("Simulated write error".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        lock(&self.notes).insert(record.id, record.clone());
        Ok(())
    }

    async fn fetch_notes(&self) -> Result<Vec<NoteRecord>, RemoteError> {
        let mut records: Vec<NoteRecord> = lock(&self.notes).values().cloned().collect();
        sort_newest_first(&mut records);
        Ok(records)
    }
}

#[async_trait]
impl Uploader for MemoryStore {
    async fn upload(&self, payload: Bytes) -> Result<Reference, RemoteError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if lock(&self.rejected_payloads).contains(&payload) {
            return Err(RemoteError::Rejected("Simulated upload error".to_string()));
        }
        let reference = format!("mem/{}", Uuid::new_v4());
        lock(&self.attachments).insert(reference.clone(), payload);
        Ok(Reference::new(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(title: &str, age_minutes: i64) -> NoteRecord {
        let at = Utc::now() - Duration::minutes(age_minutes);
        NoteRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: String::new(),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn put_then_fetch_newest_first() {
        let store = MemoryStore::new();
        store.put_note(&record("old", 10)).await.unwrap();
        store.put_note(&record("new", 1)).await.unwrap();

        let titles: Vec<_> = store
            .fetch_notes()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn put_replaces_existing_record() {
        let store = MemoryStore::new();
        let mut rec = record("first", 0);
        store.put_note(&rec).await.unwrap();
        rec.title = "second".to_string();
        store.put_note(&rec).await.unwrap();

        assert_eq!(store.fetch_notes().await.unwrap().len(), 1);
        assert_eq!(store.record(&rec.id).unwrap().title, "second");
    }

    #[tokio::test]
    async fn simulated_write_error_persists_nothing() {
        let store = MemoryStore::new();
        store.set_simulate_write_error(true);
        assert!(store.put_note(&record("x", 0)).await.is_err());
        assert!(store.fetch_notes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn uploads_are_retrievable_and_rejections_apply() {
        let store = MemoryStore::new();
        let reference = store.upload(Bytes::from_static(b"png")).await.unwrap();
        assert_eq!(
            store.attachment(reference.as_str()),
            Some(Bytes::from_static(b"png"))
        );

        store.reject_payload(Bytes::from_static(b"bad"));
        assert!(store.upload(Bytes::from_static(b"bad")).await.is_err());
        assert_eq!(store.upload_count(), 2);
    }
}
