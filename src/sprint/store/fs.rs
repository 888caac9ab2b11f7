use super::{sort_newest_first, NoteRemote};
use crate::attachments::{Reference, Uploader};
use crate::error::RemoteError;
use crate::model::NoteRecord;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const INDEX_FILENAME: &str = "data.json";
const ATTACHMENTS_DIR: &str = "attachments";

/// What `data.json` keeps per note, so listing never reads bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NoteMeta {
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// File-backed note store and uploader.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob behind a reference returned by [`Uploader::upload`].
    pub fn attachment_path(&self, reference: &Reference) -> PathBuf {
        self.root.join(reference.as_str())
    }

    fn note_path(&self, id: &Uuid) -> PathBuf {
        self.root.join(format!("note-{}.html", id))
    }

    fn ensure_dir(&self, path: &Path) -> Result<(), RemoteError> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    fn load_index(&self) -> Result<HashMap<Uuid, NoteMeta>, RemoteError> {
        let index_file = self.root.join(INDEX_FILENAME);
        if !index_file.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(index_file)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_index(&self, index: &HashMap<Uuid, NoteMeta>) -> Result<(), RemoteError> {
        let content = serde_json::to_string_pretty(index)?;
        write_atomic(&self.root.join(INDEX_FILENAME), content.as_bytes())
    }
}

/// Writes through a sibling temp file and renames it into place.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), RemoteError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl NoteRemote for FileStore {
    async fn put_note(&self, record: &NoteRecord) -> Result<(), RemoteError> {
        self.ensure_dir(&self.root)?;

        // Body first: an index entry must never point at a missing body.
        write_atomic(&self.note_path(&record.id), record.content.as_bytes())?;

        let mut index = self.load_index()?;
        index.insert(
            record.id,
            NoteMeta {
                title: record.title.clone(),
                created_at: record.created_at,
                updated_at: record.updated_at,
            },
        );
        self.save_index(&index)?;

        tracing::debug!("stored note {} in {}", record.id, self.root.display());
        Ok(())
    }

    async fn fetch_notes(&self) -> Result<Vec<NoteRecord>, RemoteError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for (id, meta) in self.load_index()? {
            let path = self.note_path(&id);
            let content = if path.exists() {
                fs::read_to_string(path)?
            } else {
                tracing::warn!("note {} has no body file", id);
                String::new()
            };
            records.push(NoteRecord {
                id,
                title: meta.title,
                content,
                created_at: meta.created_at,
                updated_at: meta.updated_at,
            });
        }

        sort_newest_first(&mut records);
        Ok(records)
    }
}

#[async_trait]
impl Uploader for FileStore {
    async fn upload(&self, payload: Bytes) -> Result<Reference, RemoteError> {
        let dir = self.root.join(ATTACHMENTS_DIR);
        self.ensure_dir(&dir)?;

        let name = format!("att-{}.bin", Uuid::new_v4());
        write_atomic(&dir.join(&name), &payload)?;
        Ok(Reference::new(format!("{ATTACHMENTS_DIR}/{name}")))
    }
}
