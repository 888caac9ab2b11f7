//! # Storage Layer
//!
//! Notes live behind a remote service in production; this module defines the
//! capabilities the rest of the crate needs from it, so the document pipeline
//! never depends on a particular transport.
//!
//! - [`NoteRemote`]: create-or-update a note, fetch every note.
//! - [`Uploader`](crate::attachments::Uploader): store an attachment payload.
//! - [`Generator`]: produce rewritten markup for a note.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: local directory storage used by the CLI.
//!   - Metadata in `data.json`, keyed by note id
//!   - Bodies as markup in `note-{uuid}.html`
//!   - Attachments as `attachments/att-{uuid}.bin`
//!
//! - [`memory::MemoryStore`]: in-memory storage for tests, with hooks to
//!   simulate write and upload failures.
//!
//! ```text
//! <data dir>/
//! ├── config.json
//! ├── data.json
//! ├── note-{uuid}.html
//! └── attachments/
//!     └── att-{uuid}.bin
//! ```

use crate::error::RemoteError;
use crate::model::NoteRecord;
use async_trait::async_trait;

pub mod fs;
pub mod memory;

/// Persistence and fetch collaborator for notes.
#[async_trait]
pub trait NoteRemote: Send + Sync {
    /// Creates the note if its id is unknown, replaces it otherwise.
    async fn put_note(&self, record: &NoteRecord) -> Result<(), RemoteError>;

    /// Every stored note, newest first.
    async fn fetch_notes(&self) -> Result<Vec<NoteRecord>, RemoteError>;
}

/// Text generation collaborator: rewrites note content according to a prompt
/// and answers with markup.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, content: &str) -> Result<String, RemoteError>;
}

/// Orders records the way every store returns them: `updated_at` descending,
/// ties broken by id.
pub(crate) fn sort_newest_first(records: &mut [NoteRecord]) {
    records.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
