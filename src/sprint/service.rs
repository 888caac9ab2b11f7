//! # Document Service
//!
//! Composition root between the in-memory document model and the outside
//! world. It owns no state beyond its collaborators.
//!
//! ## Save
//!
//! ```text
//! note.body ──resolve──▶ resolved buffer ──encode──▶ markup ──put_note──▶ remote
//! ```
//!
//! A save is all or nothing: if any upload fails, encoding fails, or the
//! remote refuses the record, the caller gets the error and the `Note` is
//! exactly as it was. Only after the remote accepted the record does the note
//! take the resolved body and the new `updated_at`.
//!
//! ## Fetch
//!
//! Every fetched record is decoded on its own. A record whose markup cannot
//! be decoded still yields a note, with the configured fallback text as its
//! body, so one bad record never hides the rest. Such a note remembers the
//! decode error and `save` refuses it, so the stored markup is never
//! overwritten by the fallback text.
//!
//! ## Rewrite
//!
//! The generator sees plain text with every resolved image reduced to its
//! reference on a line of its own. Bodies with unresolved objects are
//! refused: there is nothing the generator could point back to.
//!
//! ## Testing Strategy
//!
//! Tests run against [`MemoryStore`](crate::store::memory::MemoryStore), which
//! plays both remote and uploader and can be told to fail.

use crate::attachments::{self, Uploader};
use crate::config::{SprintConfig, DEFAULT_FALLBACK_TEXT};
use crate::error::{MarkupError, Result, SprintError};
use crate::markup::{self, reference_placeholder, strip_code_fence};
use crate::model::{Note, NoteRecord};
use crate::richtext::{AttributeSet, AttributedBuffer};
use crate::store::{Generator, NoteRemote};
use chrono::Utc;
use std::sync::Arc;

/// Prompt used by [`DocumentService::rewrite`] when the caller has none.
pub const DEFAULT_REWRITE_PROMPT: &str =
    "Rephrase and write a comprehensive document that I can present in the meeting. \
     Preserve the images: each image URL appears on a line of its own and must be \
     kept as <img src=\"URL\">.";

pub struct DocumentService {
    remote: Arc<dyn NoteRemote>,
    uploader: Arc<dyn Uploader>,
    fallback_text: String,
}

impl DocumentService {
    pub fn new(remote: Arc<dyn NoteRemote>, uploader: Arc<dyn Uploader>) -> Self {
        Self {
            remote,
            uploader,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
        }
    }

    pub fn from_config(
        remote: Arc<dyn NoteRemote>,
        uploader: Arc<dyn Uploader>,
        config: &SprintConfig,
    ) -> Self {
        Self::new(remote, uploader).with_fallback_text(config.fallback_text.clone())
    }

    pub fn with_fallback_text(mut self, text: impl Into<String>) -> Self {
        self.fallback_text = text.into();
        self
    }

    /// Resolves attachments, encodes and persists `note`.
    ///
    /// A note fetched with the fallback body is refused with
    /// [`SprintError::Unreadable`] before anything is uploaded or written.
    pub async fn save(&self, note: &mut Note) -> Result<()> {
        if let Some(err) = note.decode_error() {
            return Err(SprintError::Unreadable {
                id: note.id(),
                source: err.clone(),
            });
        }
        if note.title.trim().is_empty() {
            return Err(SprintError::EmptyTitle);
        }

        let resolved = attachments::resolve(&note.body, Arc::clone(&self.uploader)).await?;
        let content = markup::encode(&resolved)?;

        let mut record = note.to_record(content);
        record.updated_at = Utc::now();
        self.remote.put_note(&record).await?;

        tracing::info!("saved note {}", record.id);
        note.body = resolved;
        note.updated_at = record.updated_at;
        Ok(())
    }

    /// Fetches and decodes every note, newest first.
    pub async fn fetch_all(&self) -> Result<Vec<Note>> {
        let records = self.remote.fetch_notes().await?;
        tracing::debug!("fetched {} notes", records.len());
        Ok(records.iter().map(|record| self.hydrate(record)).collect())
    }

    /// Decodes one stored record, substituting the fallback body when its
    /// markup is unreadable.
    pub fn hydrate(&self, record: &NoteRecord) -> Note {
        match markup::decode(&record.content) {
            Ok(body) => Note::hydrate(record, body),
            Err(err) => {
                tracing::warn!("note {} could not be decoded: {}", record.id, err);
                Note::unreadable(record, self.fallback_body(), err)
            }
        }
    }

    pub fn fallback_body(&self) -> AttributedBuffer {
        AttributedBuffer::from_text(&self.fallback_text, AttributeSet::plain())
    }

    /// Asks `generator` to rewrite `body` and decodes the answer. The result
    /// is a new buffer; nothing is persisted.
    ///
    /// `body` must be resolved: an inline object fails with
    /// [`MarkupError::UnresolvedObject`] before the generator is called.
    pub async fn rewrite(
        &self,
        generator: &dyn Generator,
        prompt: &str,
        body: &AttributedBuffer,
    ) -> Result<AttributedBuffer> {
        if let Some(&offset) = body.objects().keys().next() {
            return Err(MarkupError::UnresolvedObject { offset }.into());
        }
        let content = generator_input(body)?;
        let generated = generator.generate(prompt, &content).await?;
        Ok(markup::decode(strip_code_fence(&generated))?)
    }
}

/// Plain text of `body` with each image reference on its own line.
fn generator_input(body: &AttributedBuffer) -> Result<String> {
    let mut out = String::new();
    for run in body.runs() {
        let text = body.text_in(run.range.clone())?;
        let Some(reference) = &run.attributes.reference else {
            out.push_str(text);
            continue;
        };

        let placeholder = reference_placeholder(&reference.reference);
        let count = text.matches(placeholder.as_str()).count();
        if count == 0 || placeholder.len() * count != text.len() {
            // Edited placeholder text no longer stands for the image.
            out.push_str(text);
            continue;
        }
        for _ in 0..count {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&reference.reference);
            out.push('\n');
        }
    }
    Ok(out)
}
