use crate::error::MarkupError;
use crate::richtext::AttributedBuffer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note as the editor sees it: title plus rich-text body.
///
/// `id` and `created_at` are fixed at creation and only readable afterwards.
/// A note whose stored markup could not be decoded carries the decode error
/// and a stand-in body; it can be shown but never saved.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    id: Uuid,
    created_at: DateTime<Utc>,
    decode_error: Option<MarkupError>,
    pub title: String,
    pub body: AttributedBuffer,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_body(title, AttributedBuffer::new())
    }

    pub fn with_body(title: impl Into<String>, body: AttributedBuffer) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            decode_error: None,
            title: title.into(),
            body,
            updated_at: now,
        }
    }

    /// Rebuilds a note fetched from storage around an already-decoded body.
    pub fn hydrate(record: &NoteRecord, body: AttributedBuffer) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            decode_error: None,
            title: record.title.clone(),
            body,
            updated_at: record.updated_at,
        }
    }

    /// Rebuilds a note whose stored markup failed to decode, showing
    /// `fallback` in place of its body.
    pub fn unreadable(record: &NoteRecord, fallback: AttributedBuffer, error: MarkupError) -> Self {
        Self {
            decode_error: Some(error),
            ..Self::hydrate(record, fallback)
        }
    }

    /// Why the stored body could not be decoded, if it couldn't.
    pub fn decode_error(&self) -> Option<&MarkupError> {
        self.decode_error.as_ref()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Wire form of this note with an already-encoded body.
    pub fn to_record(&self, content: String) -> NoteRecord {
        NoteRecord {
            id: self.id,
            title: self.title.clone(),
            content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A note as it travels to and from storage: the body is markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
