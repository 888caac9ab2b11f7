use crate::error::{Result, SprintError};
use crate::model::Note;
use crate::service::DocumentService;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Local copy of the notes known to the remote.
///
/// Nothing refreshes it behind the caller's back: it holds whatever the last
/// [`refresh`](Self::refresh) fetched plus the notes saved through it since.
#[derive(Debug, Default)]
pub struct NoteRepository {
    notes: Vec<Note>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl NoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached notes with a fresh fetch. On error the cache keeps
    /// its previous contents.
    pub async fn refresh(&mut self, service: &DocumentService) -> Result<usize> {
        let notes = service.fetch_all().await?;
        self.notes = notes;
        self.sort();
        self.refreshed_at = Some(Utc::now());
        Ok(self.notes.len())
    }

    /// Saves `note` through `service` and caches the saved version.
    pub async fn save(&mut self, service: &DocumentService, mut note: Note) -> Result<&Note> {
        service.save(&mut note).await?;
        let id = note.id();
        self.upsert(note);
        self.get(id).ok_or(SprintError::NoteNotFound(id))
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn get(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|note| note.id() == id)
    }

    /// Finds the single note whose id starts with `prefix` (case-insensitive).
    pub fn find(&self, prefix: &str) -> Result<&Note> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return Err(SprintError::Selection("Note id cannot be empty".to_string()));
        }

        let mut matches = self
            .notes
            .iter()
            .filter(|note| note.id().to_string().starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(note), None) => Ok(note),
            (None, _) => Err(SprintError::Selection(format!(
                "No note matches id '{prefix}'"
            ))),
            (Some(_), Some(_)) => Err(SprintError::Selection(format!(
                "Id '{prefix}' matches more than one note"
            ))),
        }
    }

    fn upsert(&mut self, note: Note) {
        match self.notes.iter_mut().find(|existing| existing.id() == note.id()) {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
        self.sort();
    }

    fn sort(&mut self) {
        self.notes.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id().cmp(&b.id()))
        });
    }
}
