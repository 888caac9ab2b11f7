use thiserror::Error;
use uuid::Uuid;

/// Misuse of the [`AttributedBuffer`](crate::richtext::AttributedBuffer) API.
///
/// These are programmer errors: the buffer never clamps or truncates a bad
/// range, it refuses the whole operation and leaves itself untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("offset {offset} is out of bounds for buffer of length {len}")]
    OutOfBounds { offset: usize, len: usize },

    #[error("invalid range {start}..{end}")]
    InvalidRange { start: usize, end: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    /// Encoding was attempted before every inline object was resolved.
    #[error("inline object at offset {offset} has not been resolved")]
    UnresolvedObject { offset: usize },

    #[error("malformed markup at byte {position}: {reason}")]
    MalformedMarkup { position: usize, reason: String },
}

impl MarkupError {
    pub(crate) fn malformed(position: usize, reason: impl Into<String>) -> Self {
        MarkupError::MalformedMarkup {
            position,
            reason: reason.into(),
        }
    }
}

/// Failure reported by an external collaborator (uploader, note store, generator).
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Note not found: {0}")]
    NotFound(Uuid),
}

/// A single attachment that could not be uploaded.
#[derive(Error, Debug)]
#[error("upload for object at offset {offset} failed: {source}")]
pub struct ObjectUploadFailure {
    /// Offset of the object in the buffer that was handed to the resolver.
    pub offset: usize,
    #[source]
    pub source: RemoteError,
}

/// Aggregate failure of an attachment resolution pass.
#[derive(Error, Debug)]
#[error("{} of {attempted} attachment uploads failed", .failures.len())]
pub struct UploadError {
    pub attempted: usize,
    pub failures: Vec<ObjectUploadFailure>,
}

impl UploadError {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn failed_offsets(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.offset).collect()
    }
}

#[derive(Error, Debug)]
pub enum SprintError {
    #[error("Note not found: {0}")]
    NoteNotFound(Uuid),

    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Note {id} could not be decoded and cannot be saved: {source}")]
    Unreadable {
        id: Uuid,
        #[source]
        source: MarkupError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Selection(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, SprintError>;
