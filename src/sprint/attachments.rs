//! # Attachment Resolution
//!
//! Before a note can be persisted, every inline object in its body has to be
//! uploaded and swapped for a durable reference. [`resolve`] does that:
//!
//! 1. Snapshot the objects in ascending offset order. This order is fixed
//!    before any upload starts, so the output never depends on which upload
//!    finishes first.
//! 2. Spawn one task per object on the current Tokio runtime. Each task only
//!    returns its outcome; no task touches a buffer. Outside a runtime the
//!    uploads are polled concurrently on the calling task instead.
//! 3. Wait for all of them. A failed upload doesn't cancel its siblings.
//! 4. If everything succeeded, rebuild the buffer once, front to back, writing
//!    a reference placeholder into each object slot. Otherwise report every
//!    failure and produce nothing.
//!
//! The input buffer is only borrowed, so a failed or abandoned resolution
//! leaves the caller with the original, which can be resolved again from
//! scratch.

use crate::error::{ObjectUploadFailure, RemoteError, UploadError};
use crate::markup::reference_placeholder;
use crate::richtext::{AttributeSet, AttributedBuffer, ObjectRef, RenderSize};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Durable identifier handed back by an [`Uploader`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference(String);

impl Reference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Reference {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

/// Capability that stores an attachment payload somewhere durable.
///
/// Called once per object, concurrently, with no ordering guarantees.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, payload: Bytes) -> Result<Reference, RemoteError>;
}

struct PendingUpload {
    offset: usize,
    payload: Bytes,
    render_size: RenderSize,
}

/// Replaces every inline object in `buffer` with an uploaded reference.
///
/// Inside a Tokio runtime each upload runs on its own spawned task. Any other
/// executor works too: the uploads are then driven by the returned future.
pub async fn resolve(
    buffer: &AttributedBuffer,
    uploader: Arc<dyn Uploader>,
) -> Result<AttributedBuffer, UploadError> {
    let pending: Vec<PendingUpload> = buffer
        .objects()
        .iter()
        .map(|(&offset, object)| PendingUpload {
            offset,
            payload: object.payload.clone(),
            render_size: object.render_size,
        })
        .collect();

    if pending.is_empty() {
        return Ok(buffer.clone());
    }

    tracing::debug!("resolving {} inline objects", pending.len());

    // join_all yields results in submission order, i.e. ascending offset.
    let outcomes: Vec<Result<Reference, RemoteError>> = match Handle::try_current().ok() {
        Some(runtime) => {
            let handles: Vec<_> = pending
                .iter()
                .map(|upload| {
                    let uploader = Arc::clone(&uploader);
                    let payload = upload.payload.clone();
                    runtime.spawn(async move { uploader.upload(payload).await })
                })
                .collect();
            join_all(handles)
                .await
                .into_iter()
                .map(|outcome| {
                    outcome.unwrap_or_else(|err| {
                        Err(RemoteError::Rejected(format!("upload task aborted: {err}")))
                    })
                })
                .collect()
        }
        None => {
            tracing::debug!("no Tokio runtime, uploading on the calling task");
            join_all(
                pending
                    .iter()
                    .map(|upload| uploader.upload(upload.payload.clone())),
            )
            .await
        }
    };

    let mut references = BTreeMap::new();
    let mut failures = Vec::new();
    for (upload, result) in pending.iter().zip(outcomes) {
        match result {
            Ok(reference) => {
                references.insert(
                    upload.offset,
                    ObjectRef {
                        reference: reference.to_string(),
                        size: Some(upload.render_size),
                    },
                );
            }
            Err(source) => {
                tracing::warn!("upload for object at offset {} failed: {}", upload.offset, source);
                failures.push(ObjectUploadFailure {
                    offset: upload.offset,
                    source,
                });
            }
        }
    }

    if !failures.is_empty() {
        return Err(UploadError {
            attempted: pending.len(),
            failures,
        });
    }

    tracing::debug!("all {} uploads succeeded", pending.len());
    Ok(splice_references(buffer, &references))
}

/// Rebuilds `buffer` with each object slot listed in `references` turned into
/// its placeholder text. Offsets are those of `buffer`; the new buffer is
/// written front to back so no replacement can invalidate another's offset.
/// Objects without a reference are carried over unchanged.
pub fn splice_references(
    buffer: &AttributedBuffer,
    references: &BTreeMap<usize, ObjectRef>,
) -> AttributedBuffer {
    let mut out = AttributedBuffer::new();
    let mut chars = buffer.text().chars();

    for run in buffer.runs() {
        let mut pending = String::new();
        for offset in run.range.clone() {
            let Some(c) = chars.next() else { break };
            let object = buffer.objects().get(&offset);
            if object.is_none() {
                pending.push(c);
                continue;
            }

            out.push_str(&pending, run.attributes.clone());
            pending.clear();
            match (references.get(&offset), object) {
                (Some(reference), _) => {
                    let attributes = AttributeSet {
                        object: false,
                        reference: Some(reference.clone()),
                        ..run.attributes.clone()
                    };
                    out.push_str(&reference_placeholder(&reference.reference), attributes);
                }
                (None, Some(object)) => out.push_object(object.clone(), run.attributes.clone()),
                (None, None) => {}
            }
        }
        out.push_str(&pending, run.attributes.clone());
    }
    out
}
