//! # Sprint Architecture
//!
//! Sprint is a **rich-text note engine**: notes carry styled text and inline
//! images, get their images uploaded and swapped for references on save, and
//! travel to storage as flat tag markup. The CLI is one client of the library,
//! not the other way round.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Service (service.rs, repository.rs)                        │
//! │  - save: resolve attachments → encode → persist             │
//! │  - fetch: decode each record, fallback body on bad markup   │
//! │  - NoteRepository: explicit cache with refresh              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Document Core (richtext/, markup/, attachments.rs)         │
//! │  - AttributedBuffer and style operations                    │
//! │  - Markup encode/decode                                     │
//! │  - Concurrent attachment upload and reference splicing      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - NoteRemote, Uploader and Generator traits                │
//! │  - FileStore (CLI), MemoryStore (testing)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Offsets
//!
//! Every offset and length in the document core counts Unicode scalar values,
//! not bytes. An inline object takes exactly one position, holding
//! `U+FFFC OBJECT REPLACEMENT CHARACTER` in the text.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `service.rs` inward, code:
//! - Takes regular Rust function arguments
//! - Returns regular Rust types (`Result<T>`)
//! - **Never** writes to stdout/stderr (diagnostics go through `tracing`)
//! - **Never** calls `std::process::exit`
//!
//! ## Testing Strategy
//!
//! 1. **Document core**: thorough unit tests of buffer partitioning, styling,
//!    markup in both directions, and resolution ordering under out-of-order
//!    upload completion.
//! 2. **Service**: save/fetch behavior against `MemoryStore`, including
//!    failed uploads and failed writes.
//! 3. **CLI** (`tests/`): end-to-end runs of the binary against a temporary
//!    data directory.
//!
//! ## Module Overview
//!
//! - [`richtext`]: `AttributedBuffer`, attributes and style operations
//! - [`markup`]: Markup codec
//! - [`attachments`]: Attachment resolution
//! - [`service`]: `DocumentService`
//! - [`repository`]: `NoteRepository`
//! - [`store`]: Storage traits and implementations
//! - [`model`]: `Note` and `NoteRecord`
//! - [`config`]: Configuration management
//! - [`logging`]: Subscriber setup
//! - [`error`]: Error types

pub mod attachments;
pub mod config;
pub mod error;
pub mod logging;
pub mod markup;
pub mod model;
pub mod repository;
pub mod richtext;
pub mod service;
pub mod store;
