//! Chunkvault Engine
//!
//! This crate ties the chunk cache and the metadata store together into a
//! file store that deduplicates whole files by SHA-256 and repairs itself
//! when the cache loses data.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Vault                              │
//! │  - ingest(name, reader, checksum) → File                    │
//! │  - retrieve(file) → Bytes                                   │
//! │  - reports VaultEvents to an EventSink                      │
//! └─────────────────────────────────────────────────────────────┘
//!                │                               │
//!                ▼                               ▼
//! ┌───────────────────────────┐   ┌─────────────────────────────┐
//! │      ChunkCache<B>        │   │      M: MetadataStore       │
//! │  - volatile, may evict    │   │  - files + ordered parts    │
//! │  - one entry per chunk    │   │  - transactional commit     │
//! └───────────────────────────┘   └─────────────────────────────┘
//! ```
//!
//! Writes commit metadata only after every chunk is cached; a failed write
//! removes the chunks it had stored. Reads verify every chunk and purge the
//! file on the first missing or corrupt one, so a file either reads back
//! exactly or stops existing.

mod checksum;
mod chunker;
mod error;
pub mod events;
mod ingest;
mod retrieve;
mod vault;

pub use checksum::{EMPTY_SHA256, checksum_reader, sha256_hex};
pub use chunker::Chunker;
pub use error::VaultError;
pub use events::{ChannelSink, EventSink, NoopSink, PurgeReason, TracingSink, VaultEvent};
pub use vault::{Vault, cache_backend};

// Re-export the record types callers get back from the vault.
pub use chunkvault_metadata::{File, FilePart};
