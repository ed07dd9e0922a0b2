//! Chunkvault Cache
//!
//! This crate provides the chunk cache client used by the vault, plus the
//! volatile key-value backends it can run against.
//!
//! The [`CacheBackend`] trait is the raw backend layer (set/get/delete by key).
//! [`ChunkCache`] sits on top of it and adds what the vault needs: generated
//! keys, key validation, batch deletion with an explicit report, and the
//! all-or-nothing presence check used for dedup.
//!
//! Backends are expected to lose entries on their own (eviction, restarts).
//! Nothing here tries to prevent that; the vault detects and repairs it.

mod backend;
mod client;
mod directory;
mod error;
mod key;
mod memory;

pub use backend::CacheBackend;
pub use client::{ChunkCache, DeleteReport};
pub use directory::DirectoryBackend;
pub use error::{BackendError, CacheError};
pub use key::{MAX_KEY_LEN, is_valid_key};
pub use memory::MemoryBackend;
