//! In-memory storage backend.
//!
//! Keeps the collection in a `BTreeMap` behind `Arc<RwLock<_>>`. Nothing is
//! persisted; the data is gone when the last clone of the repository drops.
//! Used by the tests and when no DynamoDB table is configured.

mod repository;

pub use repository::InMemoryRepository;
