//! Storage backend implementations.
//!
//! Concrete implementations of `itemrouter_core::storage::ItemRepository`.
//!
//! # Feature Flags
//!
//! - `dynamodb`: AWS DynamoDB storage backend using `aws-sdk-dynamodb`
//!
//! The in-memory backend is always compiled in; it backs the tests and local
//! runs without a table.
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p itemrouter --features dynamodb
//! ```

pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use inmemory::InMemoryRepository;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbRepository;
