//! DynamoDB storage backend implementation.
//!
//! The collection is a single table whose partition key is the string
//! attribute `id`. Items are stored as native DynamoDB maps so they stay
//! readable from the console and other clients.

mod conversions;
mod error;
mod repository;

pub use repository::DynamoDbRepository;
