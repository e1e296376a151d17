use std::{env, str::FromStr};

use itemrouter_core::item::IdStrategy;
use itemrouter_core::request::ErrorStatusPolicy;

/// Default table name for the item collection.
pub const DEFAULT_TABLE_NAME: &str = "ProductCollections";

/// Which storage backend serves the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    DynamoDb,
}

impl Default for StorageBackend {
    fn default() -> Self {
        if cfg!(feature = "dynamodb") {
            StorageBackend::DynamoDb
        } else {
            StorageBackend::InMemory
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "inmemory" => Ok(StorageBackend::InMemory),
            "dynamodb" => Ok(StorageBackend::DynamoDb),
            other => Err(format!("Unknown storage backend: {other}")),
        }
    }
}

/// DynamoDB connection settings.
///
/// Only read when the `dynamodb` feature is enabled.
#[cfg_attr(not(feature = "dynamodb"), allow(dead_code))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbConfig {
    /// Table holding the collection, keyed by `id` (default: "ProductCollections")
    pub table_name: String,
    /// Region override; the SDK's default chain applies when unset
    pub region: Option<String>,
    /// Custom endpoint URL (for DynamoDB Local)
    pub endpoint_url: Option<String>,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub dynamodb: DynamoDbConfig,
    pub id_strategy: IdStrategy,
    pub error_status_policy: ErrorStatusPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `STORAGE_BACKEND` - `memory` or `dynamodb` (default: `dynamodb` when
    ///   built with the `dynamodb` feature, `memory` otherwise)
    /// - `TABLE_NAME` - DynamoDB table name (default: "ProductCollections")
    /// - `AWS_REGION` - DynamoDB region override
    /// - `AWS_ENDPOINT_URL` - DynamoDB endpoint override
    /// - `ID_STRATEGY` - `timestamp` or `uuid` (default: `timestamp`)
    /// - `ERROR_STATUS_POLICY` - `legacy` or `classified` (default: `legacy`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Unparsable values fall back to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            storage_backend: parse_or_default(&lookup, "STORAGE_BACKEND"),
            dynamodb: DynamoDbConfig {
                table_name: lookup("TABLE_NAME")
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
                region: lookup("AWS_REGION").filter(|region| !region.is_empty()),
                endpoint_url: lookup("AWS_ENDPOINT_URL").filter(|url| !url.is_empty()),
            },
            id_strategy: parse_or_default(&lookup, "ID_STRATEGY"),
            error_status_policy: parse_or_default(&lookup, "ERROR_STATUS_POLICY"),
        }
    }
}

fn parse_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> T
where
    T: FromStr<Err = String> + Default,
{
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|error: String| {
            tracing::warn!(key, value = %raw, %error, "Ignoring invalid configuration value");
            T::default()
        }),
        None => T::default(),
    }
}
