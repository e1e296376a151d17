//! The stored record and how its identifier is chosen.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Name of the field that identifies an item within the collection.
pub const ID_FIELD: &str = "id";

/// A single record in the collection.
///
/// Everything besides `id` is kept as free-form JSON and flattened next to
/// the identifier when serialized, so `{"id":"42","name":"widget"}` round
/// trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Item {
    /// Creates an item with no attributes besides its id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    /// Adds an attribute, replacing any previous value under the same name.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if name != ID_FIELD {
            self.attributes.insert(name, value);
        }
        self
    }

    /// Parses a write body into an item.
    ///
    /// The body must be a JSON object. When it carries no usable `id`
    /// (absent, `null` or empty), one is drawn from `ids`.
    pub fn from_body(body: &str, ids: IdStrategy) -> Result<Self, ItemError> {
        let value: Value = serde_json::from_str(body)?;
        let Value::Object(mut attributes) = value else {
            return Err(ItemError::NotAnObject);
        };

        let id = match attributes.remove(ID_FIELD) {
            None | Some(Value::Null) => ids.generate(),
            Some(Value::String(id)) if id.is_empty() => ids.generate(),
            Some(Value::String(id)) => id,
            Some(_) => return Err(ItemError::InvalidId),
        };

        Ok(Self { id, attributes })
    }
}

/// Errors raised while turning a write body into an [`Item`].
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
    #[error("Item body must be a JSON object")]
    NotAnObject,
    #[error("Item id must be a string")]
    InvalidId,
}

/// How ids are generated for items written without one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Milliseconds since the Unix epoch, as a decimal string.
    ///
    /// Two writes in the same millisecond get the same id.
    #[default]
    Timestamp,
    /// Random v4 UUID.
    Uuid,
}

impl IdStrategy {
    /// Produces a fresh identifier.
    pub fn generate(self) -> String {
        match self {
            IdStrategy::Uuid => Uuid::new_v4().to_string(),
            IdStrategy::Timestamp => chrono::Utc::now().timestamp_millis().to_string(),
        }
    }
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(IdStrategy::Uuid),
            "timestamp" => Ok(IdStrategy::Timestamp),
            other => Err(format!("Unknown id strategy: {other}")),
        }
    }
}
