use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Result of a single-item read.
///
/// Serializes as `{"Item": {...}}`, or `{}` when nothing was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetItemOutput {
    #[serde(rename = "Item", default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
}

impl From<Option<Item>> for GetItemOutput {
    fn from(item: Option<Item>) -> Self {
        Self { item }
    }
}

/// Result of reading the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanOutput {
    pub items: Vec<Item>,
    pub count: usize,
    pub scanned_count: usize,
}

impl From<Vec<Item>> for ScanOutput {
    fn from(items: Vec<Item>) -> Self {
        let count = items.len();
        Self {
            items,
            count,
            scanned_count: count,
        }
    }
}

/// Acknowledgement returned for writes and deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    pub success: bool,
    pub message: String,
}

impl WriteAck {
    pub fn put(id: &str) -> Self {
        Self {
            success: true,
            message: format!("Put item {id}"),
        }
    }

    pub fn deleted(id: &str) -> Self {
        Self {
            success: true,
            message: format!("Deleted item {id}"),
        }
    }
}
