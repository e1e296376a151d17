use async_trait::async_trait;

use crate::item::Item;

use super::Result;

/// Persistence backend for the item collection.
///
/// Every operation is keyed by the item's `id`.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Gets an item by its id, `None` when it does not exist.
    async fn get_item(&self, id: &str) -> Result<Option<Item>>;

    /// Creates the item or replaces the existing one wholesale.
    async fn put_item(&self, item: &Item) -> Result<()>;

    /// Deletes an item. Deleting a missing id is not an error.
    async fn delete_item(&self, id: &str) -> Result<()>;

    /// Returns every item in the collection.
    async fn scan_items(&self) -> Result<Vec<Item>>;
}
