//! In-memory repository implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use itemrouter_core::item::Item;
use itemrouter_core::storage::{ItemRepository, Result};

/// In-memory storage backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    items: Arc<RwLock<BTreeMap<String, Item>>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with `items`.
    #[cfg(test)]
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let items = items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }
}

#[async_trait]
impl ItemRepository for InMemoryRepository {
    async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let items = self.items.read().await;
        Ok(items.get(id).cloned())
    }

    async fn put_item(&self, item: &Item) -> Result<()> {
        let mut items = self.items.write().await;
        items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        let mut items = self.items.write().await;
        items.remove(id);
        Ok(())
    }

    async fn scan_items(&self) -> Result<Vec<Item>> {
        let items = self.items.read().await;
        Ok(items.values().cloned().collect())
    }
}
