use crate::catalog::{Catalog, CatalogError};
use std::collections::HashMap;
use std::sync::Mutex;

/// A stock table held in memory. Shared (via `Arc`) by every node of a local cluster, the same
/// way every node talks to the one catalog service in a deployment.
pub struct InMemoryCatalog {
    stock: Mutex<HashMap<String, u64>>,
}

impl InMemoryCatalog {
    pub fn new<I, S>(initial_stock: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let stock = initial_stock
            .into_iter()
            .map(|(item_name, quantity)| (item_name.into(), quantity))
            .collect();

        InMemoryCatalog {
            stock: Mutex::new(stock),
        }
    }

    /// Adds `quantity` units to `item_name`, creating the item if needed.
    pub fn restock(&self, item_name: &str, quantity: u64) {
        let mut stock = self.stock.lock().expect("Catalog mutex poisoned");
        *stock.entry(item_name.to_string()).or_insert(0) += quantity;
    }

    pub fn quantity(&self, item_name: &str) -> Option<u64> {
        let stock = self.stock.lock().expect("Catalog mutex poisoned");
        stock.get(item_name).copied()
    }
}

#[async_trait::async_trait]
impl Catalog for InMemoryCatalog {
    async fn available_quantity(&self, item_name: &str) -> Result<u64, CatalogError> {
        self.quantity(item_name)
            .ok_or_else(|| CatalogError::UnknownItem(item_name.to_string()))
    }

    async fn try_decrement(&self, item_name: &str, quantity: u64) -> Result<(), CatalogError> {
        let mut stock = self.stock.lock().expect("Catalog mutex poisoned");
        let available = stock
            .get_mut(item_name)
            .ok_or_else(|| CatalogError::UnknownItem(item_name.to_string()))?;

        if quantity > *available {
            return Err(CatalogError::InsufficientStock {
                requested: quantity,
                available: *available,
            });
        }

        *available -= quantity;
        Ok(())
    }
}
