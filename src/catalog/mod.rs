//! The inventory store is an external collaborator. The order node only needs to check stock
//! before proposing an order and decrement it when the order commits.
mod in_memory;

pub use in_memory::InMemoryCatalog;

#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Returns how many units of `item_name` are currently in stock.
    async fn available_quantity(&self, item_name: &str) -> Result<u64, CatalogError>;

    /// Atomically checks and decrements stock. Must not decrement anything on failure.
    async fn try_decrement(&self, item_name: &str, quantity: u64) -> Result<(), CatalogError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Item {0:?} is not in the catalog")]
    UnknownItem(String),
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u64 },
    // The catalog service itself could not be reached.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}
