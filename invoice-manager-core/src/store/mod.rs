//! Persistence for clients and invoices.
//!
//! Handlers talk to a `Store` trait object so the same API runs against
//! PostgreSQL in production and an in-memory map in tests or when no
//! database is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Client, Invoice, PurchaseOrder};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field already holds this value on another record.
    #[error("{field} already exists")]
    Duplicate { field: &'static str },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into a record.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for the two collections.
///
/// Writes replace whole records; `update_*` and `set_client_pos` return
/// `false` when the id does not exist. Nothing cascades between
/// collections.
#[async_trait]
pub trait Store: Send + Sync {
    /// Checks that the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    async fn insert_client(&self, client: &Client) -> StoreResult<()>;

    /// All clients in creation order.
    async fn list_clients(&self) -> StoreResult<Vec<Client>>;

    async fn get_client(&self, id: Uuid) -> StoreResult<Option<Client>>;

    /// Fetches the subset of `ids` that still exist, in no particular order.
    async fn get_clients(&self, ids: &[Uuid]) -> StoreResult<Vec<Client>>;

    async fn update_client(&self, client: &Client) -> StoreResult<bool>;

    /// Overwrites only the purchase order list of a client.
    async fn set_client_pos(
        &self,
        id: Uuid,
        pos: &[PurchaseOrder],
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Removes a client and returns it.
    async fn delete_client(&self, id: Uuid) -> StoreResult<Option<Client>>;

    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()>;

    /// All invoices, newest `created_at` first.
    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>>;

    async fn get_invoice(&self, id: Uuid) -> StoreResult<Option<Invoice>>;

    async fn update_invoice(&self, invoice: &Invoice) -> StoreResult<bool>;

    /// Removes an invoice and returns it.
    async fn delete_invoice(&self, id: Uuid) -> StoreResult<Option<Invoice>>;
}
