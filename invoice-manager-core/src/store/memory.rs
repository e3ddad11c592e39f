use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Client, Invoice, PurchaseOrder};
use crate::store::{Store, StoreError, StoreResult};

/// In-process store.
///
/// Records live in insertion-ordered vectors behind async locks. The same
/// unique constraints as the PostgreSQL schema are enforced on write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    clients: RwLock<Vec<Client>>,
    invoices: RwLock<Vec<Invoice>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn username_taken(clients: &[Client], candidate: &Client) -> bool {
    clients
        .iter()
        .any(|c| c.id != candidate.id && c.username == candidate.username)
}

fn invoice_number_taken(invoices: &[Invoice], candidate: &Invoice) -> bool {
    invoices
        .iter()
        .any(|i| i.id != candidate.id && i.invoice_number == candidate.invoice_number)
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_client(&self, client: &Client) -> StoreResult<()> {
        let mut clients = self.clients.write().await;
        if username_taken(&clients, client) {
            return Err(StoreError::Duplicate { field: "username" });
        }
        clients.push(client.clone());
        debug!("Inserted client {} ({} total)", client.id, clients.len());
        Ok(())
    }

    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        Ok(self.clients.read().await.clone())
    }

    async fn get_client(&self, id: Uuid) -> StoreResult<Option<Client>> {
        Ok(self.clients.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn get_clients(&self, ids: &[Uuid]) -> StoreResult<Vec<Client>> {
        Ok(self
            .clients
            .read()
            .await
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn update_client(&self, client: &Client) -> StoreResult<bool> {
        let mut clients = self.clients.write().await;
        if username_taken(&clients, client) {
            return Err(StoreError::Duplicate { field: "username" });
        }
        match clients.iter_mut().find(|c| c.id == client.id) {
            Some(slot) => {
                *slot = client.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_client_pos(
        &self,
        id: Uuid,
        pos: &[PurchaseOrder],
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut clients = self.clients.write().await;
        match clients.iter_mut().find(|c| c.id == id) {
            Some(client) => {
                client.pos = pos.to_vec();
                client.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_client(&self, id: Uuid) -> StoreResult<Option<Client>> {
        let mut clients = self.clients.write().await;
        Ok(clients
            .iter()
            .position(|c| c.id == id)
            .map(|index| clients.remove(index)))
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()> {
        let mut invoices = self.invoices.write().await;
        if invoice_number_taken(&invoices, invoice) {
            return Err(StoreError::Duplicate {
                field: "invoiceNumber",
            });
        }
        invoices.push(invoice.clone());
        debug!("Inserted invoice {} ({} total)", invoice.id, invoices.len());
        Ok(())
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self.invoices.read().await.iter().rev().cloned().collect();
        // Stable sort keeps later inserts first when timestamps tie.
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invoices)
    }

    async fn get_invoice(&self, id: Uuid) -> StoreResult<Option<Invoice>> {
        Ok(self.invoices.read().await.iter().find(|i| i.id == id).cloned())
    }

    async fn update_invoice(&self, invoice: &Invoice) -> StoreResult<bool> {
        let mut invoices = self.invoices.write().await;
        if invoice_number_taken(&invoices, invoice) {
            return Err(StoreError::Duplicate {
                field: "invoiceNumber",
            });
        }
        match invoices.iter_mut().find(|i| i.id == invoice.id) {
            Some(slot) => {
                *slot = invoice.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_invoice(&self, id: Uuid) -> StoreResult<Option<Invoice>> {
        let mut invoices = self.invoices.write().await;
        Ok(invoices
            .iter()
            .position(|i| i.id == id)
            .map(|index| invoices.remove(index)))
    }
}
