use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::billing::merge_purchase_orders;
use crate::error::{AppError, AppResult};
use crate::models::client::{CreateClient, UpdateClient};
use crate::models::{Client, PurchaseOrder};
use crate::store::Store;

/// Validates and stores a new client.
///
/// # Errors
///
/// Returns a validation error when required fields are missing or the
/// username is already taken.
pub async fn create_client(store: &dyn Store, request: CreateClient) -> AppResult<Client> {
    let client = Client::create(request, Utc::now())?;
    store.insert_client(&client).await?;

    info!("Created client {} ({})", client.id, client.username);
    Ok(client)
}

pub async fn list_clients(store: &dyn Store) -> AppResult<Vec<Client>> {
    Ok(store.list_clients().await?)
}

pub async fn get_client(store: &dyn Store, id: Uuid) -> AppResult<Client> {
    store
        .get_client(id)
        .await?
        .ok_or(AppError::NotFound("Client"))
}

/// Applies a partial update to an existing client.
pub async fn update_client(store: &dyn Store, id: Uuid, update: UpdateClient) -> AppResult<Client> {
    let mut client = get_client(store, id).await?;
    client.apply_update(update, Utc::now())?;

    if !store.update_client(&client).await? {
        return Err(AppError::NotFound("Client"));
    }

    info!("Updated client {}", id);
    Ok(client)
}

/// Deletes a client. Invoices referencing it are left untouched.
pub async fn delete_client(store: &dyn Store, id: Uuid) -> AppResult<Client> {
    let client = store
        .delete_client(id)
        .await?
        .ok_or(AppError::NotFound("Client"))?;

    info!("Deleted client {}", id);
    Ok(client)
}

/// Adds the given purchase orders to a client's PO list.
///
/// POs whose number the client already holds are skipped. The whole
/// resulting list is written back.
///
/// # Errors
///
/// Returns `AppError::ClientNotFound` if the client does not exist.
pub async fn merge_client_purchase_orders(
    store: &dyn Store,
    client_id: Uuid,
    pos: &[PurchaseOrder],
) -> AppResult<Vec<PurchaseOrder>> {
    let client = store
        .get_client(client_id)
        .await?
        .ok_or(AppError::ClientNotFound(client_id))?;

    let mut merged = client.pos;
    let added = merge_purchase_orders(&mut merged, pos);

    if !store.set_client_pos(client_id, &merged, Utc::now()).await? {
        warn!("Client {} disappeared during purchase order merge", client_id);
        return Err(AppError::ClientNotFound(client_id));
    }

    info!(
        "Merged purchase orders into client {}: {} added, {} total",
        client_id,
        added,
        merged.len()
    );
    Ok(merged)
}
