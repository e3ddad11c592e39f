use std::collections::HashMap;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::billing::recompute_totals;
use crate::clients::merge_client_purchase_orders;
use crate::error::{AppError, AppResult};
use crate::models::client::{ClientDetail, ClientSummary};
use crate::models::invoice::{InvoicePayload, InvoiceResponse};
use crate::models::{Invoice, PurchaseOrder};
use crate::store::Store;

/// Lists all invoices, newest first, each with a client summary.
///
/// Invoices whose client has been deleted are returned with `client: null`.
pub async fn list_invoices(store: &dyn Store) -> AppResult<Vec<InvoiceResponse<ClientSummary>>> {
    let invoices = store.list_invoices().await?;

    let mut client_ids: Vec<Uuid> = invoices.iter().map(|i| i.client).collect();
    client_ids.sort_unstable();
    client_ids.dedup();

    let clients: HashMap<Uuid, ClientSummary> = store
        .get_clients(&client_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, ClientSummary::from(c)))
        .collect();

    Ok(invoices
        .into_iter()
        .map(|invoice| {
            let client = clients.get(&invoice.client).cloned();
            InvoiceResponse::new(invoice, client)
        })
        .collect())
}

/// Fetches one invoice with billing details of its client.
pub async fn get_invoice(store: &dyn Store, id: Uuid) -> AppResult<InvoiceResponse<ClientDetail>> {
    let invoice = store
        .get_invoice(id)
        .await?
        .ok_or(AppError::NotFound("Invoice"))?;
    let client = store.get_client(invoice.client).await?.map(ClientDetail::from);

    Ok(InvoiceResponse::new(invoice, client))
}

/// Validates, totals and stores a new invoice, then records its POs on the client.
///
/// The invoice is written before the PO merge runs. If the merge fails the
/// invoice stays stored and the error is still returned.
pub async fn create_invoice(store: &dyn Store, payload: InvoicePayload) -> AppResult<Invoice> {
    let mut invoice = Invoice::create(payload, Utc::now())?;
    recompute_totals(&mut invoice)?;
    store.insert_invoice(&invoice).await?;

    info!(
        "Created invoice {} ({}) total {}",
        invoice.id, invoice.invoice_number, invoice.total
    );

    record_purchase_orders(store, &invoice, &invoice.pos).await?;
    Ok(invoice)
}

/// Applies a partial update to an invoice, re-totals it and records its POs.
///
/// The PO merge only runs when the request itself carried a non-empty
/// `pos` list, and targets the invoice's client after the update.
pub async fn update_invoice(
    store: &dyn Store,
    id: Uuid,
    payload: InvoicePayload,
) -> AppResult<Invoice> {
    let mut invoice = store
        .get_invoice(id)
        .await?
        .ok_or(AppError::NotFound("Invoice"))?;

    let carries_pos = payload.pos.is_some();
    invoice.apply_update(payload, Utc::now())?;
    recompute_totals(&mut invoice)?;

    if !store.update_invoice(&invoice).await? {
        return Err(AppError::NotFound("Invoice"));
    }

    info!(
        "Updated invoice {} ({}) total {}",
        invoice.id, invoice.invoice_number, invoice.total
    );

    let requested: &[PurchaseOrder] = if carries_pos { &invoice.pos } else { &[] };
    record_purchase_orders(store, &invoice, requested).await?;
    Ok(invoice)
}

/// Deletes an invoice. Client PO lists are not touched.
pub async fn delete_invoice(store: &dyn Store, id: Uuid) -> AppResult<Invoice> {
    let invoice = store
        .delete_invoice(id)
        .await?
        .ok_or(AppError::NotFound("Invoice"))?;

    info!("Deleted invoice {} ({})", invoice.id, invoice.invoice_number);
    Ok(invoice)
}

/// Merges `pos` into the invoice's client. Nothing to record is not an error.
async fn record_purchase_orders(
    store: &dyn Store,
    invoice: &Invoice,
    pos: &[PurchaseOrder],
) -> AppResult<()> {
    if pos.is_empty() {
        return Ok(());
    }

    merge_client_purchase_orders(store, invoice.client, pos)
        .await
        .map(|_| ())
        .map_err(|e| {
            error!(
                "Invoice {} saved but its purchase orders were not recorded: {}",
                invoice.id, e
            );
            e
        })
}
