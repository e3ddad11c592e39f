use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::app::{parse_id, AppState};
use crate::error::AppResult;
use crate::invoices::service;
use crate::models::client::{ClientDetail, ClientSummary};
use crate::models::invoice::{InvoicePayload, InvoiceResponse};
use crate::models::Invoice;

/// Handles `GET /api/invoices`.
pub async fn list_invoices_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<InvoiceResponse<ClientSummary>>>> {
    Ok(Json(service::list_invoices(state.store.as_ref()).await?))
}

/// Handles `POST /api/invoices`.
pub async fn create_invoice_handler(
    State(state): State<AppState>,
    payload: Result<Json<InvoicePayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Invoice>)> {
    let Json(payload) = payload?;
    let invoice = service::create_invoice(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Handles `GET /api/invoices/:id`.
pub async fn get_invoice_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<InvoiceResponse<ClientDetail>>> {
    let id = parse_id(&id, "Invoice")?;
    Ok(Json(service::get_invoice(state.store.as_ref(), id).await?))
}

/// Handles `PUT /api/invoices/:id`.
pub async fn update_invoice_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<InvoicePayload>, JsonRejection>,
) -> AppResult<Json<Invoice>> {
    let id = parse_id(&id, "Invoice")?;
    let Json(payload) = payload?;
    Ok(Json(service::update_invoice(state.store.as_ref(), id, payload).await?))
}

/// Handles `DELETE /api/invoices/:id`.
pub async fn delete_invoice_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&id, "Invoice")?;
    service::delete_invoice(state.store.as_ref(), id).await?;
    Ok(Json(json!({ "message": "Invoice deleted successfully" })))
}
