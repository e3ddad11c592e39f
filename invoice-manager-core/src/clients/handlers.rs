use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use tracing::info;

use crate::app::{parse_id, AppState};
use crate::clients::service;
use crate::error::AppResult;
use crate::models::client::{CreateClient, UpdateClient};
use crate::models::Client;

/// Response body for client mutations.
#[derive(Debug, Serialize)]
pub struct ClientMessage {
    pub message: &'static str,
    pub client: Client,
}

/// Handles `POST /api/clients` (and the legacy `POST /create-client`).
pub async fn create_client_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateClient>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ClientMessage>)> {
    let Json(request) = payload?;
    let client = service::create_client(state.store.as_ref(), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ClientMessage {
            message: "Client created successfully",
            client,
        }),
    ))
}

/// Handles `GET /api/clients`.
pub async fn list_clients_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Client>>> {
    let clients = service::list_clients(state.store.as_ref()).await?;
    info!("Listing {} clients", clients.len());
    Ok(Json(clients))
}

/// Handles `GET /api/clients/:id`.
pub async fn get_client_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Client>> {
    let id = parse_id(&id, "Client")?;
    Ok(Json(service::get_client(state.store.as_ref(), id).await?))
}

/// Handles `PUT /api/clients/:id` (and the legacy `PUT /edit-client/:id`).
pub async fn update_client_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateClient>, JsonRejection>,
) -> AppResult<Json<ClientMessage>> {
    let id = parse_id(&id, "Client")?;
    let Json(update) = payload?;
    let client = service::update_client(state.store.as_ref(), id, update).await?;

    Ok(Json(ClientMessage {
        message: "Client updated successfully",
        client,
    }))
}

/// Handles `DELETE /api/clients/:id`.
pub async fn delete_client_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ClientMessage>> {
    let id = parse_id(&id, "Client")?;
    let client = service::delete_client(state.store.as_ref(), id).await?;

    Ok(Json(ClientMessage {
        message: "Client deleted successfully",
        client,
    }))
}
