use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::clients::{
    create_client_handler, delete_client_handler, get_client_handler, list_clients_handler,
    update_client_handler,
};
use crate::error::AppError;
use crate::invoices::{
    create_invoice_handler, delete_invoice_handler, get_invoice_handler, list_invoices_handler,
    update_invoice_handler,
};
use crate::store::Store;

/// Application state containing shared resources.
///
/// Holds the store that route handlers read and write through.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Parses a path id. Anything that is not a UUID cannot name a record,
/// so it is reported as not found.
pub fn parse_id(raw: &str, entity: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(entity))
}

/// Builds the CORS policy for the single UI origin.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, header::InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

async fn home() -> &'static str {
    "Invoice Manager Dashboard"
}

/// Health check endpoint.
///
/// Returns a simple JSON response indicating the server is running.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "invoice-manager-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Store health check endpoint.
///
/// Verifies that the backing store answers.
async fn store_health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    state.store.ping().await.map_err(|e| {
        tracing::error!("Store health check failed: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "database": "connected"
    })))
}

/// Creates the main application router.
///
/// # Arguments
///
/// * `state` - The application state containing the store
/// * `cors` - CORS policy applied to every route
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/health/db", get(store_health_check))
        // Clients
        .route(
            "/api/clients",
            get(list_clients_handler).post(create_client_handler),
        )
        .route(
            "/api/clients/:id",
            get(get_client_handler)
                .put(update_client_handler)
                .delete(delete_client_handler),
        )
        .route("/create-client", post(create_client_handler))
        .route("/edit-client/:id", put(update_client_handler))
        // Invoices
        .route(
            "/api/invoices",
            get(list_invoices_handler).post(create_invoice_handler),
        )
        .route(
            "/api/invoices/:id",
            get(get_invoice_handler)
                .put(update_invoice_handler)
                .delete(delete_invoice_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
