use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::ValidationError;
use crate::store::StoreError;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input. Nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The addressed record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The client an invoice points at vanished while merging its POs.
    /// The invoice write that preceded the merge stays committed.
    #[error("Client not found")]
    ClientNotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationError::new(rejection.body_text()))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ClientNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(StoreError::Duplicate { .. }) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Store(StoreError::Duplicate { .. }) => {
                warn!("Rejected write: {}", self);
                self.to_string()
            }
            AppError::Store(e) => {
                error!("Store failure: {}", e);
                "Internal server error".to_string()
            }
            AppError::ClientNotFound(id) => {
                error!("Purchase order merge failed, client {} not found", id);
                self.to_string()
            }
            AppError::Validation(_) | AppError::NotFound(_) => {
                warn!("Request failed: {}", self);
                self.to_string()
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
