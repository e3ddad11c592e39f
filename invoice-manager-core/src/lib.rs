//! Invoicing backend: clients, invoices and the purchase orders linking them.

pub mod app;
pub mod billing;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod invoices;
pub mod models;
pub mod store;

pub use app::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, AppResult};
