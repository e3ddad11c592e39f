pub mod handlers;
pub mod service;

pub use handlers::{
    create_invoice_handler, delete_invoice_handler, get_invoice_handler, list_invoices_handler,
    update_invoice_handler,
};
