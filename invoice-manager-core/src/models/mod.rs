pub mod client;
pub mod dates;
pub mod fields;
pub mod invoice;
pub mod purchase_order;

pub use client::Client;
pub use fields::ValidationError;
pub use invoice::Invoice;
pub use purchase_order::PurchaseOrder;
