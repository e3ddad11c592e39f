use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::dates;
use crate::models::fields::{trimmed, ValidationError};

/// A purchase order reference, shared by clients and invoices.
///
/// Invoices always carry a `po_date`; client records may hold undated
/// entries entered by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub po_number: String,
    pub po_date: Option<DateTime<Utc>>,
}

impl PurchaseOrder {
    pub fn new(po_number: impl Into<String>, po_date: Option<DateTime<Utc>>) -> Self {
        Self {
            po_number: po_number.into(),
            po_date,
        }
    }
}

/// Purchase order as submitted in a request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderInput {
    #[serde(default)]
    pub po_number: Option<String>,
    #[serde(default, deserialize_with = "dates::deserialize_optional")]
    pub po_date: Option<DateTime<Utc>>,
}

impl PurchaseOrderInput {
    /// Validates an invoice PO entry: both number and date are mandatory.
    pub fn into_invoice_po(self, index: usize) -> Result<PurchaseOrder, ValidationError> {
        let po_number = trimmed(self.po_number).ok_or_else(|| {
            ValidationError::new(format!("`pos[{}].poNumber` is required", index))
        })?;
        let po_date = self.po_date.ok_or_else(|| {
            ValidationError::new(format!("`pos[{}].poDate` is required", index))
        })?;

        Ok(PurchaseOrder::new(po_number, Some(po_date)))
    }

    /// Normalizes a client PO entry. Blank rows left over from the form are dropped.
    pub fn into_client_po(self) -> Option<PurchaseOrder> {
        trimmed(self.po_number).map(|po_number| PurchaseOrder::new(po_number, self.po_date))
    }
}
