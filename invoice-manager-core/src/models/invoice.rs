use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::dates;
use crate::models::fields::{required, trimmed, ValidationError};
use crate::models::purchase_order::{PurchaseOrder, PurchaseOrderInput};

/// Invoice status enumeration. A label set by the caller; nothing
/// transitions it automatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(ValidationError::new(format!("unknown invoice status `{}`", other))),
        }
    }
}

/// One billed line. `amount` is always derived from quantity and rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Invoice model representing an invoice in the system.
///
/// Maps to the `invoices` table. `subtotal`, `tax_amount`, `total` and each
/// item's `amount` are derived and recomputed on every save.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Unique identifier for the invoice
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Invoice number (unique)
    pub invoice_number: String,

    /// ID of the billed client. Not enforced: the client may have been deleted.
    pub client: Uuid,

    /// Date when invoice was issued
    pub date: DateTime<Utc>,

    /// Due date for payment
    pub due_date: DateTime<Utc>,

    /// Purchase orders this invoice bills against
    pub pos: Vec<PurchaseOrder>,

    pub items: Vec<LineItem>,

    pub subtotal: Decimal,

    /// Tax percentage, 0 to 100
    pub tax_rate: Decimal,

    pub tax_amount: Decimal,

    pub total: Decimal,

    pub status: InvoiceStatus,

    pub notes: Option<String>,

    /// Timestamp when the invoice was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the invoice was last updated
    pub updated_at: DateTime<Utc>,
}

/// Reference to a client in a request body.
///
/// The UI sends a bare id when creating, but round-trips the expanded
/// client object from `GET /api/invoices/:id` when updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientRef {
    Id(Uuid),
    Expanded {
        #[serde(rename = "_id")]
        id: Uuid,
    },
}

impl ClientRef {
    pub fn id(&self) -> Uuid {
        match *self {
            ClientRef::Id(id) | ClientRef::Expanded { id } => id,
        }
    }
}

/// Line item as submitted in a request body. Any `amount` sent is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemInput {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<Decimal>,
}

impl LineItemInput {
    fn validate(self, index: usize) -> Result<LineItem, ValidationError> {
        let description = required(&format!("items[{}].description", index), self.description)?;

        let quantity = self.quantity.ok_or_else(|| {
            ValidationError::new(format!("`items[{}].quantity` is required", index))
        })?;
        if quantity < Decimal::ONE {
            return Err(ValidationError::new(format!(
                "`items[{}].quantity` must be at least 1",
                index
            )));
        }

        let rate = self.rate.ok_or_else(|| {
            ValidationError::new(format!("`items[{}].rate` is required", index))
        })?;
        if rate < Decimal::ZERO {
            return Err(ValidationError::new(format!(
                "`items[{}].rate` must not be negative",
                index
            )));
        }

        Ok(LineItem {
            description,
            quantity,
            rate,
            amount: Decimal::ZERO,
        })
    }
}

/// Body of invoice create and update requests.
///
/// Derived totals in the body are ignored. On update, absent fields keep
/// their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    pub invoice_number: Option<String>,
    pub client: Option<ClientRef>,
    #[serde(default, deserialize_with = "dates::deserialize_optional")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize_optional")]
    pub due_date: Option<DateTime<Utc>>,
    pub pos: Option<Vec<PurchaseOrderInput>>,
    pub items: Option<Vec<LineItemInput>>,
    pub tax_rate: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
}

fn validate_tax_rate(tax_rate: Decimal) -> Result<Decimal, ValidationError> {
    if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("`taxRate` must be between 0 and 100"));
    }
    Ok(tax_rate)
}

fn validate_pos(pos: Vec<PurchaseOrderInput>) -> Result<Vec<PurchaseOrder>, ValidationError> {
    pos.into_iter()
        .enumerate()
        .map(|(index, po)| po.into_invoice_po(index))
        .collect()
}

fn validate_items(items: Vec<LineItemInput>) -> Result<Vec<LineItem>, ValidationError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| item.validate(index))
        .collect()
}

impl Invoice {
    /// Builds a new invoice from a creation request.
    ///
    /// `date` defaults to `now` and `status` to draft. Derived amounts are
    /// left at zero; they are filled in by the save path.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for the first missing or out-of-range field.
    pub fn create(payload: InvoicePayload, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let invoice_number = required("invoiceNumber", payload.invoice_number)?;
        let client = payload
            .client
            .map(|c| c.id())
            .ok_or_else(|| ValidationError::new("`client` is required"))?;
        let due_date = payload
            .due_date
            .ok_or_else(|| ValidationError::new("`dueDate` is required"))?;
        let tax_rate = payload
            .tax_rate
            .ok_or_else(|| ValidationError::new("`taxRate` is required"))
            .and_then(validate_tax_rate)?;

        Ok(Invoice {
            id: Uuid::new_v4(),
            invoice_number,
            client,
            date: payload.date.unwrap_or(now),
            due_date,
            pos: validate_pos(payload.pos.unwrap_or_default())?,
            items: validate_items(payload.items.unwrap_or_default())?,
            subtotal: Decimal::ZERO,
            tax_rate,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            status: payload.status.unwrap_or_default(),
            notes: trimmed(payload.notes),
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update, re-validating every provided field.
    pub fn apply_update(
        &mut self,
        payload: InvoicePayload,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if payload.invoice_number.is_some() {
            self.invoice_number = required("invoiceNumber", payload.invoice_number)?;
        }
        if let Some(client) = payload.client {
            self.client = client.id();
        }
        if let Some(date) = payload.date {
            self.date = date;
        }
        if let Some(due_date) = payload.due_date {
            self.due_date = due_date;
        }
        if let Some(pos) = payload.pos {
            self.pos = validate_pos(pos)?;
        }
        if let Some(items) = payload.items {
            self.items = validate_items(items)?;
        }
        if let Some(tax_rate) = payload.tax_rate {
            self.tax_rate = validate_tax_rate(tax_rate)?;
        }
        if let Some(status) = payload.status {
            self.status = status;
        }
        if payload.notes.is_some() {
            self.notes = trimmed(payload.notes);
        }

        self.updated_at = now;
        Ok(())
    }
}

/// Invoice response with the client reference expanded.
///
/// `client` is `None` when the referenced client no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse<C> {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub invoice_number: String,
    pub client: Option<C>,
    pub date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub pos: Vec<PurchaseOrder>,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<C> InvoiceResponse<C> {
    pub fn new(invoice: Invoice, client: Option<C>) -> Self {
        InvoiceResponse {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            client,
            date: invoice.date,
            due_date: invoice.due_date,
            pos: invoice.pos,
            items: invoice.items,
            subtotal: invoice.subtotal,
            tax_rate: invoice.tax_rate,
            tax_amount: invoice.tax_amount,
            total: invoice.total,
            status: invoice.status,
            notes: invoice.notes,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> InvoicePayload {
        serde_json::from_value(value).expect("payload should deserialize")
    }

    fn valid_body() -> serde_json::Value {
        json!({
            "invoiceNumber": " INV-001 ",
            "client": Uuid::new_v4(),
            "dueDate": "2024-02-01",
            "taxRate": "18",
            "items": [
                {"description": "Consulting", "quantity": "2", "rate": 100, "amount": 9999},
                {"description": "Travel", "quantity": 1, "rate": 50.5}
            ]
        })
    }

    #[test]
    fn test_create_applies_defaults() {
        let now = Utc::now();
        let invoice = Invoice::create(payload(valid_body()), now).expect("valid invoice");

        assert_eq!(invoice.invoice_number, "INV-001");
        assert_eq!(invoice.date, now);
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.items[0].quantity, Decimal::from(2));
        assert_eq!(invoice.items[1].rate, Decimal::new(505, 1));
        assert!(invoice.pos.is_empty());
    }

    #[test]
    fn test_create_rejects_out_of_range_tax_rate() {
        let mut body = valid_body();
        body["taxRate"] = json!(100.5);
        let err = Invoice::create(payload(body), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "`taxRate` must be between 0 and 100");
    }

    #[test]
    fn test_tax_rate_bounds_are_inclusive() {
        let mut body = valid_body();
        body["taxRate"] = json!(100);
        let invoice = Invoice::create(payload(body), Utc::now()).unwrap();
        assert_eq!(invoice.tax_rate, Decimal::ONE_HUNDRED);

        let mut body = valid_body();
        body["taxRate"] = json!(0);
        let invoice = Invoice::create(payload(body), Utc::now()).unwrap();
        assert_eq!(invoice.tax_rate, Decimal::ZERO);
    }

    #[test]
    fn test_create_rejects_negative_tax_rate() {
        let mut body = valid_body();
        body["taxRate"] = json!("-0.01");
        let err = Invoice::create(payload(body), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "`taxRate` must be between 0 and 100");
    }

    #[test]
    fn test_create_rejects_zero_quantity() {
        let mut body = valid_body();
        body["items"][1]["quantity"] = json!(0);
        let err = Invoice::create(payload(body), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "`items[1].quantity` must be at least 1");
    }

    #[test]
    fn test_create_rejects_negative_rate() {
        let mut body = valid_body();
        body["items"][0]["rate"] = json!(-1);
        assert!(Invoice::create(payload(body), Utc::now()).is_err());
    }

    #[test]
    fn test_create_requires_due_date() {
        let mut body = valid_body();
        body["dueDate"] = json!("");
        let err = Invoice::create(payload(body), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "`dueDate` is required");
    }

    #[test]
    fn test_client_ref_accepts_expanded_object() {
        let id = Uuid::new_v4();
        let as_id: ClientRef = serde_json::from_value(json!(id)).unwrap();
        let expanded: ClientRef =
            serde_json::from_value(json!({"_id": id, "clientName": "Acme", "gstin": "X"})).unwrap();

        assert_eq!(as_id.id(), id);
        assert_eq!(expanded.id(), id);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let mut body = valid_body();
        body["status"] = json!("archived");
        assert!(serde_json::from_value::<InvoicePayload>(body).is_err());
    }

    #[test]
    fn test_status_round_trips_through_column_text() {
        for status in [
            InvoiceStatus::Draft,
            InvoiceStatus::Sent,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<InvoiceStatus>(), Ok(status));
        }
        assert!("void".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let mut invoice = Invoice::create(payload(valid_body()), Utc::now()).unwrap();
        let client = invoice.client;

        invoice
            .apply_update(payload(json!({"status": "paid", "notes": "  settled "})), Utc::now())
            .unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.notes.as_deref(), Some("settled"));
        assert_eq!(invoice.client, client);
        assert_eq!(invoice.items.len(), 2);
    }
}
