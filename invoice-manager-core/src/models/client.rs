use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::billing::purchase_orders::merge_purchase_orders;
use crate::models::fields::{required, trimmed, ValidationError};
use crate::models::purchase_order::{PurchaseOrder, PurchaseOrderInput};

/// How to reach a client. Email is stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactDetails {
    fn normalized(email: Option<String>, phone: Option<String>) -> Self {
        Self {
            email: trimmed(email).map(|e| e.to_lowercase()),
            phone: trimmed(phone),
        }
    }
}

/// Client model representing a billed customer.
///
/// Maps to the `clients` table. The purchase orders seen on this client's
/// invoices accumulate in `pos`, unique by PO number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique identifier for the client
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Login-style handle, unique across all clients
    pub username: String,

    /// Display name printed on invoices
    pub client_name: String,

    pub billing_address: String,

    pub shipping_address: String,

    /// Tax registration number, stored verbatim
    pub gstin: String,

    pub contact_person: Option<String>,

    pub contact_details: ContactDetails,

    /// Known purchase orders
    pub pos: Vec<PurchaseOrder>,

    /// Timestamp when the client was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the client was last updated
    pub updated_at: DateTime<Utc>,
}

/// Contact details as submitted in a request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactDetailsInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Client creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClient {
    pub username: Option<String>,
    pub client_name: Option<String>,
    pub billing_address: Option<String>,
    pub shipping_address: Option<String>,
    pub gstin: Option<String>,
    pub contact_person: Option<String>,
    pub contact_details: Option<ContactDetailsInput>,
}

/// Client update request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    pub username: Option<String>,
    pub client_name: Option<String>,
    pub billing_address: Option<String>,
    pub shipping_address: Option<String>,
    pub gstin: Option<String>,
    pub contact_person: Option<String>,
    pub contact_details: Option<ContactDetailsInput>,
    pub pos: Option<Vec<PurchaseOrderInput>>,
}

impl Client {
    /// Builds a new client from a creation request.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` listing every required field that is
    /// missing or blank.
    pub fn create(request: CreateClient, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let fields = [
            ("username", trimmed(request.username)),
            ("clientName", trimmed(request.client_name)),
            ("billingAddress", trimmed(request.billing_address)),
            ("shippingAddress", trimmed(request.shipping_address)),
            ("gstin", trimmed(request.gstin)),
        ];

        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::new(format!(
                "Required fields are missing: {}",
                missing.join(", ")
            )));
        }

        let [username, client_name, billing_address, shipping_address, gstin] =
            fields.map(|(_, value)| value.unwrap_or_default());
        let contact = request.contact_details.unwrap_or_default();

        Ok(Client {
            id: Uuid::new_v4(),
            username,
            client_name,
            billing_address,
            shipping_address,
            gstin,
            contact_person: trimmed(request.contact_person),
            contact_details: ContactDetails::normalized(contact.email, contact.phone),
            pos: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update, re-validating every provided field.
    ///
    /// Required fields may be replaced but not blanked. A provided `pos`
    /// list replaces the current one after dropping blank rows and
    /// duplicate PO numbers.
    pub fn apply_update(
        &mut self,
        update: UpdateClient,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if update.username.is_some() {
            self.username = required("username", update.username)?;
        }
        if update.client_name.is_some() {
            self.client_name = required("clientName", update.client_name)?;
        }
        if update.billing_address.is_some() {
            self.billing_address = required("billingAddress", update.billing_address)?;
        }
        if update.shipping_address.is_some() {
            self.shipping_address = required("shippingAddress", update.shipping_address)?;
        }
        if update.gstin.is_some() {
            self.gstin = required("gstin", update.gstin)?;
        }
        if update.contact_person.is_some() {
            self.contact_person = trimmed(update.contact_person);
        }
        if let Some(contact) = update.contact_details {
            self.contact_details = ContactDetails::normalized(contact.email, contact.phone);
        }
        if let Some(pos) = update.pos {
            let candidates: Vec<PurchaseOrder> = pos
                .into_iter()
                .filter_map(PurchaseOrderInput::into_client_po)
                .collect();
            let mut merged = Vec::with_capacity(candidates.len());
            merge_purchase_orders(&mut merged, &candidates);
            self.pos = merged;
        }

        self.updated_at = now;
        Ok(())
    }
}

/// Client fields embedded in invoice listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub client_name: String,
    pub gstin: String,
}

impl From<Client> for ClientSummary {
    fn from(client: Client) -> Self {
        ClientSummary {
            id: client.id,
            client_name: client.client_name,
            gstin: client.gstin,
        }
    }
}

/// Client fields embedded in a single invoice view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub client_name: String,
    pub gstin: String,
    pub billing_address: String,
    pub shipping_address: String,
}

impl From<Client> for ClientDetail {
    fn from(client: Client) -> Self {
        ClientDetail {
            id: client.id,
            client_name: client.client_name,
            gstin: client.gstin,
            billing_address: client.billing_address,
            shipping_address: client.shipping_address,
        }
    }
}
