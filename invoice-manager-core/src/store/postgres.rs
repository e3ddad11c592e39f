use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::models::client::ContactDetails;
use crate::models::invoice::LineItem;
use crate::models::{Client, Invoice, PurchaseOrder};
use crate::store::{Store, StoreError, StoreResult};

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ClientRow {
    id: Uuid,
    username: String,
    client_name: String,
    billing_address: String,
    shipping_address: String,
    gstin: String,
    contact_person: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    pos: Json<Vec<PurchaseOrder>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            username: row.username,
            client_name: row.client_name,
            billing_address: row.billing_address,
            shipping_address: row.shipping_address,
            gstin: row.gstin,
            contact_person: row.contact_person,
            contact_details: ContactDetails {
                email: row.contact_email,
                phone: row.contact_phone,
            },
            pos: row.pos.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Line item as kept in the `items` JSONB column.
///
/// Decimals are written as strings so they reload with every digit intact;
/// JSON numbers would pass through `f64`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLineItem {
    description: String,
    #[serde(with = "rust_decimal::serde::str")]
    quantity: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
}

impl From<&LineItem> for StoredLineItem {
    fn from(item: &LineItem) -> Self {
        StoredLineItem {
            description: item.description.clone(),
            quantity: item.quantity,
            rate: item.rate,
            amount: item.amount,
        }
    }
}

impl From<StoredLineItem> for LineItem {
    fn from(item: StoredLineItem) -> Self {
        LineItem {
            description: item.description,
            quantity: item.quantity,
            rate: item.rate,
            amount: item.amount,
        }
    }
}

fn stored_items(items: &[LineItem]) -> Json<Vec<StoredLineItem>> {
    Json(items.iter().map(StoredLineItem::from).collect())
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: Uuid,
    invoice_number: String,
    client_id: Uuid,
    date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    pos: Json<Vec<PurchaseOrder>>,
    items: Json<Vec<StoredLineItem>>,
    subtotal: Decimal,
    tax_rate: Decimal,
    tax_amount: Decimal,
    total: Decimal,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = StoreError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|_| {
            StoreError::Corrupt(format!("invoice {} has status `{}`", row.id, row.status))
        })?;

        Ok(Invoice {
            id: row.id,
            invoice_number: row.invoice_number,
            client: row.client_id,
            date: row.date,
            due_date: row.due_date,
            pos: row.pos.0,
            items: row.items.0.into_iter().map(LineItem::from).collect(),
            subtotal: row.subtotal,
            tax_rate: row.tax_rate,
            tax_amount: row.tax_amount,
            total: row.total,
            status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const CLIENT_COLUMNS: &str = r#"
    id, username, client_name, billing_address, shipping_address, gstin,
    contact_person, contact_email, contact_phone, pos, created_at, updated_at
"#;

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, client_id, date, due_date, pos, items,
    subtotal, tax_rate, tax_amount, total, status, notes, created_at, updated_at
"#;

/// Maps a unique violation to `StoreError::Duplicate`, anything else to `Database`.
fn classify(err: sqlx::Error, field: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate { field };
        }
    }
    StoreError::Database(err)
}

fn into_invoices(rows: Vec<InvoiceRow>) -> StoreResult<Vec<Invoice>> {
    rows.into_iter().map(Invoice::try_from).collect()
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, client), fields(client_id = %client.id))]
    async fn insert_client(&self, client: &Client) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO clients (
                id, username, client_name, billing_address, shipping_address, gstin,
                contact_person, contact_email, contact_phone, pos, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12
            )
            "#,
        )
        .bind(client.id)
        .bind(&client.username)
        .bind(&client.client_name)
        .bind(&client.billing_address)
        .bind(&client.shipping_address)
        .bind(&client.gstin)
        .bind(&client.contact_person)
        .bind(&client.contact_details.email)
        .bind(&client.contact_details.phone)
        .bind(Json(&client.pos))
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "username"))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {} FROM clients ORDER BY created_at ASC",
            CLIENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_client(&self, id: Uuid) -> StoreResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {} FROM clients WHERE id = $1",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_clients(&self, ids: &[Uuid]) -> StoreResult<Vec<Client>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {} FROM clients WHERE id = ANY($1)",
            CLIENT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    #[instrument(skip(self, client), fields(client_id = %client.id))]
    async fn update_client(&self, client: &Client) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET
                username = $2,
                client_name = $3,
                billing_address = $4,
                shipping_address = $5,
                gstin = $6,
                contact_person = $7,
                contact_email = $8,
                contact_phone = $9,
                pos = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(client.id)
        .bind(&client.username)
        .bind(&client.client_name)
        .bind(&client.billing_address)
        .bind(&client.shipping_address)
        .bind(&client.gstin)
        .bind(&client.contact_person)
        .bind(&client.contact_details.email)
        .bind(&client.contact_details.phone)
        .bind(Json(&client.pos))
        .bind(client.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "username"))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, pos), fields(count = pos.len()))]
    async fn set_client_pos(
        &self,
        id: Uuid,
        pos: &[PurchaseOrder],
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE clients SET pos = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(Json(pos))
            .bind(updated_at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_client(&self, id: Uuid) -> StoreResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "DELETE FROM clients WHERE id = $1 RETURNING {}",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, client_id, date, due_date, pos, items,
                subtotal, tax_rate, tax_amount, total, status, notes, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15
            )
            "#,
        )
        .bind(invoice.id)
        .bind(&invoice.invoice_number)
        .bind(invoice.client)
        .bind(invoice.date)
        .bind(invoice.due_date)
        .bind(Json(&invoice.pos))
        .bind(stored_items(&invoice.items))
        .bind(invoice.subtotal)
        .bind(invoice.tax_rate)
        .bind(invoice.tax_amount)
        .bind(invoice.total)
        .bind(invoice.status.as_str())
        .bind(&invoice.notes)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "invoiceNumber"))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {} FROM invoices ORDER BY created_at DESC",
            INVOICE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        into_invoices(rows)
    }

    #[instrument(skip(self))]
    async fn get_invoice(&self, id: Uuid) -> StoreResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {} FROM invoices WHERE id = $1",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Invoice::try_from).transpose()
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn update_invoice(&self, invoice: &Invoice) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET
                invoice_number = $2,
                client_id = $3,
                date = $4,
                due_date = $5,
                pos = $6,
                items = $7,
                subtotal = $8,
                tax_rate = $9,
                tax_amount = $10,
                total = $11,
                status = $12,
                notes = $13,
                updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(invoice.id)
        .bind(&invoice.invoice_number)
        .bind(invoice.client)
        .bind(invoice.date)
        .bind(invoice.due_date)
        .bind(Json(&invoice.pos))
        .bind(stored_items(&invoice.items))
        .bind(invoice.subtotal)
        .bind(invoice.tax_rate)
        .bind(invoice.tax_amount)
        .bind(invoice.total)
        .bind(invoice.status.as_str())
        .bind(&invoice.notes)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "invoiceNumber"))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_invoice(&self, id: Uuid) -> StoreResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "DELETE FROM invoices WHERE id = $1 RETURNING {}",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Invoice::try_from).transpose()
    }
}
