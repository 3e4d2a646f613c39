use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::database::models::{optional, required, CreateInvoice, Invoice, InvoiceItem, InvoiceStatus, Order, ValidationError};
use crate::database::{Changeset, DatabaseError, Repository};

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("An invoice needs at least one order")]
    NoOrders,

    #[error("Order {0} is listed twice")]
    DuplicateOrder(Uuid),

    #[error("Order {0} does not exist")]
    MissingOrder(Uuid),

    #[error("Order {0} belongs to another client")]
    ForeignOrder(Uuid),

    #[error("Order {0} is already invoiced")]
    AlreadyInvoiced(Uuid),

    #[error("Discount cannot be negative")]
    NegativeDiscount,

    #[error("Discount {discount} exceeds subtotal {subtotal}")]
    DiscountTooLarge { discount: Decimal, subtotal: Decimal },

    #[error("Client not found")]
    ClientNotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for InvoiceError {
    fn from(err: sqlx::Error) -> Self {
        InvoiceError::Database(err.into())
    }
}

/// Reject empty and duplicated order lists before touching the database
pub fn check_order_ids(order_ids: &[Uuid]) -> Result<(), InvoiceError> {
    if order_ids.is_empty() {
        return Err(InvoiceError::NoOrders);
    }
    let mut seen = HashSet::with_capacity(order_ids.len());
    for id in order_ids {
        if !seen.insert(*id) {
            return Err(InvoiceError::DuplicateOrder(*id));
        }
    }
    Ok(())
}

/// Turn the fetched orders into line items, in the order they were requested.
///
/// Every requested order must exist, belong to `client_id`, and not already
/// sit on an invoice.
pub fn build_items(client_id: Uuid, requested: &[Uuid], orders: &[Order]) -> Result<Vec<InvoiceItem>, InvoiceError> {
    requested
        .iter()
        .map(|id| {
            let order = orders.iter().find(|o| o.id == *id).ok_or(InvoiceError::MissingOrder(*id))?;
            if order.client_id != client_id {
                return Err(InvoiceError::ForeignOrder(*id));
            }
            if order.invoice_id.is_some() {
                return Err(InvoiceError::AlreadyInvoiced(*id));
            }
            Ok(InvoiceItem {
                order_id: order.id,
                title: order.title.clone(),
                quantity: order.quantity,
                rate: order.rate,
                amount: order.amount(),
            })
        })
        .collect()
}

/// `(subtotal, total)` where total = subtotal - discount
pub fn totals(items: &[InvoiceItem], discount: Decimal) -> Result<(Decimal, Decimal), InvoiceError> {
    if discount.is_sign_negative() && !discount.is_zero() {
        return Err(InvoiceError::NegativeDiscount);
    }
    let subtotal: Decimal = items.iter().map(|i| i.amount).sum();
    if discount > subtotal {
        return Err(InvoiceError::DiscountTooLarge { discount, subtotal });
    }
    Ok((subtotal, subtotal - discount))
}

pub struct InvoiceService {
    pool: PgPool,
    repo: Repository<Invoice>,
}

impl InvoiceService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(Invoice::TABLE, "Invoice", pool.clone()),
            pool,
        }
    }

    /// Insert the invoice and claim its orders in one transaction.
    /// Any failure rolls both steps back.
    pub async fn create(&self, input: CreateInvoice, created_by: Uuid) -> Result<Invoice, InvoiceError> {
        let invoice_number = required("invoice_number", &input.invoice_number)?;
        check_order_ids(&input.order_ids)?;

        let mut tx = self.pool.begin().await?;

        let client: Option<(String,)> =
            sqlx::query_as("SELECT currency FROM clients WHERE id = $1 AND deleted_at IS NULL")
                .bind(input.client_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (client_currency,) = client.ok_or(InvoiceError::ClientNotFound)?;

        // Row locks keep a concurrent invoice from claiming the same orders
        let orders: Vec<Order> =
            sqlx::query_as("SELECT * FROM orders WHERE id = ANY($1) AND deleted_at IS NULL FOR UPDATE")
                .bind(&input.order_ids[..])
                .fetch_all(&mut *tx)
                .await?;

        let items = build_items(input.client_id, &input.order_ids, &orders)?;
        let (subtotal, total) = totals(&items, input.discount)?;
        let items_json =
            serde_json::to_value(&items).map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        let mut cs = Changeset::new();
        cs.set("invoice_number", invoice_number)
            .set("client_id", input.client_id)
            .set("items", items_json)
            .set("subtotal", subtotal)
            .set("discount", input.discount)
            .set("total", total)
            .set("currency", input.currency.unwrap_or(client_currency))
            .set("issued_on", input.issued_on.unwrap_or_else(|| Utc::now().date_naive()))
            .set("due_on", input.due_on)
            .set("status", InvoiceStatus::Unpaid)
            .set("notes", optional(input.notes))
            .set("created_by", created_by);
        let invoice = self.repo.insert_with(&mut *tx, &cs).await?;

        claim_orders(&mut tx, invoice.id, &input.order_ids).await?;
        tx.commit().await?;

        info!("Issued invoice {} with {} orders", invoice.invoice_number, input.order_ids.len());
        Ok(invoice)
    }

    /// Soft delete the invoice and release its orders
    pub async fn delete(&self, id: Uuid) -> Result<Invoice, InvoiceError> {
        let mut tx = self.pool.begin().await?;
        let invoice = self.delete_with(&mut tx, id).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    pub async fn delete_with(&self, conn: &mut PgConnection, id: Uuid) -> Result<Invoice, InvoiceError> {
        let invoice = self.repo.soft_delete_with(&mut *conn, id).await?;
        sqlx::query("UPDATE orders SET invoice_id = NULL, updated_at = now() WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(invoice)
    }

    /// Restore the invoice and re-claim its orders; fails if another invoice took one
    pub async fn restore_with(&self, conn: &mut PgConnection, id: Uuid) -> Result<Invoice, InvoiceError> {
        let invoice = self.repo.restore_with(&mut *conn, id).await?;
        let order_ids: Vec<Uuid> = invoice.items.iter().map(|i| i.order_id).collect();
        claim_orders(conn, invoice.id, &order_ids).await?;
        Ok(invoice)
    }
}

/// Soft-delete an order that sits on no invoice, in one conditional update.
/// `Ok(None)` when there is no live order with that id.
pub async fn delete_unbilled_order(conn: &mut PgConnection, id: Uuid) -> Result<Option<Order>, InvoiceError> {
    let deleted: Option<Order> = sqlx::query_as(
        "UPDATE orders SET deleted_at = now(), updated_at = now() \
         WHERE id = $1 AND deleted_at IS NULL AND invoice_id IS NULL RETURNING *",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    if deleted.is_some() {
        return Ok(deleted);
    }

    let billed: Option<(bool,)> = sqlx::query_as("SELECT invoice_id IS NOT NULL FROM orders WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    match billed {
        Some((true,)) => Err(InvoiceError::AlreadyInvoiced(id)),
        _ => Ok(None),
    }
}

async fn claim_orders(conn: &mut PgConnection, invoice_id: Uuid, order_ids: &[Uuid]) -> Result<(), InvoiceError> {
    let claimed: Vec<(Uuid,)> = sqlx::query_as(
        "UPDATE orders SET invoice_id = $1, updated_at = now() \
         WHERE id = ANY($2) AND invoice_id IS NULL AND deleted_at IS NULL RETURNING id",
    )
    .bind(invoice_id)
    .bind(order_ids)
    .fetch_all(&mut *conn)
    .await?;

    if claimed.len() != order_ids.len() {
        let missing = order_ids
            .iter()
            .find(|id| !claimed.iter().any(|(c,)| c == *id))
            .copied()
            .unwrap_or(invoice_id);
        return Err(InvoiceError::AlreadyInvoiced(missing));
    }
    Ok(())
}
