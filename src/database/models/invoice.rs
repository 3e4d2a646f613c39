use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{optional_patch, string_enum, ValidationError};
use crate::database::changeset::Changeset;
use crate::types::double_option;

string_enum! {
    pub enum InvoiceStatus {
        Unpaid => "unpaid",
        Partial => "partial",
        Paid => "paid",
        Cancelled => "cancelled",
    }
}

/// An invoiced order, frozen at the moment the invoice was issued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub order_id: Uuid,
    pub title: String,
    pub quantity: i32,
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub client_id: Uuid,
    pub items: Json<Vec<InvoiceItem>>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub issued_on: NaiveDate,
    pub due_on: Option<NaiveDate>,
    pub status: String,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub const TABLE: &'static str = "invoices";
    pub const SORTABLE: &'static [&'static str] =
        &["invoice_number", "issued_on", "due_on", "total", "status", "created_at"];
    pub const SEARCHABLE: &'static [&'static str] = &["invoice_number", "notes"];
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoice {
    pub invoice_number: String,
    pub client_id: Uuid,
    pub order_ids: Vec<Uuid>,
    #[serde(default)]
    pub discount: Decimal,
    pub currency: Option<String>,
    pub issued_on: Option<NaiveDate>,
    pub due_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Only bookkeeping fields are editable; items and amounts are fixed at issue
#[derive(Debug, Default, Deserialize)]
pub struct UpdateInvoice {
    pub status: Option<InvoiceStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_on: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl UpdateInvoice {
    pub fn into_changeset(self) -> Result<Changeset, ValidationError> {
        let mut cs = Changeset::new();
        cs.set_opt("status", self.status)
            .set_opt("due_on", self.due_on)
            .set_opt("notes", optional_patch(self.notes));
        Ok(cs)
    }
}
