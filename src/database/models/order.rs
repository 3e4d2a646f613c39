use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{optional, optional_patch, required, required_patch, string_enum, ValidationError};
use crate::database::changeset::Changeset;
use crate::types::double_option;

string_enum! {
    /// Production lifecycle of an order
    pub enum OrderStatus {
        Pending => "pending",
        Running => "running",
        Correction => "correction",
        Uploaded => "uploaded",
        Paused => "paused",
        Cancelled => "cancelled",
        Finished => "finished",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub task: Option<String>,
    pub quantity: i32,
    pub rate: Decimal,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub invoice_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    pub const TABLE: &'static str = "orders";
    pub const SORTABLE: &'static [&'static str] =
        &["title", "status", "quantity", "rate", "delivery_date", "created_at", "updated_at"];
    pub const SEARCHABLE: &'static [&'static str] = &["title", "task", "notes"];

    pub fn amount(&self) -> Decimal {
        Decimal::from(self.quantity) * self.rate
    }
}

fn quantity(value: i32) -> Result<i32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::new("quantity", "Must not be negative"));
    }
    Ok(value)
}

fn rate(value: Decimal) -> Result<Decimal, ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("rate", "Must not be negative"));
    }
    Ok(value)
}

#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    pub client_id: Uuid,
    pub title: String,
    pub task: Option<String>,
    pub quantity: Option<i32>,
    pub rate: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub assigned_to: Option<Uuid>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl CreateOrder {
    pub fn into_changeset(self, created_by: Uuid) -> Result<Changeset, ValidationError> {
        let mut cs = Changeset::new();
        cs.set("client_id", self.client_id)
            .set("title", required("title", &self.title)?)
            .set("task", optional(self.task))
            .set("quantity", quantity(self.quantity.unwrap_or(1))?)
            .set("rate", rate(self.rate.unwrap_or_default())?)
            .set("status", self.status.unwrap_or(OrderStatus::Pending))
            .set("assigned_to", self.assigned_to)
            .set("delivery_date", self.delivery_date)
            .set("notes", optional(self.notes))
            .set("created_by", created_by);
        Ok(cs)
    }
}

/// `invoice_id` is absent on purpose: orders are only invoiced through invoice creation
#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrder {
    pub client_id: Option<Uuid>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub task: Option<Option<String>>,
    pub quantity: Option<i32>,
    pub rate: Option<Decimal>,
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub delivery_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl UpdateOrder {
    pub fn into_changeset(self) -> Result<Changeset, ValidationError> {
        let mut cs = Changeset::new();
        cs.set_opt("client_id", self.client_id)
            .set_opt("title", required_patch("title", self.title)?)
            .set_opt("task", optional_patch(self.task))
            .set_opt("quantity", self.quantity.map(quantity).transpose()?)
            .set_opt("rate", self.rate.map(rate).transpose()?)
            .set_opt("status", self.status)
            .set_opt("assigned_to", self.assigned_to)
            .set_opt("delivery_date", self.delivery_date)
            .set_opt("notes", optional_patch(self.notes));
        Ok(cs)
    }

    /// Billing fields cannot change once an order sits on an invoice
    pub fn touches_billing(&self) -> bool {
        self.client_id.is_some() || self.quantity.is_some() || self.rate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults() {
        let input: CreateOrder = serde_json::from_value(serde_json::json!({
            "client_id": Uuid::new_v4(),
            "title": "Clipping path batch"
        }))
        .unwrap();
        let cs = input.into_changeset(Uuid::new_v4()).unwrap();
        let sql = cs.to_insert_sql(Order::TABLE).unwrap();
        assert!(sql.params.contains(&crate::filter::SqlParam::Text(Some("pending".into()))));
        assert!(sql.params.contains(&crate::filter::SqlParam::Int4(Some(1))));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let input = UpdateOrder { quantity: Some(-2), ..Default::default() };
        assert!(input.touches_billing());
        assert_eq!(input.into_changeset().unwrap_err().field, "quantity");
    }

    #[test]
    fn status_must_be_known() {
        assert!(serde_json::from_str::<UpdateOrder>(r#"{"status":"shipped"}"#).is_err());
        let patch: UpdateOrder = serde_json::from_str(r#"{"status":"correction"}"#).unwrap();
        assert_eq!(patch.status, Some(OrderStatus::Correction));
    }
}
