use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{optional, optional_patch, required, required_patch, ValidationError};
use crate::database::changeset::Changeset;
use crate::types::double_option;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub client_code: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub currency: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Client {
    pub const TABLE: &'static str = "clients";
    pub const SORTABLE: &'static [&'static str] = &["client_code", "name", "country", "currency", "created_at", "updated_at"];
    pub const SEARCHABLE: &'static [&'static str] = &["client_code", "name", "contact_person", "email"];
}

#[derive(Debug, Deserialize)]
pub struct CreateClient {
    pub client_code: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl CreateClient {
    pub fn into_changeset(self) -> Result<Changeset, ValidationError> {
        let mut cs = Changeset::new();
        cs.set("client_code", required("client_code", &self.client_code)?)
            .set("name", required("name", &self.name)?)
            .set("contact_person", optional(self.contact_person))
            .set("email", optional(self.email))
            .set("phone", optional(self.phone))
            .set("country", optional(self.country))
            .set("currency", currency(self.currency.as_deref().unwrap_or("USD"))?)
            .set("address", optional(self.address))
            .set("notes", optional(self.notes));
        Ok(cs)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClient {
    pub client_code: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country: Option<Option<String>>,
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl UpdateClient {
    pub fn into_changeset(self) -> Result<Changeset, ValidationError> {
        let mut cs = Changeset::new();
        cs.set_opt("client_code", required_patch("client_code", self.client_code)?)
            .set_opt("name", required_patch("name", self.name)?)
            .set_opt("contact_person", optional_patch(self.contact_person))
            .set_opt("email", optional_patch(self.email))
            .set_opt("phone", optional_patch(self.phone))
            .set_opt("country", optional_patch(self.country))
            .set_opt("currency", self.currency.as_deref().map(currency).transpose()?)
            .set_opt("address", optional_patch(self.address))
            .set_opt("notes", optional_patch(self.notes));
        Ok(cs)
    }
}

/// ISO-4217 style three-letter code, upper-cased
fn currency(value: &str) -> Result<String, ValidationError> {
    let code = value.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::new("currency", "Expected a three-letter currency code"));
    }
    Ok(code)
}
