use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{required, required_patch, ValidationError};
use crate::database::changeset::Changeset;
use crate::types::double_option;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub employee_id: Option<Uuid>,
    pub role_id: Uuid,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub const TABLE: &'static str = "users";
    pub const SORTABLE: &'static [&'static str] = &["username", "last_login_at", "created_at"];
    pub const SEARCHABLE: &'static [&'static str] = &["username"];
}

/// A user joined with its role; what login, refresh and whoami hand back
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub employee_id: Option<Uuid>,
    pub employee_name: Option<String>,
    pub role_id: Uuid,
    pub role: String,
    pub permissions: Vec<String>,
    pub is_active: bool,
}

impl UserProfile {
    pub const SELECT: &'static str = "SELECT u.id, u.username, u.password_hash, u.employee_id, \
         e.name AS employee_name, u.role_id, r.name AS role, r.permissions, u.is_active \
         FROM users u \
         JOIN roles r ON r.id = u.role_id AND r.deleted_at IS NULL \
         LEFT JOIN employees e ON e.id = u.employee_id AND e.deleted_at IS NULL \
         WHERE u.deleted_at IS NULL";
}

fn username(value: &str) -> Result<String, ValidationError> {
    let name = required("username", value)?.to_lowercase();
    if name.len() < 3 || !name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')) {
        return Err(ValidationError::new(
            "username",
            "At least 3 characters of letters, digits, '.', '_' or '-'",
        ));
    }
    Ok(name)
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub employee_id: Option<Uuid>,
    pub role_id: Uuid,
    pub is_active: Option<bool>,
}

impl CreateUser {
    /// `password_hash` is produced by the caller after strength checks
    pub fn into_changeset(self, password_hash: String) -> Result<Changeset, ValidationError> {
        let mut cs = Changeset::new();
        cs.set("username", username(&self.username)?)
            .set("password_hash", password_hash)
            .set("employee_id", self.employee_id)
            .set("role_id", self.role_id)
            .set("is_active", self.is_active.unwrap_or(true));
        Ok(cs)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub employee_id: Option<Option<Uuid>>,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl UpdateUser {
    pub fn into_changeset(self, password_hash: Option<String>) -> Result<Changeset, ValidationError> {
        let mut cs = Changeset::new();
        cs.set_opt(
            "username",
            required_patch("username", self.username)?.map(|u| username(&u)).transpose()?,
        )
        .set_opt("password_hash", password_hash)
        .set_opt("employee_id", self.employee_id)
        .set_opt("role_id", self.role_id)
        .set_opt("is_active", self.is_active);
        Ok(cs)
    }
}
