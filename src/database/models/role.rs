use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{optional, optional_patch, required, required_patch, ValidationError};
use crate::database::changeset::Changeset;
use crate::types::double_option;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Role {
    pub const TABLE: &'static str = "roles";
    pub const SORTABLE: &'static [&'static str] = &["name", "created_at", "updated_at"];
    pub const SEARCHABLE: &'static [&'static str] = &["name", "description"];
}

/// Trim, drop blanks and duplicates while keeping first-seen order
fn normalize(permissions: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(permissions.len());
    for p in permissions {
        let p = p.trim().to_string();
        if !p.is_empty() && !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

#[derive(Debug, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl CreateRole {
    /// Permissions are returned separately so the caller can check them against the catalog
    pub fn into_changeset(self) -> Result<(Changeset, Vec<String>), ValidationError> {
        let permissions = normalize(self.permissions);
        let mut cs = Changeset::new();
        cs.set("name", required("name", &self.name)?)
            .set("description", optional(self.description))
            .set("permissions", permissions.clone());
        Ok((cs, permissions))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub permissions: Option<Vec<String>>,
}

impl UpdateRole {
    pub fn into_changeset(self) -> Result<(Changeset, Vec<String>), ValidationError> {
        let permissions = self.permissions.map(normalize);
        let mut cs = Changeset::new();
        cs.set_opt("name", required_patch("name", self.name)?)
            .set_opt("description", optional_patch(self.description))
            .set_opt("permissions", permissions.clone());
        Ok((cs, permissions.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_are_normalized() {
        let perms = normalize(vec![" order:view ".into(), "order:view".into(), "".into(), "order:edit".into()]);
        assert_eq!(perms, vec!["order:view", "order:edit"]);
    }

    #[test]
    fn create_role_requires_name() {
        let input = CreateRole { name: " ".into(), description: None, permissions: vec![] };
        assert_eq!(input.into_changeset().unwrap_err().field, "name");
    }
}
