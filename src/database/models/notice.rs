use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{required, required_patch, ValidationError};
use crate::database::changeset::Changeset;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notice {
    pub id: Uuid,
    pub notice_no: String,
    pub title: String,
    pub body: String,
    pub audience: String,
    pub published_on: NaiveDate,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Notice {
    pub const TABLE: &'static str = "notices";
    pub const SORTABLE: &'static [&'static str] = &["notice_no", "title", "published_on", "created_at"];
    pub const SEARCHABLE: &'static [&'static str] = &["notice_no", "title", "body"];
}

#[derive(Debug, Deserialize)]
pub struct CreateNotice {
    pub notice_no: String,
    pub title: String,
    pub body: String,
    pub audience: Option<String>,
    pub published_on: Option<NaiveDate>,
}

impl CreateNotice {
    pub fn into_changeset(self, created_by: Uuid) -> Result<Changeset, ValidationError> {
        let mut cs = Changeset::new();
        cs.set("notice_no", required("notice_no", &self.notice_no)?)
            .set("title", required("title", &self.title)?)
            .set("body", required("body", &self.body)?)
            .set("audience", required("audience", self.audience.as_deref().unwrap_or("all"))?)
            .set("published_on", self.published_on.unwrap_or_else(|| Utc::now().date_naive()))
            .set("created_by", created_by);
        Ok(cs)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateNotice {
    pub notice_no: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub audience: Option<String>,
    pub published_on: Option<NaiveDate>,
}

impl UpdateNotice {
    pub fn into_changeset(self) -> Result<Changeset, ValidationError> {
        let mut cs = Changeset::new();
        cs.set_opt("notice_no", required_patch("notice_no", self.notice_no)?)
            .set_opt("title", required_patch("title", self.title)?)
            .set_opt("body", required_patch("body", self.body)?)
            .set_opt("audience", required_patch("audience", self.audience)?)
            .set_opt("published_on", self.published_on);
        Ok(cs)
    }
}
