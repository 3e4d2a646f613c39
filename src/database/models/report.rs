use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{optional, optional_patch, required, required_patch, string_enum, ValidationError};
use crate::database::changeset::Changeset;
use crate::types::double_option;

string_enum! {
    /// Outcome of a marketing call
    pub enum ReportStatus {
        Called => "called",
        Interested => "interested",
        FollowUp => "follow_up",
        NotInterested => "not_interested",
        Converted => "converted",
    }
}

/// A CRM call report; `is_lead` marks prospects worth pursuing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub company_name: String,
    pub contact_person: Option<String>,
    pub designation: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub category: Option<String>,
    pub call_date: NaiveDate,
    pub follow_up_date: Option<NaiveDate>,
    pub status: String,
    pub is_lead: bool,
    pub notes: Option<String>,
    pub marketer_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Report {
    pub const TABLE: &'static str = "reports";
    pub const SORTABLE: &'static [&'static str] =
        &["company_name", "country", "category", "call_date", "follow_up_date", "status", "created_at"];
    pub const SEARCHABLE: &'static [&'static str] = &["company_name", "contact_person", "email", "website", "notes"];
}

/// Per-status count returned by `GET /api/reports/stats`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

fn check_follow_up(call_date: NaiveDate, follow_up: Option<NaiveDate>) -> Result<(), ValidationError> {
    match follow_up {
        Some(date) if date < call_date => Err(ValidationError::new("follow_up_date", "Must not be before call_date")),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateReport {
    pub company_name: String,
    pub contact_person: Option<String>,
    pub designation: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub category: Option<String>,
    pub call_date: Option<NaiveDate>,
    pub follow_up_date: Option<NaiveDate>,
    pub status: Option<ReportStatus>,
    #[serde(default)]
    pub is_lead: bool,
    pub notes: Option<String>,
}

impl CreateReport {
    /// Reports always belong to the marketer who files them
    pub fn into_changeset(self, marketer_id: Uuid) -> Result<Changeset, ValidationError> {
        let call_date = self.call_date.unwrap_or_else(|| Utc::now().date_naive());
        check_follow_up(call_date, self.follow_up_date)?;
        let mut cs = Changeset::new();
        cs.set("company_name", required("company_name", &self.company_name)?)
            .set("contact_person", optional(self.contact_person))
            .set("designation", optional(self.designation))
            .set("email", optional(self.email))
            .set("phone", optional(self.phone))
            .set("country", optional(self.country))
            .set("website", optional(self.website))
            .set("category", optional(self.category))
            .set("call_date", call_date)
            .set("follow_up_date", self.follow_up_date)
            .set("status", self.status.unwrap_or(ReportStatus::Called))
            .set("is_lead", self.is_lead)
            .set("notes", optional(self.notes))
            .set("marketer_id", marketer_id);
        Ok(cs)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReport {
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub designation: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    pub call_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub follow_up_date: Option<Option<NaiveDate>>,
    pub status: Option<ReportStatus>,
    pub is_lead: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl UpdateReport {
    pub fn into_changeset(self, current: &Report) -> Result<Changeset, ValidationError> {
        check_follow_up(
            self.call_date.unwrap_or(current.call_date),
            self.follow_up_date.unwrap_or(current.follow_up_date),
        )?;
        let mut cs = Changeset::new();
        cs.set_opt("company_name", required_patch("company_name", self.company_name)?)
            .set_opt("contact_person", optional_patch(self.contact_person))
            .set_opt("designation", optional_patch(self.designation))
            .set_opt("email", optional_patch(self.email))
            .set_opt("phone", optional_patch(self.phone))
            .set_opt("country", optional_patch(self.country))
            .set_opt("website", optional_patch(self.website))
            .set_opt("category", optional_patch(self.category))
            .set_opt("call_date", self.call_date)
            .set_opt("follow_up_date", self.follow_up_date)
            .set_opt("status", self.status)
            .set_opt("is_lead", self.is_lead)
            .set_opt("notes", optional_patch(self.notes));
        Ok(cs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_up_cannot_precede_call() {
        let input: CreateReport = serde_json::from_value(serde_json::json!({
            "company_name": "Pixel Studio",
            "call_date": "2024-05-10",
            "follow_up_date": "2024-05-01"
        }))
        .unwrap();
        assert_eq!(input.into_changeset(Uuid::new_v4()).unwrap_err().field, "follow_up_date");
    }

    #[test]
    fn status_uses_snake_case() {
        let patch: UpdateReport = serde_json::from_str(r#"{"status":"not_interested"}"#).unwrap();
        assert_eq!(patch.status, Some(ReportStatus::NotInterested));
    }
}
