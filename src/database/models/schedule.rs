use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{optional, optional_patch, required, required_patch, ValidationError};
use crate::database::changeset::Changeset;
use crate::types::double_option;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub client_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Schedule {
    pub const TABLE: &'static str = "schedules";
    pub const SORTABLE: &'static [&'static str] = &["title", "starts_at", "ends_at", "created_at"];
    pub const SEARCHABLE: &'static [&'static str] = &["title", "description"];
}

pub fn check_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), ValidationError> {
    if ends_at < starts_at {
        return Err(ValidationError::new("ends_at", "Must not be before starts_at"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateSchedule {
    pub title: String,
    pub description: Option<String>,
    pub client_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl CreateSchedule {
    pub fn into_changeset(self, created_by: Uuid) -> Result<Changeset, ValidationError> {
        check_window(self.starts_at, self.ends_at)?;
        let mut cs = Changeset::new();
        cs.set("title", required("title", &self.title)?)
            .set("description", optional(self.description))
            .set("client_id", self.client_id)
            .set("employee_id", self.employee_id)
            .set("starts_at", self.starts_at)
            .set("ends_at", self.ends_at)
            .set("created_by", created_by);
        Ok(cs)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSchedule {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub client_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub employee_id: Option<Option<Uuid>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl UpdateSchedule {
    /// `current` supplies whichever bound the patch leaves untouched
    pub fn into_changeset(self, current: &Schedule) -> Result<Changeset, ValidationError> {
        check_window(
            self.starts_at.unwrap_or(current.starts_at),
            self.ends_at.unwrap_or(current.ends_at),
        )?;
        let mut cs = Changeset::new();
        cs.set_opt("title", required_patch("title", self.title)?)
            .set_opt("description", optional_patch(self.description))
            .set_opt("client_id", self.client_id)
            .set_opt("employee_id", self.employee_id)
            .set_opt("starts_at", self.starts_at)
            .set_opt("ends_at", self.ends_at);
        Ok(cs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn schedule(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            title: "Client call".into(),
            description: None,
            client_id: None,
            employee_id: None,
            starts_at,
            ends_at,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn end_before_start_is_rejected() {
        let now = Utc::now();
        let input = CreateSchedule {
            title: "Standup".into(),
            description: None,
            client_id: None,
            employee_id: None,
            starts_at: now,
            ends_at: now - Duration::minutes(1),
        };
        assert_eq!(input.into_changeset(Uuid::new_v4()).unwrap_err().field, "ends_at");
    }

    #[test]
    fn patch_checks_against_stored_bound() {
        let now = Utc::now();
        let current = schedule(now, now + Duration::hours(1));

        let moves_start_past_end = UpdateSchedule { starts_at: Some(now + Duration::hours(2)), ..Default::default() };
        assert!(moves_start_past_end.into_changeset(&current).is_err());

        let extends = UpdateSchedule { ends_at: Some(now + Duration::hours(3)), ..Default::default() };
        assert_eq!(extends.into_changeset(&current).unwrap().len(), 1);
    }

    #[test]
    fn zero_length_window_is_allowed() {
        let now = Utc::now();
        assert!(check_window(now, now).is_ok());
    }
}
