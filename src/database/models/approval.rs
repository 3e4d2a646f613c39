use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{optional, string_enum};

string_enum! {
    pub enum ApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

string_enum! {
    pub enum ApprovalAction {
        Delete => "delete",
        Restore => "restore",
    }
}

string_enum! {
    /// Tables an approval may act on; the text is the table name
    pub enum ApprovalTarget {
        Clients => "clients",
        Employees => "employees",
        Orders => "orders",
        Invoices => "invoices",
        Notices => "notices",
        Schedules => "schedules",
        Reports => "reports",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Approval {
    pub id: Uuid,
    pub target: String,
    pub target_id: Uuid,
    pub action: String,
    pub reason: Option<String>,
    pub status: String,
    pub requested_by: Uuid,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Approval {
    pub const TABLE: &'static str = "approvals";
    pub const SORTABLE: &'static [&'static str] = &["status", "target", "created_at", "reviewed_at"];
    pub const SEARCHABLE: &'static [&'static str] = &["reason", "review_note"];
}

#[derive(Debug, Deserialize)]
pub struct CreateApproval {
    pub target: ApprovalTarget,
    pub target_id: Uuid,
    pub action: ApprovalAction,
    pub reason: Option<String>,
}

impl CreateApproval {
    pub fn reason(&self) -> Option<String> {
        optional(self.reason.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewApproval {
    pub note: Option<String>,
}
