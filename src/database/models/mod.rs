//! Row types for every business table, plus the request bodies that create
//! and patch them. Inputs turn themselves into a `Changeset` after validation.

use std::collections::HashMap;

use thiserror::Error;

pub mod approval;
pub mod client;
pub mod employee;
pub mod invoice;
pub mod notice;
pub mod order;
pub mod report;
pub mod role;
pub mod schedule;
pub mod user;

pub use approval::{Approval, ApprovalAction, ApprovalStatus, ApprovalTarget, CreateApproval, ReviewApproval};
pub use client::{Client, CreateClient, UpdateClient};
pub use employee::{AddContribution, CreateEmployee, Employee, EmployeeStatus, PfContribution, UpdateEmployee};
pub use invoice::{CreateInvoice, Invoice, InvoiceItem, InvoiceStatus, UpdateInvoice};
pub use notice::{CreateNotice, Notice, UpdateNotice};
pub use order::{CreateOrder, Order, OrderStatus, UpdateOrder};
pub use report::{CreateReport, Report, ReportStatus, StatusCount, UpdateReport};
pub use role::{CreateRole, Role, UpdateRole};
pub use schedule::{CreateSchedule, Schedule, UpdateSchedule};
pub use user::{CreateUser, UpdateUser, User, UserProfile};

/// A request body field failed validation
#[derive(Debug, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }

    pub fn field_errors(&self) -> HashMap<String, String> {
        HashMap::from([(self.field.to_string(), self.message.clone())])
    }
}

/// Trimmed, non-empty text
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(field, "This field is required"));
    }
    Ok(value.to_string())
}

/// Blank strings become NULL
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// PATCH variant of `required`: absent stays absent, present must be non-empty
pub(crate) fn required_patch(field: &'static str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    value.map(|v| required(field, &v)).transpose()
}

/// PATCH variant of `optional` for nullable columns
pub(crate) fn optional_patch(value: Option<Option<String>>) -> Option<Option<String>> {
    value.map(optional)
}

/// Text-backed enum stored as a lowercase TEXT column
macro_rules! string_enum {
    ($(#[$meta:meta])* pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for $crate::filter::SqlParam {
            fn from(value: $name) -> Self {
                $crate::filter::SqlParam::from(value.as_str())
            }
        }
    };
}

pub(crate) use string_enum;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", "  Acme ").unwrap(), "Acme");
        let err = required("name", "   ").unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn optional_blank_is_none() {
        assert_eq!(optional(Some("  ".to_string())), None);
        assert_eq!(optional(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(optional_patch(Some(Some(String::new()))), Some(None));
    }

    #[test]
    fn string_enums_round_trip_text() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_string(&OrderStatus::Correction).unwrap(), "\"correction\"");
    }
}
