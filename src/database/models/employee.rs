use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{optional, optional_patch, required, required_patch, string_enum, ValidationError};
use crate::database::changeset::Changeset;
use crate::types::double_option;

string_enum! {
    pub enum EmployeeStatus {
        Active => "active",
        OnLeave => "on_leave",
        Resigned => "resigned",
        Terminated => "terminated",
    }
}

/// One entry of the embedded provident-fund history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfContribution {
    pub month: NaiveDate,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub employee_code: String,
    pub name: String,
    pub designation: String,
    pub department: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub joining_date: NaiveDate,
    pub gross_salary: Decimal,
    pub pf_start_date: Option<NaiveDate>,
    pub provident_fund: Json<Vec<PfContribution>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Employee {
    pub const TABLE: &'static str = "employees";
    pub const SORTABLE: &'static [&'static str] =
        &["employee_code", "name", "department", "designation", "joining_date", "gross_salary", "created_at"];
    pub const SEARCHABLE: &'static [&'static str] = &["employee_code", "name", "designation", "email", "phone"];

    /// Sum of recorded contributions
    pub fn contributed(&self) -> Decimal {
        self.provident_fund.iter().map(|c| c.amount).sum()
    }
}

fn non_negative(field: &'static str, value: Decimal) -> Result<Decimal, ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new(field, "Must not be negative"));
    }
    Ok(value)
}

#[derive(Debug, Deserialize)]
pub struct CreateEmployee {
    pub employee_code: String,
    pub name: String,
    pub designation: String,
    pub department: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub joining_date: NaiveDate,
    #[serde(default)]
    pub gross_salary: Decimal,
    pub pf_start_date: Option<NaiveDate>,
    pub status: Option<EmployeeStatus>,
}

impl CreateEmployee {
    pub fn into_changeset(self) -> Result<Changeset, ValidationError> {
        if let Some(pf_start) = self.pf_start_date {
            if pf_start < self.joining_date {
                return Err(ValidationError::new("pf_start_date", "Cannot precede joining_date"));
            }
        }
        let mut cs = Changeset::new();
        cs.set("employee_code", required("employee_code", &self.employee_code)?)
            .set("name", required("name", &self.name)?)
            .set("designation", required("designation", &self.designation)?)
            .set("department", required("department", &self.department)?)
            .set("email", optional(self.email))
            .set("phone", optional(self.phone))
            .set("joining_date", self.joining_date)
            .set("gross_salary", non_negative("gross_salary", self.gross_salary)?)
            .set("pf_start_date", self.pf_start_date)
            .set("status", self.status.unwrap_or(EmployeeStatus::Active));
        Ok(cs)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEmployee {
    pub employee_code: Option<String>,
    pub name: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    pub joining_date: Option<NaiveDate>,
    pub gross_salary: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub pf_start_date: Option<Option<NaiveDate>>,
    pub status: Option<EmployeeStatus>,
}

impl UpdateEmployee {
    pub fn into_changeset(self) -> Result<Changeset, ValidationError> {
        let mut cs = Changeset::new();
        cs.set_opt("employee_code", required_patch("employee_code", self.employee_code)?)
            .set_opt("name", required_patch("name", self.name)?)
            .set_opt("designation", required_patch("designation", self.designation)?)
            .set_opt("department", required_patch("department", self.department)?)
            .set_opt("email", optional_patch(self.email))
            .set_opt("phone", optional_patch(self.phone))
            .set_opt("joining_date", self.joining_date)
            .set_opt(
                "gross_salary",
                self.gross_salary.map(|v| non_negative("gross_salary", v)).transpose()?,
            )
            .set_opt("pf_start_date", self.pf_start_date)
            .set_opt("status", self.status);
        Ok(cs)
    }
}

/// Body of `POST /api/employees/:id/provident-fund`
#[derive(Debug, Deserialize)]
pub struct AddContribution {
    pub month: NaiveDate,
    pub amount: Decimal,
    pub note: Option<String>,
}

impl AddContribution {
    pub fn into_entry(self) -> Result<PfContribution, ValidationError> {
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::new("amount", "Must be greater than zero"));
        }
        Ok(PfContribution {
            month: self.month,
            amount: self.amount,
            note: optional(self.note),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pf_start_cannot_precede_joining() {
        let input: CreateEmployee = serde_json::from_value(serde_json::json!({
            "employee_code": "E-1",
            "name": "Rahim",
            "designation": "Designer",
            "department": "Production",
            "joining_date": "2024-03-01",
            "gross_salary": "40000",
            "pf_start_date": "2024-01-01"
        }))
        .unwrap();
        assert_eq!(input.into_changeset().unwrap_err().field, "pf_start_date");
    }

    #[test]
    fn contributions_sum() {
        let entries = vec![
            PfContribution { month: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), amount: Decimal::from(3000), note: None },
            PfContribution { month: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), amount: Decimal::from(3000), note: None },
        ];
        let total: Decimal = entries.iter().map(|c| c.amount).sum();
        assert_eq!(total, Decimal::from(6000));
    }

    #[test]
    fn contribution_must_be_positive() {
        let add = AddContribution { month: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), amount: Decimal::ZERO, note: None };
        assert!(add.into_entry().is_err());
    }

    #[test]
    fn unknown_status_fails_to_parse() {
        let result: Result<UpdateEmployee, _> = serde_json::from_str(r#"{"status": "retired"}"#);
        assert!(result.is_err());
    }
}
