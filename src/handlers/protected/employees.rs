// handlers/protected/employees.rs - /api/employees, payroll and provident fund

use axum::{extract::State, Extension};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::utils::list_filter;
use crate::auth::permissions::{EMPLOYEE_CREATE, EMPLOYEE_DELETE, EMPLOYEE_EDIT, EMPLOYEE_PAYROLL, EMPLOYEE_VIEW};
use crate::config::config;
use crate::database::models::{AddContribution, CreateEmployee, Employee, EmployeeStatus, PfContribution, UpdateEmployee};
use crate::database::{DatabaseError, Repository};
use crate::filter::{FilterOp, Page, SortDirection};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::{ProvidentFund, SalaryBreakdown, SalaryStructure};
use crate::state::AppState;
use crate::types::ListParams;

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeFilters {
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
}

fn repo(state: &AppState) -> Repository<Employee> {
    Repository::new(Employee::TABLE, "Employee", state.db.clone())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filters): ApiQuery<EmployeeFilters>,
) -> ApiResult<Page<Employee>> {
    user.require(EMPLOYEE_VIEW)?;
    let mut filter = list_filter(
        Employee::TABLE,
        &params,
        Employee::SEARCHABLE,
        Employee::SORTABLE,
        ("employee_code", SortDirection::Asc),
    )?;
    filter
        .where_ilike("department", filters.department.as_deref())
        .where_opt("status", FilterOp::Eq, filters.status);
    Ok(ApiResponse::success(repo(&state).select_page(&filter).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Employee> {
    user.require(EMPLOYEE_VIEW)?;
    Ok(ApiResponse::success(repo(&state).select_404(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateEmployee>,
) -> ApiResult<Employee> {
    user.require(EMPLOYEE_CREATE)?;
    let employee = repo(&state).insert(&body.into_changeset()?).await?;
    Ok(ApiResponse::created(employee))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateEmployee>,
) -> ApiResult<Employee> {
    user.require(EMPLOYEE_EDIT)?;
    Ok(ApiResponse::success(repo(&state).update(id, &body.into_changeset()?).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Employee> {
    user.require(EMPLOYEE_DELETE)?;
    Ok(ApiResponse::success(repo(&state).soft_delete(id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct PayrollQuery {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PayrollStatement {
    pub employee_id: Uuid,
    pub employee_code: String,
    pub name: String,
    pub structure: SalaryStructure,
    pub salary: SalaryBreakdown,
    pub provident_fund: ProvidentFund,
    /// Sum of contributions actually recorded in the history
    pub contributed: Decimal,
    pub contributions: Vec<PfContribution>,
}

/// GET /api/employees/:id/payroll?as_of=YYYY-MM-DD
pub async fn payroll(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PayrollQuery>,
) -> ApiResult<PayrollStatement> {
    user.require(EMPLOYEE_PAYROLL)?;
    let employee = repo(&state).select_404(id).await?;

    let settings = &config().payroll;
    let structure = SalaryStructure::from_config(settings)?;
    let salary = SalaryBreakdown::from_gross(employee.gross_salary, &structure)?;
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let provident_fund = ProvidentFund::accrual(salary.basic, settings.pf_rate_percent, employee.pf_start_date, as_of)?;

    Ok(ApiResponse::success(PayrollStatement {
        employee_id: employee.id,
        contributed: employee.contributed(),
        employee_code: employee.employee_code,
        name: employee.name,
        structure,
        salary,
        provident_fund,
        contributions: employee.provident_fund.0,
    }))
}

/// POST /api/employees/:id/provident-fund - append one contribution entry
pub async fn add_contribution(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<AddContribution>,
) -> ApiResult<Employee> {
    user.require(EMPLOYEE_PAYROLL)?;
    let entry = body.into_entry()?;
    let entry = serde_json::to_value(vec![entry]).map_err(|e| DatabaseError::QueryError(e.to_string()))?;

    let employee: Employee = sqlx::query_as(
        "UPDATE employees SET provident_fund = provident_fund || $2, updated_at = now() \
         WHERE id = $1 AND deleted_at IS NULL RETURNING *",
    )
    .bind(id)
    .bind(sqlx::types::Json(entry))
    .fetch_optional(&state.db)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| DatabaseError::NotFound("Employee not found".to_string()))?;

    tracing::info!("{} recorded a provident fund entry for {}", user.username, employee.employee_code);
    Ok(ApiResponse::created(employee))
}
