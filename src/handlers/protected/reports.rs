// handlers/protected/reports.rs - /api/reports (CRM call reports)

use axum::{extract::State, Extension};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::utils::list_filter;
use crate::auth::permissions::{REPORT_CREATE, REPORT_DELETE, REPORT_EDIT, REPORT_VIEW};
use crate::database::models::{CreateReport, Report, ReportStatus, StatusCount, UpdateReport};
use crate::database::{QueryBuilder, Repository};
use crate::filter::{Filter, FilterOp, Page, SortDirection, SqlResult};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::ListParams;

#[derive(Debug, Default, Deserialize)]
pub struct ReportFilters {
    pub status: Option<ReportStatus>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub marketer_id: Option<Uuid>,
    pub is_lead: Option<bool>,
    pub call_from: Option<NaiveDate>,
    pub call_to: Option<NaiveDate>,
    /// Follow-ups scheduled for today or earlier
    pub follow_up_due: Option<bool>,
}

impl ReportFilters {
    fn apply(self, filter: &mut Filter) {
        filter
            .where_opt("status", FilterOp::Eq, self.status)
            .where_ilike("country", self.country.as_deref())
            .where_ilike("category", self.category.as_deref())
            .where_opt("marketer_id", FilterOp::Eq, self.marketer_id)
            .where_opt("is_lead", FilterOp::Eq, self.is_lead)
            .where_between("call_date", self.call_from, self.call_to);
        if self.follow_up_due == Some(true) {
            filter.where_op("follow_up_date", FilterOp::Lte, Utc::now().date_naive());
        }
    }
}

fn repo(state: &AppState) -> Repository<Report> {
    Repository::new(Report::TABLE, "Report", state.db.clone())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filters): ApiQuery<ReportFilters>,
) -> ApiResult<Page<Report>> {
    user.require(REPORT_VIEW)?;
    let mut filter = list_filter(Report::TABLE, &params, Report::SEARCHABLE, Report::SORTABLE, ("call_date", SortDirection::Desc))?;
    filters.apply(&mut filter);
    Ok(ApiResponse::success(repo(&state).select_page(&filter).await?))
}

/// GET /api/reports/stats - report counts per status, honouring the list filters
pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filters): ApiQuery<ReportFilters>,
) -> ApiResult<Vec<StatusCount>> {
    user.require(REPORT_VIEW)?;
    let mut filter = Filter::new(Report::TABLE)?;
    filter.search(Report::SEARCHABLE, params.search());
    filters.apply(&mut filter);

    let where_sql = filter.to_where_sql()?;
    let sql = SqlResult {
        query: format!(
            "SELECT \"status\", COUNT(*) AS count FROM \"{}\" WHERE {} GROUP BY \"status\" ORDER BY \"status\"",
            Report::TABLE,
            where_sql.query
        ),
        params: where_sql.params,
    };
    let counts = QueryBuilder::<StatusCount>::raw(sql).select_all(&state.db).await?;
    Ok(ApiResponse::success(counts))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Report> {
    user.require(REPORT_VIEW)?;
    Ok(ApiResponse::success(repo(&state).select_404(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateReport>,
) -> ApiResult<Report> {
    user.require(REPORT_CREATE)?;
    Ok(ApiResponse::created(repo(&state).insert(&body.into_changeset(user.user_id)?).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateReport>,
) -> ApiResult<Report> {
    user.require(REPORT_EDIT)?;
    let repo = repo(&state);
    let current = repo.select_404(id).await?;
    Ok(ApiResponse::success(repo.update(id, &body.into_changeset(&current)?).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Report> {
    user.require(REPORT_DELETE)?;
    Ok(ApiResponse::success(repo(&state).soft_delete(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_up_due_bounds_by_today() {
        let mut filter = Filter::new(Report::TABLE).unwrap();
        ReportFilters { follow_up_due: Some(true), is_lead: Some(true), ..Default::default() }.apply(&mut filter);
        let sql = filter.to_where_sql().unwrap();
        assert_eq!(
            sql.query,
            "\"deleted_at\" IS NULL AND \"is_lead\" = $1 AND \"follow_up_date\" <= $2"
        );
    }

    #[test]
    fn unknown_status_is_rejected_at_parse() {
        let parsed: Result<ReportFilters, _> = serde_json::from_value(serde_json::json!({ "status": "maybe" }));
        assert!(parsed.is_err());
    }
}
