// handlers/protected/schedules.rs - /api/schedules

use axum::{extract::State, Extension};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::utils::{day_end, day_start, list_filter};
use crate::auth::permissions::{SCHEDULE_CREATE, SCHEDULE_DELETE, SCHEDULE_EDIT, SCHEDULE_VIEW};
use crate::database::models::{CreateSchedule, Schedule, UpdateSchedule};
use crate::database::Repository;
use crate::filter::{FilterOp, Page, SortDirection};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::ListParams;

/// `from`/`to` select entries whose window overlaps the given days
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleFilters {
    pub client_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

fn repo(state: &AppState) -> Repository<Schedule> {
    Repository::new(Schedule::TABLE, "Schedule", state.db.clone())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filters): ApiQuery<ScheduleFilters>,
) -> ApiResult<Page<Schedule>> {
    user.require(SCHEDULE_VIEW)?;
    let mut filter = list_filter(Schedule::TABLE, &params, Schedule::SEARCHABLE, Schedule::SORTABLE, ("starts_at", SortDirection::Asc))?;
    filter
        .where_opt("client_id", FilterOp::Eq, filters.client_id)
        .where_opt("employee_id", FilterOp::Eq, filters.employee_id)
        // Overlap: the entry ends after the window opens and starts before it closes
        .where_opt("ends_at", FilterOp::Gte, day_start(filters.from))
        .where_opt("starts_at", FilterOp::Lte, day_end(filters.to));
    Ok(ApiResponse::success(repo(&state).select_page(&filter).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Schedule> {
    user.require(SCHEDULE_VIEW)?;
    Ok(ApiResponse::success(repo(&state).select_404(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateSchedule>,
) -> ApiResult<Schedule> {
    user.require(SCHEDULE_CREATE)?;
    Ok(ApiResponse::created(repo(&state).insert(&body.into_changeset(user.user_id)?).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateSchedule>,
) -> ApiResult<Schedule> {
    user.require(SCHEDULE_EDIT)?;
    let repo = repo(&state);
    let current = repo.select_404(id).await?;
    Ok(ApiResponse::success(repo.update(id, &body.into_changeset(&current)?).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Schedule> {
    user.require(SCHEDULE_DELETE)?;
    Ok(ApiResponse::success(repo(&state).soft_delete(id).await?))
}
