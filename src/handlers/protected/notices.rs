// handlers/protected/notices.rs - /api/notices

use axum::{extract::State, Extension};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::utils::list_filter;
use crate::auth::permissions::{NOTICE_CREATE, NOTICE_DELETE, NOTICE_EDIT, NOTICE_VIEW};
use crate::database::models::{CreateNotice, Notice, UpdateNotice};
use crate::database::Repository;
use crate::filter::{FilterOp, Page, SortDirection};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::ListParams;

#[derive(Debug, Default, Deserialize)]
pub struct NoticeFilters {
    pub audience: Option<String>,
    pub published_from: Option<NaiveDate>,
    pub published_to: Option<NaiveDate>,
}

fn repo(state: &AppState) -> Repository<Notice> {
    Repository::new(Notice::TABLE, "Notice", state.db.clone())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filters): ApiQuery<NoticeFilters>,
) -> ApiResult<Page<Notice>> {
    user.require(NOTICE_VIEW)?;
    let mut filter = list_filter(Notice::TABLE, &params, Notice::SEARCHABLE, Notice::SORTABLE, ("published_on", SortDirection::Desc))?;
    filter
        .where_opt("audience", FilterOp::Eq, filters.audience.map(|a| a.trim().to_string()))
        .where_between("published_on", filters.published_from, filters.published_to);
    Ok(ApiResponse::success(repo(&state).select_page(&filter).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Notice> {
    user.require(NOTICE_VIEW)?;
    Ok(ApiResponse::success(repo(&state).select_404(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateNotice>,
) -> ApiResult<Notice> {
    user.require(NOTICE_CREATE)?;
    Ok(ApiResponse::created(repo(&state).insert(&body.into_changeset(user.user_id)?).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateNotice>,
) -> ApiResult<Notice> {
    user.require(NOTICE_EDIT)?;
    Ok(ApiResponse::success(repo(&state).update(id, &body.into_changeset()?).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Notice> {
    user.require(NOTICE_DELETE)?;
    Ok(ApiResponse::success(repo(&state).soft_delete(id).await?))
}
