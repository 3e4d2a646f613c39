// handlers/protected/users.rs - /api/users

use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use super::utils::list_filter;
use crate::auth::permissions::{USER_CREATE, USER_DELETE, USER_EDIT, USER_VIEW};
use crate::auth::{self, session};
use crate::database::models::{CreateUser, UpdateUser, User};
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::filter::{FilterOp, Page, SortDirection};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::ListParams;

#[derive(Debug, Default, Deserialize)]
pub struct UserFilters {
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

fn repo(state: &AppState) -> Repository<User> {
    Repository::new(User::TABLE, "User", state.db.clone())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filters): ApiQuery<UserFilters>,
) -> ApiResult<Page<User>> {
    user.require(USER_VIEW)?;
    let mut filter = list_filter(User::TABLE, &params, User::SEARCHABLE, User::SORTABLE, ("username", SortDirection::Asc))?;
    filter
        .where_opt("role_id", FilterOp::Eq, filters.role_id)
        .where_opt("is_active", FilterOp::Eq, filters.is_active);
    Ok(ApiResponse::success(repo(&state).select_page(&filter).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<User> {
    user.require(USER_VIEW)?;
    Ok(ApiResponse::success(repo(&state).select_404(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateUser>,
) -> ApiResult<User> {
    user.require(USER_CREATE)?;
    auth::validate_password_strength(&body.password)?;
    let hash = auth::hash_password(&body.password)?;
    let created = repo(&state).insert(&body.into_changeset(hash)?).await?;
    tracing::info!("{} created user {}", user.username, created.username);
    Ok(ApiResponse::created(created))
}

/// PATCH /api/users/:id - a new password or deactivation also ends the user's sessions
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateUser>,
) -> ApiResult<User> {
    user.require(USER_EDIT)?;
    let hash = match body.password.as_deref() {
        Some(password) => {
            auth::validate_password_strength(password)?;
            Some(auth::hash_password(password)?)
        }
        None => None,
    };
    let revoke = hash.is_some() || body.is_active == Some(false);
    let changes = body.into_changeset(hash)?;

    let mut tx = state.db.begin().await.map_err(DatabaseError::from)?;
    let updated = repo(&state).update_with(&mut *tx, id, &changes).await?;
    if revoke {
        session::revoke_all(&mut *tx, id).await?;
    }
    tx.commit().await.map_err(DatabaseError::from)?;
    Ok(ApiResponse::success(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<User> {
    user.require(USER_DELETE)?;
    if id == user.user_id {
        return Err(ApiError::conflict("You cannot delete your own account"));
    }
    let mut tx = state.db.begin().await.map_err(DatabaseError::from)?;
    let deleted = repo(&state).soft_delete_with(&mut *tx, id).await?;
    session::revoke_all(&mut *tx, id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;
    Ok(ApiResponse::success(deleted))
}
