// handlers/protected/roles.rs - /api/roles and the permission catalog

use axum::{extract::State, Extension};
use serde::Serialize;
use uuid::Uuid;

use super::utils::list_filter;
use crate::auth::permissions::{self, PermissionGroup, CATALOG, ROLE_CREATE, ROLE_DELETE, ROLE_EDIT, ROLE_VIEW};
use crate::database::models::{CreateRole, Role, UpdateRole};
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::filter::{Page, SortDirection};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::ListParams;

fn repo(state: &AppState) -> Repository<Role> {
    Repository::new(Role::TABLE, "Role", state.db.clone())
}

#[derive(Debug, Serialize)]
pub struct Catalog {
    pub groups: &'static [PermissionGroup],
    pub permissions: Vec<String>,
}

/// GET /api/roles/permissions - every permission a role may grant
pub async fn catalog(Extension(user): Extension<AuthUser>) -> ApiResult<Catalog> {
    user.require(ROLE_VIEW)?;
    Ok(ApiResponse::success(Catalog { groups: CATALOG, permissions: permissions::all() }))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Page<Role>> {
    user.require(ROLE_VIEW)?;
    let filter = list_filter(Role::TABLE, &params, Role::SEARCHABLE, Role::SORTABLE, ("name", SortDirection::Asc))?;
    Ok(ApiResponse::success(repo(&state).select_page(&filter).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Role> {
    user.require(ROLE_VIEW)?;
    Ok(ApiResponse::success(repo(&state).select_404(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateRole>,
) -> ApiResult<Role> {
    user.require(ROLE_CREATE)?;
    let (changes, perms) = body.into_changeset()?;
    permissions::validate(&perms)?;
    Ok(ApiResponse::created(repo(&state).insert(&changes).await?))
}

/// PATCH /api/roles/:id - permission changes reach users at their next login or refresh
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateRole>,
) -> ApiResult<Role> {
    user.require(ROLE_EDIT)?;
    let (changes, perms) = body.into_changeset()?;
    permissions::validate(&perms)?;
    Ok(ApiResponse::success(repo(&state).update(id, &changes).await?))
}

/// DELETE /api/roles/:id - 409 while any live user still holds the role
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Role> {
    user.require(ROLE_DELETE)?;
    let mut tx = state.db.begin().await.map_err(DatabaseError::from)?;

    // Lock the role so no user can be assigned to it between the check and the delete
    sqlx::query("SELECT id FROM roles WHERE id = $1 FOR UPDATE")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;
    let (assigned,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role_id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;
    if assigned > 0 {
        return Err(ApiError::conflict(format!("Role is still assigned to {} user(s)", assigned)));
    }

    let deleted = repo(&state).soft_delete_with(&mut *tx, id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;
    Ok(ApiResponse::success(deleted))
}
