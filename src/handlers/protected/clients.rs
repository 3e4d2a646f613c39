// handlers/protected/clients.rs - /api/clients

use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use super::utils::list_filter;
use crate::auth::permissions::{CLIENT_CREATE, CLIENT_DELETE, CLIENT_EDIT, CLIENT_VIEW};
use crate::database::models::{Client, CreateClient, UpdateClient};
use crate::database::Repository;
use crate::filter::{FilterOp, Page, SortDirection};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::ListParams;

#[derive(Debug, Default, Deserialize)]
pub struct ClientFilters {
    pub country: Option<String>,
    pub currency: Option<String>,
}

fn repo(state: &AppState) -> Repository<Client> {
    Repository::new(Client::TABLE, "Client", state.db.clone())
}

/// GET /api/clients - `?country=&currency=` plus the common list params
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filters): ApiQuery<ClientFilters>,
) -> ApiResult<Page<Client>> {
    user.require(CLIENT_VIEW)?;
    let mut filter = list_filter(Client::TABLE, &params, Client::SEARCHABLE, Client::SORTABLE, ("name", SortDirection::Asc))?;
    filter
        .where_ilike("country", filters.country.as_deref())
        .where_opt("currency", FilterOp::Eq, filters.currency.map(|c| c.trim().to_ascii_uppercase()));
    Ok(ApiResponse::success(repo(&state).select_page(&filter).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Client> {
    user.require(CLIENT_VIEW)?;
    Ok(ApiResponse::success(repo(&state).select_404(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateClient>,
) -> ApiResult<Client> {
    user.require(CLIENT_CREATE)?;
    let client = repo(&state).insert(&body.into_changeset()?).await?;
    Ok(ApiResponse::created(client))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateClient>,
) -> ApiResult<Client> {
    user.require(CLIENT_EDIT)?;
    Ok(ApiResponse::success(repo(&state).update(id, &body.into_changeset()?).await?))
}

/// DELETE /api/clients/:id - soft delete; restore goes through an approval
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Client> {
    user.require(CLIENT_DELETE)?;
    Ok(ApiResponse::success(repo(&state).soft_delete(id).await?))
}
