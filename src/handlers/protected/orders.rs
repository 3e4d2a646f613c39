// handlers/protected/orders.rs - /api/orders

use axum::{extract::State, Extension};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::utils::{day_end, day_start, list_filter, parse_ids};
use crate::auth::permissions::{ORDER_CREATE, ORDER_DELETE, ORDER_EDIT, ORDER_VIEW};
use crate::database::models::{CreateOrder, Order, OrderStatus, UpdateOrder};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{FilterOp, Page, SortDirection};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::delete_unbilled_order;
use crate::state::AppState;
use crate::types::ListParams;

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilters {
    pub status: Option<OrderStatus>,
    pub client_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub delivery_from: Option<NaiveDate>,
    pub delivery_to: Option<NaiveDate>,
    /// true: only orders on an invoice; false: only unbilled orders
    pub invoiced: Option<bool>,
    /// Comma-separated order ids
    pub ids: Option<String>,
}

fn repo(state: &AppState) -> Repository<Order> {
    Repository::new(Order::TABLE, "Order", state.db.clone())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filters): ApiQuery<OrderFilters>,
) -> ApiResult<Page<Order>> {
    user.require(ORDER_VIEW)?;
    let mut filter = list_filter(Order::TABLE, &params, Order::SEARCHABLE, Order::SORTABLE, ("created_at", SortDirection::Desc))?;
    filter
        .where_opt("status", FilterOp::Eq, filters.status)
        .where_opt("client_id", FilterOp::Eq, filters.client_id)
        .where_opt("assigned_to", FilterOp::Eq, filters.assigned_to)
        .where_between("delivery_date", day_start(filters.delivery_from), day_end(filters.delivery_to));
    match filters.invoiced {
        Some(true) => {
            filter.where_not_null("invoice_id");
        }
        Some(false) => {
            filter.where_null("invoice_id");
        }
        None => {}
    }
    if let Some(ids) = filters.ids.as_deref() {
        filter.where_in("id", parse_ids(ids)?);
    }
    Ok(ApiResponse::success(repo(&state).select_page(&filter).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Order> {
    user.require(ORDER_VIEW)?;
    Ok(ApiResponse::success(repo(&state).select_404(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateOrder>,
) -> ApiResult<Order> {
    user.require(ORDER_CREATE)?;
    let order = repo(&state).insert(&body.into_changeset(user.user_id)?).await?;
    Ok(ApiResponse::created(order))
}

/// PATCH /api/orders/:id - client, quantity and rate are frozen once invoiced
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateOrder>,
) -> ApiResult<Order> {
    user.require(ORDER_EDIT)?;
    let repo = repo(&state);
    if body.touches_billing() {
        let current = repo.select_404(id).await?;
        if current.invoice_id.is_some() {
            return Err(ApiError::conflict("Order is invoiced; client, quantity and rate can no longer change"));
        }
    }
    Ok(ApiResponse::success(repo.update(id, &body.into_changeset()?).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Order> {
    user.require(ORDER_DELETE)?;
    let mut conn = state.db.acquire().await?;
    match delete_unbilled_order(&mut conn, id).await? {
        Some(order) => Ok(ApiResponse::success(order)),
        None => Err(ApiError::not_found("Order not found")),
    }
}
