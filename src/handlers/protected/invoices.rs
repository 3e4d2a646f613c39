// handlers/protected/invoices.rs - /api/invoices

use axum::{extract::State, Extension};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::utils::list_filter;
use crate::auth::permissions::{INVOICE_CREATE, INVOICE_DELETE, INVOICE_EDIT, INVOICE_VIEW};
use crate::database::models::{CreateInvoice, Invoice, InvoiceStatus, UpdateInvoice};
use crate::database::Repository;
use crate::filter::{FilterOp, Page, SortDirection};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::InvoiceService;
use crate::state::AppState;
use crate::types::ListParams;

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilters {
    pub client_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
    pub issued_from: Option<NaiveDate>,
    pub issued_to: Option<NaiveDate>,
}

fn repo(state: &AppState) -> Repository<Invoice> {
    Repository::new(Invoice::TABLE, "Invoice", state.db.clone())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filters): ApiQuery<InvoiceFilters>,
) -> ApiResult<Page<Invoice>> {
    user.require(INVOICE_VIEW)?;
    let mut filter = list_filter(Invoice::TABLE, &params, Invoice::SEARCHABLE, Invoice::SORTABLE, ("issued_on", SortDirection::Desc))?;
    filter
        .where_opt("client_id", FilterOp::Eq, filters.client_id)
        .where_opt("status", FilterOp::Eq, filters.status)
        .where_between("issued_on", filters.issued_from, filters.issued_to);
    Ok(ApiResponse::success(repo(&state).select_page(&filter).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Invoice> {
    user.require(INVOICE_VIEW)?;
    Ok(ApiResponse::success(repo(&state).select_404(id).await?))
}

/// POST /api/invoices - bill a set of orders
///
/// ```json
/// { "invoice_number": "INV-2024-001", "client_id": "…", "order_ids": ["…"], "discount": "50.00" }
/// ```
///
/// The invoice row and the orders' `invoice_id` are written in one
/// transaction; a missing, foreign or already-invoiced order aborts both (409).
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateInvoice>,
) -> ApiResult<Invoice> {
    user.require(INVOICE_CREATE)?;
    let invoice = InvoiceService::new(state.db).create(body, user.user_id).await?;
    Ok(ApiResponse::created(invoice))
}

/// PATCH /api/invoices/:id - status, due date and notes only
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateInvoice>,
) -> ApiResult<Invoice> {
    user.require(INVOICE_EDIT)?;
    Ok(ApiResponse::success(repo(&state).update(id, &body.into_changeset()?).await?))
}

/// DELETE /api/invoices/:id - soft delete and release the orders for re-billing
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Invoice> {
    user.require(INVOICE_DELETE)?;
    Ok(ApiResponse::success(InvoiceService::new(state.db).delete(id).await?))
}
