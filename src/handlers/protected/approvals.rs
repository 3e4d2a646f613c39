// handlers/protected/approvals.rs - /api/approvals
//
// Deleting or restoring records through a second pair of eyes. Filing needs
// approval:create, reviewing needs approval:review, and nobody reviews
// their own request.

use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use super::utils::list_filter;
use crate::auth::permissions::{APPROVAL_CREATE, APPROVAL_REVIEW, APPROVAL_VIEW};
use crate::database::models::{Approval, ApprovalStatus, ApprovalTarget, CreateApproval, ReviewApproval};
use crate::database::Repository;
use crate::filter::{FilterOp, Page, SortDirection};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::ApprovalService;
use crate::state::AppState;
use crate::types::ListParams;

#[derive(Debug, Default, Deserialize)]
pub struct ApprovalFilters {
    pub status: Option<ApprovalStatus>,
    pub target: Option<ApprovalTarget>,
    pub requested_by: Option<Uuid>,
}

fn repo(state: &AppState) -> Repository<Approval> {
    Repository::new(Approval::TABLE, "Approval", state.db.clone())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filters): ApiQuery<ApprovalFilters>,
) -> ApiResult<Page<Approval>> {
    user.require(APPROVAL_VIEW)?;
    let mut filter = list_filter(Approval::TABLE, &params, Approval::SEARCHABLE, Approval::SORTABLE, ("created_at", SortDirection::Desc))?;
    filter
        .where_opt("status", FilterOp::Eq, filters.status)
        .where_opt("target", FilterOp::Eq, filters.target)
        .where_opt("requested_by", FilterOp::Eq, filters.requested_by);
    Ok(ApiResponse::success(repo(&state).select_page(&filter).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Approval> {
    user.require(APPROVAL_VIEW)?;
    Ok(ApiResponse::success(repo(&state).select_404(id).await?))
}

/// POST /api/approvals
///
/// ```json
/// { "target": "clients", "target_id": "…", "action": "delete", "reason": "duplicate" }
/// ```
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateApproval>,
) -> ApiResult<Approval> {
    user.require(APPROVAL_CREATE)?;
    let approval = ApprovalService::new(state.db).request(body, user.user_id).await?;
    Ok(ApiResponse::created(approval))
}

async fn review(
    state: AppState,
    user: AuthUser,
    id: Uuid,
    decision: ApprovalStatus,
    body: Option<ApiJson<ReviewApproval>>,
) -> ApiResult<Approval> {
    user.require(APPROVAL_REVIEW)?;
    let note = body.and_then(|ApiJson(b)| b.note);
    let approval = ApprovalService::new(state.db).review(id, user.user_id, decision, note).await?;
    Ok(ApiResponse::success(approval))
}

/// POST /api/approvals/:id/approve - apply the action and close the request
pub async fn approve(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    body: Option<ApiJson<ReviewApproval>>,
) -> ApiResult<Approval> {
    review(state, user, id, ApprovalStatus::Approved, body).await
}

/// POST /api/approvals/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    body: Option<ApiJson<ReviewApproval>>,
) -> ApiResult<Approval> {
    review(state, user, id, ApprovalStatus::Rejected, body).await
}
