use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::invoice_service::{delete_unbilled_order, InvoiceError, InvoiceService};
use crate::database::models::{Approval, ApprovalAction, ApprovalStatus, ApprovalTarget, CreateApproval};
use crate::database::{Changeset, DatabaseError, Repository};

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Approval is already {0}")]
    AlreadyReviewed(ApprovalStatus),

    #[error("Cannot move an approval from {from} to {to}")]
    InvalidTransition { from: ApprovalStatus, to: ApprovalStatus },

    #[error("You cannot review your own request")]
    SelfReview,

    #[error("{target} record {id} not found")]
    TargetNotFound { target: ApprovalTarget, id: Uuid },

    #[error("{target} record {id} is already deleted")]
    AlreadyDeleted { target: ApprovalTarget, id: Uuid },

    #[error("{target} record {id} is not deleted")]
    NotDeleted { target: ApprovalTarget, id: Uuid },

    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ApprovalError {
    fn from(err: sqlx::Error) -> Self {
        ApprovalError::Database(err.into())
    }
}

/// The only legal moves are pending → approved and pending → rejected
pub fn transition(from: ApprovalStatus, to: ApprovalStatus) -> Result<ApprovalStatus, ApprovalError> {
    match (from, to) {
        (ApprovalStatus::Pending, ApprovalStatus::Approved | ApprovalStatus::Rejected) => Ok(to),
        (ApprovalStatus::Approved | ApprovalStatus::Rejected, _) => Err(ApprovalError::AlreadyReviewed(from)),
        _ => Err(ApprovalError::InvalidTransition { from, to }),
    }
}

fn parse_row<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T, ApprovalError> {
    value
        .parse()
        .map_err(|e: String| ApprovalError::Database(DatabaseError::QueryError(e)))
}

pub struct ApprovalService {
    pool: PgPool,
    repo: Repository<Approval>,
    invoices: InvoiceService,
}

impl ApprovalService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(Approval::TABLE, "Approval", pool.clone()),
            invoices: InvoiceService::new(pool.clone()),
            pool,
        }
    }

    /// File a request. A delete needs a live target, a restore a deleted one.
    pub async fn request(&self, input: CreateApproval, requested_by: Uuid) -> Result<Approval, ApprovalError> {
        let deleted = target_state(&self.pool, input.target, input.target_id)
            .await?
            .ok_or(ApprovalError::TargetNotFound { target: input.target, id: input.target_id })?;

        match (input.action, deleted) {
            (ApprovalAction::Delete, true) => {
                return Err(ApprovalError::AlreadyDeleted { target: input.target, id: input.target_id })
            }
            (ApprovalAction::Restore, false) => {
                return Err(ApprovalError::NotDeleted { target: input.target, id: input.target_id })
            }
            (ApprovalAction::Delete, false) if input.target == ApprovalTarget::Orders => {
                if order_invoiced(&self.pool, input.target_id).await? {
                    return Err(InvoiceError::AlreadyInvoiced(input.target_id).into());
                }
            }
            _ => {}
        }

        let mut cs = Changeset::new();
        cs.set("target", input.target)
            .set("target_id", input.target_id)
            .set("action", input.action)
            .set("reason", input.reason())
            .set("status", ApprovalStatus::Pending)
            .set("requested_by", requested_by);
        // A second pending request for the same target and action hits a unique index → 409
        Ok(self.repo.insert(&cs).await?)
    }

    /// Approve or reject. Approval applies the action and records the review
    /// in the same transaction.
    pub async fn review(
        &self,
        id: Uuid,
        reviewer: Uuid,
        decision: ApprovalStatus,
        note: Option<String>,
    ) -> Result<Approval, ApprovalError> {
        let mut tx = self.pool.begin().await?;

        let approval: Approval =
            sqlx::query_as("SELECT * FROM approvals WHERE id = $1 AND deleted_at IS NULL FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DatabaseError::NotFound("Approval not found".to_string()))?;

        if approval.requested_by == reviewer {
            return Err(ApprovalError::SelfReview);
        }
        let status = transition(parse_row(&approval.status)?, decision)?;

        if status == ApprovalStatus::Approved {
            let target: ApprovalTarget = parse_row(&approval.target)?;
            let action: ApprovalAction = parse_row(&approval.action)?;
            self.apply(&mut tx, target, action, approval.target_id).await?;
        }

        let reviewed: Approval = sqlx::query_as(
            "UPDATE approvals SET status = $2, reviewed_by = $3, reviewed_at = now(), review_note = $4, \
             updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(reviewer)
        .bind(note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Approval {} {} by {} ({} {} {})",
            id, status, reviewer, approval.action, approval.target, approval.target_id
        );
        Ok(reviewed)
    }

    async fn apply(
        &self,
        conn: &mut PgConnection,
        target: ApprovalTarget,
        action: ApprovalAction,
        target_id: Uuid,
    ) -> Result<(), ApprovalError> {
        match (target, action) {
            (ApprovalTarget::Invoices, ApprovalAction::Delete) => {
                self.invoices.delete_with(conn, target_id).await?;
            }
            (ApprovalTarget::Invoices, ApprovalAction::Restore) => {
                self.invoices.restore_with(conn, target_id).await?;
            }
            (ApprovalTarget::Orders, ApprovalAction::Delete) => {
                if delete_unbilled_order(conn, target_id).await?.is_none() {
                    return Err(ApprovalError::AlreadyDeleted { target, id: target_id });
                }
            }
            (_, ApprovalAction::Delete) => {
                let sql = format!(
                    "UPDATE \"{}\" SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL",
                    target.as_str()
                );
                let result = sqlx::query(&sql).bind(target_id).execute(&mut *conn).await?;
                if result.rows_affected() == 0 {
                    return Err(ApprovalError::AlreadyDeleted { target, id: target_id });
                }
            }
            (_, ApprovalAction::Restore) => {
                let sql = format!(
                    "UPDATE \"{}\" SET deleted_at = NULL, updated_at = now() WHERE id = $1 AND deleted_at IS NOT NULL",
                    target.as_str()
                );
                let result = sqlx::query(&sql)
                    .bind(target_id)
                    .execute(&mut *conn)
                    .await
                    .map_err(DatabaseError::from)
                    .map_err(|e| {
                        if e.is_unique_violation() {
                            DatabaseError::Conflict(format!("A live {} record already uses the same key", target))
                        } else {
                            e
                        }
                    })?;
                if result.rows_affected() == 0 {
                    return Err(ApprovalError::NotDeleted { target, id: target_id });
                }
            }
        }
        Ok(())
    }
}

/// `Some(is_deleted)` when the row exists at all
async fn target_state(pool: &PgPool, target: ApprovalTarget, id: Uuid) -> Result<Option<bool>, DatabaseError> {
    let sql = format!("SELECT deleted_at IS NOT NULL FROM \"{}\" WHERE id = $1", target.as_str());
    let row: Option<(bool,)> = sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(|(deleted,)| deleted))
}

async fn order_invoiced(pool: &PgPool, id: Uuid) -> Result<bool, DatabaseError> {
    let row: Option<(bool,)> = sqlx::query_as("SELECT invoice_id IS NOT NULL FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(matches!(row, Some((true,))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_approved_or_rejected() {
        assert_eq!(transition(ApprovalStatus::Pending, ApprovalStatus::Approved).unwrap(), ApprovalStatus::Approved);
        assert_eq!(transition(ApprovalStatus::Pending, ApprovalStatus::Rejected).unwrap(), ApprovalStatus::Rejected);
    }

    #[test]
    fn reviewed_requests_are_final() {
        for from in [ApprovalStatus::Approved, ApprovalStatus::Rejected] {
            for to in ApprovalStatus::ALL {
                assert!(matches!(transition(from, *to), Err(ApprovalError::AlreadyReviewed(_))));
            }
        }
    }

    #[test]
    fn pending_to_pending_is_invalid() {
        assert!(matches!(
            transition(ApprovalStatus::Pending, ApprovalStatus::Pending),
            Err(ApprovalError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn targets_are_table_names() {
        for target in ApprovalTarget::ALL {
            assert!(crate::filter::Filter::new(target.as_str()).is_ok());
        }
    }
}
