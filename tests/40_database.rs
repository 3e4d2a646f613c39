//! Invariants that only hold with a real database behind them.
//!
//! Run with a Postgres server at DATABASE_URL:
//! `cargo test --test 40_database -- --ignored`. Each test gets a fresh
//! database with the migrations applied.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use portal_api::auth::{generate_ticket, hash_password, AuthError};
use portal_api::database::models::{ApprovalAction, ApprovalStatus, ApprovalTarget, CreateApproval, CreateInvoice};
use portal_api::services::{AccountService, ApprovalError, ApprovalService, InvoiceError, InvoiceService};

const PASSWORD: &str = "correct horse battery";

async fn seed_role(pool: &PgPool, name: &str) -> Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as("INSERT INTO roles (name, permissions) VALUES ($1, '{}') RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn seed_user(pool: &PgPool, username: &str, role_id: Uuid) -> Result<Uuid> {
    let (id,): (Uuid,) =
        sqlx::query_as("INSERT INTO users (username, password_hash, role_id) VALUES ($1, $2, $3) RETURNING id")
            .bind(username)
            .bind(hash_password(PASSWORD)?)
            .bind(role_id)
            .fetch_one(pool)
            .await?;
    Ok(id)
}

async fn seed_client(pool: &PgPool, code: &str) -> Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as("INSERT INTO clients (client_code, name) VALUES ($1, $1) RETURNING id")
        .bind(code)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn seed_order(pool: &PgPool, client_id: Uuid) -> Result<Uuid> {
    let (id,): (Uuid,) =
        sqlx::query_as("INSERT INTO orders (client_id, title, quantity, rate) VALUES ($1, 'Clipping path', 10, 1.5) RETURNING id")
            .bind(client_id)
            .fetch_one(pool)
            .await?;
    Ok(id)
}

/// `(invoice_id, deleted)` for an order
async fn order_state(pool: &PgPool, id: Uuid) -> Result<(Option<Uuid>, bool)> {
    Ok(sqlx::query_as("SELECT invoice_id, deleted_at IS NOT NULL FROM orders WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?)
}

fn invoice_input(number: &str, client_id: Uuid, order_ids: Vec<Uuid>) -> CreateInvoice {
    CreateInvoice {
        invoice_number: number.to_string(),
        client_id,
        order_ids,
        discount: Default::default(),
        currency: None,
        issued_on: None,
        due_on: None,
        notes: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn refresh_token_works_once(pool: PgPool) -> Result<()> {
    let role = seed_role(&pool, "staff").await?;
    seed_user(&pool, "alice", role).await?;
    let accounts = AccountService::new(pool.clone());

    let first = accounts.login("alice", PASSWORD).await?;
    let second = accounts.refresh(&first.refresh_token).await?;
    assert_ne!(first.refresh_token, second.refresh_token);

    assert!(matches!(accounts.refresh(&first.refresh_token).await, Err(AuthError::InvalidToken(_))));
    assert!(accounts.refresh(&second.refresh_token).await.is_ok());
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn sso_ticket_cannot_be_replayed(pool: PgPool) -> Result<()> {
    let role = seed_role(&pool, "staff").await?;
    let user = seed_user(&pool, "bob", role).await?;
    let accounts = AccountService::new(pool.clone());

    let ticket = generate_ticket(user)?;
    let session = accounts.exchange_ticket(&ticket).await?;
    assert_eq!(session.user.id, user);

    assert!(matches!(accounts.exchange_ticket(&ticket).await, Err(AuthError::InvalidToken(_))));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn password_change_revokes_sessions(pool: PgPool) -> Result<()> {
    let role = seed_role(&pool, "staff").await?;
    let user = seed_user(&pool, "carol", role).await?;
    let accounts = AccountService::new(pool.clone());

    let session = accounts.login("carol", PASSWORD).await?;
    accounts.change_password(user, PASSWORD, "a much longer passphrase").await?;

    assert!(matches!(accounts.refresh(&session.refresh_token).await, Err(AuthError::InvalidToken(_))));
    assert!(matches!(accounts.login("carol", PASSWORD).await, Err(AuthError::InvalidCredentials)));
    assert!(accounts.login("carol", "a much longer passphrase").await.is_ok());
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn invoice_over_billed_order_writes_nothing(pool: PgPool) -> Result<()> {
    let role = seed_role(&pool, "accounts").await?;
    let user = seed_user(&pool, "dave", role).await?;
    let client = seed_client(&pool, "C-001").await?;
    let billed = seed_order(&pool, client).await?;
    let free = seed_order(&pool, client).await?;
    let invoices = InvoiceService::new(pool.clone());

    let first = invoices.create(invoice_input("INV-1", client, vec![billed]), user).await?;
    let err = invoices.create(invoice_input("INV-2", client, vec![free, billed]), user).await;
    assert!(matches!(err, Err(InvoiceError::AlreadyInvoiced(id)) if id == billed));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM invoices").fetch_one(&pool).await?;
    assert_eq!(count, 1);
    assert_eq!(order_state(&pool, billed).await?, (Some(first.id), false));
    assert_eq!(order_state(&pool, free).await?, (None, false));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn invoice_delete_releases_and_restore_reclaims(pool: PgPool) -> Result<()> {
    let role = seed_role(&pool, "accounts").await?;
    let user = seed_user(&pool, "erin", role).await?;
    let client = seed_client(&pool, "C-002").await?;
    let order = seed_order(&pool, client).await?;
    let invoices = InvoiceService::new(pool.clone());

    let invoice = invoices.create(invoice_input("INV-10", client, vec![order]), user).await?;
    invoices.delete(invoice.id).await?;
    assert_eq!(order_state(&pool, order).await?, (None, false));

    let mut tx = pool.begin().await?;
    invoices.restore_with(&mut tx, invoice.id).await?;
    tx.commit().await?;
    assert_eq!(order_state(&pool, order).await?, (Some(invoice.id), false));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn restore_fails_when_an_order_was_reinvoiced(pool: PgPool) -> Result<()> {
    let role = seed_role(&pool, "accounts").await?;
    let user = seed_user(&pool, "frank", role).await?;
    let client = seed_client(&pool, "C-003").await?;
    let order = seed_order(&pool, client).await?;
    let invoices = InvoiceService::new(pool.clone());

    let old = invoices.create(invoice_input("INV-20", client, vec![order]), user).await?;
    invoices.delete(old.id).await?;
    let new = invoices.create(invoice_input("INV-21", client, vec![order]), user).await?;

    let mut tx = pool.begin().await?;
    let err = invoices.restore_with(&mut tx, old.id).await;
    assert!(matches!(err, Err(InvoiceError::AlreadyInvoiced(id)) if id == order));
    drop(tx);
    assert_eq!(order_state(&pool, order).await?, (Some(new.id), false));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn invoiced_order_delete_is_409(pool: PgPool) -> Result<()> {
    let role = seed_role(&pool, "accounts").await?;
    let user = seed_user(&pool, "grace", role).await?;
    let client = seed_client(&pool, "C-004").await?;
    let order = seed_order(&pool, client).await?;
    let unbilled = seed_order(&pool, client).await?;
    InvoiceService::new(pool.clone())
        .create(invoice_input("INV-30", client, vec![order]), user)
        .await?;

    let token = common::token_for(user, &["order:delete"]);
    let uri = format!("/api/orders/{}", order);
    let (status, body) = common::send_to(common::app_with(pool.clone()), common::delete(&uri, Some(&token))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert!(!order_state(&pool, order).await?.1);

    let uri = format!("/api/orders/{}", unbilled);
    let (status, _) = common::send_to(common::app_with(pool.clone()), common::delete(&uri, Some(&token))).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = common::send_to(common::app_with(pool.clone()), common::delete(&uri, Some(&token))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn approval_cannot_delete_invoiced_order(pool: PgPool) -> Result<()> {
    let role = seed_role(&pool, "accounts").await?;
    let requester = seed_user(&pool, "heidi", role).await?;
    let reviewer = seed_user(&pool, "ivan", role).await?;
    let client = seed_client(&pool, "C-005").await?;
    let order = seed_order(&pool, client).await?;
    let approvals = ApprovalService::new(pool.clone());

    let request = |id| CreateApproval {
        target: ApprovalTarget::Orders,
        target_id: id,
        action: ApprovalAction::Delete,
        reason: None,
    };

    // Filed while unbilled, then the order is invoiced before review
    let pending = approvals.request(request(order), requester).await?;
    let invoice = InvoiceService::new(pool.clone())
        .create(invoice_input("INV-40", client, vec![order]), requester)
        .await?;

    let err = approvals.review(pending.id, reviewer, ApprovalStatus::Approved, None).await;
    assert!(matches!(err, Err(ApprovalError::Invoice(InvoiceError::AlreadyInvoiced(_)))));
    assert_eq!(order_state(&pool, order).await?, (Some(invoice.id), false));
    let (status,): (String,) = sqlx::query_as("SELECT status FROM approvals WHERE id = $1")
        .bind(pending.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(status, "pending");

    // New requests are refused up front
    approvals.review(pending.id, reviewer, ApprovalStatus::Rejected, None).await?;
    let err = approvals.request(request(order), requester).await;
    assert!(matches!(err, Err(ApprovalError::Invoice(InvoiceError::AlreadyInvoiced(_)))));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn role_in_use_cannot_be_deleted(pool: PgPool) -> Result<()> {
    let used = seed_role(&pool, "designers").await?;
    let spare = seed_role(&pool, "interns").await?;
    let user = seed_user(&pool, "judy", used).await?;
    let token = common::token_for(user, &["role:delete"]);

    let uri = format!("/api/roles/{}", used);
    let (status, body) = common::send_to(common::app_with(pool.clone()), common::delete(&uri, Some(&token))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap_or_default().contains("1 user"));

    let uri = format!("/api/roles/{}", spare);
    let (status, _) = common::send_to(common::app_with(pool.clone()), common::delete(&uri, Some(&token))).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn one_pending_approval_per_target(pool: PgPool) -> Result<()> {
    let role = seed_role(&pool, "staff").await?;
    let user = seed_user(&pool, "ken", role).await?;
    let client = seed_client(&pool, "C-006").await?;
    let token = common::token_for(user, &["approval:create"]);
    let body = json!({ "target": "clients", "target_id": client, "action": "delete", "reason": "duplicate" });

    let (status, _) =
        common::send_to(common::app_with(pool.clone()), common::post_json("/api/approvals", Some(&token), body.clone())).await?;
    assert!(status.is_success());

    let (status, body) =
        common::send_to(common::app_with(pool.clone()), common::post_json("/api/approvals", Some(&token), body)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], true);
    Ok(())
}
