mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn missing_permission_is_403() -> Result<()> {
    let token = common::token(&["client:view"]);

    for uri in ["/api/orders", "/api/employees", "/api/users", "/api/files/contracts"] {
        let (status, body) = common::send(common::get(uri, Some(&token))).await?;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["code"], "FORBIDDEN");
    }
    Ok(())
}

#[tokio::test]
async fn create_needs_create_permission() -> Result<()> {
    let token = common::token(&["client:view"]);
    let request = common::post_json(
        "/api/clients",
        Some(&token),
        json!({ "client_code": "C-1", "name": "Acme", "country": "US", "currency": "USD" }),
    );

    let (status, _) = common::send(request).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn review_needs_review_permission() -> Result<()> {
    let token = common::token(&["approval:view", "approval:create"]);
    let uri = format!("/api/approvals/{}/approve", uuid::Uuid::new_v4());

    let (status, _) = common::send(common::post_json(&uri, Some(&token), json!({}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn permission_catalog_is_served_without_database() -> Result<()> {
    let token = common::token(&["role:view"]);
    let (status, body) = common::send(common::get("/api/roles/permissions", Some(&token))).await?;

    assert_eq!(status, StatusCode::OK);
    let permissions = body["data"]["permissions"].as_array().cloned().unwrap_or_default();
    assert!(permissions.iter().any(|p| p == "invoice:create"));
    assert!(permissions.iter().any(|p| p == "approval:review"));
    assert!(body["data"]["groups"].as_array().map_or(false, |g| !g.is_empty()));
    Ok(())
}
