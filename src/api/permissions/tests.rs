use crate::test_support::{self, call, json_request};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn catalog_edits_need_the_administrator_role() {
    let ctx = test_support::setup_test_context().await;
    let manager = test_support::insert_account(ctx.state.db(), "manager").await;
    test_support::grant_permissions(ctx.state.db(), &manager.id, &["roles:manage"]).await;
    let token = test_support::token_for(&ctx.state, &manager).await;

    let (status, body) = call(
        &ctx.app,
        json_request(Method::GET, "/api/v1/permissions?resource=roles", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert!(body["data"]["total"].as_i64().unwrap_or_default() >= 1);

    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/permissions",
            Some(&token),
            Some(json!({ "name": "reports:view" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Insufficient role");
}

#[tokio::test]
async fn administrator_manages_permission_lifecycle() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let token = test_support::token_for(&ctx.state, &admin).await;

    let (status, created) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/permissions",
            Some(&token),
            Some(json!({ "name": "reports:view", "description": "Read reports" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["data"]["resource"], "reports");
    assert_eq!(created["data"]["action"], "view");
    let permission_id = created["data"]["id"].as_str().expect("permission id").to_string();

    let (status, _) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/permissions",
            Some(&token),
            Some(json!({ "name": "reports:view" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, listed) = call(
        &ctx.app,
        json_request(Method::GET, "/api/v1/permissions?name=REPORTS", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"]["total"], 1);

    let uri = format!("/api/v1/permissions/{permission_id}");
    let (status, _) = call(&ctx.app, json_request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&ctx.app, json_request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, recreated) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/permissions",
            Some(&token),
            Some(json!({ "name": "reports:view" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {recreated}");
    assert_ne!(recreated["data"]["id"], permission_id.as_str());
}
