use crate::test_support::{self, call, json_request, TestContext};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

async fn create_menu(ctx: &TestContext, token: &str, payload: Value) -> String {
    let (status, body) =
        call(&ctx.app, json_request(Method::POST, "/api/v1/menus", Some(token), Some(payload)))
            .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    body["data"]["id"].as_str().expect("menu id").to_string()
}

#[tokio::test]
async fn navigation_tree_follows_visibility_and_permissions() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let token = test_support::token_for(&ctx.state, &admin).await;

    let system = create_menu(&ctx, &token, json!({ "name": "System", "order_num": 1 })).await;
    let accounts = create_menu(
        &ctx,
        &token,
        json!({ "name": "Accounts", "parent_id": system, "permission": "users:manage" }),
    )
    .await;
    let reports = create_menu(
        &ctx,
        &token,
        json!({ "name": "Reports", "parent_id": system, "permission": "progress:view" }),
    )
    .await;
    let hidden = create_menu(&ctx, &token, json!({ "name": "Hidden", "visible": false })).await;
    let unassigned = create_menu(&ctx, &token, json!({ "name": "Settings", "order_num": 2 })).await;
    let orphan =
        create_menu(&ctx, &token, json!({ "name": "Audit", "parent_id": unassigned })).await;

    let member = test_support::insert_account(ctx.state.db(), "member").await;
    let role = test_support::grant_permissions(ctx.state.db(), &member.id, &["users:manage"]).await;
    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::PUT,
            &format!("/api/v1/roles/{}/menus", role.id),
            Some(&token),
            Some(json!({ "menu_ids": [system, accounts, reports, hidden, orphan] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let member_token = test_support::token_for(&ctx.state, &member).await;
    let (status, tree) = call(
        &ctx.app,
        json_request(Method::GET, "/api/v1/auth/menus", Some(&member_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {tree}");

    let roots = tree["data"].as_array().expect("menu roots");
    assert_eq!(roots.len(), 1, "tree: {tree}");
    assert_eq!(roots[0]["id"], system.as_str());
    assert_eq!(roots[0]["name"], "System");
    let children = roots[0]["children"].as_array().expect("children");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["name"], "Accounts");
    assert_eq!(children[0]["children"], json!([]));
}

#[tokio::test]
async fn explicit_null_detaches_menu_from_parent() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let token = test_support::token_for(&ctx.state, &admin).await;

    let parent = create_menu(&ctx, &token, json!({ "name": "System" })).await;
    let child =
        create_menu(&ctx, &token, json!({ "name": "Accounts", "parent_id": parent })).await;
    let uri = format!("/api/v1/menus/{child}");

    let (status, unchanged) =
        call(&ctx.app, json_request(Method::PATCH, &uri, Some(&token), Some(json!({})))).await;
    assert_eq!(status, StatusCode::OK, "response: {unchanged}");
    assert_eq!(unchanged["data"]["parent_id"], parent.as_str());

    let (status, own_parent) = call(
        &ctx.app,
        json_request(Method::PATCH, &uri, Some(&token), Some(json!({ "parent_id": child }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(own_parent["message"], "A menu cannot be its own parent");

    let (status, cleared) = call(
        &ctx.app,
        json_request(Method::PATCH, &uri, Some(&token), Some(json!({ "parent_id": null }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {cleared}");
    assert_eq!(cleared["data"]["parent_id"], Value::Null);
    assert_eq!(cleared["data"]["name"], "Accounts");

    let (status, listed) =
        call(&ctx.app, json_request(Method::GET, "/api/v1/menus", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let stored = listed["data"]
        .as_array()
        .expect("menus")
        .iter()
        .find(|menu| menu["id"] == child.as_str())
        .cloned()
        .expect("child menu listed");
    assert_eq!(stored["parent_id"], Value::Null);
}
