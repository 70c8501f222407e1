use crate::test_support::{self, call, json_request, TestContext, TEST_PASSWORD};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

async fn create_role(ctx: &TestContext, token: &str, code: &str) -> (StatusCode, Value) {
    call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/roles",
            Some(token),
            Some(json!({ "code": code, "name": code })),
        ),
    )
    .await
}

async fn create_menu(ctx: &TestContext, token: &str, name: &str) -> String {
    let (status, body) = call(
        &ctx.app,
        json_request(Method::POST, "/api/v1/menus", Some(token), Some(json!({ "name": name }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    body["data"]["id"].as_str().expect("menu id").to_string()
}

fn sorted(ids: &Value) -> Vec<String> {
    let mut ids: Vec<String> = ids
        .as_array()
        .expect("id list")
        .iter()
        .filter_map(|id| id.as_str().map(str::to_string))
        .collect();
    ids.sort();
    ids
}

async fn login(ctx: &TestContext, username: &str) -> Value {
    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": username, "password": TEST_PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    body
}

#[tokio::test]
async fn replacing_permissions_and_menus_drops_earlier_members() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let token = test_support::token_for(&ctx.state, &admin).await;

    let (status, role) = create_role(&ctx, &token, "reviewer").await;
    assert_eq!(status, StatusCode::CREATED, "response: {role}");
    let role_id = role["data"]["id"].as_str().expect("role id").to_string();
    let member = test_support::insert_account(ctx.state.db(), "member").await;
    let (status, _) = call(
        &ctx.app,
        json_request(
            Method::PUT,
            &format!("/api/v1/users/{}/roles", member.id),
            Some(&token),
            Some(json!({ "role_ids": [role_id] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let manage = test_support::permission_id(ctx.state.db(), "users:manage").await;
    let view = test_support::permission_id(ctx.state.db(), "progress:view").await;
    let permissions_uri = format!("/api/v1/roles/{role_id}/permissions");

    let (status, both) = call(
        &ctx.app,
        json_request(
            Method::PUT,
            &permissions_uri,
            Some(&token),
            Some(json!({ "permission_ids": [manage, view] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {both}");
    let mut expected = vec![manage.clone(), view.clone()];
    expected.sort();
    assert_eq!(sorted(&both["data"]["permission_ids"]), expected);

    let member_token = test_support::token_for(&ctx.state, &member).await;

    let (status, narrowed) = call(
        &ctx.app,
        json_request(
            Method::PUT,
            &permissions_uri,
            Some(&token),
            Some(json!({ "permission_ids": [view] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {narrowed}");
    assert_eq!(sorted(&narrowed["data"]["permission_ids"]), vec![view.clone()]);

    let (status, refreshed) = call(
        &ctx.app,
        json_request(Method::POST, "/api/v1/auth/refresh", Some(&member_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {refreshed}");
    assert_eq!(refreshed["data"]["permissions"], json!(["progress:view"]));

    let first_menu = create_menu(&ctx, &token, "Dashboard").await;
    let second_menu = create_menu(&ctx, &token, "Reports").await;
    let menus_uri = format!("/api/v1/roles/{role_id}/menus");

    let (status, both) = call(
        &ctx.app,
        json_request(
            Method::PUT,
            &menus_uri,
            Some(&token),
            Some(json!({ "menu_ids": [first_menu, second_menu] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {both}");
    assert_eq!(both["data"]["menu_ids"].as_array().map(Vec::len), Some(2));

    let (status, narrowed) = call(
        &ctx.app,
        json_request(
            Method::PUT,
            &menus_uri,
            Some(&token),
            Some(json!({ "menu_ids": [second_menu] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {narrowed}");
    assert_eq!(sorted(&narrowed["data"]["menu_ids"]), vec![second_menu.clone()]);

    let (status, detail) = call(
        &ctx.app,
        json_request(Method::GET, &format!("/api/v1/roles/{role_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sorted(&detail["data"]["permission_ids"]), vec![view]);
    assert_eq!(sorted(&detail["data"]["menu_ids"]), vec![second_menu]);
}

#[tokio::test]
async fn deleted_role_code_can_be_reused() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let token = test_support::token_for(&ctx.state, &admin).await;

    let (status, first) = create_role(&ctx, &token, "auditor").await;
    assert_eq!(status, StatusCode::CREATED, "response: {first}");
    let first_id = first["data"]["id"].as_str().expect("role id").to_string();

    let (status, _) = create_role(&ctx, &token, "auditor").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &ctx.app,
        json_request(Method::DELETE, &format!("/api/v1/roles/{first_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = create_role(&ctx, &token, "auditor").await;
    assert_eq!(status, StatusCode::CREATED, "response: {second}");
    assert_ne!(second["data"]["id"], first_id.as_str());
}

#[tokio::test]
async fn disabled_role_is_left_out_of_claims() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let token = test_support::token_for(&ctx.state, &admin).await;
    let member = test_support::insert_account(ctx.state.db(), "grader").await;
    let role = test_support::grant_permissions(ctx.state.db(), &member.id, &["progress:view"]).await;

    let body = login(&ctx, "grader").await;
    assert_eq!(body["data"]["roles"], json!([role.code]));
    assert_eq!(body["data"]["permissions"], json!(["progress:view"]));

    let (status, updated) = call(
        &ctx.app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/roles/{}", role.id),
            Some(&token),
            Some(json!({ "status": "disabled" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {updated}");
    assert_eq!(updated["data"]["status"], "disabled");

    let body = login(&ctx, "grader").await;
    assert_eq!(body["data"]["roles"], json!([]));
    assert_eq!(body["data"]["permissions"], json!([]));
}
