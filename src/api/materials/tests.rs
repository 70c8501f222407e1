use crate::test_support::{self, call, json_request};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn each_material_action_checks_its_own_permission() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_account(ctx.state.db(), "author").await;
    test_support::grant_permissions(ctx.state.db(), &author.id, &["materials:create"]).await;
    let token = test_support::token_for(&ctx.state, &author).await;

    let (status, created) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/materials",
            Some(&token),
            Some(json!({ "title": "Intro to Rust", "material_type": "text", "content": "fn main() {}" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["data"]["status"], "draft");
    let material_id = created["data"]["id"].as_str().expect("material id").to_string();

    let (status, _) = call(
        &ctx.app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/materials/{material_id}"),
            Some(&token),
            Some(json!({ "title": "Renamed" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &ctx.app,
        json_request(
            Method::DELETE,
            &format!("/api/v1/materials/{material_id}"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn readers_list_and_fetch_without_grants() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let admin_token = test_support::token_for(&ctx.state, &admin).await;
    let reader = test_support::insert_account(ctx.state.db(), "reader").await;
    let reader_token = test_support::token_for(&ctx.state, &reader).await;

    for title in ["Ownership", "Borrowing", "Lifetimes"] {
        let (status, body) = call(
            &ctx.app,
            json_request(
                Method::POST,
                "/api/v1/materials",
                Some(&admin_token),
                Some(json!({ "title": title, "status": "published" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "response: {body}");
    }

    let (status, body) = call(
        &ctx.app,
        json_request(Method::GET, "/api/v1/materials?keyword=borrow", Some(&reader_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Borrowing");

    let material_id = body["data"]["items"][0]["id"].as_str().expect("id").to_string();
    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::GET,
            &format!("/api/v1/materials/{material_id}"),
            Some(&reader_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["id"], material_id.as_str());

    let (status, _) = call(&ctx.app, json_request(Method::GET, "/api/v1/materials", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleted_material_disappears_from_reads() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let token = test_support::token_for(&ctx.state, &admin).await;

    let (_, created) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/materials",
            Some(&token),
            Some(json!({ "title": "Temporary" })),
        ),
    )
    .await;
    let material_id = created["data"]["id"].as_str().expect("material id").to_string();

    let (status, _) = call(
        &ctx.app,
        json_request(Method::DELETE, &format!("/api/v1/materials/{material_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &ctx.app,
        json_request(Method::GET, &format!("/api/v1/materials/{material_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        call(&ctx.app, json_request(Method::GET, "/api/v1/materials", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = call(
        &ctx.app,
        json_request(Method::DELETE, &format!("/api/v1/materials/{material_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
