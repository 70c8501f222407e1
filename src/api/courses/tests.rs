use crate::test_support::{self, call, json_request};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn course_content_must_match_its_type() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let token = test_support::token_for(&ctx.state, &admin).await;

    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/courses",
            Some(&token),
            Some(json!({ "title": "Async Rust", "content_type": "video" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, created) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/courses",
            Some(&token),
            Some(json!({
                "title": "Async Rust",
                "content_type": "video",
                "video_url": "courses/async.mp4",
                "duration": 1800
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["data"]["status"], "draft");
    assert_eq!(created["data"]["created_by"], admin.id.as_str());
    let course_id = created["data"]["id"].as_str().expect("course id").to_string();

    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/courses/{course_id}"),
            Some(&token),
            Some(json!({ "content_type": "text" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::PATCH,
            &format!("/api/v1/courses/{course_id}"),
            Some(&token),
            Some(json!({ "content_type": "text", "text_content": "Futures are lazy." })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["content_type"], "text");
}

#[tokio::test]
async fn learners_only_see_published_courses() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let admin_token = test_support::token_for(&ctx.state, &admin).await;
    let learner = test_support::insert_account(ctx.state.db(), "learner").await;
    let learner_token = test_support::token_for(&ctx.state, &learner).await;

    let (_, created) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/courses",
            Some(&admin_token),
            Some(json!({ "title": "Traits", "content_type": "mixed" })),
        ),
    )
    .await;
    let course_id = created["data"]["id"].as_str().expect("course id").to_string();

    let (status, body) = call(
        &ctx.app,
        json_request(Method::GET, "/api/v1/learn/courses", Some(&learner_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = call(
        &ctx.app,
        json_request(
            Method::GET,
            &format!("/api/v1/learn/courses/{course_id}"),
            Some(&learner_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::POST,
            &format!("/api/v1/courses/{course_id}/publish"),
            Some(&admin_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["status"], "published");

    let (status, body) = call(
        &ctx.app,
        json_request(Method::GET, "/api/v1/learn/courses", Some(&learner_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], course_id.as_str());
    assert!(body["data"]["items"][0]["record"].is_null());
}

#[tokio::test]
async fn course_administration_requires_grant() {
    let ctx = test_support::setup_test_context().await;
    let learner = test_support::insert_account(ctx.state.db(), "learner").await;
    let token = test_support::token_for(&ctx.state, &learner).await;

    let (status, _) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/courses",
            Some(&token),
            Some(json!({ "title": "Macros", "content_type": "mixed" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        call(&ctx.app, json_request(Method::GET, "/api/v1/courses", Some(&token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
