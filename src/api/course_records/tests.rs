use crate::test_support::{self, call, json_request};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

async fn published_course(ctx: &test_support::TestContext, token: &str, title: &str) -> String {
    let (status, created) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/courses",
            Some(token),
            Some(json!({ "title": title, "content_type": "text", "text_content": "body" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    let course_id = created["data"]["id"].as_str().expect("course id").to_string();

    let (status, _) = call(
        &ctx.app,
        json_request(
            Method::POST,
            &format!("/api/v1/courses/{course_id}/publish"),
            Some(token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    course_id
}

async fn post_progress(
    ctx: &test_support::TestContext,
    token: &str,
    course_id: &str,
    body: Value,
) -> (StatusCode, Value) {
    call(
        &ctx.app,
        json_request(
            Method::POST,
            &format!("/api/v1/learn/courses/{course_id}/progress"),
            Some(token),
            Some(body),
        ),
    )
    .await
}

#[tokio::test]
async fn completion_is_stamped_once_and_progress_never_drops() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let admin_token = test_support::token_for(&ctx.state, &admin).await;
    let learner = test_support::insert_account(ctx.state.db(), "learner").await;
    let token = test_support::token_for(&ctx.state, &learner).await;
    let course_id = published_course(&ctx, &admin_token, "Error handling").await;

    let (status, body) =
        post_progress(&ctx, &token, &course_id, json!({ "progress": 40, "duration": 300 })).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["progress"], 40);
    assert_eq!(body["data"]["is_completed"], false);
    assert!(body["data"]["completed_at"].is_null());

    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::POST,
            &format!("/api/v1/learn/courses/{course_id}/complete"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["progress"], 100);
    assert_eq!(body["data"]["is_completed"], true);
    let completed_at = body["data"]["completed_at"].clone();
    assert!(completed_at.is_string());

    let (status, body) = post_progress(&ctx, &token, &course_id, json!({ "progress": 20 })).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["progress"], 100);
    assert_eq!(body["data"]["completed_at"], completed_at);
    assert_eq!(body["data"]["duration"], 300);

    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::GET,
            &format!("/api/v1/learn/courses/{course_id}"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["record"]["is_completed"], true);
}

#[tokio::test]
async fn progress_outside_range_or_on_hidden_course_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let admin_token = test_support::token_for(&ctx.state, &admin).await;
    let learner = test_support::insert_account(ctx.state.db(), "learner").await;
    let token = test_support::token_for(&ctx.state, &learner).await;
    let course_id = published_course(&ctx, &admin_token, "Generics").await;

    let (status, _) = post_progress(&ctx, &token, &course_id, json!({ "progress": 150 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post_progress(&ctx, &token, &course_id, json!({ "progress": -1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &ctx.app,
        json_request(
            Method::POST,
            &format!("/api/v1/courses/{course_id}/unpublish"),
            Some(&admin_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_progress(&ctx, &token, &course_id, json!({ "progress": 10 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = post_progress(&ctx, &token, "missing-course", json!({ "progress": 10 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_counts_own_records_and_admin_list_is_guarded() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let admin_token = test_support::token_for(&ctx.state, &admin).await;
    let learner = test_support::insert_account(ctx.state.db(), "learner").await;
    let token = test_support::token_for(&ctx.state, &learner).await;

    let first = published_course(&ctx, &admin_token, "Closures").await;
    let second = published_course(&ctx, &admin_token, "Iterators").await;
    post_progress(&ctx, &token, &first, json!({ "progress": 100 })).await;
    post_progress(&ctx, &token, &second, json!({ "progress": 30 })).await;

    let (status, body) = call(
        &ctx.app,
        json_request(Method::GET, "/api/v1/course-records/summary", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"], json!({ "total": 2, "completed": 1, "in_progress": 1, "percent": 50 }));

    let (status, body) = call(
        &ctx.app,
        json_request(Method::GET, "/api/v1/course-records/mine?is_completed=true", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["course_id"], first.as_str());

    let (status, _) =
        call(&ctx.app, json_request(Method::GET, "/api/v1/course-records", Some(&token), None))
            .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::GET,
            &format!("/api/v1/course-records?account_id={}", learner.id),
            Some(&admin_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["total"], 2);
}
