use crate::test_support::{self, call, json_request, TestContext};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

/// Published exam with one single-choice question worth 10 points.
async fn published_exam(ctx: &TestContext, token: &str) -> (String, String) {
    let (status, exam) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/exams",
            Some(token),
            Some(json!({ "title": "Ownership quiz", "total_score": 10.0, "pass_score": 6.0, "status": "published" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {exam}");
    let exam_id = exam["data"]["id"].as_str().expect("exam id").to_string();

    let (status, question) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/questions",
            Some(token),
            Some(json!({
                "exam_id": exam_id,
                "question_type": "single_choice",
                "content": "Which keyword moves a closure's captures?",
                "options": ["ref", "move", "mut"],
                "answer": "B",
                "score": 10.0
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {question}");
    let question_id = question["data"]["id"].as_str().expect("question id").to_string();

    (exam_id, question_id)
}

async fn start(ctx: &TestContext, token: &str, exam_id: &str) -> (StatusCode, Value) {
    call(
        &ctx.app,
        json_request(Method::POST, &format!("/api/v1/exams/{exam_id}/start"), Some(token), None),
    )
    .await
}

async fn submit(ctx: &TestContext, token: &str, record_id: &str, answers: Value) -> (StatusCode, Value) {
    call(
        &ctx.app,
        json_request(
            Method::POST,
            &format!("/api/v1/exam-records/{record_id}/submit"),
            Some(token),
            Some(json!({ "answers": answers })),
        ),
    )
    .await
}

#[tokio::test]
async fn attempt_is_reused_graded_once_and_closed() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let admin_token = test_support::token_for(&ctx.state, &admin).await;
    let (exam_id, question_id) = published_exam(&ctx, &admin_token).await;

    let learner = test_support::insert_account(ctx.state.db(), "learner").await;
    let token = test_support::token_for(&ctx.state, &learner).await;

    let (status, first) = start(&ctx, &token, &exam_id).await;
    assert_eq!(status, StatusCode::OK, "response: {first}");
    assert_eq!(first["data"]["status"], "in_progress");
    let (status, second) = start(&ctx, &token, &exam_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["id"], second["data"]["id"]);
    let record_id = first["data"]["id"].as_str().expect("record id").to_string();

    let (status, graded) =
        submit(&ctx, &token, &record_id, json!([{ "question_id": question_id, "answer": "B" }]))
            .await;
    assert_eq!(status, StatusCode::OK, "response: {graded}");
    assert_eq!(graded["data"]["status"], "graded");
    assert_eq!(graded["data"]["score"], 10.0);
    assert!(graded["data"]["submit_time"].is_string());

    let (status, body) =
        submit(&ctx, &token, &record_id, json!([{ "question_id": question_id, "answer": "A" }]))
            .await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");

    let (status, mine) =
        call(&ctx.app, json_request(Method::GET, "/api/v1/exam-records/mine", Some(&token), None))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["data"]["total"], 1);
    let stored = &mine["data"]["items"][0];
    assert_eq!(stored["id"], record_id.as_str());
    assert_eq!(stored["score"], 10.0);
    assert_eq!(stored["answers"], json!([{ "question_id": question_id, "answer": "B" }]));

    let (status, fresh) = start(&ctx, &token, &exam_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(fresh["data"]["id"], record_id.as_str());
}

#[tokio::test]
async fn wrong_answer_scores_zero_and_records_are_private() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let admin_token = test_support::token_for(&ctx.state, &admin).await;
    let (exam_id, question_id) = published_exam(&ctx, &admin_token).await;

    let learner = test_support::insert_account(ctx.state.db(), "learner").await;
    let token = test_support::token_for(&ctx.state, &learner).await;
    let other = test_support::insert_account(ctx.state.db(), "other").await;
    let other_token = test_support::token_for(&ctx.state, &other).await;

    let (_, started) = start(&ctx, &token, &exam_id).await;
    let record_id = started["data"]["id"].as_str().expect("record id").to_string();

    let (status, _) =
        submit(&ctx, &other_token, &record_id, json!([{ "question_id": question_id, "answer": "B" }]))
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, graded) =
        submit(&ctx, &token, &record_id, json!([{ "question_id": question_id, "answer": "A" }]))
            .await;
    assert_eq!(status, StatusCode::OK, "response: {graded}");
    assert_eq!(graded["data"]["score"], 0.0);

    let (status, mine) =
        call(&ctx.app, json_request(Method::GET, "/api/v1/exam-records/mine", Some(&token), None))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["data"]["total"], 1);

    let (status, _) = call(
        &ctx.app,
        json_request(Method::GET, &format!("/api/v1/exams/{exam_id}/records"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, records) = call(
        &ctx.app,
        json_request(
            Method::GET,
            &format!("/api/v1/exams/{exam_id}/records"),
            Some(&admin_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {records}");
    assert_eq!(records["data"]["total"], 1);
}

#[tokio::test]
async fn draft_exams_cannot_be_started_or_seen_by_learners() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let admin_token = test_support::token_for(&ctx.state, &admin).await;
    let learner = test_support::insert_account(ctx.state.db(), "learner").await;
    let token = test_support::token_for(&ctx.state, &learner).await;

    let (status, exam) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&admin_token),
            Some(json!({ "title": "Draft quiz" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {exam}");
    assert_eq!(exam["data"]["status"], "draft");
    let exam_id = exam["data"]["id"].as_str().expect("exam id").to_string();

    let (status, _) = start(&ctx, &token, &exam_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = start(&ctx, &token, "missing-exam").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) =
        call(&ctx.app, json_request(Method::GET, "/api/v1/exams", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"]["total"], 0);

    let (status, _) = call(
        &ctx.app,
        json_request(Method::GET, &format!("/api/v1/exams/{exam_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn answers_are_hidden_from_learners() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let admin_token = test_support::token_for(&ctx.state, &admin).await;
    let (exam_id, _) = published_exam(&ctx, &admin_token).await;
    let learner = test_support::insert_account(ctx.state.db(), "learner").await;
    let token = test_support::token_for(&ctx.state, &learner).await;

    let (status, seen) = call(
        &ctx.app,
        json_request(Method::GET, &format!("/api/v1/exams/{exam_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {seen}");
    assert_eq!(seen["data"]["questions"].as_array().map(Vec::len), Some(1));
    assert!(seen["data"]["questions"][0].get("answer").is_none());

    let (status, managed) = call(
        &ctx.app,
        json_request(Method::GET, &format!("/api/v1/exams/{exam_id}"), Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(managed["data"]["questions"][0]["answer"], "B");
}

#[tokio::test]
async fn pass_score_cannot_exceed_total() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let token = test_support::token_for(&ctx.state, &admin).await;

    let (status, body) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(json!({ "title": "Broken", "total_score": 50.0, "pass_score": 60.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
}

#[tokio::test]
async fn attempt_on_deleted_exam_cannot_be_submitted() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let admin_token = test_support::token_for(&ctx.state, &admin).await;
    let (exam_id, question_id) = published_exam(&ctx, &admin_token).await;

    let learner = test_support::insert_account(ctx.state.db(), "learner").await;
    let token = test_support::token_for(&ctx.state, &learner).await;
    let (_, started) = start(&ctx, &token, &exam_id).await;
    let record_id = started["data"]["id"].as_str().expect("record id").to_string();

    let (status, _) = call(
        &ctx.app,
        json_request(Method::DELETE, &format!("/api/v1/exams/{exam_id}"), Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        submit(&ctx, &token, &record_id, json!([{ "question_id": question_id, "answer": "B" }]))
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "response: {body}");
    assert_eq!(body["message"], "Exam not found");
}
