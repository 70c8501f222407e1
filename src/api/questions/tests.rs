use crate::test_support::{self, call, json_request};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn explicit_null_detaches_question_from_exam() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "root").await;
    let token = test_support::token_for(&ctx.state, &admin).await;

    let (status, exam) = call(
        &ctx.app,
        json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(json!({ "title": "Borrowing", "total_score": 5.0, "pass_score": 3.0 })),
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
            Some(&token),
            Some(json!({
                "exam_id": exam_id,
                "question_type": "single_choice",
                "content": "How many mutable borrows may coexist?",
                "options": ["0", "1", "many"],
                "answer": "B",
                "score": 5.0
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {question}");
    let uri = format!(
        "/api/v1/questions/{}",
        question["data"]["id"].as_str().expect("question id")
    );

    let (status, unchanged) =
        call(&ctx.app, json_request(Method::PATCH, &uri, Some(&token), Some(json!({})))).await;
    assert_eq!(status, StatusCode::OK, "response: {unchanged}");
    assert_eq!(unchanged["data"]["exam_id"], exam_id.as_str());

    let (status, cleared) = call(
        &ctx.app,
        json_request(Method::PATCH, &uri, Some(&token), Some(json!({ "exam_id": null }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {cleared}");
    assert_eq!(cleared["data"]["exam_id"], Value::Null);

    let (status, fetched) = call(&ctx.app, json_request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["exam_id"], Value::Null);
    assert_eq!(fetched["data"]["content"], "How many mutable borrows may coexist?");
    assert_eq!(fetched["data"]["answer"], "B");
}
