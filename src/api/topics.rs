use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::{
    non_blank, require_text, require_text_if_present, unique_ids, validate_payload, ApiJson, ApiQuery,
};
use crate::api::{ok, ApiResult};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Topic;
use crate::db::types::ContentStatus;
use crate::repositories;
use crate::schemas::exam::ExamResponse;
use crate::schemas::material::MaterialResponse;
use crate::schemas::topic::{
    TopicCreate, TopicDetailResponse, TopicExamsRequest, TopicListQuery, TopicMaterialsRequest,
    TopicResponse, TopicUpdate,
};
use crate::schemas::ApiResponse;

pub(crate) const MANAGE_PERMISSION: &str = "topics:manage";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_topics).post(create_topic))
        .route("/:topic_id", get(get_topic).patch(update_topic).delete(delete_topic))
        .route("/:topic_id/materials", put(replace_materials))
        .route("/:topic_id/exams", put(replace_exams))
}

async fn list_topics(
    State(state): State<AppState>,
    _identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<TopicListQuery>,
) -> ApiResult<PaginatedResponse<TopicResponse>> {
    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::topics::TopicFilter {
        keyword: non_blank(params.keyword),
        status: params.status,
    };
    let (topics, total) =
        repositories::topics::list(state.db(), &filter, page.offset(), page.limit())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list topics"))?;

    ok(PaginatedResponse::new(topics.into_iter().map(TopicResponse::from).collect(), total, page))
}

async fn get_topic(
    State(state): State<AppState>,
    _identity: CurrentIdentity,
    Path(topic_id): Path<String>,
) -> ApiResult<TopicDetailResponse> {
    let topic = repositories::topics::find_by_id(state.db(), &topic_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch topic"))?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    ok(topic_detail(&state, topic).await?)
}

async fn create_topic(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<TopicCreate>,
) -> Result<(StatusCode, Json<ApiResponse<TopicResponse>>), ApiError> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text("title", &payload.title)?;

    let topic = repositories::topics::create(
        state.db(),
        repositories::topics::CreateTopic {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            description: &payload.description,
            order_num: payload.order_num,
            status: payload.status.unwrap_or(ContentStatus::Draft),
            created_by: &identity.account_id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create topic"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        topic_id = %topic.id,
        action = "create_topic",
        "Topic created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(TopicResponse::from(topic)))))
}

async fn update_topic(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(topic_id): Path<String>,
    ApiJson(payload): ApiJson<TopicUpdate>,
) -> ApiResult<TopicResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text_if_present("title", payload.title.as_deref())?;

    let topic = repositories::topics::update(
        state.db(),
        &topic_id,
        repositories::topics::UpdateTopic {
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            order_num: payload.order_num,
            status: payload.status,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update topic"))?
    .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    tracing::info!(
        actor_id = %identity.account_id,
        topic_id = %topic.id,
        action = "update_topic",
        "Topic updated"
    );
    ok(TopicResponse::from(topic))
}

async fn delete_topic(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(topic_id): Path<String>,
) -> ApiResult<()> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let deleted = repositories::topics::soft_delete(state.db(), &topic_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete topic"))?;
    if !deleted {
        return Err(ApiError::NotFound("Topic not found".to_string()));
    }

    tracing::info!(
        actor_id = %identity.account_id,
        topic_id = %topic_id,
        action = "delete_topic",
        "Topic deleted"
    );
    ok(())
}

async fn replace_materials(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(topic_id): Path<String>,
    ApiJson(payload): ApiJson<TopicMaterialsRequest>,
) -> ApiResult<TopicDetailResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    let material_ids = unique_ids(payload.material_ids);

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;
    let topic = repositories::topics::find_by_id(&mut *tx, &topic_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch topic"))?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    let live = repositories::materials::count_live(&mut *tx, &material_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to validate materials"))?;
    if live != material_ids.len() as i64 {
        return Err(ApiError::BadRequest("One or more materials do not exist".to_string()));
    }

    repositories::topics::replace_materials(&mut tx, &topic.id, &material_ids, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to replace topic materials"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit topic materials"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        topic_id = %topic.id,
        material_count = material_ids.len(),
        action = "replace_topic_materials",
        "Topic materials replaced"
    );
    ok(topic_detail(&state, topic).await?)
}

async fn replace_exams(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(topic_id): Path<String>,
    ApiJson(payload): ApiJson<TopicExamsRequest>,
) -> ApiResult<TopicDetailResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    let exam_ids = unique_ids(payload.exam_ids);

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;
    let topic = repositories::topics::find_by_id(&mut *tx, &topic_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch topic"))?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    let live = repositories::exams::count_live(&mut *tx, &exam_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to validate exams"))?;
    if live != exam_ids.len() as i64 {
        return Err(ApiError::BadRequest("One or more exams do not exist".to_string()));
    }

    repositories::topics::replace_exams(&mut tx, &topic.id, &exam_ids, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to replace topic exams"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit topic exams"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        topic_id = %topic.id,
        exam_count = exam_ids.len(),
        action = "replace_topic_exams",
        "Topic exams replaced"
    );
    ok(topic_detail(&state, topic).await?)
}

async fn topic_detail(state: &AppState, topic: Topic) -> Result<TopicDetailResponse, ApiError> {
    let materials = repositories::topics::materials_for_topic(state.db(), &topic.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load topic materials"))?;
    let exams = repositories::topics::exams_for_topic(state.db(), &topic.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load topic exams"))?;

    Ok(TopicDetailResponse {
        topic: TopicResponse::from(topic),
        materials: materials.into_iter().map(MaterialResponse::from).collect(),
        exams: exams.into_iter().map(ExamResponse::from).collect(),
    })
}
