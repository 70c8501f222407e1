use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Topic;
use crate::db::types::ContentStatus;
use crate::schemas::exam::ExamResponse;
use crate::schemas::format_primitive;
use crate::schemas::material::MaterialResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TopicCreate {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) order_num: i32,
    #[serde(default)]
    pub(crate) status: Option<ContentStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TopicUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) order_num: Option<i32>,
    #[serde(default)]
    pub(crate) status: Option<ContentStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicListQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
    pub(crate) keyword: Option<String>,
    pub(crate) status: Option<ContentStatus>,
}

/// Ordered replacement; list position becomes the display order.
#[derive(Debug, Deserialize)]
pub(crate) struct TopicMaterialsRequest {
    pub(crate) material_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicExamsRequest {
    pub(crate) exam_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) order_num: i32,
    pub(crate) status: ContentStatus,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Topic> for TopicResponse {
    fn from(topic: Topic) -> Self {
        Self {
            id: topic.id,
            title: topic.title,
            description: topic.description,
            order_num: topic.order_num,
            status: topic.status,
            created_by: topic.created_by,
            created_at: format_primitive(topic.created_at),
            updated_at: format_primitive(topic.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicDetailResponse {
    #[serde(flatten)]
    pub(crate) topic: TopicResponse,
    pub(crate) materials: Vec<MaterialResponse>,
    pub(crate) exams: Vec<ExamResponse>,
}
