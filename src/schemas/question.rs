use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Question;
use crate::db::types::QuestionType;
use crate::schemas::{double_option, format_primitive};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(default)]
    pub(crate) exam_id: Option<String>,
    pub(crate) question_type: QuestionType,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
    #[serde(default = "empty_options")]
    pub(crate) options: serde_json::Value,
    #[validate(length(min = 1, max = 500, message = "answer must be 1-500 characters"))]
    pub(crate) answer: String,
    #[serde(default)]
    pub(crate) explanation: String,
    #[serde(default = "default_score")]
    #[validate(range(min = 0.0, message = "score must be non-negative"))]
    pub(crate) score: f64,
    #[serde(default)]
    pub(crate) order_num: i32,
}

fn empty_options() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

fn default_score() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) exam_id: Option<Option<String>>,
    #[serde(default)]
    pub(crate) question_type: Option<QuestionType>,
    #[serde(default)]
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: Option<String>,
    #[serde(default)]
    pub(crate) options: Option<serde_json::Value>,
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "answer must be 1-500 characters"))]
    pub(crate) answer: Option<String>,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "score must be non-negative"))]
    pub(crate) score: Option<f64>,
    #[serde(default)]
    pub(crate) order_num: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionListQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
    pub(crate) exam_id: Option<String>,
    pub(crate) question_type: Option<QuestionType>,
    pub(crate) keyword: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: Option<String>,
    pub(crate) question_type: QuestionType,
    pub(crate) content: String,
    pub(crate) options: serde_json::Value,
    /// Withheld from learners.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) explanation: Option<String>,
    pub(crate) score: f64,
    pub(crate) order_num: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_model(question: Question, reveal_answer: bool) -> Self {
        let (answer, explanation) = if reveal_answer {
            (Some(question.answer), Some(question.explanation))
        } else {
            (None, None)
        };
        Self {
            id: question.id,
            exam_id: question.exam_id,
            question_type: question.question_type,
            content: question.content,
            options: question.options.0,
            answer,
            explanation,
            score: question.score,
            order_num: question.order_num,
            created_at: format_primitive(question.created_at),
            updated_at: format_primitive(question.updated_at),
        }
    }
}

impl From<Question> for QuestionResponse {
    fn from(question: Question) -> Self {
        Self::from_model(question, true)
    }
}
