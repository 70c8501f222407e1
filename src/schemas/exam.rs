use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::{Exam, ExamRecord, SubmittedAnswer};
use crate::db::types::{ContentStatus, ExamRecordStatus};
use crate::schemas::format_primitive;
use crate::schemas::question::QuestionResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default = "default_total_score")]
    #[validate(range(exclusive_min = 0.0, message = "total_score must be positive"))]
    pub(crate) total_score: f64,
    #[serde(default = "default_pass_score")]
    #[validate(range(min = 0.0, message = "pass_score must be non-negative"))]
    pub(crate) pass_score: f64,
    /// Minutes; 0 means unlimited.
    #[serde(default)]
    #[validate(range(min = 0, message = "time_limit must be non-negative"))]
    pub(crate) time_limit: i32,
    #[serde(default)]
    pub(crate) status: Option<ContentStatus>,
}

fn default_total_score() -> f64 {
    100.0
}

fn default_pass_score() -> f64 {
    60.0
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "total_score must be positive"))]
    pub(crate) total_score: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "pass_score must be non-negative"))]
    pub(crate) pass_score: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0, message = "time_limit must be non-negative"))]
    pub(crate) time_limit: Option<i32>,
    #[serde(default)]
    pub(crate) status: Option<ContentStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamListQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
    pub(crate) keyword: Option<String>,
    pub(crate) status: Option<ContentStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamRecordListQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitExamRequest {
    #[serde(default)]
    pub(crate) answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) total_score: f64,
    pub(crate) pass_score: f64,
    pub(crate) time_limit: i32,
    pub(crate) status: ContentStatus,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Exam> for ExamResponse {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            total_score: exam.total_score,
            pass_score: exam.pass_score,
            time_limit: exam.time_limit,
            status: exam.status,
            created_by: exam.created_by,
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamDetailResponse {
    #[serde(flatten)]
    pub(crate) exam: ExamResponse,
    pub(crate) questions: Vec<QuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamRecordResponse {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) exam_id: String,
    pub(crate) status: ExamRecordStatus,
    pub(crate) answers: Vec<SubmittedAnswer>,
    pub(crate) score: Option<f64>,
    pub(crate) start_time: String,
    pub(crate) submit_time: Option<String>,
}

impl From<ExamRecord> for ExamRecordResponse {
    fn from(record: ExamRecord) -> Self {
        Self {
            id: record.id,
            account_id: record.account_id,
            exam_id: record.exam_id,
            status: record.status,
            answers: record.answers.0,
            score: record.score,
            start_time: format_primitive(record.start_time),
            submit_time: record.submit_time.map(format_primitive),
        }
    }
}
