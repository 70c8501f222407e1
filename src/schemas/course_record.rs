use serde::{Deserialize, Serialize};

use crate::db::models::CourseRecord;
use crate::schemas::format_primitive;

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressRequest {
    pub(crate) progress: i32,
    #[serde(default)]
    pub(crate) duration: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseRecordListQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
    pub(crate) account_id: Option<String>,
    pub(crate) course_id: Option<String>,
    pub(crate) is_completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MyCourseRecordQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
    pub(crate) is_completed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseRecordResponse {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) course_id: String,
    pub(crate) progress: i32,
    pub(crate) duration: i32,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<String>,
    pub(crate) last_study_at: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<CourseRecord> for CourseRecordResponse {
    fn from(record: CourseRecord) -> Self {
        Self {
            id: record.id,
            account_id: record.account_id,
            course_id: record.course_id,
            progress: record.progress,
            duration: record.duration,
            is_completed: record.is_completed,
            completed_at: record.completed_at.map(format_primitive),
            last_study_at: format_primitive(record.last_study_at),
            created_at: format_primitive(record.created_at),
            updated_at: format_primitive(record.updated_at),
        }
    }
}
