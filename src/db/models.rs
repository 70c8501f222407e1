use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{
    AccountStatus, ContentStatus, CourseContentType, ExamRecordStatus, MaterialType, MenuKind,
    QuestionType, RoleStatus,
};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Account {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) password_hash: String,
    pub(crate) nickname: String,
    pub(crate) email: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) status: AccountStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
    pub(crate) deleted_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Role {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) status: RoleStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Permission {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) resource: String,
    pub(crate) action: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Menu {
    pub(crate) id: String,
    pub(crate) parent_id: Option<String>,
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) icon: String,
    pub(crate) component: String,
    pub(crate) order_num: i32,
    pub(crate) visible: bool,
    pub(crate) kind: MenuKind,
    pub(crate) permission: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Material {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) material_type: MaterialType,
    pub(crate) content: String,
    pub(crate) file_url: Option<String>,
    pub(crate) file_size: i64,
    pub(crate) cover_url: Option<String>,
    pub(crate) order_num: i32,
    pub(crate) status: ContentStatus,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) cover_image: Option<String>,
    pub(crate) content_type: CourseContentType,
    pub(crate) video_url: Option<String>,
    pub(crate) text_content: Option<String>,
    pub(crate) duration: i32,
    pub(crate) status: ContentStatus,
    pub(crate) sort_order: i32,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Topic {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) order_num: i32,
    pub(crate) status: ContentStatus,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) total_score: f64,
    pub(crate) pass_score: f64,
    pub(crate) time_limit: i32,
    pub(crate) status: ContentStatus,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) exam_id: Option<String>,
    pub(crate) question_type: QuestionType,
    pub(crate) content: String,
    pub(crate) options: Json<serde_json::Value>,
    pub(crate) answer: String,
    pub(crate) explanation: String,
    pub(crate) score: f64,
    pub(crate) order_num: i32,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One answer as submitted by a learner; persisted verbatim on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SubmittedAnswer {
    pub(crate) question_id: String,
    pub(crate) answer: String,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ExamRecord {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) exam_id: String,
    pub(crate) status: ExamRecordStatus,
    pub(crate) answers: Json<Vec<SubmittedAnswer>>,
    pub(crate) score: Option<f64>,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) submit_time: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Export row: an exam record joined with the owner's username.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ExamScoreRow {
    pub(crate) account_id: String,
    pub(crate) username: String,
    pub(crate) score: Option<f64>,
    pub(crate) status: ExamRecordStatus,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) submit_time: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CourseRecord {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) course_id: String,
    pub(crate) progress: i32,
    pub(crate) duration: i32,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) last_study_at: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
