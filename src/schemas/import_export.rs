use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ExamScoresQuery {
    pub(crate) exam_id: String,
}
