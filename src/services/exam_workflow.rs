use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::metrics;
use crate::core::time::primitive_now_utc;
use crate::db::models::{ExamRecord, SubmittedAnswer};
use crate::db::types::{ContentStatus, ExamRecordStatus};
use crate::repositories;
use crate::services::grading;

#[derive(Debug, Error)]
pub(crate) enum WorkflowError {
    #[error("Exam not found")]
    ExamNotFound,
    #[error("Exam is not published")]
    ExamNotPublished,
    #[error("Exam record not found")]
    RecordNotFound,
    #[error("Exam record is already {0}")]
    NotInProgress(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Returns the caller's open attempt for the exam, opening one if needed.
pub(crate) async fn start_exam(
    pool: &PgPool,
    account_id: &str,
    exam_id: &str,
) -> Result<ExamRecord, WorkflowError> {
    let mut tx = pool.begin().await?;

    let exam = repositories::exams::find_by_id(&mut *tx, exam_id)
        .await?
        .ok_or(WorkflowError::ExamNotFound)?;
    if exam.status != ContentStatus::Published {
        return Err(WorkflowError::ExamNotPublished);
    }

    repositories::exam_records::acquire_attempt_lock(&mut tx, account_id, exam_id).await?;

    if let Some(existing) =
        repositories::exam_records::find_in_progress(&mut *tx, account_id, exam_id).await?
    {
        tx.commit().await?;
        return Ok(existing);
    }

    let id = Uuid::new_v4().to_string();
    repositories::exam_records::create(
        &mut *tx,
        repositories::exam_records::CreateExamRecord {
            id: &id,
            account_id,
            exam_id,
            start_time: primitive_now_utc(),
        },
    )
    .await?;

    let record = repositories::exam_records::find_in_progress(&mut *tx, account_id, exam_id)
        .await?
        .ok_or(WorkflowError::RecordNotFound)?;
    tx.commit().await?;

    tracing::info!(account_id, exam_id, record_id = %record.id, "Exam attempt started");
    Ok(record)
}

/// Grades an open attempt owned by `account_id` on an exam that still
/// exists. The stored answers are kept verbatim.
pub(crate) async fn submit_exam(
    pool: &PgPool,
    account_id: &str,
    record_id: &str,
    answers: Vec<SubmittedAnswer>,
) -> Result<ExamRecord, WorkflowError> {
    let record = repositories::exam_records::find_by_id(pool, record_id)
        .await?
        .filter(|record| record.account_id == account_id)
        .ok_or(WorkflowError::RecordNotFound)?;

    if record.status != ExamRecordStatus::InProgress {
        return Err(WorkflowError::NotInProgress(record.status.as_str()));
    }
    repositories::exams::find_by_id(pool, &record.exam_id)
        .await?
        .ok_or(WorkflowError::ExamNotFound)?;

    let questions = repositories::questions::list_for_exam(pool, &record.exam_id).await?;
    let score = grading::score_answers(&questions, &answers);

    let graded = repositories::exam_records::grade(
        pool,
        record_id,
        repositories::exam_records::GradeExamRecord {
            answers: &answers,
            score,
            submitted_at: primitive_now_utc(),
        },
    )
    .await?
    .ok_or(WorkflowError::NotInProgress(ExamRecordStatus::Graded.as_str()))?;

    metrics::record_exam_graded(score);
    tracing::info!(
        account_id,
        exam_id = %graded.exam_id,
        record_id,
        score,
        "Exam attempt graded"
    );
    Ok(graded)
}
