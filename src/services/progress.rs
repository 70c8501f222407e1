use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::CourseRecord;
use crate::db::types::ContentStatus;
use crate::repositories;

pub(crate) const COMPLETE: i32 = 100;

#[derive(Debug, Error)]
pub(crate) enum ProgressError {
    #[error("Progress must be between 0 and 100")]
    OutOfRange,
    #[error("Course not found")]
    CourseNotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct ProgressSummary {
    pub(crate) total: i64,
    pub(crate) completed: i64,
    pub(crate) in_progress: i64,
    pub(crate) percent: i64,
}

/// Applies one study update. Progress never decreases; reaching 100 marks
/// the record completed and stamps `completed_at` the first time only.
/// Non-positive durations leave the stored duration alone.
pub(crate) fn apply_progress(
    record: &mut CourseRecord,
    requested: i32,
    duration: Option<i32>,
    now: PrimitiveDateTime,
) -> Result<(), ProgressError> {
    if !(0..=COMPLETE).contains(&requested) {
        return Err(ProgressError::OutOfRange);
    }

    record.progress = record.progress.max(requested);
    if let Some(duration) = duration.filter(|value| *value > 0) {
        record.duration = duration;
    }
    if record.progress == COMPLETE && !record.is_completed {
        record.is_completed = true;
        record.completed_at = Some(now);
    }
    record.last_study_at = now;
    record.updated_at = now;
    Ok(())
}

pub(crate) fn summarize(total: i64, completed: i64) -> ProgressSummary {
    let percent = if total > 0 { completed * 100 / total } else { 0 };
    ProgressSummary { total, completed, in_progress: total - completed, percent }
}

pub(crate) async fn record_progress(
    pool: &PgPool,
    account_id: &str,
    course_id: &str,
    requested: i32,
    duration: Option<i32>,
) -> Result<CourseRecord, ProgressError> {
    if !(0..=COMPLETE).contains(&requested) {
        return Err(ProgressError::OutOfRange);
    }

    let mut tx = pool.begin().await?;
    let course = repositories::courses::find_by_id(&mut *tx, course_id)
        .await?
        .filter(|course| course.status == ContentStatus::Published)
        .ok_or(ProgressError::CourseNotFound)?;

    let now = primitive_now_utc();
    let id = Uuid::new_v4().to_string();
    let mut record =
        repositories::course_records::lock_or_create(&mut tx, &id, account_id, &course.id, now)
            .await?;
    let was_completed = record.is_completed;

    apply_progress(&mut record, requested, duration, now)?;
    let saved = repositories::course_records::save(&mut *tx, &record).await?;
    tx.commit().await?;

    if saved.is_completed && !was_completed {
        tracing::info!(account_id, course_id, "Course completed");
    }
    Ok(saved)
}

pub(crate) async fn complete_course(
    pool: &PgPool,
    account_id: &str,
    course_id: &str,
) -> Result<CourseRecord, ProgressError> {
    record_progress(pool, account_id, course_id, COMPLETE, None).await
}

pub(crate) async fn summary(pool: &PgPool, account_id: &str) -> Result<ProgressSummary, sqlx::Error> {
    let counts = repositories::course_records::counts_for_account(pool, account_id).await?;
    Ok(summarize(counts.total, counts.completed))
}
