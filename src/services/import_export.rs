use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::bootstrap::DEFAULT_ROLE_CODE;
use crate::core::time::{format_export, primitive_now_utc};
use crate::core::{metrics, security};
use crate::db::models::ExamScoreRow;
use crate::db::types::{AccountStatus, QuestionType};
use crate::repositories;

const QUESTION_COLUMNS: usize = 5;
const ACCOUNT_COLUMNS: usize = 3;
const DEFAULT_QUESTION_SCORE: f64 = 1.0;

pub(crate) const SCORE_HEADERS: [&str; 6] =
    ["account_id", "username", "score", "status", "start_time", "submit_time"];

#[derive(Debug, Error)]
pub(crate) enum ImportError {
    #[error("No data rows found")]
    Empty,
    #[error("Spreadsheet could not be written: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Outcome of a batch import. Rows are numbered from 1, header excluded.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub(crate) struct ImportReport {
    pub(crate) success_count: usize,
    pub(crate) failure_count: usize,
    pub(crate) errors: Vec<String>,
}

impl ImportReport {
    fn succeeded(&mut self) {
        self.success_count += 1;
    }

    fn failed(&mut self, row: usize, reason: impl std::fmt::Display) {
        self.failure_count += 1;
        self.errors.push(format!("Row {row}: {reason}"));
    }
}

/// Data rows of a CSV upload with their 1-based row numbers. A row the
/// reader cannot decode is kept as its error message.
fn data_rows(bytes: &[u8]) -> Result<Vec<(usize, Result<Vec<String>, String>)>, ImportError> {
    let mut reader =
        csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(bytes);

    let rows: Vec<_> = reader
        .records()
        .enumerate()
        .map(|(index, record)| {
            let cells = record
                .map(|record| {
                    record.iter().map(|cell| cell.trim().to_string()).collect::<Vec<_>>()
                })
                .map_err(|err| err.to_string());
            (index + 1, cells)
        })
        .filter(|(_, cells)| !matches!(cells, Ok(cells) if cells.iter().all(String::is_empty)))
        .collect();

    if rows.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuestionRow {
    pub(crate) question_type: QuestionType,
    pub(crate) content: String,
    pub(crate) options: Value,
    pub(crate) answer: String,
    pub(crate) score: f64,
}

/// Columns: type, content, options, answer, score.
pub(crate) fn parse_question_row(cells: &[String]) -> Result<QuestionRow, String> {
    if cells.len() < QUESTION_COLUMNS {
        return Err("Invalid data".to_string());
    }

    let question_type = QuestionType::parse(&cells[0])
        .ok_or_else(|| format!("Unknown question type '{}'", cells[0]))?;
    if cells[1].is_empty() {
        return Err("Content is required".to_string());
    }
    if cells[3].is_empty() {
        return Err("Answer is required".to_string());
    }

    Ok(QuestionRow {
        question_type,
        content: cells[1].clone(),
        options: parse_options(&cells[2]),
        answer: cells[3].clone(),
        score: parse_score(&cells[4]),
    })
}

fn parse_score(raw: &str) -> f64 {
    raw.parse::<f64>()
        .ok()
        .filter(|score| score.is_finite() && *score >= 0.0)
        .unwrap_or(DEFAULT_QUESTION_SCORE)
}

/// A JSON array is taken as is; anything else is split on `|`.
fn parse_options(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Array(Vec::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Array(_)) => value,
        _ => Value::Array(
            raw.split('|')
                .map(str::trim)
                .filter(|option| !option.is_empty())
                .map(|option| Value::String(option.to_string()))
                .collect(),
        ),
    }
}

pub(crate) async fn import_questions(
    pool: &PgPool,
    exam_id: Option<&str>,
    created_by: &str,
    bytes: &[u8],
) -> Result<ImportReport, ImportError> {
    let mut report = ImportReport::default();

    for (row, cells) in data_rows(bytes)? {
        let parsed = match cells.and_then(|cells| parse_question_row(&cells)) {
            Ok(parsed) => parsed,
            Err(reason) => {
                report.failed(row, reason);
                continue;
            }
        };

        let id = Uuid::new_v4().to_string();
        let created = repositories::questions::create(
            pool,
            repositories::questions::CreateQuestion {
                id: &id,
                exam_id,
                question_type: parsed.question_type,
                content: &parsed.content,
                options: parsed.options,
                answer: &parsed.answer,
                explanation: "",
                score: parsed.score,
                order_num: row as i32,
                created_by,
                created_at: primitive_now_utc(),
            },
        )
        .await;

        match created {
            Ok(_) => report.succeeded(),
            Err(err) => {
                tracing::warn!(error = %err, row, "Question import row failed");
                report.failed(row, "Could not be saved");
            }
        }
    }

    metrics::record_import("questions", report.success_count, report.failure_count);
    Ok(report)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AccountRow {
    pub(crate) username: String,
    pub(crate) nickname: String,
    pub(crate) password: String,
}

/// Columns: username, nickname, password.
pub(crate) fn parse_account_row(cells: &[String]) -> Result<AccountRow, String> {
    if cells.len() < ACCOUNT_COLUMNS {
        return Err("Invalid data".to_string());
    }
    if cells[0].is_empty() || cells[2].is_empty() {
        return Err("Username and password are required".to_string());
    }
    Ok(AccountRow {
        username: cells[0].clone(),
        nickname: cells[1].clone(),
        password: cells[2].clone(),
    })
}

/// Creates one active account per row and assigns `role_id`, or the
/// default role when none is given.
pub(crate) async fn import_accounts(
    pool: &PgPool,
    role_id: Option<&str>,
    bytes: &[u8],
) -> Result<ImportReport, ImportError> {
    let role_id = match role_id {
        Some(role_id) => Some(role_id.to_string()),
        None => {
            repositories::roles::find_by_code(pool, DEFAULT_ROLE_CODE).await?.map(|role| role.id)
        }
    };

    let mut report = ImportReport::default();
    for (row, cells) in data_rows(bytes)? {
        let parsed = match cells.and_then(|cells| parse_account_row(&cells)) {
            Ok(parsed) => parsed,
            Err(reason) => {
                report.failed(row, reason);
                continue;
            }
        };

        match create_imported_account(pool, &parsed, role_id.as_deref()).await {
            Ok(true) => report.succeeded(),
            Ok(false) => report.failed(row, "User already exists"),
            Err(err) => {
                tracing::warn!(error = %err, row, "Account import row failed");
                report.failed(row, "Could not be saved");
            }
        }
    }

    metrics::record_import("accounts", report.success_count, report.failure_count);
    Ok(report)
}

/// `Ok(false)` when the username is taken.
async fn create_imported_account(
    pool: &PgPool,
    row: &AccountRow,
    role_id: Option<&str>,
) -> anyhow::Result<bool> {
    let mut tx = pool.begin().await?;
    if repositories::accounts::exists_by_username(&mut *tx, &row.username).await?.is_some() {
        return Ok(false);
    }

    let now = primitive_now_utc();
    let id = Uuid::new_v4().to_string();
    let created = repositories::accounts::create(
        &mut *tx,
        repositories::accounts::CreateAccount {
            id: &id,
            username: &row.username,
            password_hash: security::hash_password(&row.password)?,
            nickname: &row.nickname,
            email: None,
            phone: None,
            status: AccountStatus::Active,
            created_at: now,
        },
    )
    .await;

    match created {
        Ok(_) => {}
        Err(err) if crate::db::is_unique_violation(&err) => return Ok(false),
        Err(err) => return Err(err.into()),
    }

    if let Some(role_id) = role_id {
        repositories::roles::assign_to_account(&mut *tx, &id, role_id, now).await?;
    }
    tx.commit().await?;
    Ok(true)
}

/// Renders exam records as CSV with [`SCORE_HEADERS`] columns.
pub(crate) fn render_scores_csv(rows: &[ExamScoreRow]) -> Result<Vec<u8>, ImportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SCORE_HEADERS)?;

    for row in rows {
        let score = row.score.map(|score| format!("{score:.2}")).unwrap_or_default();
        let submit_time = row.submit_time.map(format_export).unwrap_or_default();
        writer.write_record([
            row.account_id.as_str(),
            row.username.as_str(),
            score.as_str(),
            row.status.as_str(),
            format_export(row.start_time).as_str(),
            submit_time.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|err| ImportError::Csv(err.into_error().into()))
}
