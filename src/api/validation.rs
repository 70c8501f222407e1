use std::collections::HashSet;

use async_trait::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::api::errors::ApiError;

pub(crate) const MIN_PASSWORD_LEN: usize = 6;
pub(crate) const MAX_PASSWORD_LEN: usize = 128;

/// JSON body extractor whose rejections use the API envelope as `400`.
pub(crate) struct ApiJson<T>(pub(crate) T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query-string extractor with the same rejection mapping as [`ApiJson`].
pub(crate) struct ApiQuery<T>(pub(crate) T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

pub(crate) fn validate_payload(payload: &impl Validate) -> Result<(), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))
}

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} characters long"
        )))
    }
}

/// Rejects required text that is empty after trimming.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::BadRequest(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

/// Same as [`require_text`] for patch fields; omitted values pass.
pub(crate) fn require_text_if_present(field: &str, value: Option<&str>) -> Result<(), ApiError> {
    value.map_or(Ok(()), |value| require_text(field, value))
}

/// Drops blanks and repeats while keeping first-seen order.
pub(crate) fn unique_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

/// Treats empty or whitespace-only optional text as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_length_bounds() {
        assert!(validate_password_len("12345").is_err());
        assert!(validate_password_len("123456").is_ok());
        assert!(validate_password_len(&"x".repeat(129)).is_err());
    }

    #[test]
    fn required_text_rejects_blank() {
        assert!(require_text("title", "  ").is_err());
        assert!(require_text("title", "Intro").is_ok());
        assert!(require_text_if_present("title", None).is_ok());
        assert!(require_text_if_present("title", Some("")).is_err());
    }

    #[test]
    fn unique_ids_keep_order() {
        let ids = vec!["b".into(), "a".into(), " b ".into(), "".into(), "c".into()];
        assert_eq!(unique_ids(ids), vec!["b", "a", "c"]);
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" x ".into())), Some("x".into()));
    }
}
