use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schemas::account::AccountResponse;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RegisterRequest {
    #[validate(length(min = 3, max = 100, message = "username must be 3-100 characters"))]
    pub(crate) username: String,
    pub(crate) password: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "nickname must be at most 100 characters"))]
    pub(crate) nickname: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email is invalid"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangePasswordRequest {
    pub(crate) current_password: String,
    pub(crate) new_password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: &'static str,
    pub(crate) expires_in: i64,
    pub(crate) roles: Vec<String>,
    pub(crate) permissions: Vec<String>,
    pub(crate) account: AccountResponse,
}

/// Identity as carried by the caller's token.
#[derive(Debug, Serialize)]
pub(crate) struct MeResponse {
    pub(crate) account_id: String,
    pub(crate) username: String,
    pub(crate) roles: Vec<String>,
    pub(crate) permissions: Vec<String>,
}
