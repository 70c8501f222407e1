use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Account;
use crate::db::types::AccountStatus;
use crate::schemas::role::RoleResponse;
use crate::schemas::{double_option, format_primitive};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AccountCreate {
    #[validate(length(min = 3, max = 100, message = "username must be 3-100 characters"))]
    pub(crate) username: String,
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) nickname: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email is invalid"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<AccountStatus>,
    #[serde(default)]
    pub(crate) role_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AccountUpdate {
    #[serde(default)]
    #[validate(length(max = 100, message = "nickname must be at most 100 characters"))]
    pub(crate) nickname: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) phone: Option<Option<String>>,
    #[serde(default)]
    pub(crate) status: Option<AccountStatus>,
    #[serde(default)]
    pub(crate) password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountListQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
    pub(crate) username: Option<String>,
    pub(crate) status: Option<AccountStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountGetQuery {
    #[serde(default)]
    pub(crate) include_deleted: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignRolesRequest {
    pub(crate) role_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AccountResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) nickname: String,
    pub(crate) email: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) status: AccountStatus,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) deleted_at: Option<String>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            nickname: account.nickname,
            email: account.email,
            phone: account.phone,
            status: account.status,
            created_at: format_primitive(account.created_at),
            updated_at: format_primitive(account.updated_at),
            deleted_at: account.deleted_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AccountDetailResponse {
    #[serde(flatten)]
    pub(crate) account: AccountResponse,
    pub(crate) roles: Vec<RoleResponse>,
}
