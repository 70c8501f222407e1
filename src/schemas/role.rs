use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Role;
use crate::db::types::RoleStatus;
use crate::schemas::format_primitive;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RoleCreate {
    #[validate(length(min = 1, max = 100, message = "code must be 1-100 characters"))]
    pub(crate) code: String,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) status: Option<RoleStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RoleUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<RoleStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleListQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
    pub(crate) keyword: Option<String>,
    pub(crate) status: Option<RoleStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignPermissionsRequest {
    pub(crate) permission_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignMenusRequest {
    pub(crate) menu_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RoleResponse {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) status: RoleStatus,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            code: role.code,
            name: role.name,
            description: role.description,
            status: role.status,
            created_at: format_primitive(role.created_at),
            updated_at: format_primitive(role.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RoleDetailResponse {
    #[serde(flatten)]
    pub(crate) role: RoleResponse,
    pub(crate) permission_ids: Vec<String>,
    pub(crate) menu_ids: Vec<String>,
}
