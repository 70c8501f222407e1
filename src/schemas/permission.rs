use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Permission;
use crate::schemas::format_primitive;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PermissionCreate {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    /// Defaults to the part of `name` before `:`.
    #[serde(default)]
    pub(crate) resource: Option<String>,
    /// Defaults to the part of `name` after `:`.
    #[serde(default)]
    pub(crate) action: Option<String>,
}

impl PermissionCreate {
    pub(crate) fn resource_and_action(&self) -> (String, String) {
        let (resource, action) = self.name.split_once(':').unwrap_or((self.name.as_str(), ""));
        (
            self.resource.clone().unwrap_or_else(|| resource.to_string()),
            self.action.clone().unwrap_or_else(|| action.to_string()),
        )
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PermissionUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) resource: Option<String>,
    #[serde(default)]
    pub(crate) action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PermissionListQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
    pub(crate) name: Option<String>,
    pub(crate) resource: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PermissionResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) resource: String,
    pub(crate) action: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Permission> for PermissionResponse {
    fn from(permission: Permission) -> Self {
        Self {
            id: permission.id,
            name: permission.name,
            description: permission.description,
            resource: permission.resource,
            action: permission.action,
            created_at: format_primitive(permission.created_at),
            updated_at: format_primitive(permission.updated_at),
        }
    }
}
