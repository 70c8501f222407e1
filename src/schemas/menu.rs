use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Menu;
use crate::db::types::MenuKind;
use crate::schemas::{double_option, format_primitive};
use crate::services::permissions::MenuNode;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MenuCreate {
    #[serde(default)]
    pub(crate) parent_id: Option<String>,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) path: String,
    #[serde(default)]
    pub(crate) icon: String,
    #[serde(default)]
    pub(crate) component: String,
    #[serde(default)]
    pub(crate) order_num: i32,
    #[serde(default = "default_visible")]
    pub(crate) visible: bool,
    #[serde(default = "default_kind")]
    pub(crate) kind: MenuKind,
    #[serde(default)]
    pub(crate) permission: Option<String>,
}

fn default_visible() -> bool {
    true
}

fn default_kind() -> MenuKind {
    MenuKind::Menu
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MenuUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) parent_id: Option<Option<String>>,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) path: Option<String>,
    #[serde(default)]
    pub(crate) icon: Option<String>,
    #[serde(default)]
    pub(crate) component: Option<String>,
    #[serde(default)]
    pub(crate) order_num: Option<i32>,
    #[serde(default)]
    pub(crate) visible: Option<bool>,
    #[serde(default)]
    pub(crate) kind: Option<MenuKind>,
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) permission: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MenuResponse {
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
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Menu> for MenuResponse {
    fn from(menu: Menu) -> Self {
        Self {
            id: menu.id,
            parent_id: menu.parent_id,
            name: menu.name,
            path: menu.path,
            icon: menu.icon,
            component: menu.component,
            order_num: menu.order_num,
            visible: menu.visible,
            kind: menu.kind,
            permission: menu.permission,
            created_at: format_primitive(menu.created_at),
            updated_at: format_primitive(menu.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MenuTreeResponse {
    #[serde(flatten)]
    pub(crate) menu: MenuResponse,
    pub(crate) children: Vec<MenuTreeResponse>,
}

impl From<MenuNode> for MenuTreeResponse {
    fn from(node: MenuNode) -> Self {
        Self {
            menu: node.menu.into(),
            children: node.children.into_iter().map(Into::into).collect(),
        }
    }
}
