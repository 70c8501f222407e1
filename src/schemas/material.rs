use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Material;
use crate::db::types::{ContentStatus, MaterialType};
use crate::schemas::{double_option, format_primitive};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MaterialCreate {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default = "default_material_type")]
    pub(crate) material_type: MaterialType,
    #[serde(default)]
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) file_url: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "file_size must be non-negative"))]
    pub(crate) file_size: i64,
    #[serde(default)]
    pub(crate) cover_url: Option<String>,
    #[serde(default)]
    pub(crate) order_num: i32,
    #[serde(default = "default_status")]
    pub(crate) status: ContentStatus,
}

fn default_material_type() -> MaterialType {
    MaterialType::Text
}

fn default_status() -> ContentStatus {
    ContentStatus::Draft
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MaterialUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) material_type: Option<MaterialType>,
    #[serde(default)]
    pub(crate) content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) file_url: Option<Option<String>>,
    #[serde(default)]
    #[validate(range(min = 0, message = "file_size must be non-negative"))]
    pub(crate) file_size: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) cover_url: Option<Option<String>>,
    #[serde(default)]
    pub(crate) order_num: Option<i32>,
    #[serde(default)]
    pub(crate) status: Option<ContentStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaterialListQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
    pub(crate) keyword: Option<String>,
    pub(crate) material_type: Option<MaterialType>,
    pub(crate) status: Option<ContentStatus>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MaterialResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) material_type: MaterialType,
    pub(crate) content: String,
    pub(crate) file_url: Option<String>,
    pub(crate) file_size: i64,
    pub(crate) cover_url: Option<String>,
    pub(crate) order_num: i32,
    pub(crate) status: ContentStatus,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Material> for MaterialResponse {
    fn from(material: Material) -> Self {
        Self {
            id: material.id,
            title: material.title,
            description: material.description,
            material_type: material.material_type,
            content: material.content,
            file_url: material.file_url,
            file_size: material.file_size,
            cover_url: material.cover_url,
            order_num: material.order_num,
            status: material.status,
            created_by: material.created_by,
            created_at: format_primitive(material.created_at),
            updated_at: format_primitive(material.updated_at),
        }
    }
}
