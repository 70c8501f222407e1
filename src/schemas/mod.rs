use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

pub(crate) mod account;
pub(crate) mod auth;
pub(crate) mod course;
pub(crate) mod course_record;
pub(crate) mod exam;
pub(crate) mod file;
pub(crate) mod import_export;
pub(crate) mod material;
pub(crate) mod menu;
pub(crate) mod permission;
pub(crate) mod question;
pub(crate) mod role;
pub(crate) mod topic;

pub(crate) use crate::core::time::format_primitive;

/// Success half of the `{code, message, data}` envelope.
#[derive(Debug, Serialize)]
pub(crate) struct ApiResponse<T> {
    pub(crate) code: i32,
    pub(crate) message: &'static str,
    pub(crate) data: T,
}

impl<T> ApiResponse<T> {
    pub(crate) fn ok(data: T) -> Self {
        Self { code: 0, message: "success", data }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}

/// Distinguishes an omitted field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::double_option;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        email: Option<Option<String>>,
    }

    #[test]
    fn double_option_separates_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        let cleared: Patch = serde_json::from_str(r#"{"email": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"email": "a@b.c"}"#).unwrap();

        assert_eq!(missing.email, None);
        assert_eq!(cleared.email, Some(None));
        assert_eq!(set.email, Some(Some("a@b.c".to_string())));
    }
}
