use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};

/// Caller identity decoded from a verified bearer token. Grants come from
/// the token claims and are not re-read from the database, so a revoked
/// permission stays usable until the token expires.
#[derive(Debug, Clone)]
pub(crate) struct CurrentIdentity {
    pub(crate) account_id: String,
    pub(crate) username: String,
    pub(crate) roles: Vec<String>,
    pub(crate) permissions: Vec<String>,
}

impl CurrentIdentity {
    pub(crate) fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|held| held == permission)
    }

    pub(crate) fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|held| held == role)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Not authenticated"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        Ok(CurrentIdentity {
            account_id: claims.sub,
            username: claims.username,
            roles: claims.roles,
            permissions: claims.permissions,
        })
    }
}

pub(crate) fn require_permission(
    identity: &CurrentIdentity,
    permission: &str,
) -> Result<(), ApiError> {
    if identity.has_permission(permission) {
        Ok(())
    } else {
        tracing::debug!(
            account_id = %identity.account_id,
            permission,
            "Permission denied"
        );
        Err(ApiError::Forbidden("Insufficient permissions"))
    }
}

pub(crate) fn require_role(identity: &CurrentIdentity, role: &str) -> Result<(), ApiError> {
    if identity.has_role(role) {
        Ok(())
    } else {
        tracing::debug!(account_id = %identity.account_id, role, "Role denied");
        Err(ApiError::Forbidden("Insufficient role"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> CurrentIdentity {
        CurrentIdentity {
            account_id: "a".to_string(),
            username: "alice".to_string(),
            roles: vec!["user".to_string()],
            permissions: vec!["progress:view".to_string()],
        }
    }

    #[test]
    fn permission_check_is_exact() {
        let identity = identity();
        assert!(require_permission(&identity, "progress:view").is_ok());
        assert!(matches!(
            require_permission(&identity, "progress"),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn role_check_uses_role_codes() {
        let identity = identity();
        assert!(require_role(&identity, "user").is_ok());
        assert!(require_role(&identity, "admin").is_err());
    }
}
