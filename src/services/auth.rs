use std::sync::OnceLock;

use sqlx::PgPool;
use thiserror::Error;

use crate::core::config::Settings;
use crate::core::security::{self, SecurityError, TokenGrant};
use crate::db::models::Account;
use crate::db::types::AccountStatus;
use crate::repositories;
use crate::services::permissions::permissions_for;

#[derive(Debug, Error)]
pub(crate) enum AuthError {
    /// Unknown username and wrong password are deliberately the same error.
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Account is disabled")]
    AccountDisabled,
    #[error(transparent)]
    Security(#[from] SecurityError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub(crate) struct IssuedToken {
    pub(crate) access_token: String,
    pub(crate) expires_in: i64,
    pub(crate) roles: Vec<String>,
    pub(crate) permissions: Vec<String>,
}

/// Hash verified for unknown usernames so both credential failures cost
/// one argon2 run.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY.get_or_init(|| security::hash_password("learnhub-unknown-account").ok()).as_deref()
}

pub(crate) async fn authenticate(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<Account, AuthError> {
    let Some(account) = repositories::accounts::find_by_username(pool, username).await? else {
        if let Some(hash) = dummy_hash() {
            let _ = security::verify_password(password, hash);
        }
        return Err(AuthError::InvalidCredentials);
    };

    if !security::verify_password(password, &account.password_hash)? {
        return Err(AuthError::InvalidCredentials);
    }

    if account.status != AccountStatus::Active {
        return Err(AuthError::AccountDisabled);
    }

    Ok(account)
}

/// Resolves the account's current grants and signs them into a token.
pub(crate) async fn issue_token(
    pool: &PgPool,
    settings: &Settings,
    account: &Account,
) -> Result<IssuedToken, AuthError> {
    let roles = repositories::roles::enabled_codes_for_account(pool, &account.id).await?;
    let mut permissions: Vec<String> =
        permissions_for(pool, &account.id).await?.into_iter().collect();
    permissions.sort();

    let access_token = security::create_access_token(
        TokenGrant {
            account_id: &account.id,
            username: &account.username,
            roles: roles.clone(),
            permissions: permissions.clone(),
        },
        settings,
        None,
    )?;

    Ok(IssuedToken {
        access_token,
        expires_in: settings.security().token_expire_hours as i64 * 3600,
        roles,
        permissions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_account_hash_never_verifies() {
        let hash = dummy_hash().expect("dummy hash");
        assert!(!security::verify_password("secret-pass", hash).expect("verify"));
        assert_eq!(dummy_hash(), Some(hash));
    }
}
