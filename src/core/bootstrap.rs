use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::AccountStatus;
use crate::repositories;

pub(crate) const ADMIN_ROLE_CODE: &str = "admin";
pub(crate) const DEFAULT_ROLE_CODE: &str = "user";

/// Makes sure the configured superuser exists, is active, knows the
/// configured password and holds the `admin` role with every grant.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let username = admin.first_superuser_username.as_str();
    let now = primitive_now_utc();

    let account_id = match repositories::accounts::find_by_username(state.db(), username).await? {
        Some(account) => {
            let verified =
                security::verify_password(&admin.first_superuser_password, &account.password_hash)
                    .unwrap_or(false);
            let password_hash = if verified {
                None
            } else {
                Some(security::hash_password(&admin.first_superuser_password)?)
            };
            let status =
                (account.status != AccountStatus::Active).then_some(AccountStatus::Active);

            if password_hash.is_some() || status.is_some() {
                repositories::accounts::update(
                    state.db(),
                    &account.id,
                    repositories::accounts::UpdateAccount {
                        nickname: None,
                        email: None,
                        phone: None,
                        status,
                        password_hash,
                        updated_at: now,
                    },
                )
                .await?;
                tracing::info!(username, "Updated default superuser");
            } else {
                tracing::info!("Default superuser already up to date");
            }
            account.id
        }
        None => {
            let id = Uuid::new_v4().to_string();
            repositories::accounts::create(
                state.db(),
                repositories::accounts::CreateAccount {
                    id: &id,
                    username,
                    password_hash: security::hash_password(&admin.first_superuser_password)?,
                    nickname: "Super Admin",
                    email: None,
                    phone: None,
                    status: AccountStatus::Active,
                    created_at: now,
                },
            )
            .await?;
            tracing::info!(username, "Created default superuser");
            id
        }
    };

    let Some(role) = repositories::roles::find_by_code(state.db(), ADMIN_ROLE_CODE).await? else {
        tracing::warn!(code = ADMIN_ROLE_CODE, "Administrator role missing; grants not applied");
        return Ok(());
    };

    repositories::roles::assign_to_account(state.db(), &account_id, &role.id, now).await?;
    repositories::roles::grant_everything(state.db(), &role.id, now).await?;
    Ok(())
}
