use std::io::Write;
use std::{fs, path::Path, path::PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Returns the persisted signing secret, creating it on first start.
pub(super) fn load_or_create_secret_key() -> String {
    let path = secret_file_path();

    if let Some(existing) = read_secret(&path) {
        return existing;
    }

    let generated = generate_secret_key();
    match persist_secret(&path, &generated) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Generated new token signing secret");
            generated
        }
        // Another process won the race; use its key.
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            read_secret(&path).unwrap_or(generated)
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "Failed to persist token signing secret; tokens will not survive a restart"
            );
            generated
        }
    }
}

fn read_secret(path: &Path) -> Option<String> {
    let value = fs::read_to_string(path).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn persist_secret(path: &Path, secret: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(secret.as_bytes())
}

fn generate_secret_key() -> String {
    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn secret_file_path() -> PathBuf {
    match std::env::var("LEARNHUB_SECRET_FILE") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
        _ => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".secret_key"),
    }
}

#[cfg(test)]
mod tests {
    use super::{generate_secret_key, persist_secret, read_secret};

    #[test]
    fn generated_keys_are_long_and_distinct() {
        let first = generate_secret_key();
        let second = generate_secret_key();
        assert!(first.len() >= 80);
        assert_ne!(first, second);
    }

    #[test]
    fn persisted_secret_is_not_overwritten() {
        let dir = std::env::temp_dir().join(format!("learnhub-secret-{}", uuid::Uuid::new_v4()));
        let path = dir.join(".secret_key");

        persist_secret(&path, "first").expect("persist");
        let err = persist_secret(&path, "second").unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(read_secret(&path).as_deref(), Some("first"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
