use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment,
    parse_storage_provider, parse_u16, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, PaginationSettings,
    RedisSettings, RuntimeSettings, S3Settings, SecuritySettings, ServerHost, ServerPort,
    ServerSettings, Settings, StorageProvider, StorageSettings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("LEARNHUB_HOST", "0.0.0.0");
        let port = env_or_default("LEARNHUB_PORT", "8080");

        let environment = parse_environment(
            env_optional("LEARNHUB_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config =
            env_optional("LEARNHUB_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "LearnHub API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };
        let token_expire_hours =
            parse_u64("TOKEN_EXPIRE_HOURS", env_or_default("TOKEN_EXPIRE_HOURS", "24"))?;
        let algorithm = env_or_default("ALGORITHM", "HS256");
        let login_rate_limit =
            parse_u64("LOGIN_RATE_LIMIT", env_or_default("LOGIN_RATE_LIMIT", "10"))?;
        let login_rate_window_seconds = parse_u64(
            "LOGIN_RATE_WINDOW_SECONDS",
            env_or_default("LOGIN_RATE_WINDOW_SECONDS", "60"),
        )?;

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "learnhub");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "learnhub");
        let database_url = env_optional("DATABASE_URL");
        let max_connections =
            parse_u32("DATABASE_MAX_CONNECTIONS", env_or_default("DATABASE_MAX_CONNECTIONS", "20"))?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let default_page_size =
            parse_u32("PAGE_SIZE_DEFAULT", env_or_default("PAGE_SIZE_DEFAULT", "10"))? as i64;
        let max_page_size =
            parse_u32("PAGE_SIZE_MAX", env_or_default("PAGE_SIZE_MAX", "100"))? as i64;

        let provider = parse_storage_provider(env_optional("STORAGE_PROVIDER"))?;
        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "100"))?;
        let local_dir = env_or_default("LOCAL_STORAGE_DIR", "./uploads");
        let local_base_url = env_or_default("LOCAL_STORAGE_BASE_URL", "/uploads");
        let presigned_url_expire_seconds = parse_u64(
            "PRESIGNED_URL_EXPIRE_SECONDS",
            env_or_default("PRESIGNED_URL_EXPIRE_SECONDS", "3600"),
        )?;

        let s3_endpoint = env_or_default("S3_ENDPOINT", "https://s3.amazonaws.com");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "learnhub-files");
        let s3_region = env_or_default("S3_REGION", "us-east-1");

        let first_superuser_username = env_or_default("FIRST_SUPERUSER_USERNAME", "admin");
        let first_superuser_password = env_or_default("FIRST_SUPERUSER_PASSWORD", "");

        let log_level = env_or_default("LEARNHUB_LOG_LEVEL", "info");
        let json = env_optional("LEARNHUB_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            security: SecuritySettings {
                secret_key,
                token_expire_hours,
                algorithm,
                login_rate_limit,
                login_rate_window_seconds,
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            pagination: PaginationSettings { default_page_size, max_page_size },
            storage: StorageSettings {
                provider,
                max_upload_size_mb,
                local_dir,
                local_base_url,
                presigned_url_expire_seconds,
            },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
            },
            admin: AdminSettings { first_superuser_username, first_superuser_password },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn pagination(&self) -> PaginationSettings {
        self.pagination
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.token_expire_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "TOKEN_EXPIRE_HOURS",
                value: "0".to_string(),
            });
        }

        if self.pagination.max_page_size < 1 {
            return Err(ConfigError::InvalidValue {
                field: "PAGE_SIZE_MAX",
                value: self.pagination.max_page_size.to_string(),
            });
        }

        if self.pagination.default_page_size < 1
            || self.pagination.default_page_size > self.pagination.max_page_size
        {
            return Err(ConfigError::InvalidValue {
                field: "PAGE_SIZE_DEFAULT",
                value: self.pagination.default_page_size.to_string(),
            });
        }

        if self.storage.max_upload_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_UPLOAD_SIZE_MB",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.storage.provider == StorageProvider::S3
            && (self.s3.access_key.is_empty() || self.s3.secret_key.is_empty())
        {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }
        if self.admin.first_superuser_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_SUPERUSER_PASSWORD"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use crate::core::config::ConfigError;
    use crate::test_support;

    #[tokio::test]
    async fn zero_page_size_default_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("PAGE_SIZE_DEFAULT", "0");

        let result = Settings::load();
        std::env::remove_var("PAGE_SIZE_DEFAULT");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "PAGE_SIZE_DEFAULT", .. })
        ));
    }

    #[tokio::test]
    async fn strict_mode_requires_superuser_password() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("LEARNHUB_STRICT_CONFIG", "1");
        std::env::remove_var("FIRST_SUPERUSER_PASSWORD");

        let result = Settings::load();
        std::env::set_var("LEARNHUB_STRICT_CONFIG", "0");

        assert!(matches!(result, Err(ConfigError::MissingSecret("FIRST_SUPERUSER_PASSWORD"))));
    }

    #[tokio::test]
    async fn defaults_match_documented_values() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.api().api_v1_str, "/api/v1");
        assert_eq!(settings.security().token_expire_hours, 24);
        assert_eq!(settings.pagination().default_page_size, 10);
        assert_eq!(settings.pagination().max_page_size, 100);
        assert_eq!(settings.storage().max_upload_size_mb, 100);
        assert_eq!(settings.storage().presigned_url_expire_seconds, 3600);
    }
}
