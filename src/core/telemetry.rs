use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

/// Noisy dependencies are capped unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "aws_config=warn", "aws_smithy_runtime=warn"];

pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&settings.telemetry().log_level)));

    let builder = fmt().with_env_filter(filter).with_target(false);

    let result = if settings.telemetry().json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.compact().try_init()
    };

    result.map_err(|err| anyhow::anyhow!(err.to_string()))
}

fn default_directives(level: &str) -> String {
    std::iter::once(level).chain(QUIET_TARGETS.iter().copied()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::default_directives;

    #[test]
    fn default_directives_keep_base_level_first() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("sqlx=warn"));
    }
}
