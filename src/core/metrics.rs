use std::sync::OnceLock;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_login(outcome: &'static str) {
    metrics::counter!("auth_login_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_exam_graded(score: f64) {
    metrics::counter!("exam_submissions_graded_total").increment(1);
    metrics::histogram!("exam_submission_score").record(score);
}

pub(crate) fn record_import(entity: &'static str, succeeded: usize, failed: usize) {
    metrics::counter!("import_rows_total", "entity" => entity, "result" => "success")
        .increment(succeeded as u64);
    metrics::counter!("import_rows_total", "entity" => entity, "result" => "failure")
        .increment(failed as u64);
}

pub(crate) fn record_http_response(status: u16, latency: Duration) {
    let status = status.to_string();
    metrics::counter!("http_requests_total", "status" => status.clone()).increment(1);
    metrics::histogram!("http_request_duration_seconds", "status" => status)
        .record(latency.as_secs_f64());
}
