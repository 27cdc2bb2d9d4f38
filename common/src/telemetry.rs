// Telemetry module for structured logging and metrics

use crate::config::LogFormat;
use crate::models::OverrideOrigin;
use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize structured logging
///
/// `RUST_LOG` takes precedence over the configured level. JSON output carries
/// the current span and span list so request fields end up in every line.
pub fn init_logging(log_level: &str, format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(false)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(
        log_level = log_level,
        log_format = ?format,
        "Structured logging initialized"
    );

    Ok(())
}

/// Install the Prometheus recorder and describe every metric
///
/// The returned handle renders the scrape output for the `/metrics` route.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    describe_counter!("agents_created_total", "Total number of agents registered");
    describe_counter!(
        "agents_imported_total",
        "Total number of agents created or updated by CSV import"
    );
    describe_counter!(
        "import_rows_skipped_total",
        "Total number of CSV rows skipped during import"
    );
    describe_counter!(
        "planning_projections_total",
        "Total number of monthly planning projections"
    );
    describe_histogram!(
        "planning_entries_generated",
        "Number of planning entries produced per projection"
    );
    describe_counter!(
        "shift_overrides_total",
        "Total number of shift overrides recorded"
    );

    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}

#[inline]
pub fn record_agent_created(group_code: &str) {
    counter!("agents_created_total", "group" => group_code.to_string()).increment(1);
}

#[inline]
pub fn record_import(imported: usize, skipped: usize) {
    counter!("agents_imported_total").increment(imported as u64);
    counter!("import_rows_skipped_total").increment(skipped as u64);
}

#[inline]
pub fn record_projection(entries: usize) {
    counter!("planning_projections_total").increment(1);
    histogram!("planning_entries_generated").record(entries as f64);
}

#[inline]
pub fn record_override(origin: OverrideOrigin, count: usize) {
    counter!("shift_overrides_total", "origin" => origin.as_str()).increment(count as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_logging_init_is_rejected() {
        let _ = init_logging("info", LogFormat::Json);
        let err = init_logging("debug", LogFormat::Pretty).unwrap_err();
        assert!(err.to_string().contains("tracing subscriber"));
    }

    #[test]
    fn test_second_metrics_init_is_rejected() {
        let _ = init_metrics();
        let err = init_metrics().err().unwrap();
        assert!(err.to_string().contains("Prometheus recorder"));
    }

    #[test]
    fn test_metrics_recording_without_recorder() {
        record_agent_created("A");
        record_import(3, 1);
        record_projection(90);
        record_override(OverrideOrigin::Manual, 2);
    }
}
