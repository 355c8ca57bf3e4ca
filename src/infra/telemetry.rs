use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "roombook_cache_hit_total",
            Unit::Count,
            "Listing cache lookups served from memory."
        );
        describe_counter!(
            "roombook_cache_miss_total",
            Unit::Count,
            "Listing cache lookups that fell through to the database."
        );
        describe_counter!(
            "roombook_cache_expired_total",
            Unit::Count,
            "Expired listing cache entries removed on read."
        );
        describe_counter!(
            "roombook_cache_invalidate_total",
            Unit::Count,
            "Listing cache entries removed by write paths or admin requests."
        );
        describe_gauge!(
            "roombook_cache_entries",
            Unit::Count,
            "Entries currently held by the listing cache."
        );
        describe_histogram!(
            "roombook_http_request_duration_ms",
            Unit::Milliseconds,
            "HTTP request latency in milliseconds."
        );
    });
}
