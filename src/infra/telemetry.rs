use std::sync::Once;

use metrics::{Unit, describe_counter};
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

    // Logs go to stderr so the rendered feed on stdout stays clean.
    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "corkboard_persist_remote_ok_total",
            Unit::Count,
            "Saves of the post sequence accepted by the remote document store."
        );
        describe_counter!(
            "corkboard_persist_remote_failed_total",
            Unit::Count,
            "Saves of the post sequence the remote document store did not accept."
        );
        describe_counter!(
            "corkboard_persist_cache_failed_total",
            Unit::Count,
            "Local cache mirror writes that failed."
        );
        describe_counter!(
            "corkboard_initialize_fallback_total",
            Unit::Count,
            "Startups that fell back to the local cache because the remote was unavailable."
        );
    });
}
