use crate::config::{LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a metrics recorder is already installed")]
    AlreadyInstalled,
}

/// Installs the global tracing subscriber. When a Sentry DSN is configured, error
/// events are forwarded there as well; keep the returned guard alive until exit
/// so pending events are flushed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let guard = config
        .and_then(|c| c.sentry_dsn.as_deref())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ))
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    guard
}

/// Sends metrics to statsd when configured. Without it the `metrics` macros are
/// no-ops.
pub fn init_metrics(config: Option<&MetricsConfig>) -> Result<(), MetricsError> {
    let Some(config) = config else {
        tracing::info!("No metrics backend configured");
        return Ok(());
    };

    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(config.prefix.as_str()))?;
    metrics::set_global_recorder(recorder).map_err(|_| MetricsError::AlreadyInstalled)?;
    shared::metrics_defs::describe_metrics(tenant_api::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}
