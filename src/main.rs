use anyhow::{Context, Result};
use sphinx_exporter::{
    api::{self, ExporterState},
    collector::Collector,
    config, logging,
    metrics::CycleMetrics,
    poller,
    registry::{DEFINITIONS, MetricRegistry},
    source::SphinxSource,
};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let config = config::load().context("invalid configuration")?;

    let registry = Arc::new(
        MetricRegistry::with_definitions(&DEFINITIONS).context("failed to register gauges")?,
    );
    let cycles = Arc::new(CycleMetrics::new());
    let source = Arc::new(SphinxSource::from_config(&config));
    let collector = Collector::new(
        source,
        registry.clone(),
        cycles.clone(),
        config.outage_policy,
    );
    let poller = poller::spawn(collector, config.poll_interval);

    let app = api::create_router(Arc::new(ExporterState { registry, cycles }));
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.listen_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.listen_port))?;
    tracing::info!("Listening on http://0.0.0.0:{}/metrics", config.listen_port);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("metrics server terminated unexpectedly");

    poller.shutdown().await;
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
