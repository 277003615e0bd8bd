use std::{env, sync::Arc};

use sphinx_exporter::{
    collector::Collector,
    config::OutagePolicy,
    metrics::CycleMetrics,
    registry::{DEFINITIONS, MetricRegistry},
    source::{SphinxSource, StatsSource},
};

fn live_source() -> SphinxSource {
    let address = env::var("SPHINX_ADDRESS").unwrap_or_else(|_| "127.0.0.1".into());
    let port = env::var("SPHINX_PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(9306);
    SphinxSource::new(address, port)
}

#[tokio::test]
#[ignore = "Requires live Sphinx searchd"]
async fn live_sphinx_lists_indexes_and_stats() {
    let source = live_source();
    let mut conn = source.connect().await.expect("connect to searchd");
    let indexes = conn.list_indexes().await.expect("SHOW TABLES");
    for entry in &indexes {
        let stats = conn
            .fetch_index_stats(&entry.name)
            .await
            .expect("SHOW INDEX .. STATUS");
        assert!(
            !stats.is_empty(),
            "index {} reported no status rows",
            entry.name
        );
    }
    conn.close().await.expect("disconnect");
}

#[tokio::test]
#[ignore = "Requires live Sphinx searchd"]
async fn live_cycle_populates_registry() {
    let registry = Arc::new(MetricRegistry::with_definitions(&DEFINITIONS).expect("registry"));
    let mut collector = Collector::new(
        Arc::new(live_source()),
        registry.clone(),
        Arc::new(CycleMetrics::new()),
        OutagePolicy::Preserve,
    );

    let report = collector.run_cycle().await;

    assert!(report.is_success(), "cycle failed: {:?}", report.error);
    assert_eq!(registry.index_count(), report.observed as f64);
}
