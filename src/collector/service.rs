//! One collection cycle: connect, list, fetch, update gauges, reconcile.

use crate::{
    collector::{
        reconciler::{IndexSet, Reconciler},
        types::{CycleError, CycleReport},
    },
    config::OutagePolicy,
    metrics::CycleMetrics,
    registry::MetricRegistry,
    source::{StatsConnection, StatsSource, query::validate_index_name},
};
use std::sync::Arc;

/// Drives collection cycles against a stats source.
///
/// The collector is the only writer of the registry's per-index gauges and owns the
/// [`Reconciler`], so cycles must run one at a time; the poller guarantees that by awaiting
/// each cycle before sleeping again.
pub struct Collector {
    source: Arc<dyn StatsSource>,
    registry: Arc<MetricRegistry>,
    metrics: Arc<CycleMetrics>,
    reconciler: Reconciler,
    outage_policy: OutagePolicy,
}

impl Collector {
    /// Build a collector sharing the registry and cycle metrics with the HTTP surface.
    pub fn new(
        source: Arc<dyn StatsSource>,
        registry: Arc<MetricRegistry>,
        metrics: Arc<CycleMetrics>,
        outage_policy: OutagePolicy,
    ) -> Self {
        Self {
            source,
            registry,
            metrics,
            reconciler: Reconciler::new(),
            outage_policy,
        }
    }

    /// Indexes remembered from the last reconciled cycle.
    pub fn previous_indexes(&self) -> &IndexSet {
        self.reconciler.previous()
    }

    /// Run one full cycle. Errors are logged and reported, never propagated.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut current = IndexSet::new();
        let result = match self.source.connect().await {
            Ok(mut conn) => {
                let result = collect(conn.as_mut(), &self.registry, &mut current).await;
                if let Err(err) = conn.close().await {
                    tracing::warn!(error = %err, "Failed to close stats source connection");
                }
                result
            }
            Err(err) => Err(CycleError::Connect(err)),
        };
        self.finish(current, result)
    }

    fn finish(&mut self, current: IndexSet, result: Result<(), CycleError>) -> CycleReport {
        let observed = current.len();
        let error = result.err();

        if let Some(err) = &error {
            tracing::error!(
                error = %err,
                index = err.index(),
                stat = err.stat(),
                observed,
                "Collection cycle aborted"
            );
            if err.is_outage() && self.outage_policy == OutagePolicy::Preserve {
                self.metrics.record_failure(0);
                return CycleReport {
                    observed,
                    zeroed: Vec::new(),
                    reconciled: false,
                    error,
                };
            }
        }

        let zeroed = self.reconciler.reconcile(current, &self.registry);
        self.registry.set_index_count(observed);

        if error.is_some() {
            self.metrics.record_failure(zeroed.len());
        } else {
            self.metrics.record_success(zeroed.len());
            tracing::debug!(observed, zeroed = zeroed.len(), "Collection cycle complete");
        }

        CycleReport {
            observed,
            zeroed,
            reconciled: true,
            error,
        }
    }
}

/// Collect phase. Indexes are added to `current` as soon as their stats query succeeds, so an
/// abort leaves `current` holding everything confirmed so far.
async fn collect(
    conn: &mut dyn StatsConnection,
    registry: &MetricRegistry,
    current: &mut IndexSet,
) -> Result<(), CycleError> {
    let entries = conn
        .list_indexes()
        .await
        .map_err(CycleError::ListIndexes)?;

    for entry in entries {
        if let Err(err) = validate_index_name(&entry.name) {
            tracing::warn!(error = %err, kind = %entry.kind, "Skipping index");
            continue;
        }

        let stats = conn
            .fetch_index_stats(&entry.name)
            .await
            .map_err(|source| CycleError::IndexStats {
                index: entry.name.clone(),
                source,
            })?;
        current.insert(entry.name.clone());

        for stat in stats {
            if !registry.is_registered(&stat.name) {
                tracing::trace!(index = %entry.name, stat = %stat.name, "Ignoring unknown stat");
                continue;
            }
            let value: f64 = stat.value.parse().map_err(|_| CycleError::Parse {
                index: entry.name.clone(),
                stat: stat.name.clone(),
                value: stat.value.clone(),
            })?;
            registry.set_value(&stat.name, &entry.name, value)?;
        }
    }

    Ok(())
}
