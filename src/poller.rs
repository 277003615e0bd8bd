//! Fixed-interval polling loop.
//!
//! The loop sleeps for the configured interval, runs one cycle to completion, and repeats. The
//! sleep does not account for how long the cycle took, and the next cycle never starts before
//! the previous one returns. Stats source queries carry no timeout: a hung connection stalls
//! every later cycle, but a shutdown request abandons the stuck cycle instead of waiting on it.

use crate::collector::Collector;
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};

/// Handle to a running poller task.
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Collector>,
}

impl PollerHandle {
    /// Ask the poller to stop and wait for it. An in-flight cycle is dropped, which also drops
    /// its connection without a graceful close.
    ///
    /// Returns the collector so callers can inspect its final state.
    pub async fn shutdown(self) -> Option<Collector> {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(collector) => Some(collector),
            Err(err) => {
                tracing::error!(error = %err, "Poller task failed");
                None
            }
        }
    }
}

/// Spawn the polling loop on the current Tokio runtime.
pub fn spawn(collector: Collector, interval: Duration) -> PollerHandle {
    let (shutdown, receiver) = watch::channel(false);
    let task = tokio::spawn(run(collector, interval, receiver));
    PollerHandle { shutdown, task }
}

/// Sleep, run a cycle, repeat until shutdown is signalled or the sender is dropped.
pub async fn run(
    mut collector: Collector,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Collector {
    tracing::info!(interval = ?interval, "Poller started");
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {}
        }
        if stop_requested(&shutdown) {
            break;
        }
        let report = tokio::select! {
            report = collector.run_cycle() => report,
            _ = shutdown.changed() => {
                tracing::warn!("Shutdown requested mid-cycle; abandoning it");
                break;
            }
        };
        tracing::trace!(
            observed = report.observed,
            zeroed = report.zeroed.len(),
            reconciled = report.reconciled,
            ok = report.is_success(),
            "Cycle finished"
        );
    }
    tracing::info!("Poller stopped");
    collector
}

fn stop_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}
