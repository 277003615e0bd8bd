#![deny(missing_docs)]

//! Core library for the Sphinx Prometheus exporter.

/// HTTP routing for the metrics endpoint.
pub mod api;
/// Collection cycles and stale-index reconciliation.
pub mod collector;
/// Command line and environment configuration.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Cycle bookkeeping counters.
pub mod metrics;
/// Fixed-interval scheduling of collection cycles.
pub mod poller;
/// Per-index gauge registry.
pub mod registry;
/// SphinxQL stats source client.
pub mod source;
