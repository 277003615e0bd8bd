//! Per-index gauge registry published on the metrics endpoint.
//!
//! Every Sphinx statistic the exporter understands maps to one Prometheus `GaugeVec` labeled by
//! `index`. The registry is constructed once at startup and shared by reference between the
//! collection task (sole writer) and the HTTP handler (reader). Individual gauges are atomic,
//! so readers never observe torn values, but a scrape taken mid-cycle can mix values from two
//! cycles.

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder, core::Collector};
use std::collections::BTreeMap;
use thiserror::Error;

/// Label attached to every per-index series.
pub const INDEX_LABEL: &str = "index";

/// Static description of one statistic reported by `SHOW INDEX <name> STATUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDefinition {
    /// Statistic name as reported by Sphinx.
    pub key: &'static str,
    /// Published Prometheus metric name.
    pub name: &'static str,
    /// Help text.
    pub help: &'static str,
}

/// The fixed set of statistics exported per index.
pub const DEFINITIONS: [MetricDefinition; 8] = [
    MetricDefinition {
        key: "indexed_documents",
        name: "sphinx_indexed_documents",
        help: "Number of documents indexed",
    },
    MetricDefinition {
        key: "indexed_bytes",
        name: "sphinx_indexed_bytes",
        help: "Indexed Bytes",
    },
    MetricDefinition {
        key: "field_tokens_title",
        name: "sphinx_field_tokens_title",
        help: "Sums of per-field length titles over the entire index",
    },
    MetricDefinition {
        key: "field_tokens_body",
        name: "sphinx_field_tokens_body",
        help: "Sums of per-field length bodies over the entire index",
    },
    MetricDefinition {
        key: "total_tokens",
        name: "sphinx_total_tokens",
        help: "Total tokens",
    },
    MetricDefinition {
        key: "ram_bytes",
        name: "sphinx_ram_bytes",
        help: "total size (in bytes) of the RAM-resident index portion",
    },
    MetricDefinition {
        key: "disk_bytes",
        name: "sphinx_disk_bytes",
        help: "total size (in bytes) of the disk index",
    },
    MetricDefinition {
        key: "mem_limit",
        name: "sphinx_mem_limit",
        help: "Memory limit",
    },
];

/// Errors raised by the metric registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The same statistic key was registered twice.
    #[error("Metric `{0}` is already registered")]
    Duplicate(String),
    /// A write targeted a key that was never registered.
    #[error("Metric `{0}` is not registered")]
    UnknownMetric(String),
    /// The underlying Prometheus registry rejected an operation.
    #[error("Prometheus registry error: {0}")]
    Prometheus(#[from] prometheus::Error),
    /// Encoded exposition output was not valid UTF-8.
    #[error("Exposition output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Named per-index gauges plus the scalar index count.
pub struct MetricRegistry {
    registry: Registry,
    gauges: BTreeMap<&'static str, GaugeVec>,
    index_count: Gauge,
}

impl MetricRegistry {
    /// Create a registry holding only the `sphinx_index_count` gauge.
    pub fn new() -> Result<Self, RegistryError> {
        let registry = Registry::new();
        let index_count = Gauge::with_opts(Opts::new("sphinx_index_count", "Number of indexes"))?;
        registry.register(Box::new(index_count.clone()))?;
        Ok(Self {
            registry,
            gauges: BTreeMap::new(),
            index_count,
        })
    }

    /// Create a registry and register every supplied definition.
    pub fn with_definitions(definitions: &[MetricDefinition]) -> Result<Self, RegistryError> {
        let mut registry = Self::new()?;
        for definition in definitions {
            registry.register(*definition)?;
        }
        Ok(registry)
    }

    /// Register one per-index gauge. Registering the same key twice is an error.
    pub fn register(&mut self, definition: MetricDefinition) -> Result<(), RegistryError> {
        if self.gauges.contains_key(definition.key) {
            return Err(RegistryError::Duplicate(definition.key.to_string()));
        }
        let gauge = GaugeVec::new(Opts::new(definition.name, definition.help), &[INDEX_LABEL])?;
        self.registry.register(Box::new(gauge.clone()))?;
        self.gauges.insert(definition.key, gauge);
        tracing::debug!(key = definition.key, name = definition.name, "Registered gauge");
        Ok(())
    }

    /// Whether a statistic key has a registered gauge.
    pub fn is_registered(&self, key: &str) -> bool {
        self.gauges.contains_key(key)
    }

    /// Overwrite the value for `(key, index_name)`, creating the series when absent.
    pub fn set_value(&self, key: &str, index_name: &str, value: f64) -> Result<(), RegistryError> {
        let gauge = self
            .gauges
            .get(key)
            .ok_or_else(|| RegistryError::UnknownMetric(key.to_string()))?;
        gauge.with_label_values(&[index_name]).set(value);
        Ok(())
    }

    /// Set `(key, index_name)` to zero.
    pub fn zero(&self, key: &str, index_name: &str) -> Result<(), RegistryError> {
        self.set_value(key, index_name, 0.0)
    }

    /// Every registered statistic key, in sorted order.
    pub fn all_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.gauges.keys().copied()
    }

    /// Read the current value of `(key, index_name)` without creating the series.
    ///
    /// `None` means the pair was never observed, which is distinct from `Some(0.0)`.
    pub fn value(&self, key: &str, index_name: &str) -> Option<f64> {
        let gauge = self.gauges.get(key)?;
        gauge
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|label| label.get_name() == INDEX_LABEL && label.get_value() == index_name)
            })
            .map(|metric| metric.get_gauge().get_value())
    }

    /// Set the unlabeled index count gauge.
    pub fn set_index_count(&self, count: usize) {
        self.index_count.set(count as f64);
    }

    /// Current value of the index count gauge.
    pub fn index_count(&self) -> f64 {
        self.index_count.get()
    }

    /// Render every registered metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, RegistryError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
