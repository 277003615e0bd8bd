#![allow(dead_code)]

use async_trait::async_trait;
use sphinx_exporter::{
    collector::Collector,
    config::OutagePolicy,
    metrics::CycleMetrics,
    registry::{DEFINITIONS, MetricRegistry},
    source::{
        ConnectionErrorKind, IndexEntry, SourceError, StatRow, StatsConnection, StatsSource,
    },
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the fake server answers on the next connection.
#[derive(Default, Clone)]
pub struct Script {
    pub connect_error: Option<ConnectionErrorKind>,
    pub list_error: bool,
    pub indexes: Vec<(String, Vec<StatRow>)>,
    pub failing_index: Option<String>,
    pub connect_delay: Option<Duration>,
}

impl Script {
    pub fn with_index(mut self, name: &str, stats: &[(&str, &str)]) -> Self {
        let rows = stats
            .iter()
            .map(|(key, value)| StatRow::new(*key, *value))
            .collect();
        self.indexes.push((name.to_string(), rows));
        self
    }
}

#[derive(Default)]
struct Shared {
    script: Script,
    connects: usize,
    closes: usize,
    queried: Vec<String>,
}

/// In-memory stats source whose answers can be swapped between cycles.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedSource {
    pub fn new(script: Script) -> Self {
        let source = Self::default();
        source.set(script);
        source
    }

    pub fn set(&self, script: Script) {
        self.shared.lock().expect("lock").script = script;
    }

    pub fn connects(&self) -> usize {
        self.shared.lock().expect("lock").connects
    }

    pub fn closes(&self) -> usize {
        self.shared.lock().expect("lock").closes
    }

    pub fn queried(&self) -> Vec<String> {
        self.shared.lock().expect("lock").queried.clone()
    }
}

#[async_trait]
impl StatsSource for ScriptedSource {
    async fn connect(&self) -> Result<Box<dyn StatsConnection>, SourceError> {
        let script = {
            let mut shared = self.shared.lock().expect("lock");
            shared.connects += 1;
            shared.script.clone()
        };
        if let Some(delay) = script.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(kind) = script.connect_error {
            return Err(SourceError::Connection {
                kind,
                message: "connection refused".into(),
            });
        }
        Ok(Box::new(ScriptedConnection {
            shared: self.shared.clone(),
            script,
        }))
    }
}

struct ScriptedConnection {
    shared: Arc<Mutex<Shared>>,
    script: Script,
}

#[async_trait]
impl StatsConnection for ScriptedConnection {
    async fn list_indexes(&mut self) -> Result<Vec<IndexEntry>, SourceError> {
        if self.script.list_error {
            return Err(SourceError::Query {
                query: "SHOW TABLES".into(),
                message: "server went away".into(),
            });
        }
        Ok(self
            .script
            .indexes
            .iter()
            .map(|(name, _)| IndexEntry::new(name.clone(), "local"))
            .collect())
    }

    async fn fetch_index_stats(&mut self, index_name: &str) -> Result<Vec<StatRow>, SourceError> {
        self.shared
            .lock()
            .expect("lock")
            .queried
            .push(index_name.to_string());
        if self.script.failing_index.as_deref() == Some(index_name) {
            return Err(SourceError::Query {
                query: format!("SHOW INDEX {index_name} STATUS"),
                message: "unknown index".into(),
            });
        }
        Ok(self
            .script
            .indexes
            .iter()
            .find(|(name, _)| name == index_name)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<(), SourceError> {
        self.shared.lock().expect("lock").closes += 1;
        Ok(())
    }
}

pub struct Harness {
    pub source: ScriptedSource,
    pub registry: Arc<MetricRegistry>,
    pub cycles: Arc<CycleMetrics>,
    pub collector: Collector,
}

pub fn harness(script: Script, policy: OutagePolicy) -> Harness {
    let source = ScriptedSource::new(script);
    let registry = Arc::new(MetricRegistry::with_definitions(&DEFINITIONS).expect("registry"));
    let cycles = Arc::new(CycleMetrics::new());
    let collector = Collector::new(
        Arc::new(source.clone()),
        registry.clone(),
        cycles.clone(),
        policy,
    );
    Harness {
        source,
        registry,
        cycles,
        collector,
    }
}
