//! Error and report types for collection cycles.

use crate::{registry::RegistryError, source::SourceError};
use thiserror::Error;

/// Errors that abort the collection phase of a cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The stats source could not be reached.
    #[error("Failed to connect to stats source: {0}")]
    Connect(#[source] SourceError),
    /// The index listing failed, so nothing about the current index set is known.
    #[error("Failed to list indexes: {0}")]
    ListIndexes(#[source] SourceError),
    /// The status query for one index failed.
    #[error("Failed to fetch stats for index `{index}`: {source}")]
    IndexStats {
        /// Index whose stats were requested.
        index: String,
        /// Underlying source failure.
        #[source]
        source: SourceError,
    },
    /// A known statistic carried a non-numeric value.
    #[error("Stat `{stat}` of index `{index}` is not numeric: {value:?}")]
    Parse {
        /// Index the statistic belongs to.
        index: String,
        /// Statistic name.
        stat: String,
        /// Raw value that failed to parse.
        value: String,
    },
    /// Writing to the metric registry failed.
    #[error("Metric registry rejected a write: {0}")]
    Registry(#[from] RegistryError),
}

impl CycleError {
    /// Whether the cycle aborted before any index list was obtained.
    pub fn is_outage(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::ListIndexes(_))
    }

    /// Index the error is attributed to, if any.
    pub fn index(&self) -> Option<&str> {
        match self {
            Self::IndexStats { index, .. } | Self::Parse { index, .. } => Some(index.as_str()),
            _ => None,
        }
    }

    /// Statistic the error is attributed to, if any.
    pub fn stat(&self) -> Option<&str> {
        match self {
            Self::Parse { stat, .. } => Some(stat.as_str()),
            _ => None,
        }
    }
}

/// Summary of one collection cycle.
#[derive(Debug)]
pub struct CycleReport {
    /// Indexes successfully enumerated and stat-fetched this cycle.
    pub observed: usize,
    /// Indexes whose gauges were zeroed by reconciliation.
    pub zeroed: Vec<String>,
    /// Whether the reconcile phase ran.
    pub reconciled: bool,
    /// Error that aborted the collection phase, if any.
    pub error: Option<CycleError>,
}

impl CycleReport {
    /// Whether the collection phase finished without error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
