//! Stats source client: connection handling and the two SphinxQL queries a cycle needs.

pub mod query;
pub mod sphinx;
pub mod types;

use async_trait::async_trait;

pub use sphinx::SphinxSource;
pub use types::{ConnectionErrorKind, IdentifierError, IndexEntry, SourceError, StatRow};

/// Factory for per-cycle connections to the stats provider.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Open a fresh connection. Each collection cycle owns exactly one.
    async fn connect(&self) -> Result<Box<dyn StatsConnection>, SourceError>;
}

/// An open connection to the stats provider.
#[async_trait]
pub trait StatsConnection: Send {
    /// Enumerate every index currently known to the provider, in server order.
    async fn list_indexes(&mut self) -> Result<Vec<IndexEntry>, SourceError>;

    /// Fetch the raw statistic rows for one index.
    ///
    /// Callers are expected to pass names that already passed
    /// [`query::validate_index_name`]; implementations must still refuse anything else.
    async fn fetch_index_stats(&mut self, index_name: &str) -> Result<Vec<StatRow>, SourceError>;

    /// Release the connection.
    async fn close(self: Box<Self>) -> Result<(), SourceError>;
}
