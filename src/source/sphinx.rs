//! SphinxQL client over the MySQL wire protocol.

use crate::config::Config;
use crate::source::{
    StatsConnection, StatsSource,
    query::{LIST_INDEXES, index_status_query},
    types::{ConnectionErrorKind, IndexEntry, SourceError, StatRow},
};
use async_trait::async_trait;
use mysql_async::{Conn, OptsBuilder, Row, prelude::Queryable};

/// MySQL error code for "access denied".
const ER_ACCESS_DENIED: u16 = 1045;

/// Stats source backed by a Sphinx `searchd` SphinxQL listener.
#[derive(Debug, Clone)]
pub struct SphinxSource {
    address: String,
    port: u16,
}

impl SphinxSource {
    /// Target the given host and SphinxQL port.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Build a source from the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sphinx_address.clone(), config.sphinx_port)
    }

    fn opts(&self) -> OptsBuilder {
        // searchd does not know @@max_allowed_packet / @@wait_timeout, so the driver must not
        // probe for them after the handshake.
        OptsBuilder::default()
            .ip_or_hostname(self.address.clone())
            .tcp_port(self.port)
            .prefer_socket(false)
            .stmt_cache_size(0)
            .max_allowed_packet(Some(16 * 1024 * 1024))
            .wait_timeout(Some(28_800))
    }
}

#[async_trait]
impl StatsSource for SphinxSource {
    async fn connect(&self) -> Result<Box<dyn StatsConnection>, SourceError> {
        tracing::debug!(address = %self.address, port = self.port, "Connecting to Sphinx");
        let conn = Conn::new(self.opts())
            .await
            .map_err(|err| SourceError::Connection {
                kind: classify_connection_error(&err),
                message: err.to_string(),
            })?;
        Ok(Box::new(SphinxConnection { conn }))
    }
}

/// Map driver errors raised during the handshake onto the exporter's taxonomy.
fn classify_connection_error(err: &mysql_async::Error) -> ConnectionErrorKind {
    match err {
        mysql_async::Error::Io(_) => ConnectionErrorKind::Unreachable,
        mysql_async::Error::Server(server) if server.code == ER_ACCESS_DENIED => {
            ConnectionErrorKind::Authentication
        }
        _ => ConnectionErrorKind::Protocol,
    }
}

struct SphinxConnection {
    conn: Conn,
}

impl SphinxConnection {
    async fn rows(&mut self, query: &str) -> Result<Vec<Row>, SourceError> {
        self.conn
            .query::<Row, _>(query)
            .await
            .map_err(|err| SourceError::Query {
                query: query.to_string(),
                message: err.to_string(),
            })
    }
}

#[async_trait]
impl StatsConnection for SphinxConnection {
    async fn list_indexes(&mut self) -> Result<Vec<IndexEntry>, SourceError> {
        let rows = self.rows(LIST_INDEXES).await?;
        rows.iter()
            .map(|row| {
                Ok(IndexEntry {
                    name: text_column(row, 0, LIST_INDEXES)?,
                    kind: text_column(row, 1, LIST_INDEXES)?,
                })
            })
            .collect()
    }

    async fn fetch_index_stats(&mut self, index_name: &str) -> Result<Vec<StatRow>, SourceError> {
        let query = index_status_query(index_name)?;
        let rows = self.rows(&query).await?;
        rows.iter()
            .map(|row| {
                Ok(StatRow {
                    name: text_column(row, 0, &query)?,
                    value: text_column(row, 1, &query)?,
                })
            })
            .collect()
    }

    async fn close(self: Box<Self>) -> Result<(), SourceError> {
        self.conn
            .disconnect()
            .await
            .map_err(|err| SourceError::Query {
                query: "COM_QUIT".to_string(),
                message: err.to_string(),
            })
    }
}

fn text_column(row: &Row, index: usize, query: &str) -> Result<String, SourceError> {
    match row.get_opt::<String, usize>(index) {
        Some(Ok(value)) => Ok(value),
        Some(Err(err)) => Err(SourceError::Malformed {
            query: query.to_string(),
            message: format!("column {index} is not text: {err:?}"),
        }),
        None => Err(SourceError::Malformed {
            query: query.to_string(),
            message: format!("column {index} is missing"),
        }),
    }
}
