//! Shared types used by the stats source client and its callers.

use std::fmt;
use thiserror::Error;

/// Broad classification of a failed connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// The server could not be reached (refused, DNS, socket errors).
    Unreachable,
    /// The server rejected the handshake credentials.
    Authentication,
    /// The handshake failed for any other protocol-level reason.
    Protocol,
}

impl fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unreachable => "unreachable",
            Self::Authentication => "authentication",
            Self::Protocol => "protocol",
        };
        f.write_str(label)
    }
}

/// Errors returned while talking to the stats source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Opening the connection failed.
    #[error("Connection to stats source failed ({kind}): {message}")]
    Connection {
        /// Classification of the failure.
        kind: ConnectionErrorKind,
        /// Diagnostic text reported by the driver.
        message: String,
    },
    /// The server rejected or failed a query.
    #[error("Query `{query}` failed: {message}")]
    Query {
        /// Query text that was sent.
        query: String,
        /// Diagnostic text reported by the driver.
        message: String,
    },
    /// The server answered with rows that lack the expected columns.
    #[error("Query `{query}` returned a malformed row: {message}")]
    Malformed {
        /// Query text that was sent.
        query: String,
        /// Description of the missing or unreadable column.
        message: String,
    },
    /// An index name was refused before any query text was built.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

/// Index name rejected by the identifier allow-list.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Index name {0:?} contains characters outside [A-Za-z0-9_]")]
pub struct IdentifierError(pub String);

/// One row of the index listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Index name as reported by the server.
    pub name: String,
    /// Index kind (`local`, `rt`, `distributed`, ...).
    pub kind: String,
}

impl IndexEntry {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Raw key/value statistic for one index. Values arrive as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRow {
    /// Statistic name, matched against registered metric keys.
    pub name: String,
    /// Unparsed statistic value.
    pub value: String,
}

impl StatRow {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
