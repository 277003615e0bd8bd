//! Collection cycles and the cross-cycle reconciliation of stale indexes.

pub mod reconciler;
mod service;
pub mod types;

pub use reconciler::{IndexSet, Reconciler};
pub use service::Collector;
pub use types::{CycleError, CycleReport};
