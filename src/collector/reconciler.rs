//! Cross-cycle reconciliation of the observed index set.
//!
//! A pull-based endpoint has no way to say "this index was deleted", so any index seen in the
//! previous cycle but missing from the current one gets every registered gauge forced to zero.

use crate::registry::MetricRegistry;
use std::collections::BTreeSet;

/// Names of the indexes observed during one cycle.
pub type IndexSet = BTreeSet<String>;

/// Holds the index set of the last completed cycle.
#[derive(Debug, Default)]
pub struct Reconciler {
    previous: IndexSet,
}

impl Reconciler {
    /// Start with an empty previous set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes observed by the last reconciled cycle.
    pub fn previous(&self) -> &IndexSet {
        &self.previous
    }

    /// Zero every gauge of every index in `previous \ current`, then remember `current`.
    ///
    /// Returns the zeroed index names in sorted order.
    pub fn reconcile(&mut self, current: IndexSet, registry: &MetricRegistry) -> Vec<String> {
        let stale: Vec<String> = self.previous.difference(&current).cloned().collect();
        for index in &stale {
            for key in registry.all_keys() {
                if let Err(err) = registry.zero(key, index) {
                    tracing::warn!(index = %index, key, error = %err, "Failed to zero stale gauge");
                }
            }
            tracing::info!(index = %index, "Index disappeared; zeroed its gauges");
        }
        self.previous = current;
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFINITIONS;

    fn set(names: &[&str]) -> IndexSet {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn registry_with(index: &str, value: f64) -> MetricRegistry {
        let registry = MetricRegistry::with_definitions(&DEFINITIONS).expect("registry");
        for key in DEFINITIONS.iter().map(|definition| definition.key) {
            registry.set_value(key, index, value).expect("seed");
        }
        registry
    }

    #[test]
    fn zeroes_every_gauge_of_vanished_indexes() {
        let registry = registry_with("reviews", 7.0);
        registry
            .set_value("indexed_documents", "products", 100.0)
            .expect("seed");
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(set(&["products", "reviews"]), &registry);

        let zeroed = reconciler.reconcile(set(&["products"]), &registry);

        assert_eq!(zeroed, vec!["reviews".to_string()]);
        for definition in &DEFINITIONS {
            assert_eq!(registry.value(definition.key, "reviews"), Some(0.0));
        }
        assert_eq!(
            registry.value("indexed_documents", "products"),
            Some(100.0)
        );
        assert_eq!(reconciler.previous(), &set(&["products"]));
    }

    #[test]
    fn first_cycle_has_nothing_to_zero() {
        let registry = MetricRegistry::with_definitions(&DEFINITIONS).expect("registry");
        let mut reconciler = Reconciler::new();
        assert!(reconciler.reconcile(set(&["a", "b"]), &registry).is_empty());
        assert_eq!(registry.value("ram_bytes", "a"), None);
    }

    #[test]
    fn repeated_reconciliation_is_idempotent() {
        let registry = registry_with("gone", 3.0);
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(set(&["gone", "kept"]), &registry);

        assert_eq!(reconciler.reconcile(set(&["kept"]), &registry), vec!["gone"]);
        assert!(reconciler.reconcile(set(&["kept"]), &registry).is_empty());
        assert_eq!(registry.value("mem_limit", "gone"), Some(0.0));
        assert_eq!(reconciler.previous(), &set(&["kept"]));
    }

    #[test]
    fn reappearing_index_is_not_zeroed() {
        let registry = registry_with("flaky", 5.0);
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(set(&["flaky"]), &registry);
        reconciler.reconcile(set(&[]), &registry);
        registry
            .set_value("total_tokens", "flaky", 9.0)
            .expect("refresh");

        assert!(reconciler.reconcile(set(&["flaky"]), &registry).is_empty());
        assert_eq!(registry.value("total_tokens", "flaky"), Some(9.0));
    }
}
