//! Metrics registry wrapper

use std::sync::Arc;

use parking_lot::Mutex;
use prometheus::proto::MetricFamily;
use prometheus::Registry;

use super::conditions::ConditionFamilies;
use super::exporter::export_metrics;
use super::labels;
use crate::error::Result;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "operator";

/// A Prometheus registry owned by the caller rather than the process.
///
/// Cloning shares the underlying registry. Legacy condition families are
/// created on first use and shared by every kind in the registry.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    namespace: String,
    legacy: Arc<Mutex<Option<Arc<ConditionFamilies>>>>,
}

impl MetricsRegistry {
    /// Create a registry under the default namespace
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
            .unwrap_or_else(|_| Self::from_registry(Registry::new(), ""))
    }

    /// Create a registry whose metric names are prefixed with `namespace`.
    /// An empty namespace leaves names unprefixed.
    pub fn with_namespace(namespace: &str) -> Result<Self> {
        let prefix = (!namespace.is_empty()).then(|| namespace.to_string());
        let registry = Registry::new_custom(prefix, None)?;
        Ok(Self::from_registry(registry, namespace))
    }

    fn from_registry(registry: Registry, namespace: &str) -> Self {
        Self {
            registry: Arc::new(registry),
            namespace: namespace.to_string(),
            legacy: Arc::new(Mutex::new(None)),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The shared legacy families, registering them on first use.
    pub fn legacy_families(&self) -> Result<Arc<ConditionFamilies>> {
        let mut slot = self.legacy.lock();
        if let Some(families) = slot.as_ref() {
            return Ok(Arc::clone(families));
        }

        let families = ConditionFamilies::new("", &[labels::GROUP, labels::KIND], &[])?;
        families.register(&self.registry)?;
        let families = Arc::new(families);
        *slot = Some(Arc::clone(&families));
        Ok(families)
    }

    /// Give back a handle from [`legacy_families`](Self::legacy_families).
    /// The families are unregistered when the last handle is returned.
    pub fn release_legacy(&self, families: Arc<ConditionFamilies>) {
        let mut slot = self.legacy.lock();
        let last = match slot.as_ref() {
            // the slot and `families` are the only holders
            Some(cached) => Arc::ptr_eq(cached, &families) && Arc::strong_count(&families) == 2,
            None => false,
        };
        if last {
            families.unregister(&self.registry);
            *slot = None;
        }
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Export all metrics in Prometheus text format
    pub fn export(&self) -> Result<String> {
        export_metrics(&self.registry)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("namespace", &self.namespace)
            .finish()
    }
}
