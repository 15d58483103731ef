//! Shared fixtures for observer tests.

#![allow(dead_code)]

use std::sync::Arc;

use prometheus::proto::{Metric, MetricFamily};
use vigil_conditions::{StatusConditions, StatusObject};
use vigil_controller::{MemoryEventSink, MemoryStore, ObserverConfig, TransitionObserver};
use vigil_observability::MetricsRegistry;
use vigil_types::{ConditionTypes, GroupKind, ObjectMeta, ResourceKey};

pub fn node_pool() -> GroupKind {
    GroupKind::new("karpenter.sh", "NodePool")
}

/// A cluster-scoped NodePool with its schema already bound.
pub fn pool(name: &str, dependents: &[&str]) -> StatusObject {
    let mut meta = ObjectMeta::new("", name);
    meta.uid = format!("uid-{}", name);
    let mut pool = StatusObject::new(
        node_pool(),
        meta,
        ConditionTypes::ready(dependents.iter().copied()),
    );
    pool.status_conditions();
    pool
}

pub fn key(name: &str) -> ResourceKey {
    ResourceKey::cluster_scoped(name)
}

pub struct Harness {
    pub registry: MetricsRegistry,
    pub store: Arc<MemoryStore<StatusObject>>,
    pub events: Arc<MemoryEventSink>,
    pub observer: Arc<TransitionObserver<StatusObject>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ObserverConfig::default())
    }

    pub fn with_config(config: ObserverConfig) -> Self {
        let registry = MetricsRegistry::new();
        let store = Arc::new(MemoryStore::new());
        let events = Arc::new(MemoryEventSink::new());
        let observer = TransitionObserver::new(
            node_pool(),
            config,
            store.clone(),
            events.clone(),
            &registry,
        )
        .unwrap();

        Self {
            registry,
            store,
            events,
            observer: Arc::new(observer),
        }
    }

    pub async fn reconcile(&self, name: &str) {
        self.observer.reconcile(&key(name)).await.unwrap();
    }

    /// Series of `family` whose labels include every pair in `labels`.
    pub fn series(&self, family: &str, labels: &[(&str, &str)]) -> Vec<Metric> {
        find_series(&self.registry.gather(), family, labels)
    }
}

pub fn find_series(
    families: &[MetricFamily],
    family: &str,
    labels: &[(&str, &str)],
) -> Vec<Metric> {
    families
        .iter()
        .filter(|f| f.get_name() == family)
        .flat_map(|f| f.get_metric().iter())
        .filter(|m| {
            labels.iter().all(|(name, value)| {
                m.get_label()
                    .iter()
                    .any(|l| l.get_name() == *name && l.get_value() == *value)
            })
        })
        .cloned()
        .collect()
}

pub fn label_names(metric: &Metric) -> Vec<String> {
    metric
        .get_label()
        .iter()
        .map(|l| l.get_name().to_string())
        .collect()
}

pub const COUNT: &str = "operator_node_pool_status_condition_count";
pub const CURRENT_STATUS: &str = "operator_node_pool_status_condition_current_status_seconds";
pub const TRANSITIONS: &str = "operator_node_pool_status_condition_transitions_total";
pub const TRANSITION_SECONDS: &str = "operator_node_pool_status_condition_transition_seconds";
pub const TERMINATION_CURRENT: &str = "operator_node_pool_termination_current_time_seconds";
pub const TERMINATION_DURATION: &str = "operator_node_pool_termination_duration_seconds";
