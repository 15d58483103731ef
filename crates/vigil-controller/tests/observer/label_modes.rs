//! Legacy mirroring, label projection and registry lifecycle.

use std::sync::Arc;

use vigil_controller::{
    MemoryEventSink, MemoryStore, ObserverConfig, ObserverError, TransitionObserver,
};
use vigil_conditions::StatusObject;
use vigil_observability::MetricsRegistry;

use crate::common::*;

const LEGACY_COUNT: &str = "operator_status_condition_count";
const LEGACY_TRANSITIONS: &str = "operator_status_condition_transitions_total";

fn new_observer(
    registry: &MetricsRegistry,
) -> Result<TransitionObserver<StatusObject>, ObserverError> {
    TransitionObserver::new(
        node_pool(),
        ObserverConfig::default(),
        Arc::new(MemoryStore::<StatusObject>::new()),
        Arc::new(MemoryEventSink::new()),
        registry,
    )
}

#[tokio::test]
async fn legacy_and_projected_labels() {
    let h = Harness::with_config(
        ObserverConfig::default()
            .with_legacy_metrics(true)
            .with_label_projection(["team", "zone"]),
    );
    h.store.upsert(pool("default", &["Foo"]).with_label("team", "infra"));
    h.reconcile("default").await;

    let count = h.series(COUNT, &[("type", "Foo"), ("label_team", "infra"), ("label_zone", "")]);
    assert_eq!(count.len(), 1);
    let names = label_names(&count[0]);
    assert!(!names.contains(&"group".to_string()));
    assert!(!names.contains(&"kind".to_string()));

    let legacy = h.series(
        LEGACY_COUNT,
        &[("group", "karpenter.sh"), ("kind", "NodePool"), ("type", "Foo")],
    );
    assert_eq!(legacy.len(), 1);
    assert!(!label_names(&legacy[0]).contains(&"label_team".to_string()));
    assert_eq!(h.series(LEGACY_TRANSITIONS, &[("kind", "NodePool")]).len(), 2);

    // Deletion clears both surfaces
    h.store.remove(&key("default"));
    h.reconcile("default").await;
    assert!(h.series(COUNT, &[]).is_empty());
    assert!(h.series(LEGACY_COUNT, &[]).is_empty());
}

#[tokio::test]
async fn legacy_disabled_by_default() {
    let h = Harness::new();
    h.store.upsert(pool("default", &["Foo"]));
    h.reconcile("default").await;

    assert_eq!(h.series(COUNT, &[]).len(), 2);
    assert!(h.series(LEGACY_COUNT, &[]).is_empty());
}

#[tokio::test]
async fn shutdown_unregisters_families() {
    let h = Harness::new();
    h.store.upsert(pool("default", &["Foo"]));
    h.reconcile("default").await;

    let Harness {
        registry, observer, ..
    } = h;

    // One observer per kind and registry
    let duplicate = new_observer(&registry);
    assert!(matches!(duplicate, Err(ObserverError::Metrics(_))));
    assert!(!duplicate.err().map_or(true, |e| e.is_retryable()));

    let observer = Arc::try_unwrap(observer).ok().unwrap();
    observer.shutdown();
    assert!(registry.gather().is_empty());
    assert!(new_observer(&registry).is_ok());
}

#[tokio::test]
async fn custom_namespace() {
    let registry = MetricsRegistry::with_namespace("karpenter").unwrap();
    let store = Arc::new(MemoryStore::new());
    let observer = TransitionObserver::new(
        node_pool(),
        ObserverConfig::default(),
        store.clone(),
        Arc::new(MemoryEventSink::new()),
        &registry,
    )
    .unwrap();

    store.upsert(pool("default", &["Foo"]));
    observer.reconcile(&key("default")).await.unwrap();

    let exported = registry.export().unwrap();
    assert!(exported.contains("karpenter_node_pool_status_condition_count{"));
    assert!(!exported.contains("operator_"));
}

#[tokio::test]
async fn configured_namespace_names_metrics() {
    let config = ObserverConfig::default().with_namespace("karpenter");
    let registry = config.metrics.registry().unwrap();
    let store = Arc::new(MemoryStore::new());
    let observer = TransitionObserver::new(
        node_pool(),
        config,
        store.clone(),
        Arc::new(MemoryEventSink::new()),
        &registry,
    )
    .unwrap();

    store.upsert(pool("default", &["Foo"]));
    observer.reconcile(&key("default")).await.unwrap();

    let gathered = registry.gather();
    assert_eq!(
        find_series(&gathered, "karpenter_node_pool_status_condition_count", &[]).len(),
        2
    );
    assert!(find_series(&gathered, COUNT, &[]).is_empty());
}

#[tokio::test]
async fn projected_label_change_replaces_series() {
    let h = Harness::with_config(ObserverConfig::default().with_label_projection(["team"]));
    h.store.upsert(pool("default", &["Foo"]).with_label("team", "a"));
    h.reconcile("default").await;

    // Same condition states, new projected value
    h.store.upsert(pool("default", &["Foo"]).with_label("team", "b"));
    h.reconcile("default").await;

    let foo = h.series(COUNT, &[("type", "Foo")]);
    assert_eq!(foo.len(), 1);
    assert_eq!(h.series(COUNT, &[("type", "Foo"), ("label_team", "b")]).len(), 1);
    assert!(h.series(CURRENT_STATUS, &[("label_team", "a")]).is_empty());
    assert_eq!(h.series(CURRENT_STATUS, &[]).len(), 2);
    assert!(h.events.is_empty());
}

#[tokio::test]
async fn projected_label_change_while_terminating() {
    let h = Harness::with_config(ObserverConfig::default().with_label_projection(["team"]));
    let mut terminating = pool("default", &["Foo"])
        .with_label("team", "a")
        .with_finalizer("karpenter.sh/termination");
    terminating.mark_deleted(chrono::Utc::now());
    h.store.upsert(terminating.clone());
    h.reconcile("default").await;

    let mut relabelled = terminating.clone();
    relabelled
        .metadata
        .labels
        .insert("team".to_string(), "b".to_string());
    h.store.upsert(relabelled);
    h.reconcile("default").await;

    let termination = h.series(TERMINATION_CURRENT, &[]);
    assert_eq!(termination.len(), 1);
    assert_eq!(h.series(TERMINATION_CURRENT, &[("label_team", "b")]).len(), 1);
}

#[tokio::test]
async fn unprojected_label_change_keeps_series() {
    let h = Harness::with_config(ObserverConfig::default().with_label_projection(["team"]));
    h.store.upsert(pool("default", &["Foo"]).with_label("team", "a"));
    h.reconcile("default").await;

    h.store.upsert(
        pool("default", &["Foo"])
            .with_label("team", "a")
            .with_label("zone", "us-east-1a"),
    );
    h.reconcile("default").await;

    assert_eq!(h.series(COUNT, &[("label_team", "a")]).len(), 2);
}
