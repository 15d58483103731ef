//! Fetch failures leave observer state untouched.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use vigil_conditions::{ConditionError, StatusConditions, Unstructured};
use vigil_controller::{
    FetchError, MemoryEventSink, ObserverConfig, ObserverError, ResourceFetcher, TransitionObserver,
};
use vigil_observability::MetricsRegistry;
use vigil_types::{ConditionTypes, ResourceKey};

use crate::common::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serves one JSON payload, adapted on every fetch.
struct JsonFetcher {
    payload: Mutex<Option<Value>>,
}

#[async_trait]
impl ResourceFetcher<Unstructured> for JsonFetcher {
    async fn fetch(&self, _key: &ResourceKey) -> Result<Option<Unstructured>, FetchError> {
        let payload = self.payload.lock().unwrap().clone();
        match payload {
            Some(value) => Ok(Some(Unstructured::from_value(
                value,
                ConditionTypes::ready(["Foo"]),
            )?)),
            None => Ok(None),
        }
    }
}

fn payload(foo_status: &str) -> Value {
    json!({
        "apiVersion": "karpenter.sh/v1",
        "kind": "NodePool",
        "metadata": {"name": "default", "uid": "abc", "generation": 1},
        "status": {
            "conditions": [{
                "type": "Foo",
                "status": foo_status,
                "reason": "Foo",
                "lastTransitionTime": "2024-01-01T00:00:00Z"
            }]
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_error_propagates_without_mutation() {
    let h = Harness::new();
    h.store.upsert(pool("default", &["Foo"]));
    h.reconcile("default").await;

    let exported = h.registry.export().unwrap();
    let snapshot = h.observer.snapshot(&key("default")).unwrap();

    h.store.update(&key("default"), |p| {
        p.status_conditions().set_true("Foo");
    });
    h.store.fail_next(FetchError::Unavailable("connection refused".into()));

    let err = h.observer.reconcile(&key("default")).await.unwrap_err();
    assert!(matches!(err, ObserverError::Fetch(FetchError::Unavailable(_))));
    assert_eq!(err.to_string(), "resource source unavailable: connection refused");
    assert!(err.is_retryable());

    assert_eq!(h.registry.export().unwrap(), exported);
    assert_eq!(h.observer.snapshot(&key("default")).unwrap(), snapshot);
    assert!(h.events.is_empty());

    // The next cycle sees the change
    h.reconcile("default").await;
    assert_eq!(h.events.reasons(), vec!["Foo", "Ready"]);
}

#[tokio::test]
async fn malformed_payload_aborts_before_mutation() {
    let fetcher = Arc::new(JsonFetcher {
        payload: Mutex::new(Some(payload("True"))),
    });
    let events = Arc::new(MemoryEventSink::new());
    let registry = MetricsRegistry::new();
    let observer = TransitionObserver::new(
        node_pool(),
        ObserverConfig::default(),
        fetcher.clone(),
        events.clone(),
        &registry,
    )
    .unwrap();

    let key = ResourceKey::cluster_scoped("default");
    observer.reconcile(&key).await.unwrap();
    let snapshot = observer.snapshot(&key).unwrap();
    assert!(snapshot.get("Foo").unwrap().is_true());
    assert_eq!(snapshot.uid, "abc");

    *fetcher.payload.lock().unwrap() = Some(payload("Sideways"));
    let exported = registry.export().unwrap();

    let err = observer.reconcile(&key).await.unwrap_err();
    assert!(matches!(
        err,
        ObserverError::Fetch(FetchError::Conversion(ConditionError::Json { .. }))
    ));
    assert!(err.is_retryable());
    assert_eq!(registry.export().unwrap(), exported);
    assert_eq!(observer.snapshot(&key).unwrap(), snapshot);
    assert!(events.is_empty());
}

#[tokio::test]
async fn cancelled_fetch_is_retryable() {
    let h = Harness::new();
    h.store.fail_next(FetchError::Cancelled);
    let err = h.observer.reconcile(&key("default")).await.unwrap_err();
    assert!(matches!(err, ObserverError::Fetch(FetchError::Cancelled)));
    assert!(err.is_retryable());
    assert!(h.observer.tracked_keys().is_empty());
}
