//! Many resources reconciled concurrently.

use std::sync::Arc;

use vigil_conditions::StatusConditions;
use vigil_controller::ObserverConfig;
use vigil_types::ConditionStatus;

use crate::common::*;

const RESOURCES: usize = 100;

fn name(i: usize) -> String {
    format!("pool-{:03}", i)
}

async fn wave(h: &Harness) {
    let mut handles = Vec::with_capacity(RESOURCES);
    for i in 0..RESOURCES {
        let observer = Arc::clone(&h.observer);
        handles.push(tokio::spawn(async move {
            observer.reconcile(&key(&name(i))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn two_waves_keep_per_key_state() {
    let h = Harness::new();
    for i in 0..RESOURCES {
        h.store.upsert(pool(&name(i), &["Foo", "Bar"]));
    }

    wave(&h).await;
    assert_eq!(h.observer.tracked_keys().len(), RESOURCES);

    for i in 0..RESOURCES {
        h.store.update(&key(&name(i)), |p| {
            let mut conditions = p.status_conditions();
            if i % 2 == 0 {
                conditions.set_true("Foo");
                conditions.set_true("Bar");
            } else {
                conditions.set_false("Foo", "Broken", format!("resource {}", i));
            }
        });
    }

    wave(&h).await;

    for i in 0..RESOURCES {
        let snapshot = h.observer.snapshot(&key(&name(i))).unwrap();
        let ready = snapshot.get("Ready").unwrap();
        if i % 2 == 0 {
            assert_eq!(ready.status, ConditionStatus::True, "{}", name(i));
        } else {
            assert_eq!(ready.status, ConditionStatus::False, "{}", name(i));
            assert_eq!(
                snapshot.get("Foo").unwrap().message,
                format!("resource {}", i)
            );
        }
        assert_eq!(snapshot.uid, format!("uid-{}", name(i)));
    }

    // Two current conditions per type per resource would be a leak
    assert_eq!(h.series(COUNT, &[]).len(), RESOURCES * 3);
    assert_eq!(h.events.len(), (RESOURCES / 2) * 3 + (RESOURCES / 2) * 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reconcile_many_is_bounded_and_complete() {
    let h = Harness::with_config(ObserverConfig::default().with_max_concurrent_reconciles(3));
    for i in 0..RESOURCES {
        h.store.upsert(pool(&name(i), &["Foo"]));
    }

    let keys: Vec<_> = (0..RESOURCES).map(|i| key(&name(i))).collect();
    let results = h.observer.reconcile_many(keys.clone()).await;
    assert_eq!(results.len(), RESOURCES);
    assert!(results.iter().all(|(_, r)| r.is_ok()));

    let mut tracked = h.observer.tracked_keys();
    tracked.sort();
    assert_eq!(tracked, keys);
}
