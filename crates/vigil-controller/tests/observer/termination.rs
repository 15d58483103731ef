//! Deletion and termination tracking.

use chrono::{Duration, Utc};
use vigil_controller::ReconcileOutcome;
use vigil_types::FINALIZED_REASON;

use crate::common::*;

const FINALIZER: &str = "karpenter.sh/termination";

#[tokio::test]
async fn terminating_resource_is_timed_until_gone() {
    let h = Harness::new();
    h.store.upsert(pool("a", &["Foo"]).with_finalizer(FINALIZER));
    h.store.upsert(pool("b", &["Foo"]));
    h.reconcile("a").await;
    h.reconcile("b").await;
    assert!(h.series(TERMINATION_CURRENT, &[]).is_empty());

    h.store.update(&key("a"), |p| p.mark_deleted(Utc::now() - Duration::seconds(5)));
    h.reconcile("a").await;

    let current = h.series(TERMINATION_CURRENT, &[("name", "a")]);
    assert_eq!(current.len(), 1);
    assert!(current[0].get_gauge().get_value() >= 5.0);
    assert!(h.observer.snapshot(&key("a")).unwrap().is_terminating());

    // Finalizer removed while the resource still exists
    h.store.update(&key("a"), |p| {
        p.remove_finalizer(FINALIZER);
    });
    h.reconcile("a").await;
    assert_eq!(h.events.reasons(), vec![FINALIZED_REASON]);
    assert_eq!(h.events.events()[0].message, format!("Finalized {}", FINALIZER));

    // Gone
    h.store.remove(&key("a"));
    let outcome = h.observer.reconcile(&key("a")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::done());

    let duration = h.series(TERMINATION_DURATION, &[]);
    assert_eq!(duration.len(), 1);
    assert_eq!(duration[0].get_histogram().get_sample_count(), 1);
    assert!(duration[0].get_histogram().get_sample_sum() >= 5.0);

    for family in [COUNT, CURRENT_STATUS, TERMINATION_CURRENT] {
        assert!(h.series(family, &[("name", "a")]).is_empty(), "{}", family);
    }
    assert_eq!(h.series(COUNT, &[("name", "b")]).len(), 2);

    // No second notification for the finalizer already reported
    assert_eq!(h.events.len(), 1);
    assert_eq!(h.observer.tracked_keys(), vec![key("b")]);
}

#[tokio::test]
async fn vanished_resource_reports_remembered_finalizers() {
    let h = Harness::new();
    h.store.upsert(
        pool("a", &["Foo"])
            .with_finalizer(FINALIZER)
            .with_finalizer("example.com/cleanup"),
    );
    h.reconcile("a").await;

    h.store.remove(&key("a"));
    h.reconcile("a").await;

    assert_eq!(h.events.reasons(), vec![FINALIZED_REASON, FINALIZED_REASON]);
    let messages: Vec<String> = h.events.events().into_iter().map(|e| e.message).collect();
    assert_eq!(
        messages,
        vec![
            format!("Finalized {}", FINALIZER),
            "Finalized example.com/cleanup".to_string()
        ]
    );

    // Never marked terminating, so no termination sample
    assert!(h.series(TERMINATION_DURATION, &[]).is_empty());
    assert!(h.series(COUNT, &[]).is_empty());
    assert!(h.observer.tracked_keys().is_empty());
}

#[tokio::test]
async fn first_deletion_timestamp_is_kept() {
    let h = Harness::new();
    let first = Utc::now() - Duration::seconds(60);
    let mut resource = pool("a", &["Foo"]);
    resource.mark_deleted(first);
    h.store.upsert(resource);
    h.reconcile("a").await;

    h.store.update(&key("a"), |p| {
        p.metadata.deletion_timestamp = Some(Utc::now());
    });
    h.reconcile("a").await;

    assert_eq!(h.observer.snapshot(&key("a")).unwrap().terminating_since, Some(first));

    h.store.remove(&key("a"));
    h.reconcile("a").await;
    let duration = h.series(TERMINATION_DURATION, &[]);
    assert!(duration[0].get_histogram().get_sample_sum() >= 60.0);
}

#[tokio::test]
async fn unknown_key_is_a_no_op() {
    let h = Harness::new();
    let outcome = h.observer.reconcile(&key("never-seen")).await.unwrap();
    assert_eq!(outcome.requeue_after, None);
    assert!(h.events.is_empty());
    assert!(h.registry.gather().is_empty());
}
