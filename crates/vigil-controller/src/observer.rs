//! Condition transition observer
//!
//! Each reconcile compares the resource's current conditions with the
//! snapshot taken on the previous reconcile of the same key, and turns the
//! difference into metrics and events. Only the two snapshots are compared:
//! several status changes between reconciles are reported as one net
//! transition.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};
use vigil_conditions::StatusConditions;
use vigil_observability::metrics::seconds_between;
use vigil_observability::{ConditionMetrics, LabelProjection, MetricsRegistry};
use vigil_types::{
    EventSink, GroupKind, ObjectReference, ResourceKey, StatusEvent, StatusResource,
};

use crate::config::ObserverConfig;
use crate::error::ObserverResult;
use crate::fetch::ResourceFetcher;
use crate::snapshot::{Snapshot, SnapshotStore};

/// Result of one reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// When to observe the resource again; `None` once it is gone
    pub requeue_after: Option<Duration>,
}

impl ReconcileOutcome {
    pub fn requeue(after: Duration) -> Self {
        Self {
            requeue_after: Some(after),
        }
    }

    pub fn done() -> Self {
        Self {
            requeue_after: None,
        }
    }
}

/// Observes condition transitions for one kind of resource
pub struct TransitionObserver<R> {
    group_kind: GroupKind,
    config: ObserverConfig,
    fetcher: Arc<dyn ResourceFetcher<R>>,
    events: Arc<dyn EventSink>,
    metrics: ConditionMetrics,
    snapshots: SnapshotStore,
}

impl<R: StatusResource + 'static> TransitionObserver<R> {
    /// Create an observer and register its metric families in `registry`.
    ///
    /// Metric names take the registry's namespace; build the registry with
    /// [`MetricsConfig::registry`](crate::MetricsConfig::registry) to honour
    /// the configured one.
    pub fn new(
        group_kind: GroupKind,
        config: ObserverConfig,
        fetcher: Arc<dyn ResourceFetcher<R>>,
        events: Arc<dyn EventSink>,
        registry: &MetricsRegistry,
    ) -> ObserverResult<Self> {
        if registry.namespace() != config.metrics.namespace {
            warn!(
                configured = %config.metrics.namespace,
                registry = %registry.namespace(),
                "Metrics namespace differs from configuration, using the registry's"
            );
        }

        let metrics = ConditionMetrics::new(
            registry,
            group_kind.clone(),
            config.metrics.legacy_metrics,
            LabelProjection::new(config.metrics.label_projection.iter().cloned()),
        )?;

        info!(
            kind = %group_kind,
            legacy_metrics = config.metrics.legacy_metrics,
            "Transition observer created"
        );

        Ok(Self {
            group_kind,
            config,
            fetcher,
            events,
            metrics,
            snapshots: SnapshotStore::new(),
        })
    }

    pub fn group_kind(&self) -> &GroupKind {
        &self.group_kind
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Observe one resource.
    ///
    /// Fetch errors are returned unchanged and leave metrics and snapshots
    /// untouched. A resource that no longer exists is cleaned up and not
    /// requeued.
    #[instrument(skip_all, fields(kind = %self.group_kind, resource = %key))]
    pub async fn reconcile(&self, key: &ResourceKey) -> ObserverResult<ReconcileOutcome> {
        let fetched = self.fetcher.fetch(key).await?;
        let now = Utc::now();

        let mut resource = match fetched {
            Some(resource) => resource,
            None => {
                self.finalize(key, now);
                return Ok(ReconcileOutcome::done());
            }
        };

        let conditions = resource.status_conditions().list().to_vec();
        let uid = resource.metadata().uid.clone();
        let finalizers = resource.finalizers().to_vec();
        let labels = resource.labels().clone();
        let deletion_timestamp = resource.deletion_timestamp();

        let current = Snapshot {
            uid,
            conditions,
            finalizers,
            terminating_since: deletion_timestamp,
            labels,
            observed_at: now,
        };
        let previous = self.snapshots.swap(key.clone(), |previous| {
            let mut next = current.clone();
            next.terminating_since = previous
                .and_then(|p| p.terminating_since)
                .or(next.terminating_since);
            next
        });

        let involved = self.reference(key, &current.uid);

        // finalizers removed since the last observation
        if let Some(previous) = &previous {
            for finalizer in previous
                .finalizers
                .iter()
                .filter(|f| !current.finalizers.contains(f))
            {
                info!(finalizer = %finalizer, "Finalizer removed");
                self.events
                    .publish(StatusEvent::finalized(involved.clone(), finalizer));
            }
        }

        // per-object series carry the old projected labels
        if let Some(previous) = &previous {
            if self
                .metrics
                .projection_changed(&previous.labels, &current.labels)
            {
                let removed = self.metrics.forget(key);
                debug!(series_removed = removed, "Projected labels changed");
            }
        }

        if let Some(deleted) = deletion_timestamp {
            self.metrics
                .set_termination_current(key, &current.labels, seconds_between(now, deleted));
        }

        for condition in &current.conditions {
            self.metrics
                .set_condition(key, &current.labels, condition, now);
        }

        if let Some(previous) = &previous {
            self.collect_stale_series(key, previous, &current);
        }

        self.report_transitions(&involved, previous.as_ref(), &current);

        debug!(
            conditions = current.conditions.len(),
            first_observation = previous.is_none(),
            "Reconciled"
        );
        Ok(ReconcileOutcome::requeue(self.config.requeue_interval()))
    }

    /// Reconcile many keys with at most `max_concurrent_reconciles` in
    /// flight. Results are in completion order.
    pub async fn reconcile_many<I>(
        &self,
        keys: I,
    ) -> Vec<(ResourceKey, ObserverResult<ReconcileOutcome>)>
    where
        I: IntoIterator<Item = ResourceKey>,
    {
        let limit = self.config.max_concurrent_reconciles.max(1);
        stream::iter(keys)
            .map(|key| async move {
                let result = self.reconcile(&key).await;
                (key, result)
            })
            .buffer_unordered(limit)
            .collect()
            .await
    }

    /// The last snapshot taken of `key`
    pub fn snapshot(&self, key: &ResourceKey) -> Option<Snapshot> {
        self.snapshots.get(key)
    }

    /// Keys with a snapshot, sorted
    pub fn tracked_keys(&self) -> Vec<ResourceKey> {
        self.snapshots.keys()
    }

    /// Unregister this observer's metric families.
    pub fn shutdown(self) {
        info!(
            kind = %self.group_kind,
            tracked = self.snapshots.len(),
            "Transition observer stopped"
        );
        self.metrics.unregister();
    }

    fn reference(&self, key: &ResourceKey, uid: &str) -> ObjectReference {
        ObjectReference {
            key: key.clone(),
            group_kind: self.group_kind.clone(),
            uid: uid.to_string(),
        }
    }

    /// The resource is gone: drop its series and state.
    fn finalize(&self, key: &ResourceKey, now: DateTime<Utc>) {
        let removed = self.metrics.forget(key);
        let Some(previous) = self.snapshots.remove(key) else {
            debug!(series_removed = removed, "Resource not found");
            return;
        };

        if let Some(since) = previous.terminating_since {
            self.metrics
                .observe_termination_duration(&previous.labels, seconds_between(now, since));
        }

        let involved = self.reference(key, &previous.uid);
        for finalizer in &previous.finalizers {
            self.events
                .publish(StatusEvent::finalized(involved.clone(), finalizer));
        }

        info!(
            series_removed = removed,
            terminating = previous.is_terminating(),
            "Resource deleted"
        );
    }

    /// Remove presence series for condition states that no longer hold.
    fn collect_stale_series(&self, key: &ResourceKey, previous: &Snapshot, current: &Snapshot) {
        for old in &previous.conditions {
            let stale = match current.get(&old.condition_type) {
                None => true,
                Some(now) => now.status != old.status || now.reason != old.reason,
            };
            if stale {
                self.metrics.delete_condition(key, old);
            }
        }
    }

    /// Count and announce every condition whose status moved.
    fn report_transitions(
        &self,
        involved: &ObjectReference,
        previous: Option<&Snapshot>,
        current: &Snapshot,
    ) {
        for condition in &current.conditions {
            let old = previous.and_then(|p| p.get(&condition.condition_type));
            if old.map_or(false, |o| o.status == condition.status) {
                continue;
            }

            self.metrics.record_transition(&current.labels, condition);

            let Some(old) = old else { continue };
            self.metrics.observe_transition_duration(
                &current.labels,
                old,
                seconds_between(condition.last_transition_time, old.last_transition_time),
            );

            info!(
                condition_type = %condition.condition_type,
                from = %old.status,
                to = %condition.status,
                reason = %condition.reason,
                "Condition transitioned"
            );
            self.events
                .publish(StatusEvent::transition(involved.clone(), old.status, condition));
        }
    }
}
