//! Condition metrics
//!
//! One [`ConditionFamilies`] holds the six metric families describing
//! condition state for a kind. [`ConditionMetrics`] is the per-kind handle an
//! observer writes through: it always writes the kind's own families and,
//! when enabled, mirrors every write into the registry-wide legacy families
//! that carry `group` and `kind` labels.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use prometheus::core::Collector;
use prometheus::Registry;
use vigil_types::{Condition, GroupKind, ResourceKey};

use super::labels::{self, LabelProjection};
use super::registry::MetricsRegistry;
use super::series::{CounterFamily, GaugeFamily, HistogramFamily};
use super::sink::{Counter, Gauge, Histogram, Labels};
use crate::error::Result;

/// Buckets for transition and termination durations, in seconds.
pub const DURATION_BUCKETS: &[f64] = &[
    0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0, 21600.0,
    43200.0, 86400.0,
];

/// Seconds from `earlier` to `later`, never negative.
pub fn seconds_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    ((later - earlier).num_milliseconds() as f64 / 1000.0).max(0.0)
}

/// The metric families describing condition state.
pub struct ConditionFamilies {
    pub count: GaugeFamily,
    pub current_status_seconds: GaugeFamily,
    pub transitions_total: CounterFamily,
    pub transition_seconds: HistogramFamily,
    pub termination_current_time_seconds: GaugeFamily,
    pub termination_duration_seconds: HistogramFamily,
}

impl ConditionFamilies {
    /// Build unregistered families. `prefix` is prepended to every family
    /// name, `scope` labels follow the identity labels and `extra` labels
    /// come last.
    pub fn new(prefix: &str, scope: &[&str], extra: &[String]) -> Result<Self> {
        let names = |parts: &[&str]| -> Vec<String> {
            parts
                .iter()
                .map(|p| p.to_string())
                .chain(extra.iter().cloned())
                .collect()
        };
        let with_scope = |head: &[&str], tail: &[&str]| -> Vec<String> {
            let parts: Vec<&str> = head
                .iter()
                .chain(scope.iter())
                .chain(tail.iter())
                .copied()
                .collect();
            names(&parts)
        };

        let identity = [labels::NAMESPACE, labels::NAME];
        let state = [labels::TYPE, labels::STATUS, labels::REASON];

        Ok(Self {
            count: GaugeFamily::new(
                &format!("{}status_condition_count", prefix),
                "The number of a condition for a given object, type and status. e.g. Alarm := Available=False > 0",
                &with_scope(&identity, &state),
            )?,
            current_status_seconds: GaugeFamily::new(
                &format!("{}status_condition_current_status_seconds", prefix),
                "The current amount of time in seconds that a status condition has been in a specific state.",
                &with_scope(&identity, &state),
            )?,
            transitions_total: CounterFamily::new(
                &format!("{}status_condition_transitions_total", prefix),
                "The count of transitions of a given object, type and status.",
                &with_scope(&[], &state),
            )?,
            transition_seconds: HistogramFamily::new(
                &format!("{}status_condition_transition_seconds", prefix),
                "The amount of time a condition was in a given state before transitioning.",
                DURATION_BUCKETS.to_vec(),
                &with_scope(&[], &[labels::TYPE, labels::STATUS]),
            )?,
            termination_current_time_seconds: GaugeFamily::new(
                &format!("{}termination_current_time_seconds", prefix),
                "The current amount of time in seconds that an object has been in terminating state.",
                &with_scope(&identity, &[]),
            )?,
            termination_duration_seconds: HistogramFamily::new(
                &format!("{}termination_duration_seconds", prefix),
                "The amount of time taken by an object to terminate completely.",
                DURATION_BUCKETS.to_vec(),
                &with_scope(&[], &[]),
            )?,
        })
    }

    fn collectors(&self) -> Vec<Box<dyn Collector>> {
        vec![
            self.count.collector(),
            self.current_status_seconds.collector(),
            self.transitions_total.collector(),
            self.transition_seconds.collector(),
            self.termination_current_time_seconds.collector(),
            self.termination_duration_seconds.collector(),
        ]
    }

    /// Register every family. Nothing stays registered if one fails.
    pub fn register(&self, registry: &Registry) -> Result<()> {
        for (i, collector) in self.collectors().into_iter().enumerate() {
            if let Err(e) = registry.register(collector) {
                for registered in self.collectors().into_iter().take(i) {
                    let _ = registry.unregister(registered);
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    pub fn unregister(&self, registry: &Registry) {
        for collector in self.collectors() {
            let _ = registry.unregister(collector);
        }
    }

    fn set_condition(&self, labels: &Labels, age_seconds: f64) {
        self.count.set(1.0, labels);
        self.current_status_seconds.set(age_seconds, labels);
    }

    fn delete_condition(&self, partial: &Labels) -> usize {
        self.count.delete_partial_match(&self.count.declared(partial))
            + self
                .current_status_seconds
                .delete_partial_match(&self.current_status_seconds.declared(partial))
    }

    fn forget(&self, partial: &Labels) -> usize {
        self.delete_condition(partial)
            + self
                .termination_current_time_seconds
                .delete_partial_match(&self.termination_current_time_seconds.declared(partial))
    }
}

/// Per-kind writer over the condition metric families.
pub struct ConditionMetrics {
    group_kind: GroupKind,
    projection: LabelProjection,
    families: Arc<ConditionFamilies>,
    legacy: Option<Arc<ConditionFamilies>>,
    registry: MetricsRegistry,
}

impl ConditionMetrics {
    /// Create and register the families for `group_kind`. Fails if the kind
    /// already has families in this registry.
    pub fn new(
        registry: &MetricsRegistry,
        group_kind: GroupKind,
        legacy: bool,
        projection: LabelProjection,
    ) -> Result<Self> {
        let prefix = format!("{}_", labels::to_snake_case(&group_kind.kind));
        let families = ConditionFamilies::new(&prefix, &[], &projection.label_names())?;
        families.register(registry.registry())?;

        let legacy = if legacy {
            match registry.legacy_families() {
                Ok(shared) => Some(shared),
                Err(e) => {
                    families.unregister(registry.registry());
                    return Err(e);
                }
            }
        } else {
            None
        };

        Ok(Self {
            group_kind,
            projection,
            families: Arc::new(families),
            legacy,
            registry: registry.clone(),
        })
    }

    pub fn group_kind(&self) -> &GroupKind {
        &self.group_kind
    }

    pub fn legacy_enabled(&self) -> bool {
        self.legacy.is_some()
    }

    /// Label set for one write: identity, group/kind, projected resource
    /// labels and the given extras. Each family keeps the names it declares.
    fn label_set(
        &self,
        key: Option<&ResourceKey>,
        resource_labels: &BTreeMap<String, String>,
        extra: &[(&str, &str)],
    ) -> Labels {
        let mut out = self.projection.project(resource_labels);
        if let Some(key) = key {
            out.insert(labels::NAMESPACE.to_string(), key.namespace.clone());
            out.insert(labels::NAME.to_string(), key.name.clone());
        }
        out.insert(labels::GROUP.to_string(), self.group_kind.group.clone());
        out.insert(labels::KIND.to_string(), self.group_kind.kind.clone());
        for (name, value) in extra.iter().copied() {
            out.insert(name.to_string(), value.to_string());
        }
        out
    }

    fn each(&self, mut f: impl FnMut(&ConditionFamilies)) {
        f(&self.families);
        if let Some(legacy) = &self.legacy {
            f(legacy);
        }
    }

    /// Mark `condition` present on the resource and refresh its age.
    pub fn set_condition(
        &self,
        key: &ResourceKey,
        resource_labels: &BTreeMap<String, String>,
        condition: &Condition,
        now: DateTime<Utc>,
    ) {
        let labels = self.label_set(
            Some(key),
            resource_labels,
            &[
                (labels::TYPE, condition.condition_type.as_str()),
                (labels::STATUS, condition.status.as_str()),
                (labels::REASON, condition.reason.as_str()),
            ],
        );
        let age = seconds_between(now, condition.last_transition_time);
        self.each(|f| f.set_condition(&labels, age));
    }

    /// Drop the presence and age series of a condition state that no longer
    /// holds. Returns the number of series removed.
    pub fn delete_condition(&self, key: &ResourceKey, condition: &Condition) -> usize {
        let partial = self.label_set(
            Some(key),
            &BTreeMap::new(),
            &[
                (labels::TYPE, condition.condition_type.as_str()),
                (labels::STATUS, condition.status.as_str()),
                (labels::REASON, condition.reason.as_str()),
            ],
        );
        let partial = self.without_projection(partial);
        let mut removed = 0;
        self.each(|f| removed += f.delete_condition(&partial));
        removed
    }

    /// Count a transition into `current`.
    pub fn record_transition(
        &self,
        resource_labels: &BTreeMap<String, String>,
        current: &Condition,
    ) {
        let labels = self.label_set(
            None,
            resource_labels,
            &[
                (labels::TYPE, current.condition_type.as_str()),
                (labels::STATUS, current.status.as_str()),
                (labels::REASON, current.reason.as_str()),
            ],
        );
        self.each(|f| f.transitions_total.inc(&labels));
    }

    /// Record how long the condition spent in `previous`'s status.
    pub fn observe_transition_duration(
        &self,
        resource_labels: &BTreeMap<String, String>,
        previous: &Condition,
        seconds: f64,
    ) {
        let labels = self.label_set(
            None,
            resource_labels,
            &[
                (labels::TYPE, previous.condition_type.as_str()),
                (labels::STATUS, previous.status.as_str()),
            ],
        );
        self.each(|f| f.transition_seconds.observe(seconds, &labels));
    }

    pub fn set_termination_current(
        &self,
        key: &ResourceKey,
        resource_labels: &BTreeMap<String, String>,
        seconds: f64,
    ) {
        let labels = self.label_set(Some(key), resource_labels, &[]);
        self.each(|f| f.termination_current_time_seconds.set(seconds, &labels));
    }

    pub fn observe_termination_duration(
        &self,
        resource_labels: &BTreeMap<String, String>,
        seconds: f64,
    ) {
        let labels = self.label_set(None, resource_labels, &[]);
        self.each(|f| f.termination_duration_seconds.observe(seconds, &labels));
    }

    /// Whether two label sets of one resource project to different metric
    /// labels. Always false without a projection.
    pub fn projection_changed(
        &self,
        before: &BTreeMap<String, String>,
        after: &BTreeMap<String, String>,
    ) -> bool {
        !self.projection.is_empty()
            && self.projection.project(before) != self.projection.project(after)
    }

    /// Remove every per-object series for `key`. Returns the number of
    /// series removed.
    pub fn forget(&self, key: &ResourceKey) -> usize {
        let partial = self.without_projection(self.label_set(Some(key), &BTreeMap::new(), &[]));
        let mut removed = 0;
        self.each(|f| removed += f.forget(&partial));
        removed
    }

    /// Unregister this kind's families. Legacy families are unregistered
    /// once no kind uses them.
    pub fn unregister(self) {
        self.families.unregister(self.registry.registry());
        if let Some(legacy) = self.legacy {
            self.registry.release_legacy(legacy);
        }
    }

    fn without_projection(&self, mut set: Labels) -> Labels {
        set.retain(|name, _| !name.starts_with(labels::PROJECTED_PREFIX));
        set
    }
}
