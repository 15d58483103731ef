//! A natively typed resource carrying conditions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_types::{Condition, ConditionTypes, GroupKind, ObjectMeta, StatusResource};

/// Minimal typed resource: metadata, kind, schema and conditions.
///
/// Useful for embedding the observer without a custom resource type, and
/// as the reference implementation of [`StatusResource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusObject {
    pub metadata: ObjectMeta,

    pub group_kind: GroupKind,

    pub condition_types: ConditionTypes,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl StatusObject {
    pub fn new(
        group_kind: GroupKind,
        metadata: ObjectMeta,
        condition_types: ConditionTypes,
    ) -> Self {
        Self {
            metadata,
            group_kind,
            condition_types,
            conditions: Vec::new(),
        }
    }

    pub fn with_generation(mut self, generation: i64) -> Self {
        self.metadata.generation = generation;
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_finalizer(mut self, finalizer: impl Into<String>) -> Self {
        self.metadata.finalizers.push(finalizer.into());
        self
    }

    /// Mark the resource as terminating.
    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        if self.metadata.deletion_timestamp.is_none() {
            self.metadata.deletion_timestamp = Some(at);
        }
    }

    pub fn remove_finalizer(&mut self, finalizer: &str) -> bool {
        let before = self.metadata.finalizers.len();
        self.metadata.finalizers.retain(|f| f != finalizer);
        self.metadata.finalizers.len() != before
    }
}

impl StatusResource for StatusObject {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn group_kind(&self) -> GroupKind {
        self.group_kind.clone()
    }

    fn condition_types(&self) -> ConditionTypes {
        self.condition_types.clone()
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn set_conditions(&mut self, conditions: Vec<Condition>) {
        self.conditions = conditions;
    }
}
