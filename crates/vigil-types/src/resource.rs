//! Resource capability required by the condition model and the observer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Condition, ConditionTypes, GroupKind, ResourceKey};

/// Object metadata the observer reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub namespace: String,

    pub name: String,

    #[serde(default)]
    pub uid: String,

    /// Incremented on every spec change
    #[serde(default)]
    pub generation: i64,

    #[serde(default)]
    pub creation_timestamp: DateTime<Utc>,

    /// Set once deletion has been requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,

    /// Holds that must be cleared before the resource is removed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            creation_timestamp: Utc::now(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.namespace.clone(), self.name.clone())
    }

    pub fn is_terminating(&self) -> bool {
        self.deletion_timestamp.is_some()
    }
}

/// Capability a resource exposes so its conditions can be tracked.
///
/// Implemented natively by typed resources, or through an adapter over a
/// loosely-typed structured value.
pub trait StatusResource: Send + Sync {
    fn metadata(&self) -> &ObjectMeta;

    fn group_kind(&self) -> GroupKind;

    /// Condition schema of this resource's kind.
    fn condition_types(&self) -> ConditionTypes;

    fn conditions(&self) -> &[Condition];

    fn set_conditions(&mut self, conditions: Vec<Condition>);

    fn key(&self) -> ResourceKey {
        self.metadata().key()
    }

    fn generation(&self) -> i64 {
        self.metadata().generation
    }

    fn creation_timestamp(&self) -> DateTime<Utc> {
        self.metadata().creation_timestamp
    }

    fn deletion_timestamp(&self) -> Option<DateTime<Utc>> {
        self.metadata().deletion_timestamp
    }

    fn finalizers(&self) -> &[String] {
        &self.metadata().finalizers
    }

    fn labels(&self) -> &BTreeMap<String, String> {
        &self.metadata().labels
    }
}
