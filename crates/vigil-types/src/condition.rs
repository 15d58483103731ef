//! Condition types
//!
//! A condition is a named tri-state health indicator. Conditions are owned
//! by the resource they describe and are mutated through a bound
//! condition set (see the `vigil-conditions` crate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tri-state status of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl Default for ConditionStatus {
    fn default() -> Self {
        ConditionStatus::Unknown
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How seriously a non-True condition should be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConditionSeverity {
    #[default]
    Error,
    Info,
}

impl ConditionSeverity {
    pub fn is_error(&self) -> bool {
        matches!(self, ConditionSeverity::Error)
    }
}

/// A single status condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Stable condition name, e.g. `Ready`
    #[serde(rename = "type")]
    pub condition_type: String,

    pub status: ConditionStatus,

    #[serde(default, skip_serializing_if = "ConditionSeverity::is_error")]
    pub severity: ConditionSeverity,

    /// Short machine-readable reason in CamelCase
    #[serde(default)]
    pub reason: String,

    /// Human-readable detail
    #[serde(default)]
    pub message: String,

    /// Last time the status changed
    pub last_transition_time: DateTime<Utc>,

    /// Resource generation this condition was computed against
    #[serde(default)]
    pub observed_generation: i64,
}

impl Condition {
    /// Create a condition stamped with the current time.
    pub fn new(condition_type: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            severity: ConditionSeverity::Error,
            reason: String::new(),
            message: String::new(),
            last_transition_time: Utc::now(),
            observed_generation: 0,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_severity(mut self, severity: ConditionSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    pub fn is_false(&self) -> bool {
        self.status == ConditionStatus::False
    }

    pub fn is_unknown(&self) -> bool {
        self.status == ConditionStatus::Unknown
    }

    /// Whether `other` carries the same observable state, ignoring timestamps
    /// and observed generation.
    pub fn same_state(&self, other: &Condition) -> bool {
        self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
            && self.severity == other.severity
    }
}

/// Nil-safe status checks for a condition that may be absent.
///
/// An absent condition is neither true nor false; it counts as unknown.
pub trait MaybeCondition {
    fn is_true(&self) -> bool;
    fn is_false(&self) -> bool;
    fn is_unknown(&self) -> bool;
}

impl MaybeCondition for Option<&Condition> {
    fn is_true(&self) -> bool {
        self.map(Condition::is_true).unwrap_or(false)
    }

    fn is_false(&self) -> bool {
        self.map(Condition::is_false).unwrap_or(false)
    }

    fn is_unknown(&self) -> bool {
        self.map(Condition::is_unknown).unwrap_or(true)
    }
}
