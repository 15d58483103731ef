//! Notification events for observed status changes
//!
//! Events are published fire-and-forget through an [`EventSink`]. A sink may
//! drop, delay or deduplicate them; publishers must not rely on delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Condition, ConditionStatus, GroupKind, ResourceKey};

/// Reason attached to finalizer-removal events.
pub const FINALIZED_REASON: &str = "Finalized";

/// Event type, mirroring the usual Normal/Warning split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Normal,
    Warning,
}

/// The resource an event is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    pub key: ResourceKey,
    pub group_kind: GroupKind,
    pub uid: String,
}

/// A single notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Subject of the event
    pub involved: ObjectReference,

    pub event_type: EventType,

    pub reason: String,

    pub message: String,

    /// Values a downstream deduplicator keys on, together with the reason
    pub dedupe_values: Vec<String>,
}

impl StatusEvent {
    pub fn new(
        involved: ObjectReference,
        event_type: EventType,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            involved,
            event_type,
            reason: reason.into(),
            message: message.into(),
            dedupe_values: Vec::new(),
        }
    }

    pub fn with_dedupe_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dedupe_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Event for a condition whose status moved from `old_status` to
    /// `current.status`.
    pub fn transition(
        involved: ObjectReference,
        old_status: ConditionStatus,
        current: &Condition,
    ) -> Self {
        let mut message = format!(
            "Status condition transitioned, Type: {}, Status: {} -> {}, Reason: {}",
            current.condition_type, old_status, current.status, current.reason
        );
        if !current.message.is_empty() {
            message.push_str(", Message: ");
            message.push_str(&current.message);
        }

        let event_type = if current.is_false() && current.severity.is_error() {
            EventType::Warning
        } else {
            EventType::Normal
        };

        let uid = involved.uid.clone();
        Self::new(involved, event_type, current.condition_type.clone(), message)
            .with_dedupe_values([
                uid,
                current.condition_type.clone(),
                current.status.to_string(),
                current.reason.clone(),
            ])
    }

    /// Event for a finalizer that is no longer present.
    pub fn finalized(involved: ObjectReference, finalizer: &str) -> Self {
        let uid = involved.uid.clone();
        Self::new(
            involved,
            EventType::Normal,
            FINALIZED_REASON,
            format!("Finalized {}", finalizer),
        )
        .with_dedupe_values([uid, finalizer.to_string()])
    }
}

/// Destination for status events.
pub trait EventSink: Send + Sync {
    /// Publish an event. Best effort; never fails.
    fn publish(&self, event: StatusEvent);
}
