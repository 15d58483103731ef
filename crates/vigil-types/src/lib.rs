//! Vigil Types - Core types for condition status tracking
//!
//! Vigil tracks the health of long-lived resources that are reconciled by
//! eventually-consistent control loops. Each resource carries a list of
//! named tri-state conditions; one of them (the root) is derived from the
//! others.
//!
//! ## Key Concepts
//!
//! - **Condition**: Named True/False/Unknown indicator with reason and message
//! - **ConditionTypes**: Per-kind schema of one root and its dependents
//! - **StatusResource**: Capability a resource exposes to the condition model
//! - **ResourceKey**: Stable `namespace/name` identity across observations
//! - **StatusEvent**: Notification published when a transition is observed

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod condition;
pub mod events;
pub mod ids;
pub mod resource;
pub mod schema;

// Re-export main types
pub use condition::{Condition, ConditionSeverity, ConditionStatus, MaybeCondition};
pub use events::{EventSink, EventType, ObjectReference, StatusEvent, FINALIZED_REASON};
pub use ids::{GroupKind, ParseKeyError, ResourceKey};
pub use resource::{ObjectMeta, StatusResource};
pub use schema::{ConditionTypes, READY};
