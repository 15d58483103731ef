//! # Vigil Conditions - Condition Set Algebra
//!
//! This crate implements the condition model every observed resource
//! carries: a per-kind schema of one root condition and its dependents,
//! bound to the resource's live condition list.
//!
//! ## Rules
//!
//! - Binding a resource creates every schema condition it lacks as
//!   `Unknown` / `AwaitingReconciliation`.
//! - A write that changes nothing (status, reason, message, severity) is a
//!   no-op and reports `false`.
//! - `last_transition_time` moves only when the status moves.
//! - The root is True iff every dependent is True, False if any dependent is
//!   False, and Unknown otherwise.
//! - Schema conditions can transition but never be cleared.
//!
//! ## Example
//!
//! ```rust
//! use vigil_conditions::{StatusConditions, StatusObject};
//! use vigil_types::{ConditionTypes, GroupKind, MaybeCondition, ObjectMeta};
//!
//! let mut pool = StatusObject::new(
//!     GroupKind::new("karpenter.sh", "NodePool"),
//!     ObjectMeta::new("", "default"),
//!     ConditionTypes::ready(["ValidationSucceeded", "NodeClassReady"]),
//! );
//!
//! let mut conditions = pool.status_conditions();
//! conditions.set_true("ValidationSucceeded");
//! assert!(conditions.root().is_unknown());
//!
//! conditions.set_true("NodeClassReady");
//! assert!(conditions.root().is_true());
//! ```
//!
//! ## Loosely-typed resources
//!
//! [`Unstructured`] adapts a JSON object by projecting `status.conditions`,
//! so resources without a Rust type can be tracked the same way.

pub mod error;
pub mod object;
pub mod set;
pub mod unstructured;

pub use error::{ConditionError, ConditionResult};
pub use object::StatusObject;
pub use set::{
    ConditionSet, StatusConditions, AWAITING_RECONCILIATION, AWAITING_RECONCILIATION_MESSAGE,
    UNHEALTHY_DEPENDENTS,
};
pub use unstructured::Unstructured;
