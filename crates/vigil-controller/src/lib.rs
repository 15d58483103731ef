//! Vigil Controller
//!
//! The transition observer: a per-resource reconcile function that diffs a
//! resource's conditions against the previous observation and reports the
//! net change through metrics and events.
//!
//! - [`TransitionObserver`] runs the reconcile pipeline for one kind
//! - [`ResourceFetcher`] is the only suspending collaborator
//! - [`MemoryStore`] and the event sinks in [`events`] are ready-made
//!   collaborators for embedding and testing
//!
//! Scheduling, watches and leader election belong to the caller; the
//! observer only asks to be called again after
//! [`ReconcileOutcome::requeue_after`].

pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod observer;
pub mod snapshot;
pub mod store;

pub use config::{LoggingConfig, MetricsConfig, ObserverConfig};
pub use error::{FetchError, ObserverError, ObserverResult};
pub use events::{BroadcastEventSink, MemoryEventSink};
pub use fetch::ResourceFetcher;
pub use observer::{ReconcileOutcome, TransitionObserver};
pub use snapshot::{Snapshot, SnapshotStore};
pub use store::MemoryStore;
