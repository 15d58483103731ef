//! Vigil Observability
//!
//! Metrics and logging infrastructure for condition observers.
//!
//! ## Features
//!
//! - **Metrics**: Prometheus families for condition presence, age,
//!   transitions and termination, per kind and optionally mirrored into
//!   registry-wide legacy families
//! - **Cardinality control**: every family tracks its live series so stale
//!   condition states can be removed by partial label match
//! - **Tracing**: `tracing-subscriber` setup with env filtering and optional
//!   JSON output

pub mod error;
pub mod metrics;
pub mod tracing;

pub use error::{ObservabilityError, Result};
pub use metrics::{
    ConditionMetrics, Counter, Gauge, Histogram, LabelProjection, Labels, MetricsRegistry,
};
pub use tracing::{init_tracing, TracingConfig};
