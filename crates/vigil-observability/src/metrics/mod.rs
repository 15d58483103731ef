//! Condition metrics
//!
//! Prometheus-backed families behind the [`sink`] contracts, with series
//! tracking so per-object series can be garbage collected.

pub mod conditions;
pub mod exporter;
pub mod labels;
pub mod registry;
pub mod series;
pub mod sink;

pub use conditions::{seconds_between, ConditionFamilies, ConditionMetrics, DURATION_BUCKETS};
pub use exporter::export_metrics;
pub use labels::LabelProjection;
pub use registry::{MetricsRegistry, DEFAULT_NAMESPACE};
pub use series::{CounterFamily, GaugeFamily, HistogramFamily};
pub use sink::{labels, Counter, Gauge, Histogram, Labels};
