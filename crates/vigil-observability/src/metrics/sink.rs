//! Metric sink contracts
//!
//! The observer talks to metrics only through these traits. Label sets are
//! passed as name/value maps; a family picks the names it declares and
//! ignores the rest, so one map can feed families with different layouts.

use std::collections::BTreeMap;

/// Label name to value.
pub type Labels = BTreeMap<String, String>;

/// Monotonic counter family.
pub trait Counter: Send + Sync {
    fn inc(&self, labels: &Labels);
}

/// Settable gauge family with series deletion.
pub trait Gauge: Send + Sync {
    fn set(&self, value: f64, labels: &Labels);

    /// Delete the series with exactly these label values. Returns whether it
    /// existed.
    fn delete(&self, labels: &Labels) -> bool;

    /// Delete every series whose labels include all of `labels`. Returns the
    /// number of series removed.
    fn delete_partial_match(&self, labels: &Labels) -> usize;
}

/// Histogram family.
pub trait Histogram: Send + Sync {
    fn observe(&self, value: f64, labels: &Labels);
}

/// Build a label map from name/value pairs.
pub fn labels<I, K, V>(pairs: I) -> Labels
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
