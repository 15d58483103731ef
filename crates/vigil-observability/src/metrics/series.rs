//! Prometheus-backed metric families with series tracking
//!
//! Prometheus vectors cannot enumerate or partially match their children,
//! so each family keeps an index of the label values it has written. The
//! index lock is held across the vector mutation: a delete and a concurrent
//! set on the same label values are applied in a single order.

use std::collections::HashSet;

use parking_lot::Mutex;
use prometheus::core::Collector;
use prometheus::{GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts};

use super::sink::{Counter, Gauge, Histogram, Labels};
use crate::error::Result;

struct SeriesIndex {
    label_names: Vec<String>,
    live: Mutex<HashSet<Vec<String>>>,
}

impl SeriesIndex {
    fn new(label_names: &[String]) -> Self {
        Self {
            label_names: label_names.to_vec(),
            live: Mutex::new(HashSet::new()),
        }
    }

    /// Values in declaration order; undeclared names are ignored and
    /// missing ones are empty.
    fn values(&self, labels: &Labels) -> Vec<String> {
        self.label_names
            .iter()
            .map(|name| labels.get(name).cloned().unwrap_or_default())
            .collect()
    }

    fn matches(&self, values: &[String], partial: &Labels) -> bool {
        partial.iter().all(|(name, value)| {
            self.label_names
                .iter()
                .position(|n| n == name)
                .map(|i| values[i] == *value)
                .unwrap_or(false)
        })
    }

    fn record(&self, labels: &Labels, write: impl FnOnce(&[&str])) {
        let values = self.values(labels);
        let mut live = self.live.lock();
        write(&as_refs(&values));
        live.insert(values);
    }

    fn remove(&self, labels: &Labels, delete: impl Fn(&[&str])) -> bool {
        let values = self.values(labels);
        let mut live = self.live.lock();
        let existed = live.remove(&values);
        if existed {
            delete(&as_refs(&values));
        }
        existed
    }

    fn remove_matching(&self, partial: &Labels, delete: impl Fn(&[&str])) -> usize {
        let mut live = self.live.lock();
        let doomed: Vec<Vec<String>> = live
            .iter()
            .filter(|values| self.matches(values, partial))
            .cloned()
            .collect();
        for values in &doomed {
            live.remove(values);
            delete(&as_refs(values));
        }
        doomed.len()
    }

    /// Keep only the entries whose names this family declares.
    fn declared(&self, labels: &Labels) -> Labels {
        labels
            .iter()
            .filter(|(name, _)| self.label_names.contains(name))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.live.lock().len()
    }
}

fn as_refs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

fn names(label_names: &[String]) -> Vec<&str> {
    as_refs(label_names)
}

/// Gauge family
pub struct GaugeFamily {
    vec: GaugeVec,
    index: SeriesIndex,
}

impl GaugeFamily {
    pub fn new(name: &str, help: &str, label_names: &[String]) -> Result<Self> {
        let vec = GaugeVec::new(Opts::new(name, help), &names(label_names))?;
        Ok(Self {
            vec,
            index: SeriesIndex::new(label_names),
        })
    }

    /// The underlying vector, for registration.
    pub fn collector(&self) -> Box<dyn Collector> {
        Box::new(self.vec.clone())
    }

    /// Restrict a label set to the names this family declares.
    pub fn declared(&self, labels: &Labels) -> Labels {
        self.index.declared(labels)
    }

    #[cfg(test)]
    fn series_count(&self) -> usize {
        self.index.len()
    }
}

impl Gauge for GaugeFamily {
    fn set(&self, value: f64, labels: &Labels) {
        self.index
            .record(labels, |values| self.vec.with_label_values(values).set(value));
    }

    fn delete(&self, labels: &Labels) -> bool {
        self.index.remove(labels, |values| {
            let _ = self.vec.remove_label_values(values);
        })
    }

    fn delete_partial_match(&self, labels: &Labels) -> usize {
        self.index.remove_matching(labels, |values| {
            let _ = self.vec.remove_label_values(values);
        })
    }
}

/// Integer counter family
pub struct CounterFamily {
    vec: IntCounterVec,
    index: SeriesIndex,
}

impl CounterFamily {
    pub fn new(name: &str, help: &str, label_names: &[String]) -> Result<Self> {
        let vec = IntCounterVec::new(Opts::new(name, help), &names(label_names))?;
        Ok(Self {
            vec,
            index: SeriesIndex::new(label_names),
        })
    }

    /// The underlying vector, for registration.
    pub fn collector(&self) -> Box<dyn Collector> {
        Box::new(self.vec.clone())
    }

    /// Restrict a label set to the names this family declares.
    pub fn declared(&self, labels: &Labels) -> Labels {
        self.index.declared(labels)
    }

    pub fn delete_partial_match(&self, labels: &Labels) -> usize {
        self.index.remove_matching(labels, |values| {
            let _ = self.vec.remove_label_values(values);
        })
    }
}

impl Counter for CounterFamily {
    fn inc(&self, labels: &Labels) {
        self.index
            .record(labels, |values| self.vec.with_label_values(values).inc());
    }
}

/// Histogram family
pub struct HistogramFamily {
    vec: HistogramVec,
    index: SeriesIndex,
}

impl HistogramFamily {
    pub fn new(
        name: &str,
        help: &str,
        buckets: Vec<f64>,
        label_names: &[String],
    ) -> Result<Self> {
        let vec = HistogramVec::new(
            HistogramOpts::new(name, help).buckets(buckets),
            &names(label_names),
        )?;
        Ok(Self {
            vec,
            index: SeriesIndex::new(label_names),
        })
    }

    /// The underlying vector, for registration.
    pub fn collector(&self) -> Box<dyn Collector> {
        Box::new(self.vec.clone())
    }

    /// Restrict a label set to the names this family declares.
    pub fn declared(&self, labels: &Labels) -> Labels {
        self.index.declared(labels)
    }

    pub fn delete_partial_match(&self, labels: &Labels) -> usize {
        self.index.remove_matching(labels, |values| {
            let _ = self.vec.remove_label_values(values);
        })
    }
}

impl Histogram for HistogramFamily {
    fn observe(&self, value: f64, labels: &Labels) {
        self.index
            .record(labels, |values| self.vec.with_label_values(values).observe(value));
    }
}
