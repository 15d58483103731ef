//! Label names and label construction for condition metrics

use std::collections::{BTreeMap, HashSet};

use super::sink::Labels;

pub const NAMESPACE: &str = "namespace";
pub const NAME: &str = "name";
pub const GROUP: &str = "group";
pub const KIND: &str = "kind";
pub const TYPE: &str = "type";
pub const STATUS: &str = "status";
pub const REASON: &str = "reason";

/// Prefix for label names projected from resource labels.
pub const PROJECTED_PREFIX: &str = "label_";

/// Convert a kind such as `NodePool` or `EC2NodeClass` into a metric-name
/// fragment (`node_pool`, `ec2_node_class`).
pub fn to_snake_case(kind: &str) -> String {
    let chars: Vec<char> = kind.chars().collect();
    let mut out = String::with_capacity(kind.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map_or(false, |n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower);
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out.trim_matches('_').to_string()
}

/// Make an arbitrary resource label key usable as a metric label name.
fn sanitize(key: &str) -> String {
    let body: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{}{}", PROJECTED_PREFIX, body)
}

/// Resource labels copied onto every per-kind metric.
///
/// Keys that sanitize to the same label name are collapsed; the first one
/// configured wins.
#[derive(Debug, Clone, Default)]
pub struct LabelProjection {
    entries: Vec<(String, String)>,
}

impl LabelProjection {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let entries = keys
            .into_iter()
            .map(Into::into)
            .filter_map(|key| {
                let name = sanitize(&key);
                seen.insert(name.clone()).then_some((key, name))
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metric label names, in configuration order.
    pub fn label_names(&self) -> Vec<String> {
        self.entries.iter().map(|(_, name)| name.clone()).collect()
    }

    /// Project a resource's labels. Absent keys project as empty values.
    pub fn project(&self, resource_labels: &BTreeMap<String, String>) -> Labels {
        self.entries
            .iter()
            .map(|(key, name)| {
                let value = resource_labels.get(key).cloned().unwrap_or_default();
                (name.clone(), value)
            })
            .collect()
    }
}
