//! Condition schema for a resource kind

use serde::{Deserialize, Serialize};

/// Conventional root condition type.
pub const READY: &str = "Ready";

/// Immutable schema of the conditions a resource kind carries: one root
/// and the dependents it is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionTypes {
    root: String,
    dependents: Vec<String>,
}

impl ConditionTypes {
    /// Build a schema. Duplicate dependents are dropped (first occurrence
    /// wins) and the root is never its own dependent.
    pub fn new<I, S>(root: impl Into<String>, dependents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let root = root.into();
        let mut deduped: Vec<String> = Vec::new();
        for dependent in dependents {
            let dependent = dependent.into();
            if dependent != root && !deduped.contains(&dependent) {
                deduped.push(dependent);
            }
        }

        Self {
            root,
            dependents: deduped,
        }
    }

    /// Schema rooted at [`READY`].
    pub fn ready<I, S>(dependents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(READY, dependents)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn dependents(&self) -> &[String] {
        &self.dependents
    }

    pub fn is_root(&self, condition_type: &str) -> bool {
        self.root == condition_type
    }

    pub fn is_dependent(&self, condition_type: &str) -> bool {
        self.dependents.iter().any(|d| d == condition_type)
    }

    /// Whether the type is declared by the schema (root or dependent).
    pub fn contains(&self, condition_type: &str) -> bool {
        self.is_root(condition_type) || self.is_dependent(condition_type)
    }

    /// All declared types, dependents first.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.dependents
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.root.as_str()))
    }
}
