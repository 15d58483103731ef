//! Condition sets: a schema bound to one resource's live condition list.
//!
//! The resource owns its conditions. A [`ConditionSet`] borrows the resource
//! mutably for as long as it is in use, so every write goes straight back
//! through [`StatusResource::set_conditions`].

use chrono::Utc;
use tracing::{debug, warn};
use vigil_types::{Condition, ConditionStatus, ConditionTypes, MaybeCondition, StatusResource};

use crate::error::{ConditionError, ConditionResult};

/// Reason given to schema conditions created by binding.
pub const AWAITING_RECONCILIATION: &str = "AwaitingReconciliation";

/// Message given to schema conditions created by binding.
pub const AWAITING_RECONCILIATION_MESSAGE: &str = "object is awaiting reconciliation";

/// Reason the root carries while any dependent is not True.
pub const UNHEALTHY_DEPENDENTS: &str = "UnhealthyDependents";

/// A condition schema bound to a resource.
pub struct ConditionSet<'a, R: StatusResource + ?Sized> {
    types: ConditionTypes,
    resource: &'a mut R,
}

impl<'a, R: StatusResource + ?Sized> ConditionSet<'a, R> {
    /// Bind the resource's schema to it. Every declared type missing from
    /// the resource is created as Unknown.
    pub fn bind(resource: &'a mut R) -> Self {
        let types = resource.condition_types();
        let mut set = Self { types, resource };
        set.initialize();
        set
    }

    fn initialize(&mut self) {
        let now = Utc::now();
        let generation = self.resource.generation();
        let mut conditions = self.resource.conditions().to_vec();
        let mut added = false;

        for condition_type in self.types.all() {
            if conditions.iter().any(|c| c.condition_type == condition_type) {
                continue;
            }
            conditions.push(Condition {
                condition_type: condition_type.to_string(),
                status: ConditionStatus::Unknown,
                severity: Default::default(),
                reason: AWAITING_RECONCILIATION.to_string(),
                message: AWAITING_RECONCILIATION_MESSAGE.to_string(),
                last_transition_time: now,
                observed_generation: generation,
            });
            added = true;
        }

        if added {
            sort_by_type(&mut conditions);
            self.resource.set_conditions(conditions);
        }
    }

    pub fn types(&self) -> &ConditionTypes {
        &self.types
    }

    pub fn root(&self) -> Option<&Condition> {
        self.get(self.types.root())
    }

    pub fn get(&self, condition_type: &str) -> Option<&Condition> {
        self.resource
            .conditions()
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    /// All conditions, sorted by type.
    pub fn list(&self) -> &[Condition] {
        self.resource.conditions()
    }

    pub fn is_dependent(&self, condition_type: &str) -> bool {
        self.types.is_dependent(condition_type)
    }

    pub fn is_schema_declared(&self, condition_type: &str) -> bool {
        self.types.contains(condition_type)
    }

    /// True when every named condition is True. No names means nothing is
    /// asserted, which holds vacuously.
    pub fn is_true(&self, condition_types: &[&str]) -> bool {
        condition_types.iter().all(|t| self.get(t).is_true())
    }

    /// Replace or insert a condition by type.
    ///
    /// Returns `false` without touching anything when status, reason,
    /// message and severity all match the existing condition. Otherwise the
    /// condition is stamped with the resource generation, its transition time
    /// moves only if the status changed, and the root is recomputed unless
    /// the root itself was written.
    pub fn set(&mut self, mut condition: Condition) -> bool {
        match self.get(&condition.condition_type) {
            Some(existing) if existing.same_state(&condition) => return false,
            Some(existing) if existing.status == condition.status => {
                condition.last_transition_time = existing.last_transition_time;
            }
            _ => condition.last_transition_time = Utc::now(),
        }
        condition.observed_generation = self.resource.generation();

        let condition_type = condition.condition_type.clone();
        debug!(
            condition_type = %condition_type,
            status = %condition.status,
            reason = %condition.reason,
            "Setting condition"
        );

        let mut conditions: Vec<Condition> = self
            .resource
            .conditions()
            .iter()
            .filter(|c| c.condition_type != condition_type)
            .cloned()
            .collect();
        conditions.push(condition);
        sort_by_type(&mut conditions);
        self.resource.set_conditions(conditions);

        if !self.types.is_root(&condition_type) {
            self.recompute_root();
        }
        true
    }

    /// Set a condition True with its type as the reason.
    pub fn set_true(&mut self, condition_type: &str) -> bool {
        self.set(Condition::new(condition_type, ConditionStatus::True).with_reason(condition_type))
    }

    pub fn set_true_with_reason(
        &mut self,
        condition_type: &str,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> bool {
        self.set(
            Condition::new(condition_type, ConditionStatus::True)
                .with_reason(reason)
                .with_message(message),
        )
    }

    pub fn set_false(
        &mut self,
        condition_type: &str,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> bool {
        self.set(
            Condition::new(condition_type, ConditionStatus::False)
                .with_reason(reason)
                .with_message(message),
        )
    }

    /// Set a condition Unknown with its type as the reason.
    pub fn set_unknown(&mut self, condition_type: &str) -> bool {
        self.set(
            Condition::new(condition_type, ConditionStatus::Unknown).with_reason(condition_type),
        )
    }

    pub fn set_unknown_with_reason(
        &mut self,
        condition_type: &str,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> bool {
        self.set(
            Condition::new(condition_type, ConditionStatus::Unknown)
                .with_reason(reason)
                .with_message(message),
        )
    }

    /// Remove an ad hoc condition. Returns whether it was present.
    ///
    /// Schema-declared conditions can only transition, so clearing one is
    /// rejected and leaves the resource untouched.
    pub fn clear(&mut self, condition_type: &str) -> ConditionResult<bool> {
        if self.types.contains(condition_type) {
            warn!(
                condition_type = %condition_type,
                "Refusing to clear schema-declared condition"
            );
            return Err(ConditionError::SchemaDeclared(condition_type.to_string()));
        }

        let before = self.resource.conditions().len();
        let conditions: Vec<Condition> = self
            .resource
            .conditions()
            .iter()
            .filter(|c| c.condition_type != condition_type)
            .cloned()
            .collect();
        if conditions.len() == before {
            return Ok(false);
        }

        self.resource.set_conditions(conditions);
        Ok(true)
    }

    fn recompute_root(&mut self) {
        let mut unhealthy: Vec<Condition> = self
            .types
            .dependents()
            .iter()
            .map(|t| {
                self.get(t)
                    .cloned()
                    .unwrap_or_else(|| Condition::new(t.as_str(), ConditionStatus::Unknown))
            })
            .filter(|c| !c.is_true())
            .collect();

        let root = self.types.root().to_string();
        if unhealthy.is_empty() {
            self.set_true(&root);
            return;
        }

        unhealthy.sort_by(|a, b| {
            b.last_transition_time
                .cmp(&a.last_transition_time)
                .then_with(|| a.condition_type.cmp(&b.condition_type))
        });
        let message = unhealthy
            .iter()
            .map(|c| format!("{}={}", c.condition_type, c.status))
            .collect::<Vec<_>>()
            .join(", ");

        if unhealthy.iter().any(Condition::is_false) {
            self.set_false(&root, UNHEALTHY_DEPENDENTS, message);
        } else {
            self.set_unknown_with_reason(&root, UNHEALTHY_DEPENDENTS, message);
        }
    }
}

fn sort_by_type(conditions: &mut [Condition]) {
    conditions.sort_by(|a, b| a.condition_type.cmp(&b.condition_type));
}

/// Bind a resource to its condition schema.
pub trait StatusConditions: StatusResource {
    fn status_conditions(&mut self) -> ConditionSet<'_, Self> {
        ConditionSet::bind(self)
    }
}

impl<R: StatusResource + ?Sized> StatusConditions for R {}
