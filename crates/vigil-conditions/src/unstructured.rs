//! Adapter for loosely-typed resources.
//!
//! Projects `metadata`, `kind`/`apiVersion` and `status.conditions` out of a
//! JSON object so it satisfies [`StatusResource`], and injects the condition
//! list back on the way out. Everything else in the payload is carried
//! through untouched.

use serde_json::{Map, Value};
use vigil_types::{Condition, ConditionTypes, GroupKind, ObjectMeta, StatusResource};

use crate::error::{ConditionError, ConditionResult};

const STATUS: &str = "status";
const CONDITIONS: &str = "conditions";

/// A structured value viewed as a status-bearing resource.
#[derive(Debug, Clone)]
pub struct Unstructured {
    object: Value,
    metadata: ObjectMeta,
    group_kind: GroupKind,
    condition_types: ConditionTypes,
    conditions: Vec<Condition>,
}

impl Unstructured {
    /// Adapt a JSON object. Fails before anything is mutated if the payload
    /// does not have the expected shape.
    pub fn from_value(object: Value, condition_types: ConditionTypes) -> ConditionResult<Self> {
        let map = object
            .as_object()
            .ok_or_else(|| ConditionError::conversion("object", "expected a JSON object"))?;

        let kind = map
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| ConditionError::conversion("kind", "missing or not a string"))?;
        let api_version = map.get("apiVersion").and_then(Value::as_str).unwrap_or("");
        let group_kind = GroupKind::from_api_version(api_version, kind);

        let metadata = map
            .get("metadata")
            .cloned()
            .ok_or_else(|| ConditionError::conversion("metadata", "missing"))?;
        let metadata: ObjectMeta = serde_json::from_value(metadata).map_err(|source| {
            ConditionError::Json {
                field: "metadata",
                source,
            }
        })?;

        let conditions = match map.get(STATUS) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(status)) => parse_conditions(status.get(CONDITIONS))?,
            Some(other) => {
                return Err(ConditionError::conversion(
                    "status",
                    format!("expected an object, found {}", json_type(other)),
                ))
            }
        };

        Ok(Self {
            object,
            metadata,
            group_kind,
            condition_types,
            conditions,
        })
    }

    /// The payload as it was adapted, without condition writes applied.
    pub fn object(&self) -> &Value {
        &self.object
    }

    /// The payload with the current condition list written to
    /// `status.conditions`.
    pub fn into_value(self) -> ConditionResult<Value> {
        let conditions =
            serde_json::to_value(&self.conditions).map_err(|source| ConditionError::Json {
                field: "status.conditions",
                source,
            })?;

        let mut object = self.object;
        let map = object
            .as_object_mut()
            .ok_or_else(|| ConditionError::conversion("object", "expected a JSON object"))?;
        let status = map
            .entry(STATUS)
            .or_insert_with(|| Value::Object(Map::new()));
        if status.is_null() {
            *status = Value::Object(Map::new());
        }
        let status = status
            .as_object_mut()
            .ok_or_else(|| ConditionError::conversion("status", "expected an object"))?;
        status.insert(CONDITIONS.to_string(), conditions);

        Ok(object)
    }
}

fn parse_conditions(raw: Option<&Value>) -> ConditionResult<Vec<Condition>> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .cloned()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Condition>, _>>()
            .map_err(|source| ConditionError::Json {
                field: "status.conditions",
                source,
            }),
        Some(other) => Err(ConditionError::conversion(
            "status.conditions",
            format!("expected an array, found {}", json_type(other)),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl StatusResource for Unstructured {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn group_kind(&self) -> GroupKind {
        self.group_kind.clone()
    }

    fn condition_types(&self) -> ConditionTypes {
        self.condition_types.clone()
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn set_conditions(&mut self, conditions: Vec<Condition>) {
        self.conditions = conditions;
    }
}
