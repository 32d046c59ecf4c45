//! Values
//!
//! `Value` is the dynamically typed datum stored in targets and refs. Objects
//! come in two flavours: a raw `Object(Target)` and an `Observable` wrapping
//! one. Both count as objects for wrapping purposes, and both compare by
//! identity.
//!
//! # Strict equality
//!
//! Writes are suppressed when the new value is strictly equal to the old one.
//! Primitives compare by value, objects by identity. Two NaNs compare equal
//! here, so writing NaN over NaN does not notify anyone.
//!
//! # JSON
//!
//! Values convert from `serde_json::Value` (objects become records, arrays
//! become lists) and snapshot back into it. Snapshots follow nested targets and
//! fail with [`ReactiveError::Cycle`] if a target contains itself.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value as Json;

use super::observable::Observable;
use super::target::{Shape, Target, TargetId, MAX_LENGTH};
use crate::error::{ReactiveError, Result};

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Arc<str>),
    Object(Target),
    Observable(Observable),
}

impl Value {
    /// Strict equality: primitives by value, objects by identity, NaN equals NaN.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Observable(a), Value::Observable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Observable(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_observable(&self) -> Option<&Observable> {
        match self {
            Value::Observable(observable) => Some(observable),
            _ => None,
        }
    }

    /// The raw target behind an object value, whether wrapped or not.
    pub fn as_target(&self) -> Option<&Target> {
        match self {
            Value::Object(target) => Some(target),
            Value::Observable(observable) => Some(observable.target()),
            _ => None,
        }
    }

    pub(crate) fn as_length(&self) -> Option<usize> {
        match self {
            Value::Number(n)
                if *n >= 0.0 && *n <= MAX_LENGTH as f64 && n.fract() == 0.0 =>
            {
                Some(*n as usize)
            }
            _ => None,
        }
    }

    /// Build a value from JSON. Objects and arrays become fresh targets.
    pub fn from_json(json: Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::Str(Arc::from(s)),
            Json::Array(items) => {
                Value::Object(Target::from_values(items.into_iter().map(Value::from_json)))
            }
            Json::Object(map) => Value::Object(Target::from_entries(
                map.into_iter().map(|(key, value)| (key, Value::from_json(value))),
            )),
        }
    }

    /// Snapshot this value, following nested targets, into JSON.
    ///
    /// `Undefined` record entries are omitted; `Undefined` list slots, holes
    /// and non-finite numbers become `null`.
    pub fn to_json(&self) -> Result<Json> {
        self.snapshot(&mut Vec::new())
    }

    fn snapshot(&self, path: &mut Vec<TargetId>) -> Result<Json> {
        Ok(match self {
            Value::Undefined | Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::Str(s) => Json::String(s.to_string()),
            Value::Object(target) => snapshot_target(target, path)?,
            Value::Observable(observable) => snapshot_target(observable.target(), path)?,
        })
    }
}

fn snapshot_target(target: &Target, path: &mut Vec<TargetId>) -> Result<Json> {
    if path.contains(&target.id()) {
        return Err(ReactiveError::Cycle { target: target.id() });
    }
    path.push(target.id());

    let json = match target.shape() {
        Shape::List => {
            let mut items = vec![Json::Null; target.len()];
            for (key, value) in target.entries() {
                if let Some(slot) = key.as_index().and_then(|index| items.get_mut(index)) {
                    *slot = value.snapshot(path)?;
                }
            }
            Json::Array(items)
        }
        Shape::Record => {
            let mut map = serde_json::Map::new();
            for (key, value) in target.entries() {
                if value.is_undefined() {
                    continue;
                }
                map.insert(key.to_string(), value.snapshot(path)?);
            }
            Json::Object(map)
        }
    };

    path.pop();
    Ok(json)
}

fn number_to_json(n: f64) -> Json {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Json::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(Json::Null, Json::Number)
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.strict_eq(other)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let json = self
            .to_json()
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        json.serialize(serializer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.is_nan() => f.write_str("NaN"),
            Value::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
            Value::Object(target) => write!(f, "[object {}]", target.id()),
            Value::Observable(observable) => write!(f, "[observable {}]", observable.target().id()),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::Str(s)
    }
}

impl From<Target> for Value {
    fn from(target: Target) -> Self {
        Value::Object(target)
    }
}

impl From<Observable> for Value {
    fn from(observable: Observable) -> Self {
        Value::Observable(observable)
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::from_json(json)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
