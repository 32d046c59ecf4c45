//! Targets
//!
//! A `Target` is the raw mutable object that observables wrap. It is a plain
//! keyed container with no knowledge of tracking: reads and writes on a
//! `Target` never notify anyone. Reactivity comes from going through an
//! [`Observable`](super::Observable).
//!
//! # Identity
//!
//! Targets are compared by identity, never by contents. Each target gets a
//! `TargetId` at construction and every clone of the handle shares it. The
//! dependency graph keys its entries by this id, and the entry is removed when
//! the last handle to the target is dropped.
//!
//! # Shapes
//!
//! - `Record`: a mapping from keys to values.
//! - `List`: array-like. It keeps a length that grows when an index at or past
//!   the end is written, and reports `length` as a (non-enumerable) own key.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::runtime::DependencyGraph;
use super::value::Value;
use crate::error::{ReactiveError, Result};

const LENGTH: &str = "length";

/// Largest index a list treats as an element slot (2^32 - 2). Larger integer
/// keys are plain properties and leave the length alone.
pub const MAX_INDEX: usize = u32::MAX as usize - 1;

/// Largest length a list can have (2^32 - 1).
pub const MAX_LENGTH: usize = u32::MAX as usize;

/// Identity of anything the dependency graph can key on: targets and refs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    /// Generate a new unique target ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A property key.
///
/// String keys that spell a canonical non-negative integer ("0", "17", but not
/// "007") no larger than [`MAX_INDEX`] are normalized to `Index`, so `"0"` and
/// `0` address the same slot. Integers past `MAX_INDEX` become `Name`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(Arc<str>),
    Index(usize),
}

impl Key {
    /// Build a named key, normalizing canonical integers to `Index`.
    pub fn name(name: &str) -> Self {
        match parse_index(name) {
            Some(index) => Key::Index(index),
            None => Key::Name(Arc::from(name)),
        }
    }

    /// The element index, if this key addresses one.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(index) if *index <= MAX_INDEX => Some(*index),
            _ => None,
        }
    }

    fn is_length(&self) -> bool {
        matches!(self, Key::Name(name) if &**name == LENGTH)
    }
}

fn parse_index(name: &str) -> Option<usize> {
    if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
        return None;
    }
    if !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok().filter(|index| *index <= MAX_INDEX)
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::name(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::name(&name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        if index <= MAX_INDEX {
            Key::Index(index)
        } else {
            Key::Name(Arc::from(index.to_string()))
        }
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// The structural kind of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Record,
    List,
}

/// A raw mutable object.
#[derive(Clone)]
pub struct Target {
    inner: Arc<TargetInner>,
}

struct TargetInner {
    id: TargetId,
    shape: Shape,
    state: RwLock<TargetState>,
}

#[derive(Default)]
struct TargetState {
    entries: IndexMap<Key, Value>,
    len: usize,
    frozen: bool,
}

impl Drop for TargetInner {
    fn drop(&mut self) {
        DependencyGraph::forget(self.id);
    }
}

impl Target {
    fn with_shape(shape: Shape) -> Self {
        Self {
            inner: Arc::new(TargetInner {
                id: TargetId::new(),
                shape,
                state: RwLock::new(TargetState::default()),
            }),
        }
    }

    /// Create an empty record.
    pub fn record() -> Self {
        Self::with_shape(Shape::Record)
    }

    /// Create an empty list.
    pub fn list() -> Self {
        Self::with_shape(Shape::List)
    }

    /// Create a record from key/value pairs, in order.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        let target = Self::record();
        {
            let mut state = target.inner.state.write();
            for (key, value) in entries {
                state.entries.insert(key.into(), value.into());
            }
        }
        target
    }

    /// Create a list from values, indexed from zero.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let target = Self::list();
        {
            let mut state = target.inner.state.write();
            for (index, value) in values.into_iter().enumerate() {
                state.entries.insert(Key::Index(index), value.into());
                state.len = index + 1;
            }
        }
        target
    }

    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    pub fn shape(&self) -> Shape {
        self.inner.shape
    }

    pub fn is_array_like(&self) -> bool {
        self.inner.shape == Shape::List
    }

    /// Check whether two handles refer to the same target.
    pub fn ptr_eq(&self, other: &Target) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read a property. Missing properties read as `Undefined`.
    pub fn get(&self, key: &Key) -> Value {
        let state = self.inner.state.read();
        if let Some(value) = state.entries.get(key) {
            return value.clone();
        }
        if self.is_array_like() && key.is_length() {
            return Value::Number(state.len as f64);
        }
        Value::Undefined
    }

    /// Whether `key` is an own property of this target.
    pub fn has_own(&self, key: &Key) -> bool {
        if self.is_array_like() && key.is_length() {
            return true;
        }
        self.inner.state.read().entries.contains_key(key)
    }

    /// Write a property.
    ///
    /// On a list, writing an index past the end extends the length, and
    /// writing `length` truncates or extends it.
    pub fn set(&self, key: Key, value: Value) -> Result<()> {
        let mut state = self.inner.state.write();
        if state.frozen {
            return Err(ReactiveError::FrozenWrite { key });
        }

        if self.is_array_like() {
            if key.is_length() {
                let len = value
                    .as_length()
                    .ok_or_else(|| ReactiveError::InvalidLength { value: value.to_string() })?;
                state
                    .entries
                    .retain(|key, _| key.as_index().map_or(true, |index| index < len));
                state.len = len;
                return Ok(());
            }
            if let Some(end) = key.as_index().and_then(|index| index.checked_add(1)) {
                state.len = state.len.max(end);
            }
        }

        state.entries.insert(key, value);
        Ok(())
    }

    /// Delete a property.
    ///
    /// Returns `Ok(false)` when there was nothing to delete.
    pub fn delete(&self, key: &Key) -> Result<bool> {
        let mut state = self.inner.state.write();
        if !state.entries.contains_key(key) {
            return Ok(false);
        }
        if state.frozen {
            return Err(ReactiveError::FrozenDelete { key: key.clone() });
        }
        state.entries.shift_remove(key);
        Ok(true)
    }

    /// The own enumerable keys: indices ascending, then names in insertion order.
    pub fn keys(&self) -> Vec<Key> {
        let state = self.inner.state.read();
        let mut indices: Vec<Key> = state
            .entries
            .keys()
            .filter(|key| key.as_index().is_some())
            .cloned()
            .collect();
        indices.sort_by_key(|key| key.as_index());
        indices.extend(
            state
                .entries
                .keys()
                .filter(|key| key.as_index().is_none())
                .cloned(),
        );
        indices
    }

    /// For a list, its length; for a record, the number of entries.
    pub fn len(&self) -> usize {
        let state = self.inner.state.read();
        match self.inner.shape {
            Shape::List => state.len,
            Shape::Record => state.entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuse all further writes and deletes.
    pub fn freeze(&self) {
        self.inner.state.write().frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.state.read().frozen
    }

    /// Snapshot of the own entries in key order.
    pub(crate) fn entries(&self) -> Vec<(Key, Value)> {
        self.keys()
            .into_iter()
            .map(|key| {
                let value = self.get(&key);
                (key, value)
            })
            .collect()
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("id", &self.inner.id)
            .field("shape", &self.inner.shape)
            .field("len", &self.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_names_normalize_to_indices() {
        assert_eq!(Key::from("0"), Key::Index(0));
        assert_eq!(Key::from("42"), Key::Index(42));
        assert_eq!(Key::from("042"), Key::Name(Arc::from("042")));
        assert_eq!(Key::from("-1"), Key::Name(Arc::from("-1")));
        assert_eq!(Key::from(""), Key::Name(Arc::from("")));
    }

    #[test]
    fn record_get_set_delete() {
        let target = Target::record();
        let key = Key::from("x");

        assert_eq!(target.get(&key), Value::Undefined);
        assert!(!target.has_own(&key));

        target.set(key.clone(), Value::from(1)).unwrap();
        assert_eq!(target.get(&key), Value::from(1));
        assert!(target.has_own(&key));

        assert_eq!(target.delete(&key), Ok(true));
        assert_eq!(target.delete(&key), Ok(false));
        assert_eq!(target.get(&key), Value::Undefined);
    }

    #[test]
    fn keys_list_indices_first() {
        let target = Target::record();
        target.set(Key::from("b"), Value::from(1)).unwrap();
        target.set(Key::from(2), Value::from(2)).unwrap();
        target.set(Key::from("a"), Value::from(3)).unwrap();
        target.set(Key::from(0), Value::from(4)).unwrap();

        assert_eq!(
            target.keys(),
            vec![Key::Index(0), Key::Index(2), Key::from("b"), Key::from("a")]
        );
    }

    #[test]
    fn list_length_grows_and_survives_delete() {
        let target = Target::from_values([1, 2]);
        assert_eq!(target.len(), 2);

        target.set(Key::Index(4), Value::from(5)).unwrap();
        assert_eq!(target.len(), 5);
        assert_eq!(target.get(&Key::Index(3)), Value::Undefined);

        target.delete(&Key::Index(4)).unwrap();
        assert_eq!(target.len(), 5);
        assert_eq!(target.get(&Key::from("length")), Value::from(5));
    }

    #[test]
    fn list_length_write_truncates() {
        let target = Target::from_values([1, 2, 3]);
        target.set(Key::from("length"), Value::from(1)).unwrap();

        assert_eq!(target.len(), 1);
        assert_eq!(target.keys(), vec![Key::Index(0)]);

        let err = target.set(Key::from("length"), Value::from(-1)).unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidLength { .. }));
    }

    #[test]
    fn index_keys_stop_at_max_index() {
        assert_eq!(Key::from("4294967294"), Key::Index(MAX_INDEX));
        assert_eq!(Key::from("4294967295"), Key::Name(Arc::from("4294967295")));
        assert_eq!(
            Key::from("18446744073709551615"),
            Key::Name(Arc::from("18446744073709551615"))
        );
        assert_eq!(Key::from(MAX_INDEX + 1), Key::from("4294967295"));
        assert_eq!(Key::Index(usize::MAX).as_index(), None);
    }

    #[test]
    fn huge_numeric_keys_leave_list_length_alone() {
        let target = Target::from_values([1, 2]);

        target
            .set(Key::from("18446744073709551615"), Value::from(1))
            .unwrap();
        target.set(Key::Index(usize::MAX), Value::from(2)).unwrap();
        target.set(Key::from(1usize << 40), Value::from(3)).unwrap();

        assert_eq!(target.len(), 2);
        assert_eq!(target.get(&Key::from("18446744073709551615")), Value::from(1));
    }

    #[test]
    fn list_length_is_capped() {
        let target = Target::from_values([1, 2]);

        for bad in [1e300, (MAX_LENGTH as f64) + 1.0, f64::INFINITY] {
            let err = target.set(Key::from("length"), Value::from(bad)).unwrap_err();
            assert!(matches!(err, ReactiveError::InvalidLength { .. }));
        }
        assert_eq!(target.len(), 2);

        target
            .set(Key::from(MAX_INDEX), Value::from("last"))
            .unwrap();
        assert_eq!(target.len(), MAX_LENGTH);
    }

    #[test]
    fn frozen_target_refuses_mutation() {
        let target = Target::from_entries([("x", 1)]);
        target.freeze();

        assert_eq!(
            target.set(Key::from("x"), Value::from(2)),
            Err(ReactiveError::FrozenWrite { key: Key::from("x") })
        );
        assert_eq!(
            target.delete(&Key::from("x")),
            Err(ReactiveError::FrozenDelete { key: Key::from("x") })
        );
        assert_eq!(target.delete(&Key::from("missing")), Ok(false));
        assert_eq!(target.get(&Key::from("x")), Value::from(1));
    }

    #[test]
    fn clones_share_identity() {
        let a = Target::record();
        let b = a.clone();
        let c = Target::record();

        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
        assert!(!a.ptr_eq(&c));
        assert_ne!(a.id(), c.id());
    }
}
