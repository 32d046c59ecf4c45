//! Ref Bridge
//!
//! Turns the properties of an observable into individual refs, so that a
//! single property can be handed around on its own and still stay connected
//! to the object it came from.
//!
//! A [`ProxyRef`] owns no state. Every read goes through
//! [`Observable::get`] and every write through [`Observable::set`], so all
//! tracking and notification happens on the underlying target.

use std::fmt;

use indexmap::IndexMap;

use super::observable::Observable;
use super::ref_box::Ref;
use super::target::{Key, Shape};
use super::value::Value;
use crate::error::Result;

/// A ref that forwards to one property of an observable.
#[derive(Clone)]
pub struct ProxyRef {
    observable: Observable,
    key: Key,
}

/// Create a forwarding ref for `key` of `observable`.
pub fn to_proxy_ref(observable: &Observable, key: impl Into<Key>) -> ProxyRef {
    ProxyRef {
        observable: observable.clone(),
        key: key.into(),
    }
}

impl ProxyRef {
    /// Read the property through the observable.
    pub fn get(&self) -> Value {
        self.observable.get(&self.key)
    }

    /// Write the property through the observable.
    pub fn set(&self, value: impl Into<Value>) -> Result<bool> {
        self.observable.set(&self.key, value)
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn observable(&self) -> &Observable {
        &self.observable
    }
}

impl Ref for ProxyRef {
    fn value(&self) -> Value {
        self.get()
    }

    fn set_value(&self, value: Value) -> Result<()> {
        self.set(value).map(|_| ())
    }
}

impl fmt::Debug for ProxyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyRef")
            .field("target", &self.observable.target().id())
            .field("key", &self.key)
            .finish()
    }
}

/// The refs produced by [`to_refs`].
///
/// For a list, the result mirrors the list's length: slots whose index is not
/// an own key of the list (holes) have no ref.
#[derive(Debug, Clone)]
pub struct Refs {
    shape: Shape,
    len: usize,
    entries: IndexMap<Key, ProxyRef>,
}

/// Create a forwarding ref for every own enumerable key of `observable`.
///
/// The key set is taken once, untracked. Keys added later are not included.
pub fn to_refs(observable: &Observable) -> Refs {
    let target = observable.target();
    let entries = target
        .keys()
        .into_iter()
        .map(|key| (key.clone(), to_proxy_ref(observable, key)))
        .collect::<IndexMap<_, _>>();

    let len = match target.shape() {
        Shape::List => target.len(),
        Shape::Record => entries.len(),
    };

    Refs {
        shape: target.shape(),
        len,
        entries,
    }
}

impl Refs {
    pub fn get(&self, key: impl Into<Key>) -> Option<&ProxyRef> {
        self.entries.get(&key.into())
    }

    /// For a list, the mirrored length; otherwise the number of refs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_array_like(&self) -> bool {
        self.shape == Shape::List
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &ProxyRef)> {
        self.entries.iter()
    }

    /// The index slots `0..len`, with `None` for holes.
    pub fn to_vec(&self) -> Vec<Option<ProxyRef>> {
        (0..self.len)
            .map(|index| self.entries.get(&Key::Index(index)).cloned())
            .collect()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
