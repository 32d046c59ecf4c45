//! Observables
//!
//! An `Observable` is an interception layer over one [`Target`]. Reads go
//! through [`Observable::get`], which subscribes the active effect to the key
//! it reads; writes and deletes go through [`Observable::set`] and
//! [`Observable::delete`], which re-run the subscribers of the key they change.
//!
//! Observables have their own identity, distinct from the target they wrap.
//! Reading a property that holds an object returns a brand-new observable over
//! that object on every read, so nested observables are not identity-stable:
//! two reads of the same nested object compare unequal. Compare their
//! [`target`](Observable::target)s instead.

use std::fmt;
use std::sync::Arc;

use super::runtime::DependencyGraph;
use super::target::{Key, Target};
use super::value::Value;
use crate::error::Result;

/// Wrap a value for observation.
///
/// Objects are wrapped in a new observable (an observable is re-wrapped around
/// its own target). Anything else is returned unchanged.
pub fn wrap(value: Value) -> Value {
    match value {
        Value::Object(target) => Value::Observable(Observable::new(target)),
        Value::Observable(observable) => {
            Value::Observable(Observable::new(observable.target().clone()))
        }
        other => other,
    }
}

/// A tracking view over a target.
#[derive(Clone)]
pub struct Observable {
    inner: Arc<Target>,
}

impl Observable {
    /// Create a new observable over `target`.
    pub fn new(target: Target) -> Self {
        Self {
            inner: Arc::new(target),
        }
    }

    /// The wrapped target.
    pub fn target(&self) -> &Target {
        &self.inner
    }

    /// Check whether two handles are the same observable.
    pub fn ptr_eq(&self, other: &Observable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read `key`, subscribing the active effect to it.
    ///
    /// Object values come back wrapped in a fresh observable.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let key = key.into();
        let target = self.target();

        tracing::trace!(target_id = %target.id(), key = %key, "get");
        DependencyGraph::track(target.id(), &key);

        wrap(target.get(&key))
    }

    /// Write `key`, re-running its subscribers if the value changed.
    ///
    /// Writing a value strictly equal to the current one does nothing and
    /// still succeeds. A refused write (frozen target) is returned as an error
    /// and triggers nothing.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<bool> {
        let key = key.into();
        let value = value.into();
        let target = self.target();

        let old = target.get(&key);
        if !old.strict_eq(&value) {
            tracing::trace!(target_id = %target.id(), key = %key, value = %value, "set");
            target.set(key.clone(), value)?;
            DependencyGraph::trigger(target.id(), &key);
        }

        Ok(true)
    }

    /// Delete `key`, re-running its subscribers if it existed.
    ///
    /// Returns `Ok(false)` when the key was not there to delete.
    pub fn delete(&self, key: impl Into<Key>) -> Result<bool> {
        let key = key.into();
        let target = self.target();

        let had_key = target.has_own(&key);
        let deleted = target.delete(&key)?;

        if had_key && deleted {
            tracing::trace!(target_id = %target.id(), key = %key, "delete");
            DependencyGraph::trigger(target.id(), &key);
        }

        Ok(deleted)
    }

    /// The target's own enumerable keys, without tracking.
    pub fn keys(&self) -> Vec<Key> {
        self.target().keys()
    }

    /// The target's length, without tracking.
    pub fn len(&self) -> usize {
        self.target().len()
    }

    pub fn is_empty(&self) -> bool {
        self.target().is_empty()
    }

    pub fn is_array_like(&self) -> bool {
        self.target().is_array_like()
    }
}

impl From<Target> for Observable {
    fn from(target: Target) -> Self {
        Observable::new(target)
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("target", self.target())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
