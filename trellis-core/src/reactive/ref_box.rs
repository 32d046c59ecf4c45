//! Refs
//!
//! A `RefBox` is a single reactive cell. It is tracked exactly like a target
//! with one property: the box's own identity is the target, and the property
//! is always `"value"`.
//!
//! # How Refs Work
//!
//! 1. Reading the cell ([`RefBox::get`]) subscribes the active effect to the
//!    box's `"value"` slot.
//!
//! 2. Writing it ([`RefBox::set`]) stores the raw value, re-wraps it if it is
//!    an object, and re-runs the subscribers. Writing a value strictly equal
//!    to the stored one does nothing.
//!
//! # The ref marker
//!
//! Anything that behaves like a ref implements [`Ref`], whose `is_ref` marker
//! is always true. [`make_ref`] is idempotent: handing it an existing
//! `RefBox` returns that same box instead of nesting it.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::observable::wrap;
use super::runtime::DependencyGraph;
use super::target::{Key, TargetId};
use super::value::Value;
use crate::error::Result;

const VALUE_KEY: &str = "value";

/// Common surface of refs: owned cells, computed cells and forwarding refs.
pub trait Ref {
    /// Read the current value, subscribing the active effect.
    fn value(&self) -> Value;

    /// Write a new value.
    fn set_value(&self, value: Value) -> Result<()>;

    /// The ref marker.
    fn is_ref(&self) -> bool {
        true
    }
}

/// Conversion into a `RefBox`, used by [`make_ref`].
pub trait IntoRef {
    fn into_ref(self) -> RefBox;
}

impl<T> IntoRef for T
where
    T: Into<Value>,
{
    fn into_ref(self) -> RefBox {
        RefBox::new(self.into())
    }
}

impl IntoRef for RefBox {
    fn into_ref(self) -> RefBox {
        self
    }
}

impl IntoRef for &RefBox {
    fn into_ref(self) -> RefBox {
        self.clone()
    }
}

/// Create a ref holding `raw`, or return `raw` itself if it already is one.
pub fn make_ref(raw: impl IntoRef) -> RefBox {
    raw.into_ref()
}

/// A single-value reactive cell.
///
/// Clones share the cell.
#[derive(Clone)]
pub struct RefBox {
    inner: Arc<RefInner>,
}

struct RefInner {
    id: TargetId,
    key: Key,
    state: RwLock<RefState>,
}

struct RefState {
    /// The value as it was assigned.
    raw: Value,
    /// `raw`, wrapped in an observable if it is an object.
    value: Value,
}

impl Drop for RefInner {
    fn drop(&mut self) {
        DependencyGraph::forget(self.id);
    }
}

impl RefBox {
    fn new(raw: Value) -> Self {
        let value = wrap(raw.clone());
        Self {
            inner: Arc::new(RefInner {
                id: TargetId::new(),
                key: Key::from(VALUE_KEY),
                state: RwLock::new(RefState { raw, value }),
            }),
        }
    }

    /// The identity this ref is tracked under.
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    /// Check whether two handles refer to the same cell.
    pub fn ptr_eq(&self, other: &RefBox) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read the value, subscribing the active effect.
    pub fn get(&self) -> Value {
        DependencyGraph::track(self.inner.id, &self.inner.key);
        self.inner.state.read().value.clone()
    }

    /// Write the value, re-running subscribers if it changed.
    pub fn set(&self, new_value: impl Into<Value>) {
        let new_value = new_value.into();
        {
            let mut state = self.inner.state.write();
            if new_value.strict_eq(&state.value) {
                return;
            }
            state.value = wrap(new_value.clone());
            state.raw = new_value;
        }

        tracing::trace!(target_id = %self.inner.id, value = %self.get_untracked(), "ref set");
        DependencyGraph::trigger(self.inner.id, &self.inner.key);
    }

    /// Read the value without subscribing.
    pub fn get_untracked(&self) -> Value {
        self.inner.state.read().value.clone()
    }

    /// The value as it was assigned, before wrapping, without subscribing.
    pub fn raw(&self) -> Value {
        self.inner.state.read().raw.clone()
    }

    /// Number of effects subscribed to this cell.
    pub fn subscriber_count(&self) -> usize {
        DependencyGraph::subscriber_count(self.inner.id, &self.inner.key)
    }
}

impl Ref for RefBox {
    fn value(&self) -> Value {
        self.get()
    }

    fn set_value(&self, value: Value) -> Result<()> {
        self.set(value);
        Ok(())
    }
}

impl fmt::Debug for RefBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefBox")
            .field("id", &self.inner.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::effect::run_effect;
    use crate::reactive::target::Target;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn watch(cell: &RefBox) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let cell = cell.clone();
        run_effect(move || {
            cell.get();
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn ref_get_and_set() {
        let cell = make_ref(5);
        assert_eq!(cell.get(), Value::from(5));

        cell.set(6);
        assert_eq!(cell.get(), Value::from(6));
        assert!(cell.is_ref());
    }

    #[test]
    fn read_outside_effect_does_not_subscribe() {
        let cell = make_ref(5);
        cell.get();

        assert_eq!(cell.subscriber_count(), 0);
        assert!(!DependencyGraph::has_entry(cell.id()));
    }

    #[test]
    fn set_notifies_subscribers() {
        let cell = make_ref(5);
        let first = watch(&cell);
        let second = watch(&cell);

        cell.set(6);
        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn equal_set_is_silent() {
        let cell = make_ref(5);
        let count = watch(&cell);

        cell.set(5);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nan_over_nan_is_silent() {
        let cell = make_ref(f64::NAN);
        let count = watch(&cell);

        cell.set(f64::NAN);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn object_values_are_wrapped() {
        let target = Target::from_entries([("x", 1)]);
        let cell = make_ref(target.clone());

        assert!(cell.raw().as_observable().is_none());
        let wrapped = cell.get();
        let observable = wrapped.as_observable().unwrap();
        assert!(observable.target().ptr_eq(&target));

        // The raw object never equals its wrapper, so reassigning it notifies.
        let count = watch(&cell);
        cell.set(target);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn make_ref_is_idempotent() {
        let cell = make_ref(1);
        let same = make_ref(cell.clone());
        let borrowed = make_ref(&cell);

        assert!(same.ptr_eq(&cell));
        assert!(borrowed.ptr_eq(&cell));
        assert!(!make_ref(1).ptr_eq(&cell));
    }

    #[test]
    fn clone_shares_cell() {
        let cell1 = make_ref(0);
        let cell2 = cell1.clone();

        cell1.set(42);
        assert_eq!(cell2.get(), Value::from(42));
        assert_eq!(cell1.id(), cell2.id());
    }
}
