//! Computed Refs
//!
//! A computed ref is a [`RefBox`] that an effect keeps up to date.
//!
//! # How Computed Refs Work
//!
//! 1. On creation, an empty cell is made and an effect runs the getter once,
//!    assigning the result into the cell. Everything the getter reads
//!    subscribes that effect.
//!
//! 2. When any of those dependencies is written, the effect re-runs the
//!    getter and assigns the new result. The cell's usual equality check
//!    applies, so a recomputation that yields the same value notifies no one.
//!
//! # Differences from a cached memo
//!
//! - Recomputation is eager: it happens inside the write that caused it, even
//!   if nobody ever reads the cell again.
//! - There is no dirty flag and no caching beyond the cell itself.

use std::fmt;
use std::ops::Deref;

use super::effect::{run_effect, Effect};
use super::ref_box::{make_ref, Ref, RefBox};
use super::value::Value;
use crate::error::Result;

/// A ref whose value is recomputed by its own effect.
#[derive(Clone)]
pub struct Computed {
    cell: RefBox,
    effect: Effect,
}

/// Create a computed ref from `getter`.
///
/// The getter runs once immediately, and again every time something it read
/// is written.
pub fn computed<F, T>(getter: F) -> Computed
where
    F: Fn() -> T + Send + Sync + 'static,
    T: Into<Value>,
{
    let cell = make_ref(Value::Undefined);
    let result = cell.clone();
    let effect = run_effect(move || result.set(getter()));

    Computed { cell, effect }
}

impl Computed {
    /// The recomputation effect.
    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    /// The underlying cell.
    pub fn as_ref_box(&self) -> &RefBox {
        &self.cell
    }

    /// Number of times the getter has run.
    pub fn compute_count(&self) -> usize {
        self.effect.run_count()
    }
}

impl Deref for Computed {
    type Target = RefBox;

    fn deref(&self) -> &RefBox {
        &self.cell
    }
}

impl Ref for Computed {
    fn value(&self) -> Value {
        self.cell.get()
    }

    fn set_value(&self, value: Value) -> Result<()> {
        self.cell.set_value(value)
    }
}

impl From<Computed> for RefBox {
    fn from(computed: Computed) -> Self {
        computed.cell
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("cell", &self.cell)
            .field("compute_count", &self.compute_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
