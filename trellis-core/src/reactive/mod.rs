//! Reactive Primitives
//!
//! This module implements the core reactive system: observables, refs,
//! computed refs and effects. Effects subscribe to exactly the properties they
//! read, and writes to those properties re-run them.
//!
//! # Concepts
//!
//! ## Observables
//!
//! An [`Observable`] wraps a raw [`Target`]. Reading a property through it
//! while an effect is running subscribes that effect to the property; writing
//! or deleting the property re-runs every subscriber.
//!
//! ## Refs
//!
//! A [`RefBox`] is a single reactive cell, tracked as if it were a target with
//! one property called `value`. [`to_refs`] turns each property of an
//! observable into a forwarding [`ProxyRef`].
//!
//! ## Computed refs
//!
//! A [`Computed`] is a ref kept current by its own effect. It recomputes
//! eagerly, inside the write that changed one of its inputs.
//!
//! ## Effects
//!
//! An [`Effect`] is a callback that runs once through [`run_effect`] and
//! again, synchronously, whenever something it read is written.
//!
//! # Implementation Notes
//!
//! The active effect lives in a thread-local slot ([`ActiveEffect`]); the
//! subscriptions live in a process-wide table ([`DependencyGraph`]) keyed by
//! target identity. Updates are neither batched nor deduplicated: each write
//! re-runs its subscribers before it returns.

mod computed;
mod context;
mod effect;
mod observable;
mod ref_box;
mod runtime;
mod subscriber;
mod target;
mod to_refs;
mod value;

pub use computed::{computed, Computed};
pub use context::{ActiveEffect, ActiveEffectGuard};
pub use effect::{run_effect, Effect};
pub use observable::{wrap, Observable};
pub use ref_box::{make_ref, IntoRef, Ref, RefBox};
pub use runtime::DependencyGraph;
pub use subscriber::SubscriberId;
pub use target::{Key, Shape, Target, TargetId, MAX_INDEX, MAX_LENGTH};
pub use to_refs::{to_proxy_ref, to_refs, ProxyRef, Refs};
pub use value::Value;
