//! Trellis Core
//!
//! This crate provides the core runtime for Trellis, a proxy-style reactive
//! state engine. It implements:
//!
//! - Observable wrappers that track property reads and notify on writes
//! - A dependency graph from (target, property) pairs to effects
//! - Refs, computed refs and per-property forwarding refs
//!
//! Everything runs synchronously: a write re-runs the effects that depend on
//! it before the write returns.
//!
//! # Architecture
//!
//! - `reactive`: targets, values, observables, refs and the dependency graph
//! - `error`: the error type for refused mutations and failed snapshots
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use trellis_core::reactive::{computed, make_ref, run_effect, Observable, Target, Value};
//!
//! let state = Observable::new(Target::from_entries([("count", 1)]));
//!
//! // Derive a value from the observable
//! let source = state.clone();
//! let doubled = computed(move || source.get("count").as_number().unwrap_or_default() * 2.0);
//!
//! // Record every value the derived ref takes
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let (sink, derived) = (log.clone(), doubled.clone());
//! run_effect(move || sink.lock().unwrap().push(derived.get()));
//!
//! // Update the observable: the computed ref and the effect re-run inline
//! state.set("count", 5).unwrap();
//! assert_eq!(doubled.get(), Value::from(10));
//! assert_eq!(*log.lock().unwrap(), vec![Value::from(2), Value::from(10)]);
//!
//! // Refs work the same way for single values
//! let name = make_ref("ada");
//! assert_eq!(name.get(), Value::from("ada"));
//! ```

pub mod error;
pub mod reactive;

pub use error::{ReactiveError, Result};
