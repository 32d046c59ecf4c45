//! Error types for the reactive engine.
//!
//! The engine itself defines very little that can fail: reads never fail, and
//! writes only fail when the underlying target refuses the mutation. Effect
//! callbacks are infallible; a panicking effect unwinds through the trigger
//! cascade that invoked it.

use thiserror::Error;

use crate::reactive::{Key, TargetId};

/// Errors raised by target mutation and snapshotting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// The target is frozen and refused the write.
    #[error("cannot assign to property `{key}` of frozen target")]
    FrozenWrite { key: Key },

    /// The target is frozen and refused the delete.
    #[error("cannot delete property `{key}` of frozen target")]
    FrozenDelete { key: Key },

    /// A list length was set to something other than a non-negative integer.
    #[error("invalid list length: {value}")]
    InvalidLength { value: String },

    /// A snapshot walked back into a target that is already on the path.
    #[error("target {target} refers to itself and cannot be snapshotted")]
    Cycle { target: TargetId },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReactiveError>;
