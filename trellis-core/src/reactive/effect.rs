//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever the reactive
//! properties it read change.
//!
//! # How Effects Work
//!
//! 1. [`run_effect`] makes the effect the active effect and runs it once.
//!
//! 2. Every observable or ref read during that run subscribes the effect to
//!    the property that was read.
//!
//! 3. When one of those properties is written, the dependency graph runs the
//!    effect again, immediately, on the writer's stack. The re-run is active
//!    too, so properties it reads for the first time also subscribe it.
//!
//! Subscriptions are never removed: an effect keeps running for every property
//! it has ever read, for as long as the target lives.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::context::ActiveEffect;
use super::subscriber::SubscriberId;

/// A re-runnable callback with identity.
///
/// Clones share identity and run count. Two effects are equal when they are
/// clones of the same effect.
#[derive(Clone)]
pub struct Effect {
    /// Identity used to deduplicate subscriptions.
    id: SubscriberId,

    /// The effect function.
    run: Arc<dyn Fn() + Send + Sync>,

    /// Number of times the effect has run.
    run_count: Arc<AtomicUsize>,
}

impl Effect {
    /// Create an effect without running it.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::new(),
            run: Arc::new(run),
            run_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Run the effect as the active effect.
    ///
    /// The active-effect slot is released when the run ends, including when
    /// the effect panics.
    pub fn execute(&self) {
        let _active = ActiveEffect::enter(self.clone());
        self.run_count.fetch_add(1, Ordering::SeqCst);
        (self.run)();
    }

    /// Get the number of times the effect has started running.
    pub fn run_count(&self) -> usize {
        self.run_count.load(Ordering::SeqCst)
    }
}

/// Run `callback` once as the active effect, subscribing it to everything it
/// reads.
///
/// Returns the effect handle. Dropping the handle does not unsubscribe it.
pub fn run_effect<F>(callback: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    let effect = Effect::new(callback);
    effect.execute();
    effect
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Effect {}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("run_count", &self.run_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::AssertUnwindSafe;

    #[test]
    fn run_effect_runs_once_immediately() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let run_count_clone = run_count.clone();

        let effect = run_effect(move || {
            run_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn new_does_not_run() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let run_count_clone = run_count.clone();

        let effect = Effect::new(move || {
            run_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(run_count.load(Ordering::SeqCst), 0);
        assert_eq!(effect.run_count(), 0);

        effect.execute();
        assert_eq!(run_count.load(Ordering::SeqCst), 1);
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn effect_is_active_while_running() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let seen_clone = seen.clone();

        let effect = run_effect(move || {
            *seen_clone.lock() = ActiveEffect::current().map(|e| e.id());
        });

        assert_eq!(*seen.lock(), Some(effect.id()));
        assert!(!ActiveEffect::is_active());
    }

    #[test]
    fn panicking_effect_releases_slot() {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            run_effect(|| panic!("boom"));
        }));

        assert!(result.is_err());
        assert!(!ActiveEffect::is_active());
    }

    #[test]
    fn clones_share_identity_and_count() {
        let effect1 = run_effect(|| {});
        let effect2 = effect1.clone();

        assert_eq!(effect1, effect2);
        assert_eq!(effect2.run_count(), 1);

        effect1.execute();
        assert_eq!(effect2.run_count(), 2);

        assert_ne!(effect1, run_effect(|| {}));
    }
}
