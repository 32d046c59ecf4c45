//! Active Effect
//!
//! The active-effect register records which effect is currently executing, so
//! that reads can subscribe it without being told about it explicitly.
//!
//! # Implementation
//!
//! The register is a single thread-local slot. Outside this crate it is
//! read-only; it is written only by [`Effect::execute`] through
//! `ActiveEffect::enter`, which returns a guard. Dropping the guard puts back
//! whatever occupied the slot before. At the top level that is always "empty",
//! and because the guard is released on unwind, a panicking effect cannot
//! leave a stale effect behind in the slot.
//!
//! There is no stack of contexts: an effect started while another is active
//! simply takes over the slot until it finishes.

use std::cell::RefCell;

use super::effect::Effect;

thread_local! {
    static ACTIVE_EFFECT: RefCell<Option<Effect>> = const { RefCell::new(None) };
}

/// Accessors for the thread's active-effect slot.
pub struct ActiveEffect;

/// Guard that releases the active-effect slot when dropped.
#[must_use = "the effect is only active while the guard is alive"]
pub struct ActiveEffectGuard {
    previous: Option<Effect>,
}

impl ActiveEffect {
    /// Make `effect` the active effect until the returned guard is dropped.
    pub(crate) fn enter(effect: Effect) -> ActiveEffectGuard {
        let previous = ACTIVE_EFFECT.with(|slot| slot.borrow_mut().replace(effect));
        ActiveEffectGuard { previous }
    }

    /// The effect currently executing, if any.
    pub fn current() -> Option<Effect> {
        ACTIVE_EFFECT.with(|slot| slot.borrow().clone())
    }

    /// Check if an effect is currently executing.
    pub fn is_active() -> bool {
        ACTIVE_EFFECT.with(|slot| slot.borrow().is_some())
    }
}

impl Drop for ActiveEffectGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // The outgoing effect is dropped after the borrow ends.
        let _outgoing =
            ACTIVE_EFFECT.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), previous));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::AssertUnwindSafe;

    #[test]
    fn guard_sets_and_clears_slot() {
        let effect = Effect::new(|| {});

        assert!(!ActiveEffect::is_active());
        assert!(ActiveEffect::current().is_none());

        {
            let _guard = ActiveEffect::enter(effect.clone());

            assert!(ActiveEffect::is_active());
            assert_eq!(ActiveEffect::current().map(|e| e.id()), Some(effect.id()));
        }

        assert!(!ActiveEffect::is_active());
    }

    #[test]
    fn inner_guard_hands_slot_back() {
        let outer = Effect::new(|| {});
        let inner = Effect::new(|| {});

        let _outer_guard = ActiveEffect::enter(outer.clone());
        {
            let _inner_guard = ActiveEffect::enter(inner.clone());
            assert_eq!(ActiveEffect::current().map(|e| e.id()), Some(inner.id()));
        }
        assert_eq!(ActiveEffect::current().map(|e| e.id()), Some(outer.id()));
    }

    #[test]
    fn slot_is_released_on_panic() {
        let effect = Effect::new(|| {});

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = ActiveEffect::enter(effect);
            panic!("effect failed");
        }));

        assert!(result.is_err());
        assert!(!ActiveEffect::is_active());
    }

    #[test]
    fn slot_is_per_thread() {
        let effect = Effect::new(|| {});
        let _guard = ActiveEffect::enter(effect);

        let seen_elsewhere = std::thread::spawn(ActiveEffect::is_active).join().unwrap();
        assert!(!seen_elsewhere);
        assert!(ActiveEffect::is_active());
    }
}
