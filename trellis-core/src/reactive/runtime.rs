//! Dependency Graph
//!
//! The dependency graph connects reads to writes. It maps every tracked
//! (target, key) pair to the set of effects that read it.
//!
//! # How It Works
//!
//! 1. When an observable or ref is read while an effect is active, the read
//!    calls [`DependencyGraph::track`], which records the active effect
//!    against the (target, key) pair.
//!
//! 2. When the property is written, the write calls
//!    [`DependencyGraph::trigger`], which re-runs every recorded effect
//!    synchronously, on the caller's stack, before the write returns.
//!
//! 3. When the last handle to a target is dropped, its entry is removed with
//!    [`DependencyGraph::forget`].
//!
//! # Thread Safety
//!
//! The graph is process-wide and lives in a `DashMap`, so graph mutation is
//! guarded by shard locks. No lock is held while effects run: `trigger` copies
//! the subscriber set out first, which also lets effects add subscriptions to
//! the very set that is being triggered.
//!
//! # Lifetime
//!
//! The graph holds its effects strongly, and an effect holds whatever its
//! closure captured. An effect that captures a handle to the target it reads
//! (`let obs2 = obs.clone(); run_effect(move || { obs2.get("k"); })`) keeps
//! that target alive through the graph, so the target is never dropped and
//! `forget` never runs for it. Entries are reclaimed only for targets that
//! effects reach indirectly, such as objects nested inside another target.

use std::sync::OnceLock;

use dashmap::DashMap;
use indexmap::IndexMap;
use smallvec::SmallVec;

use super::context::ActiveEffect;
use super::effect::Effect;
use super::subscriber::SubscriberId;
use super::target::{Key, TargetId};

/// Effects subscribed to a single property, in subscription order.
type Dep = IndexMap<SubscriberId, Effect>;

/// Per-target map from property key to its subscribers.
type DepsMap = IndexMap<Key, Dep>;

// Global subscription table, keyed by target identity.
static TARGET_MAP: OnceLock<DashMap<TargetId, DepsMap>> = OnceLock::new();

fn target_map() -> &'static DashMap<TargetId, DepsMap> {
    TARGET_MAP.get_or_init(DashMap::new)
}

/// The global dependency graph.
pub struct DependencyGraph;

impl DependencyGraph {
    /// Record that the active effect depends on `key` of `target`.
    ///
    /// Does nothing when no effect is active. Subscribing the same effect
    /// twice leaves a single subscription.
    pub fn track(target: TargetId, key: &Key) {
        let Some(effect) = ActiveEffect::current() else {
            return;
        };

        target_map()
            .entry(target)
            .or_default()
            .entry(key.clone())
            .or_default()
            .entry(effect.id())
            .or_insert(effect);
    }

    /// Re-run every effect subscribed to `key` of `target`.
    ///
    /// Effects run in subscription order, each exactly once. A panic in one
    /// effect stops the cascade: the remaining effects do not run.
    ///
    /// Returns the number of effects that were run.
    pub fn trigger(target: TargetId, key: &Key) -> usize {
        let effects: SmallVec<[Effect; 4]> = match target_map().get(&target) {
            Some(deps) => deps
                .get(key)
                .map(|dep| dep.values().cloned().collect())
                .unwrap_or_default(),
            None => return 0,
        };

        if effects.is_empty() {
            return 0;
        }

        tracing::debug!(target_id = %target, key = %key, effects = effects.len(), "trigger");

        for effect in &effects {
            effect.execute();
        }

        effects.len()
    }

    /// Drop every subscription recorded against `target`.
    pub fn forget(target: TargetId) {
        let Some(map) = TARGET_MAP.get() else {
            return;
        };
        // Removed effects may own the last handle to other targets, so they
        // are dropped only after the shard lock is released.
        let _removed = map.remove(&target);
    }

    /// Number of effects subscribed to `key` of `target`.
    pub fn subscriber_count(target: TargetId, key: &Key) -> usize {
        target_map()
            .get(&target)
            .and_then(|deps| deps.get(key).map(|dep| dep.len()))
            .unwrap_or(0)
    }

    /// Whether anything has ever been tracked against `target`.
    pub fn has_entry(target: TargetId) -> bool {
        target_map().contains_key(&target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_effect() -> (Effect, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let effect = Effect::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (effect, count)
    }

    #[test]
    fn trigger_without_tracking_is_a_no_op() {
        let target = TargetId::new();

        assert_eq!(DependencyGraph::trigger(target, &Key::from("x")), 0);
        assert!(!DependencyGraph::has_entry(target));
    }

    #[test]
    fn track_without_active_effect_records_nothing() {
        let target = TargetId::new();
        DependencyGraph::track(target, &Key::from("x"));

        assert!(!DependencyGraph::has_entry(target));
    }

    #[test]
    fn track_is_idempotent() {
        let target = TargetId::new();
        let key = Key::from("x");
        let (effect, _count) = counting_effect();

        {
            let _guard = ActiveEffect::enter(effect);
            DependencyGraph::track(target, &key);
            DependencyGraph::track(target, &key);
        }

        assert_eq!(DependencyGraph::subscriber_count(target, &key), 1);
    }

    #[test]
    fn trigger_runs_each_subscriber_once() {
        let target = TargetId::new();
        let key = Key::from("x");
        let (first, first_count) = counting_effect();
        let (second, second_count) = counting_effect();

        for effect in [first, second] {
            let _guard = ActiveEffect::enter(effect);
            DependencyGraph::track(target, &key);
        }

        assert_eq!(DependencyGraph::trigger(target, &key), 2);
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);

        // Other keys of the same target are untouched.
        assert_eq!(DependencyGraph::trigger(target, &Key::from("y")), 0);
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn forget_drops_subscriptions() {
        let target = TargetId::new();
        let key = Key::from("x");
        let (effect, count) = counting_effect();

        {
            let _guard = ActiveEffect::enter(effect);
            DependencyGraph::track(target, &key);
        }
        DependencyGraph::forget(target);

        assert!(!DependencyGraph::has_entry(target));
        assert_eq!(DependencyGraph::trigger(target, &key), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
