//! Behavior trait and type-identity keys
//!
//! Behaviors are the attachable units of per-entity logic. An entity holds
//! at most one behavior of each concrete type, keyed by [`BehaviorKey`].

use std::any::TypeId;

/// Attachable per-entity behavior.
///
/// Implementors get a lifecycle hook, [`Behavior::tick`], invoked once per
/// frame by the owning [`Entity`](crate::scene::Entity) while it is ticking.
/// The `Any` supertrait provides the checked downcast used by typed lookup;
/// it also bounds implementors to `'static`, which is what makes the
/// per-type key stable for the life of the process.
pub trait Behavior: std::any::Any {
    /// Per-frame update hook. `delta_time` is the frame delta in seconds,
    /// passed through unchanged from the host loop.
    fn tick(&mut self, _delta_time: f32) {}
}

/// Identity token for a behavior type, usable as an ordered map key.
///
/// Two keys compare equal iff they identify the same behavior type. The
/// ordering is arbitrary but consistent for the lifetime of the process,
/// which is all the entity needs for deterministic tick iteration. Keys
/// must never be persisted or compared across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BehaviorKey(TypeId);

impl BehaviorKey {
    /// The key identifying behavior type `T`.
    #[must_use]
    pub fn of<T: Behavior>() -> Self {
        Self(TypeId::of::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct A;
    impl Behavior for A {}

    #[derive(Default)]
    struct B;
    impl Behavior for B {}

    #[test]
    fn test_keys_equal_for_same_type() {
        assert_eq!(BehaviorKey::of::<A>(), BehaviorKey::of::<A>());
    }

    #[test]
    fn test_keys_differ_across_types() {
        assert_ne!(BehaviorKey::of::<A>(), BehaviorKey::of::<B>());
    }

    #[test]
    fn test_key_ordering_is_consistent() {
        let ab = BehaviorKey::of::<A>() < BehaviorKey::of::<B>();
        for _ in 0..8 {
            assert_eq!(BehaviorKey::of::<A>() < BehaviorKey::of::<B>(), ab);
        }
    }
}
