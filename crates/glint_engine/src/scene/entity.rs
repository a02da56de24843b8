//! Entity: an owned, keyed collection of behaviors
//!
//! An [`Entity`] owns its behaviors exclusively; a behavior never outlives
//! its entity and is never shared across entities. Callers observe
//! behaviors either through short-lived borrows ([`Entity::behavior`]) or
//! through a generation-checked [`BehaviorHandle`] that safely reports
//! "no longer present" after removal instead of extending the behavior's
//! lifetime.

use std::any::Any;
use std::collections::BTreeMap;
use std::marker::PhantomData;

use slotmap::{DefaultKey, SlotMap};

use super::behavior::{Behavior, BehaviorKey};

/// Non-owning, typed observation handle to a behavior on a specific entity.
///
/// The handle is backed by a slot-map key, so it carries a generation
/// counter: after the behavior is removed, resolution returns `None` even
/// if the slot has since been reused. Resolving a handle against an entity
/// other than the one that produced it yields unspecified-but-safe results
/// (either `None` or some behavior of the same type).
#[derive(Debug)]
pub struct BehaviorHandle<T> {
    key: Option<DefaultKey>,
    _phantom: PhantomData<fn() -> T>,
}

// Manual impls: a handle is copyable regardless of whether `T` is.
impl<T> Clone for BehaviorHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BehaviorHandle<T> {}

impl<T> PartialEq for BehaviorHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for BehaviorHandle<T> {}

impl<T> BehaviorHandle<T> {
    /// A handle that resolves to nothing.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            key: None,
            _phantom: PhantomData,
        }
    }

    /// Whether the handle pointed at a live behavior when it was created.
    ///
    /// A valid handle can still fail to resolve later if the behavior has
    /// been removed in the meantime.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.key.is_some()
    }
}

/// A scene object composed of typed behaviors.
///
/// At most one behavior of each concrete type can be attached; the
/// per-type key is a [`BehaviorKey`]. Behaviors are ticked in key order,
/// which is deterministic for the life of the process.
///
/// The entity only stores its `active` flag; skipping inactive entities is
/// the scene owner's policy (see [`Scene::tick`](crate::scene::Scene::tick)).
pub struct Entity {
    behaviors: SlotMap<DefaultKey, Box<dyn Behavior>>,
    index: BTreeMap<BehaviorKey, DefaultKey>,
    is_active: bool,
    is_ticking: bool,
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity {
    /// Create an empty entity, active and ticking.
    #[must_use]
    pub fn new() -> Self {
        Self {
            behaviors: SlotMap::new(),
            index: BTreeMap::new(),
            is_active: true,
            is_ticking: true,
        }
    }

    /// Attach a default-constructed behavior of type `T`.
    ///
    /// If a `T` is already attached this is a **no-op** and returns `false`;
    /// the existing instance is kept. Duplicates per type are disallowed by
    /// the unique-key invariant, and silent replacement would invalidate
    /// outstanding handles, so insert-keeps-first is the chosen policy.
    pub fn add_behavior<T: Behavior + Default>(&mut self) -> bool {
        self.insert_behavior(T::default())
    }

    /// Attach an already-constructed behavior.
    ///
    /// Same duplicate policy as [`Entity::add_behavior`]: no-op returning
    /// `false` when a behavior of the same type is already attached.
    pub fn insert_behavior<T: Behavior>(&mut self, behavior: T) -> bool {
        let key = BehaviorKey::of::<T>();
        if self.index.contains_key(&key) {
            log::debug!(
                "ignoring duplicate behavior {}; one is already attached",
                std::any::type_name::<T>()
            );
            return false;
        }
        let slot = self.behaviors.insert(Box::new(behavior));
        self.index.insert(key, slot);
        true
    }

    /// Detach and drop the behavior of type `T`, if present.
    ///
    /// Removing an absent type is a no-op, not an error. Returns whether a
    /// behavior was actually removed. Outstanding handles to the removed
    /// behavior resolve to `None` from then on.
    pub fn remove_behavior<T: Behavior>(&mut self) -> bool {
        match self.index.remove(&BehaviorKey::of::<T>()) {
            Some(slot) => {
                self.behaviors.remove(slot);
                true
            }
            None => false,
        }
    }

    /// Whether a behavior of type `T` is attached.
    #[must_use]
    pub fn has_behavior<T: Behavior>(&self) -> bool {
        self.index.contains_key(&BehaviorKey::of::<T>())
    }

    /// Number of attached behaviors.
    #[must_use]
    pub fn behavior_count(&self) -> usize {
        self.index.len()
    }

    /// Obtain a weak observation handle to the attached `T`, if any.
    ///
    /// The stored instance's dynamic type is checked against `T` rather
    /// than assumed; an invalid handle is returned if the type is absent
    /// or the check fails (the latter would mean the type index drifted).
    #[must_use]
    pub fn get_behavior<T: Behavior>(&self) -> BehaviorHandle<T> {
        let Some(&slot) = self.index.get(&BehaviorKey::of::<T>()) else {
            return BehaviorHandle::invalid();
        };
        let matches = self.behaviors.get(slot).is_some_and(|behavior| {
            let any: &dyn Any = &**behavior;
            any.is::<T>()
        });
        if matches {
            BehaviorHandle {
                key: Some(slot),
                _phantom: PhantomData,
            }
        } else {
            BehaviorHandle::invalid()
        }
    }

    /// Resolve a handle to a shared borrow of the behavior.
    ///
    /// Returns `None` if the behavior has been removed since the handle was
    /// created, or if the handle is invalid.
    #[must_use]
    pub fn resolve<T: Behavior>(&self, handle: BehaviorHandle<T>) -> Option<&T> {
        let behavior = self.behaviors.get(handle.key?)?;
        let any: &dyn Any = &**behavior;
        any.downcast_ref::<T>()
    }

    /// Resolve a handle to an exclusive borrow of the behavior.
    #[must_use]
    pub fn resolve_mut<T: Behavior>(&mut self, handle: BehaviorHandle<T>) -> Option<&mut T> {
        let behavior = self.behaviors.get_mut(handle.key?)?;
        let any: &mut dyn Any = &mut **behavior;
        any.downcast_mut::<T>()
    }

    /// Borrow the attached `T` directly, without going through a handle.
    #[must_use]
    pub fn behavior<T: Behavior>(&self) -> Option<&T> {
        let handle = self.get_behavior::<T>();
        self.resolve(handle)
    }

    /// Mutably borrow the attached `T` directly.
    #[must_use]
    pub fn behavior_mut<T: Behavior>(&mut self) -> Option<&mut T> {
        let handle = self.get_behavior::<T>();
        self.resolve_mut(handle)
    }

    /// Invoke the tick hook on every attached behavior, in key order.
    ///
    /// No-op while `is_ticking` is `false`. `delta_time` is passed through
    /// unchanged. A behavior has no route back to its owning entity from
    /// inside `tick`, so the collection cannot be structurally mutated
    /// mid-iteration; siblings must be added or removed between frames by
    /// whoever owns the entity.
    pub fn tick(&mut self, delta_time: f32) {
        if !self.is_ticking {
            return;
        }
        for &slot in self.index.values() {
            if let Some(behavior) = self.behaviors.get_mut(slot) {
                behavior.tick(delta_time);
            }
        }
    }

    /// Whether the entity participates in the scene.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Set the active flag. Pure state; enforcement is the scene owner's job.
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Whether [`Entity::tick`] cascades to behaviors.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.is_ticking
    }

    /// Set the ticking flag.
    pub fn set_ticking(&mut self, ticking: bool) {
        self.is_ticking = ticking;
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("behaviors", &self.index.len())
            .field("is_active", &self.is_active)
            .field("is_ticking", &self.is_ticking)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        ticks: u32,
        last_delta: f32,
    }

    impl Behavior for Counter {
        fn tick(&mut self, delta_time: f32) {
            self.ticks += 1;
            self.last_delta = delta_time;
        }
    }

    #[derive(Default)]
    struct Mover {
        distance: f32,
    }

    impl Behavior for Mover {
        fn tick(&mut self, delta_time: f32) {
            self.distance += delta_time * 2.0;
        }
    }

    #[test]
    fn test_distinct_types_coexist_independently() {
        let mut entity = Entity::new();
        assert!(entity.add_behavior::<Counter>());
        assert!(entity.add_behavior::<Mover>());

        let counter = entity.get_behavior::<Counter>();
        let mover = entity.get_behavior::<Mover>();
        assert!(counter.is_valid());
        assert!(mover.is_valid());

        entity.resolve_mut(counter).unwrap().ticks = 7;
        assert_eq!(entity.resolve(counter).unwrap().ticks, 7);
        assert_eq!(entity.resolve(mover).unwrap().distance, 0.0);
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut entity = Entity::new();
        assert!(entity.add_behavior::<Counter>());
        entity.behavior_mut::<Counter>().unwrap().ticks = 3;

        assert!(!entity.add_behavior::<Counter>());
        assert_eq!(entity.behavior_count(), 1);
        // The original instance survives; no silent replacement.
        assert_eq!(entity.behavior::<Counter>().unwrap().ticks, 3);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut entity = Entity::new();
        entity.add_behavior::<Mover>();
        assert!(!entity.remove_behavior::<Counter>());
        assert_eq!(entity.behavior_count(), 1);
    }

    #[test]
    fn test_handle_invalid_after_removal() {
        let mut entity = Entity::new();
        entity.add_behavior::<Counter>();
        let handle = entity.get_behavior::<Counter>();
        assert!(handle.is_valid());

        assert!(entity.remove_behavior::<Counter>());
        assert!(entity.resolve(handle).is_none());
        assert!(!entity.get_behavior::<Counter>().is_valid());
    }

    #[test]
    fn test_stale_handle_survives_slot_reuse() {
        let mut entity = Entity::new();
        entity.add_behavior::<Counter>();
        let stale = entity.get_behavior::<Counter>();
        entity.remove_behavior::<Counter>();

        // Re-adding may reuse the slot; the generation check must still
        // reject the old handle.
        entity.add_behavior::<Counter>();
        assert!(entity.resolve(stale).is_none());
        assert!(entity.get_behavior::<Counter>().is_valid());
    }

    #[test]
    fn test_tick_cascades_with_delta() {
        let mut entity = Entity::new();
        entity.add_behavior::<Counter>();
        entity.add_behavior::<Mover>();

        entity.tick(0.25);
        entity.tick(0.25);

        let counter = entity.behavior::<Counter>().unwrap();
        assert_eq!(counter.ticks, 2);
        assert_eq!(counter.last_delta, 0.25);
        assert_eq!(entity.behavior::<Mover>().unwrap().distance, 1.0);
    }

    #[test]
    fn test_tick_gated_by_ticking_flag() {
        let mut entity = Entity::new();
        entity.add_behavior::<Counter>();
        entity.set_ticking(false);

        entity.tick(0.016);
        assert_eq!(entity.behavior::<Counter>().unwrap().ticks, 0);

        entity.set_ticking(true);
        entity.tick(0.016);
        assert_eq!(entity.behavior::<Counter>().unwrap().ticks, 1);
    }

    #[test]
    fn test_flags_are_plain_state() {
        let mut entity = Entity::new();
        assert!(entity.is_active());
        assert!(entity.is_ticking());
        entity.set_active(false);
        assert!(!entity.is_active());
        // Deactivation does not imply tick gating; that is scene policy.
        assert!(entity.is_ticking());
    }
}
