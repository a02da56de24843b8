//! Scene composition: entities and their attachable behaviors
//!
//! The scene model is deliberately small: a [`Scene`] owns [`Entity`]s,
//! each entity owns a keyed set of [`Behavior`]s, and the host loop drives
//! everything through [`Scene::tick`] once per frame. This is behavior
//! composition, not a full archetype ECS; there is no component storage
//! shared across entities and no system scheduler.

mod behavior;
mod entity;

pub use behavior::{Behavior, BehaviorKey};
pub use entity::{BehaviorHandle, Entity};

use slotmap::{DefaultKey, SlotMap};

/// Stable identifier for an entity owned by a [`Scene`].
pub type EntityId = DefaultKey;

/// Owner of all entities in a running world.
///
/// The scene applies the activity policy the entities themselves do not:
/// [`Scene::tick`] skips entities whose `is_active` flag is clear. Entities
/// are dropped (and with them every behavior they own) when despawned or
/// when the scene itself is dropped.
#[derive(Default)]
pub struct Scene {
    entities: SlotMap<DefaultKey, Entity>,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty entity and return its id.
    pub fn spawn(&mut self) -> EntityId {
        self.entities.insert(Entity::new())
    }

    /// Remove an entity, releasing all behaviors it owns.
    ///
    /// Despawning an unknown or already-despawned id is a no-op.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    /// Borrow an entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutably borrow an entity by id.
    #[must_use]
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over all live entities.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    /// Tick every active entity with the frame delta in seconds.
    pub fn tick(&mut self, delta_time: f32) {
        for entity in self.entities.values_mut() {
            if entity.is_active() {
                entity.tick(delta_time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        ticks: u32,
    }

    impl Behavior for Counter {
        fn tick(&mut self, _delta_time: f32) {
            self.ticks += 1;
        }
    }

    #[test]
    fn test_spawn_and_despawn() {
        let mut scene = Scene::new();
        let id = scene.spawn();
        assert_eq!(scene.len(), 1);
        assert!(scene.despawn(id).is_some());
        assert!(scene.is_empty());
        assert!(scene.despawn(id).is_none());
    }

    #[test]
    fn test_inactive_entities_are_skipped() {
        let mut scene = Scene::new();
        let running = scene.spawn();
        let paused = scene.spawn();
        scene.entity_mut(running).unwrap().add_behavior::<Counter>();
        scene.entity_mut(paused).unwrap().add_behavior::<Counter>();
        scene.entity_mut(paused).unwrap().set_active(false);

        scene.tick(0.016);

        let ticks = |scene: &Scene, id| scene.entity(id).unwrap().behavior::<Counter>().unwrap().ticks;
        assert_eq!(ticks(&scene, running), 1);
        assert_eq!(ticks(&scene, paused), 0);
    }
}
