//! SimpleWorld: in-memory reference implementation of [`World`].
//!
//! Intended for tests, tooling and headless hosts. Objects live in an ordered
//! map keyed by handle; handles are never reused within one world.

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::world::{
    DestroyOptions, EntityDesc, EntityHandle, EntityKind, SpawnFlags, Transform, World, WorldId,
};

/// Declarative world layout, e.g. loaded from a fixture.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorldSpec {
    /// Path prefix of every actor; defaults to `PersistentLevel`.
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub classes: IndexMap<String, EntityKind>,
    #[serde(default)]
    pub actors: Vec<ActorSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorSpec {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub properties: IndexMap<String, f32>,
}

#[derive(Clone, Debug)]
struct SimpleEntity {
    kind: EntityKind,
    class: String,
    name: String,
    path: String,
    owner: Option<EntityHandle>,
    transform: Transform,
    /// Set for objects created through `spawn_entity`.
    spawn_flags: Option<SpawnFlags>,
    properties: HashMap<String, f32>,
}

#[derive(Debug)]
pub struct SimpleWorld {
    id: WorldId,
    level: String,
    next_handle: u64,
    classes: HashMap<String, EntityKind>,
    rejected: HashSet<String>,
    entities: IndexMap<EntityHandle, SimpleEntity>,
    destroy_log: Vec<(EntityHandle, DestroyOptions)>,
}

impl SimpleWorld {
    pub const DEFAULT_LEVEL: &'static str = "PersistentLevel";

    pub fn new(id: WorldId) -> Self {
        Self {
            id,
            level: Self::DEFAULT_LEVEL.to_string(),
            next_handle: 1,
            classes: HashMap::new(),
            rejected: HashSet::new(),
            entities: IndexMap::new(),
            destroy_log: Vec::new(),
        }
    }

    pub fn from_spec(id: WorldId, spec: &WorldSpec) -> Self {
        let mut world = Self::new(id);
        if let Some(level) = &spec.level {
            world.level = level.clone();
        }
        for (class, kind) in &spec.classes {
            world.register_class(class, *kind);
        }
        for actor in &spec.actors {
            let handle = world.add_actor(&actor.name, &actor.class);
            for comp in &actor.components {
                world.add_component(handle, comp);
            }
            for (prop, value) in &actor.properties {
                world.set_property(handle, prop, *value);
            }
        }
        world
    }

    pub fn register_class(&mut self, class: &str, kind: EntityKind) {
        self.classes.insert(class.to_string(), kind);
    }

    /// Make `spawn_entity` fail for `class`, as an engine does for abstract classes.
    pub fn reject_spawns_of(&mut self, class: &str) {
        self.rejected.insert(class.to_string());
    }

    fn alloc_handle(&mut self) -> EntityHandle {
        let h = EntityHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn unique_path(&self, base: String) -> String {
        if self.find_by_path(&base).is_none() {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}_{n}");
            if self.find_by_path(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    fn insert(
        &mut self,
        kind: EntityKind,
        class: &str,
        name: &str,
        path: String,
        owner: Option<EntityHandle>,
    ) -> EntityHandle {
        let handle = self.alloc_handle();
        self.entities.insert(
            handle,
            SimpleEntity {
                kind,
                class: class.to_string(),
                name: name.to_string(),
                path,
                owner,
                transform: Transform::default(),
                spawn_flags: None,
                properties: HashMap::new(),
            },
        );
        handle
    }

    /// Place a pre-existing actor. Unknown classes are registered as actor classes.
    pub fn add_actor(&mut self, name: &str, class: &str) -> EntityHandle {
        self.classes
            .entry(class.to_string())
            .or_insert(EntityKind::Actor);
        let path = self.unique_path(format!("{}.{}", self.level, name));
        self.insert(EntityKind::Actor, class, name, path, None)
    }

    /// Attach a named component to a live actor.
    pub fn add_component(&mut self, owner: EntityHandle, name: &str) -> Option<EntityHandle> {
        let owner_path = self.entities.get(&owner)?.path.clone();
        let path = format!("{owner_path}.{name}");
        Some(self.insert(EntityKind::Component, "Component", name, path, Some(owner)))
    }

    /// Add an object that is neither actor nor component.
    pub fn add_object(&mut self, name: &str, class: &str) -> EntityHandle {
        self.classes
            .entry(class.to_string())
            .or_insert(EntityKind::Other);
        let path = self.unique_path(format!("/Game/{name}"));
        self.insert(EntityKind::Other, class, name, path, None)
    }

    /// Destroy an object behind the engine's back (no destroy-log entry).
    pub fn remove(&mut self, handle: EntityHandle) -> bool {
        let removed = self.entities.shift_remove(&handle).is_some();
        if removed {
            self.entities.retain(|_, e| e.owner != Some(handle));
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count_of_class(&self, class: &str) -> usize {
        self.entities.values().filter(|e| e.class == class).count()
    }

    pub fn handles_of_class(&self, class: &str) -> Vec<EntityHandle> {
        self.entities
            .iter()
            .filter(|(_, e)| e.class == class)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn transform(&self, handle: EntityHandle) -> Option<Transform> {
        self.entities.get(&handle).map(|e| e.transform)
    }

    /// Flags the object was spawned with; None for placed objects.
    pub fn spawn_flags(&self, handle: EntityHandle) -> Option<SpawnFlags> {
        self.entities.get(&handle).and_then(|e| e.spawn_flags)
    }

    /// Every `destroy_entity` call that destroyed something, in order.
    pub fn destroy_log(&self) -> &[(EntityHandle, DestroyOptions)] {
        &self.destroy_log
    }
}

impl World for SimpleWorld {
    fn id(&self) -> WorldId {
        self.id
    }

    fn class_kind(&self, class: &str) -> Option<EntityKind> {
        self.classes.get(class).copied()
    }

    fn spawn_entity(
        &mut self,
        class: &str,
        name: &str,
        transform: &Transform,
        flags: SpawnFlags,
    ) -> Option<EntityHandle> {
        if self.rejected.contains(class) || self.class_kind(class) != Some(EntityKind::Actor) {
            return None;
        }
        let path = self.unique_path(format!("{}.{}", self.level, name));
        let handle = self.insert(EntityKind::Actor, class, name, path, None);
        if let Some(e) = self.entities.get_mut(&handle) {
            e.transform = *transform;
            e.spawn_flags = Some(flags);
        }
        Some(handle)
    }

    fn destroy_entity(&mut self, handle: EntityHandle, opts: DestroyOptions) -> bool {
        if self.remove(handle) {
            self.destroy_log.push((handle, opts));
            true
        } else {
            false
        }
    }

    fn describe(&self, handle: EntityHandle) -> Option<EntityDesc> {
        self.entities.get(&handle).map(|e| EntityDesc {
            kind: e.kind,
            class: e.class.clone(),
            name: e.name.clone(),
            path: e.path.clone(),
            owner: e.owner,
        })
    }

    fn is_alive(&self, handle: EntityHandle) -> bool {
        self.entities.contains_key(&handle)
    }

    fn find_by_path(&self, path: &str) -> Option<EntityHandle> {
        self.entities
            .iter()
            .find(|(_, e)| e.path == path)
            .map(|(h, _)| *h)
    }

    fn find_component(&self, owner: EntityHandle, name: &str) -> Option<EntityHandle> {
        self.entities
            .iter()
            .find(|(_, e)| {
                e.kind == EntityKind::Component && e.owner == Some(owner) && e.name == name
            })
            .map(|(h, _)| *h)
    }

    fn set_property(&mut self, handle: EntityHandle, property: &str, value: f32) -> bool {
        match self.entities.get_mut(&handle) {
            Some(e) => {
                e.properties.insert(property.to_string(), value);
                true
            }
            None => false,
        }
    }

    fn property(&self, handle: EntityHandle, property: &str) -> Option<f32> {
        self.entities.get(&handle)?.properties.get(property).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_paths_are_unique_and_components_nest() {
        let mut w = SimpleWorld::new(WorldId(0));
        let a = w.add_actor("Door", "DoorActor");
        let b = w.add_actor("Door", "DoorActor");
        assert_eq!(w.describe(a).unwrap().path, "PersistentLevel.Door");
        assert_eq!(w.describe(b).unwrap().path, "PersistentLevel.Door_1");

        let hinge = w.add_component(a, "Hinge").unwrap();
        assert_eq!(w.describe(hinge).unwrap().path, "PersistentLevel.Door.Hinge");
        assert_eq!(w.find_component(a, "Hinge"), Some(hinge));
        assert_eq!(w.find_component(b, "Hinge"), None);
    }

    #[test]
    fn destroying_an_actor_takes_its_components() {
        let mut w = SimpleWorld::new(WorldId(0));
        let a = w.add_actor("Door", "DoorActor");
        let hinge = w.add_component(a, "Hinge").unwrap();
        assert!(w.destroy_entity(a, DestroyOptions::default()));
        assert!(!w.is_alive(hinge));
        assert!(!w.destroy_entity(a, DestroyOptions::default()));
        assert_eq!(w.destroy_log().len(), 1);
    }

    #[test]
    fn spawn_requires_a_constructible_actor_class() {
        let mut w = SimpleWorld::new(WorldId(0));
        w.register_class("Box", EntityKind::Actor);
        w.register_class("Mesh", EntityKind::Component);
        w.register_class("Abstract", EntityKind::Actor);
        w.reject_spawns_of("Abstract");
        let t = Transform::default();
        let flags = SpawnFlags::default();
        assert!(w.spawn_entity("Box", "Box", &t, flags).is_some());
        assert!(w.spawn_entity("Mesh", "Mesh", &t, flags).is_none());
        assert!(w.spawn_entity("Abstract", "A", &t, flags).is_none());
        assert!(w.spawn_entity("Nope", "N", &t, flags).is_none());
    }
}
