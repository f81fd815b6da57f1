//! World collaborator: object creation, destruction and lookup.
//!
//! The engine never owns a world. Hosts (game runtime, editor preview, tests)
//! implement [`World`] and hand it to the controller as an
//! `Rc<RefCell<impl World>>`; the controller only keeps a weak reference.

use serde::{Deserialize, Serialize};

/// Opaque handle to an object living in a world.
/// Handles are non-owning; a handle may outlive the object it names.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

/// Identity of a world (one per level/play session).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WorldId(pub u32);

/// Kinds of objects a world can hold.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Top-level placeable object; the only spawnable kind.
    Actor,
    /// Named sub-object owned by an actor.
    Component,
    /// Anything else (assets, settings objects). Never bindable.
    Other,
}

/// Snapshot of a live object's identity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityDesc {
    pub kind: EntityKind,
    pub class: String,
    pub name: String,
    /// Stable path, valid across worlds that load the same level.
    pub path: String,
    /// Owning actor for components.
    pub owner: Option<EntityHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: [f32; 3],
    /// Quaternion (x, y, z, w).
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    };

    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Flags forwarded to `World::spawn_entity`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnFlags {
    /// Spawned objects are never saved with the level.
    pub transient: bool,
    /// Run construction scripts after the engine has applied the transform.
    pub defer_construction: bool,
}

impl Default for SpawnFlags {
    fn default() -> Self {
        Self {
            transient: true,
            defer_construction: false,
        }
    }
}

/// Options forwarded to `World::destroy_entity`.
/// Defaults describe a transient, local-only teardown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyOptions {
    /// Force destruction on network clients as well.
    pub network_force: bool,
    /// Mark the owning level as modified.
    pub mark_dirty: bool,
}

/// Host world interface consumed by the binding map, spawn registry and
/// track evaluation.
pub trait World {
    fn id(&self) -> WorldId;

    /// Kind of objects constructed from `class`, or None if the class is unknown.
    fn class_kind(&self, class: &str) -> Option<EntityKind>;

    /// Construct a new object. Returns None if construction failed.
    fn spawn_entity(
        &mut self,
        class: &str,
        name: &str,
        transform: &Transform,
        flags: SpawnFlags,
    ) -> Option<EntityHandle>;

    /// Destroy an object. Returns false if it was already gone.
    fn destroy_entity(&mut self, handle: EntityHandle, opts: DestroyOptions) -> bool;

    /// Describe a live object; None once it has been destroyed.
    fn describe(&self, handle: EntityHandle) -> Option<EntityDesc>;

    fn is_alive(&self, handle: EntityHandle) -> bool {
        self.describe(handle).is_some()
    }

    fn find_by_path(&self, path: &str) -> Option<EntityHandle>;

    /// Find a named component owned by `owner`.
    fn find_component(&self, owner: EntityHandle, name: &str) -> Option<EntityHandle>;

    /// Write a scalar property. Returns false if the object or property is unknown.
    fn set_property(&mut self, handle: EntityHandle, property: &str, value: f32) -> bool;

    fn property(&self, handle: EntityHandle, property: &str) -> Option<f32>;
}
