//! Spawn registry: owned lifetime of spawnable objects, partitioned by context.
//!
//! The registry is the only owner of the objects it spawns. Each playback
//! context gets its own partition; contexts never see each other's entries.
//! Partitions are removed explicitly with [`SpawnRegistry::dispose`].

use hashbrown::HashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::asset::SpawnableDesc;
use crate::error::SequenceError;
use crate::ids::{BindingId, ContextId};
use crate::world::{DestroyOptions, EntityHandle, EntityKind, SpawnFlags, World};

/// Record of one object spawned for a binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedObjectInfo {
    pub binding: BindingId,
    pub handle: EntityHandle,
}

/// Outcome of a spawn batch. Failures never abort the batch.
#[derive(Clone, Debug, Default)]
pub struct SpawnReport {
    pub spawned: Vec<SpawnedObjectInfo>,
    pub destroyed: Vec<SpawnedObjectInfo>,
    pub failures: Vec<SequenceError>,
}

#[derive(Debug, Default)]
pub struct SpawnRegistry {
    partitions: HashMap<ContextId, Vec<SpawnedObjectInfo>>,
    flags: SpawnFlags,
    destroy_opts: DestroyOptions,
}

impl SpawnRegistry {
    pub fn new(flags: SpawnFlags, destroy_opts: DestroyOptions) -> Self {
        Self {
            partitions: HashMap::new(),
            flags,
            destroy_opts,
        }
    }

    /// Objects currently tracked for `context`, in spawn order.
    pub fn spawned(&self, context: ContextId) -> &[SpawnedObjectInfo] {
        self.partitions
            .get(&context)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contexts(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.partitions.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.values().all(Vec::is_empty)
    }

    /// Replace every spawned object of `context` with a fresh batch built from `spawnables`.
    pub fn spawn_all(
        &mut self,
        context: ContextId,
        spawnables: &[SpawnableDesc],
        world: &mut dyn World,
    ) -> SpawnReport {
        let mut report = SpawnReport {
            destroyed: self.destroy_all(context, world),
            ..SpawnReport::default()
        };
        if spawnables.is_empty() {
            return report;
        }

        let mut entries: Vec<SpawnedObjectInfo> = Vec::with_capacity(spawnables.len());
        for desc in spawnables {
            let handle = match self.spawn_one(desc, world) {
                Ok(h) => h,
                Err(err) => {
                    warn!("spawn_all[{}]: {}", context, err);
                    report.failures.push(err);
                    continue;
                }
            };

            // A repeated id replaces the object spawned earlier in this batch.
            if let Some(pos) = entries.iter().position(|e| e.binding == desc.id) {
                let prev = entries.remove(pos);
                self.destroy_one(prev, world);
                report.spawned.retain(|s| s.handle != prev.handle);
                report.destroyed.push(prev);
            }

            let info = SpawnedObjectInfo {
                binding: desc.id,
                handle,
            };
            debug!(
                "spawn_all[{}]: spawned '{}' for {} as {:?}",
                context,
                desc.display_name(),
                desc.id,
                handle
            );
            entries.push(info);
            report.spawned.push(info);
        }

        self.partitions.insert(context, entries);
        report
    }

    fn spawn_one(
        &self,
        desc: &SpawnableDesc,
        world: &mut dyn World,
    ) -> Result<EntityHandle, SequenceError> {
        match world.class_kind(&desc.class) {
            None => Err(SequenceError::UnknownClass {
                binding: desc.id,
                class: desc.class.clone(),
            }),
            Some(EntityKind::Actor) => world
                .spawn_entity(&desc.class, desc.display_name(), &desc.transform, self.flags)
                .ok_or_else(|| SequenceError::SpawnRejected {
                    binding: desc.id,
                    class: desc.class.clone(),
                }),
            Some(_) => Err(SequenceError::UnsupportedClass {
                binding: desc.id,
                class: desc.class.clone(),
            }),
        }
    }

    fn destroy_one(&self, info: SpawnedObjectInfo, world: &mut dyn World) {
        if !world.is_alive(info.handle) {
            debug!(
                "destroy: {:?} for {} already gone",
                info.handle, info.binding
            );
            return;
        }
        if !world.destroy_entity(info.handle, self.destroy_opts) {
            debug!(
                "destroy: world reported {:?} for {} as already destroyed",
                info.handle, info.binding
            );
        }
    }

    /// Destroy every object tracked for `context` and clear its entries.
    /// Objects destroyed elsewhere are skipped. Returns the cleared records.
    pub fn destroy_all(
        &mut self,
        context: ContextId,
        world: &mut dyn World,
    ) -> Vec<SpawnedObjectInfo> {
        let entries = match self.partitions.get_mut(&context) {
            Some(e) if !e.is_empty() => std::mem::take(e),
            _ => return Vec::new(),
        };
        for info in &entries {
            self.destroy_one(*info, world);
        }
        debug!("destroy_all[{}]: cleared {} objects", context, entries.len());
        entries
    }

    /// Live spawned object for `id` in `context`.
    pub fn resolve(
        &self,
        context: ContextId,
        id: BindingId,
        world: &dyn World,
    ) -> Option<EntityHandle> {
        self.partitions
            .get(&context)?
            .iter()
            .find(|e| e.binding == id)
            .map(|e| e.handle)
            .filter(|h| world.is_alive(*h))
    }

    /// Section became relevant: (re)spawn its objects.
    pub fn add_or_update(
        &mut self,
        context: ContextId,
        spawnables: &[SpawnableDesc],
        world: &mut dyn World,
    ) -> SpawnReport {
        self.spawn_all(context, spawnables, world)
    }

    /// Section became irrelevant: destroy its objects but keep the partition.
    pub fn remove(&mut self, context: ContextId, world: &mut dyn World) -> Vec<SpawnedObjectInfo> {
        self.destroy_all(context, world)
    }

    /// Destroy the context's objects and drop its partition.
    pub fn dispose(&mut self, context: ContextId, world: &mut dyn World) -> Vec<SpawnedObjectInfo> {
        let destroyed = self.destroy_all(context, world);
        self.partitions.remove(&context);
        destroyed
    }

    /// Forget a context without touching the world (the world is gone).
    pub fn forget(&mut self, context: ContextId) {
        self.partitions.remove(&context);
    }
}
