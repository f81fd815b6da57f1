//! SequenceInstance: one live performance of a sequence asset.
//!
//! The instance owns its context id and time cursor. The binding map and spawn
//! registry belong to the controller and are borrowed per call, so several
//! instances (root and sections) share one arena without sharing partitions.

use std::sync::Arc;

use log::debug;

use crate::asset::{BindingResolver, PlaybackStatus, SequenceAsset, TimeRange};
use crate::binding::BindingMap;
use crate::ids::{BindingId, ContextId};
use crate::spawn::{SpawnRegistry, SpawnReport, SpawnedObjectInfo};
use crate::world::{EntityHandle, World};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InstanceState {
    /// Constructed, nothing spawned yet.
    Idle,
    /// Refreshed or evaluated at least once.
    Active,
    /// Spawned objects destroyed; terminal.
    TornDown,
}

/// Camera switch requested by the asset during the last evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CameraCut {
    pub camera: Option<EntityHandle>,
    pub is_cut: bool,
}

pub struct SequenceInstance {
    context: ContextId,
    asset: Arc<dyn SequenceAsset>,
    state: InstanceState,
    time: f32,
    camera: Option<EntityHandle>,
    pending_cuts: Vec<CameraCut>,
}

impl std::fmt::Debug for SequenceInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceInstance")
            .field("context", &self.context)
            .field("asset", &self.asset.name())
            .field("state", &self.state)
            .field("time", &self.time)
            .field("camera", &self.camera)
            .finish()
    }
}

impl SequenceInstance {
    pub fn new(context: ContextId, asset: Arc<dyn SequenceAsset>) -> Self {
        Self {
            context,
            asset,
            state: InstanceState::Idle,
            time: 0.0,
            camera: None,
            pending_cuts: Vec::new(),
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn asset(&self) -> &Arc<dyn SequenceAsset> {
        &self.asset
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    /// Time of the last evaluation.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Camera selected by the most recent camera cut.
    pub fn camera(&self) -> Option<EntityHandle> {
        self.camera
    }

    /// Camera cuts reported since the last call.
    pub fn take_camera_cuts(&mut self) -> Vec<CameraCut> {
        std::mem::take(&mut self.pending_cuts)
    }

    /// Enter Active and (re)spawn the asset's spawnables for this context.
    /// Returns None once torn down.
    pub fn refresh(
        &mut self,
        spawns: &mut SpawnRegistry,
        world: &mut dyn World,
    ) -> Option<SpawnReport> {
        if self.state == InstanceState::TornDown {
            debug!("refresh[{}]: instance is torn down; ignored", self.context);
            return None;
        }
        self.state = InstanceState::Active;
        Some(spawns.spawn_all(self.context, self.asset.spawnables(), world))
    }

    /// Section-activation hook: the instance became relevant again.
    pub fn add_or_update(
        &mut self,
        spawns: &mut SpawnRegistry,
        world: &mut dyn World,
    ) -> Option<SpawnReport> {
        if self.state == InstanceState::TornDown {
            return None;
        }
        self.state = InstanceState::Active;
        Some(spawns.add_or_update(self.context, self.asset.spawnables(), world))
    }

    /// Section-deactivation hook: destroy spawned objects, stay evaluable.
    pub fn remove(
        &mut self,
        spawns: &mut SpawnRegistry,
        world: &mut dyn World,
    ) -> Vec<SpawnedObjectInfo> {
        if self.state == InstanceState::TornDown {
            return Vec::new();
        }
        spawns.remove(self.context, world)
    }

    /// Evaluate the asset over `range`.
    ///
    /// Works before `refresh`: spawnables are then simply absent and bindings
    /// resolve through the binding map only.
    pub fn evaluate(
        &mut self,
        range: TimeRange,
        status: PlaybackStatus,
        bindings: &BindingMap,
        spawns: &SpawnRegistry,
        world: &mut dyn World,
    ) {
        if self.state == InstanceState::TornDown {
            debug!("evaluate[{}]: instance is torn down; ignored", self.context);
            return;
        }
        self.state = InstanceState::Active;

        let asset = Arc::clone(&self.asset);
        let mut resolver = InstanceResolver {
            context: self.context,
            bindings,
            spawns,
            world,
            status,
            camera: &mut self.camera,
            cuts: &mut self.pending_cuts,
        };
        asset.evaluate_tracks(range, &mut resolver);
        self.time = range.to;
    }

    /// Spawned object for this context first, bound objects second, else empty.
    pub fn runtime_objects(
        &self,
        id: BindingId,
        bindings: &BindingMap,
        spawns: &SpawnRegistry,
        world: &dyn World,
    ) -> Vec<EntityHandle> {
        resolve_runtime_objects(self.context, id, bindings, spawns, world)
    }

    /// Destroy everything spawned for this context and make the instance terminal.
    pub fn tear_down(
        &mut self,
        spawns: &mut SpawnRegistry,
        world: &mut dyn World,
    ) -> Vec<SpawnedObjectInfo> {
        if self.state == InstanceState::TornDown {
            return Vec::new();
        }
        self.state = InstanceState::TornDown;
        self.camera = None;
        spawns.dispose(self.context, world)
    }

    /// Mark terminal without a world; the objects went away with it.
    pub(crate) fn abandon(&mut self, spawns: &mut SpawnRegistry) {
        self.state = InstanceState::TornDown;
        self.camera = None;
        spawns.forget(self.context);
    }

    /// Mark terminal but leave the context's objects in the registry; the
    /// owner destroys them once the world can be borrowed again.
    pub(crate) fn detach(&mut self) {
        self.state = InstanceState::TornDown;
        self.camera = None;
    }
}

fn resolve_runtime_objects(
    context: ContextId,
    id: BindingId,
    bindings: &BindingMap,
    spawns: &SpawnRegistry,
    world: &dyn World,
) -> Vec<EntityHandle> {
    if let Some(spawned) = spawns.resolve(context, id, world) {
        return vec![spawned];
    }
    bindings.resolve_all(id, world)
}

/// Resolver view handed to the asset for one evaluation.
struct InstanceResolver<'a> {
    context: ContextId,
    bindings: &'a BindingMap,
    spawns: &'a SpawnRegistry,
    world: &'a mut dyn World,
    status: PlaybackStatus,
    camera: &'a mut Option<EntityHandle>,
    cuts: &'a mut Vec<CameraCut>,
}

impl BindingResolver for InstanceResolver<'_> {
    fn runtime_objects(&self, id: BindingId) -> Vec<EntityHandle> {
        resolve_runtime_objects(self.context, id, self.bindings, self.spawns, &*self.world)
    }

    fn update_camera_cut(&mut self, camera: Option<EntityHandle>, is_cut: bool) {
        if *self.camera == camera && !is_cut {
            return;
        }
        *self.camera = camera;
        self.cuts.push(CameraCut { camera, is_cut });
    }

    fn playback_status(&self) -> PlaybackStatus {
        self.status
    }

    fn world_mut(&mut self) -> &mut dyn World {
        &mut *self.world
    }
}
