//! PlaybackController: the player facade embedders drive once per frame.
//!
//! Methods:
//! - new, set_sequence, play, pause, stop, tick, apply (commands)
//! - add_or_update_section / remove_section for sub-sequence shots
//! - runtime_objects, drain_events, dispose (also run on drop)
//!
//! The controller owns the binding map, the spawn registry and every
//! instance's context. It holds the world weakly; once the world is gone all
//! calls degrade to no-ops. Teardown requested while the host holds a borrow
//! of the world is deferred until the next call that can borrow it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::asset::{PlaybackStatus, SequenceAsset, TimeRange};
use crate::binding::BindingMap;
use crate::config::Config;
use crate::error::SequenceError;
use crate::ids::{BindingId, ContextId, IdAllocator, SectionId};
use crate::inputs::{LoopMode, PlaybackCommand};
use crate::instance::{InstanceState, SequenceInstance};
use crate::outputs::CoreEvent;
use crate::spawn::{SpawnRegistry, SpawnReport, SpawnedObjectInfo};
use crate::world::{EntityHandle, World};

/// World shared between the host and any number of controllers.
pub type SharedWorld = Rc<RefCell<dyn World>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
    Paused,
    /// Terminal; every call is ignored.
    Disposed,
}

/// Sub-sequence instance placed on the root timeline.
#[derive(Debug)]
struct Section {
    instance: SequenceInstance,
    /// Root time at which the section's local time is zero.
    start: f32,
    active: bool,
}

pub struct PlaybackController {
    cfg: Config,
    ids: IdAllocator,
    world: Weak<RefCell<dyn World>>,
    asset: Option<Arc<dyn SequenceAsset>>,
    bindings: BindingMap,
    spawns: SpawnRegistry,
    root: Option<SequenceInstance>,
    sections: IndexMap<SectionId, Section>,
    state: PlayState,
    time: f32,
    events: Vec<CoreEvent>,
    /// Torn-down contexts whose objects still wait for a world borrow.
    pending_teardown: Vec<ContextId>,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state)
            .field("time", &self.time)
            .field("root", &self.root)
            .field("sections", &self.sections)
            .finish_non_exhaustive()
    }
}

fn record_report(events: &mut Vec<CoreEvent>, context: ContextId, report: SpawnReport) {
    record_destroyed(events, context, report.destroyed);
    for s in report.spawned {
        events.push(CoreEvent::ObjectSpawned {
            context,
            binding: s.binding,
            handle: s.handle,
        });
    }
    for err in report.failures {
        events.push(CoreEvent::SpawnFailed {
            context,
            message: err.to_string(),
        });
    }
}

fn record_destroyed(
    events: &mut Vec<CoreEvent>,
    context: ContextId,
    destroyed: Vec<SpawnedObjectInfo>,
) {
    for d in destroyed {
        events.push(CoreEvent::ObjectDestroyed {
            context,
            binding: d.binding,
            handle: d.handle,
        });
    }
}

impl PlaybackController {
    /// Create a stopped controller playing into `world`. The world is held weakly.
    pub fn new<W: World + 'static>(world: &Rc<RefCell<W>>, cfg: Config) -> Self {
        let shared: SharedWorld = world.clone();
        Self::with_shared_world(&shared, cfg)
    }

    pub fn with_shared_world(world: &SharedWorld, cfg: Config) -> Self {
        Self {
            spawns: SpawnRegistry::new(cfg.spawn, cfg.destroy),
            time: cfg.playback.start_time,
            cfg,
            ids: IdAllocator::new(),
            world: Rc::downgrade(world),
            asset: None,
            bindings: BindingMap::new(),
            root: None,
            sections: IndexMap::new(),
            state: PlayState::Stopped,
            events: Vec::new(),
            pending_teardown: Vec::new(),
        }
    }

    /// Builder-style variant of [`Self::set_sequence`].
    pub fn with_sequence(mut self, asset: Arc<dyn SequenceAsset>, bindings: BindingMap) -> Self {
        self.set_sequence(asset);
        self.bindings = bindings;
        self
    }

    /// Switch to another sequence. Any current performance is stopped first.
    pub fn set_sequence(&mut self, asset: Arc<dyn SequenceAsset>) {
        if self.state == PlayState::Disposed {
            return;
        }
        if self.root.is_some() || !self.sections.is_empty() {
            self.stop();
        }
        self.asset = Some(asset);
    }

    pub fn sequence(&self) -> Option<&Arc<dyn SequenceAsset>> {
        self.asset.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn bindings(&self) -> &BindingMap {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut BindingMap {
        &mut self.bindings
    }

    /// Bind a possessable slot to an existing world object.
    pub fn create_binding(
        &mut self,
        id: BindingId,
        object: EntityHandle,
    ) -> Result<(), SequenceError> {
        let Some(shared) = self.world.upgrade() else {
            debug!("create_binding: world is gone");
            return Err(SequenceError::ObjectGone { handle: object });
        };
        let Ok(world) = shared.try_borrow() else {
            warn!("create_binding: world is mutably borrowed; binding {} skipped", id);
            return Err(SequenceError::ObjectGone { handle: object });
        };
        self.bindings.create_binding(id, object, &*world)
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn time_cursor(&self) -> f32 {
        self.time
    }

    /// Move the cursor without advancing playback; the next tick evaluates there.
    /// Non-finite times are ignored.
    pub fn set_time_cursor(&mut self, time: f32) {
        if self.state == PlayState::Disposed {
            return;
        }
        if !time.is_finite() {
            warn!("set_time_cursor: non-finite time {}; ignored", time);
            return;
        }
        self.time = time;
    }

    /// Non-finite rates are ignored.
    pub fn set_play_rate(&mut self, rate: f32) {
        if !rate.is_finite() {
            warn!("set_play_rate: non-finite rate {}; ignored", rate);
            return;
        }
        self.cfg.playback.play_rate = rate;
    }

    pub fn root_instance(&self) -> Option<&SequenceInstance> {
        self.root.as_ref()
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        match self.state {
            PlayState::Playing => PlaybackStatus::Playing,
            PlayState::Paused => PlaybackStatus::Paused,
            PlayState::Stopped | PlayState::Disposed => PlaybackStatus::Stopped,
        }
    }

    /// Events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start or resume playback.
    ///
    /// Resuming from Paused keeps the current instance and its spawned objects.
    /// Otherwise a fresh root instance replaces (and tears down) the previous one.
    /// Without a sequence or a live world this is a no-op.
    pub fn play(&mut self) {
        match self.state {
            PlayState::Disposed | PlayState::Playing => return,
            PlayState::Paused
                if self
                    .root
                    .as_ref()
                    .is_some_and(|r| r.state() != InstanceState::TornDown) =>
            {
                self.state = PlayState::Playing;
                self.events.push(CoreEvent::PlaybackResumed { time: self.time });
                return;
            }
            _ => {}
        }

        let Some(asset) = self.asset.clone() else {
            debug!("play: no sequence set; ignored");
            return;
        };
        let Some(shared) = self.world.upgrade() else {
            debug!("play: world is gone; ignored");
            return;
        };
        let Ok(mut world) = shared.try_borrow_mut() else {
            warn!("play: world is already borrowed; ignored");
            return;
        };
        self.reap_pending(&mut *world);

        if let Some(mut old) = self.root.take() {
            let destroyed = old.tear_down(&mut self.spawns, &mut *world);
            record_destroyed(&mut self.events, old.context(), destroyed);
        }

        let context = self.ids.alloc_context();
        let mut instance = SequenceInstance::new(context, asset);
        if let Some(report) = instance.refresh(&mut self.spawns, &mut *world) {
            record_report(&mut self.events, context, report);
        }
        info!(
            "play: '{}' started in {} at t={}",
            instance.asset().name(),
            context,
            self.time
        );
        self.root = Some(instance);
        self.state = PlayState::Playing;
        self.events.push(CoreEvent::PlaybackStarted { context });
    }

    /// Stop advancing the cursor. Spawned objects stay alive.
    pub fn pause(&mut self) {
        if self.state == PlayState::Playing {
            self.state = PlayState::Paused;
            self.events.push(CoreEvent::PlaybackPaused { time: self.time });
        }
    }

    /// Tear down the root and every section instance and rewind the cursor.
    pub fn stop(&mut self) {
        if self.state == PlayState::Disposed {
            return;
        }
        let had_work = self.root.is_some() || !self.sections.is_empty();
        self.tear_down_all();
        self.time = self.cfg.playback.start_time;
        let was_stopped = self.state == PlayState::Stopped;
        self.state = PlayState::Stopped;
        if had_work || !was_stopped {
            self.events.push(CoreEvent::PlaybackStopped);
        }
    }

    /// Advance by `dt` seconds if playing, then evaluate the root and active
    /// sections at the (possibly unchanged) cursor.
    pub fn tick(&mut self, dt: f32) {
        if self.state == PlayState::Disposed {
            return;
        }
        if !dt.is_finite() {
            warn!("tick: non-finite dt {}; frame skipped", dt);
            return;
        }
        let Some(shared) = self.world.upgrade() else {
            return;
        };
        let Ok(mut world) = shared.try_borrow_mut() else {
            warn!("tick: world is already borrowed; frame skipped");
            return;
        };
        self.reap_pending(&mut *world);

        let old = self.time;
        let mut ranges: Vec<TimeRange> = Vec::with_capacity(2);
        let mut finished = false;

        if self.state == PlayState::Playing {
            let new = old + dt * self.cfg.playback.play_rate;
            if !new.is_finite() {
                warn!("tick: cursor overflowed from t={}; frame skipped", old);
                return;
            }
            let duration = self.asset.as_ref().and_then(|a| a.duration());
            match (duration, self.cfg.playback.loop_mode) {
                (Some(end), LoopMode::Once) if new >= end => {
                    ranges.push(TimeRange::new(old.min(end), end));
                    self.time = end;
                    finished = true;
                }
                (Some(end), LoopMode::Loop) if end > 0.0 && new >= end => {
                    let wrapped = new.rem_euclid(end);
                    ranges.push(TimeRange::new(old.min(end), end));
                    ranges.push(TimeRange::new(0.0, wrapped));
                    self.time = wrapped;
                }
                _ => {
                    ranges.push(TimeRange::new(old, new));
                    self.time = new;
                }
            }
        } else {
            ranges.push(TimeRange::at(old));
        }

        let status = self.playback_status();
        if let Some(root) = self.root.as_mut() {
            for range in &ranges {
                root.evaluate(*range, status, &self.bindings, &self.spawns, &mut *world);
            }
            for cut in root.take_camera_cuts() {
                self.events.push(CoreEvent::CameraCut {
                    context: root.context(),
                    camera: cut.camera,
                    is_cut: cut.is_cut,
                });
            }
        }
        for section in self.sections.values_mut().filter(|s| s.active) {
            for range in &ranges {
                section.instance.evaluate(
                    range.shifted(-section.start),
                    status,
                    &self.bindings,
                    &self.spawns,
                    &mut *world,
                );
            }
            for cut in section.instance.take_camera_cuts() {
                self.events.push(CoreEvent::CameraCut {
                    context: section.instance.context(),
                    camera: cut.camera,
                    is_cut: cut.is_cut,
                });
            }
        }

        if finished {
            debug!("tick: reached end at t={}", self.time);
            self.state = PlayState::Paused;
            self.events.push(CoreEvent::PlaybackFinished { time: self.time });
        }
    }

    pub fn apply(&mut self, cmd: PlaybackCommand) {
        match cmd {
            PlaybackCommand::Play => self.play(),
            PlaybackCommand::Pause => self.pause(),
            PlaybackCommand::Stop => self.stop(),
            PlaybackCommand::Seek { time } => self.set_time_cursor(time),
            PlaybackCommand::SetPlayRate { rate } => self.set_play_rate(rate),
            PlaybackCommand::SetLoopMode { mode } => self.cfg.playback.loop_mode = mode,
        }
    }

    /// A sub-sequence section became relevant (e.g. the cursor entered a shot).
    ///
    /// The first call creates a section instance with its own context; later
    /// calls respawn its objects. A different asset replaces the instance.
    pub fn add_or_update_section(
        &mut self,
        section: SectionId,
        asset: Arc<dyn SequenceAsset>,
        start: f32,
    ) -> Option<ContextId> {
        if self.state == PlayState::Disposed {
            return None;
        }
        let shared = self.world.upgrade()?;
        let Ok(mut world) = shared.try_borrow_mut() else {
            warn!("add_or_update_section: world is already borrowed; ignored");
            return None;
        };
        self.reap_pending(&mut *world);

        let replace = self
            .sections
            .get(&section)
            .is_some_and(|s| !Arc::ptr_eq(s.instance.asset(), &asset));
        if replace {
            if let Some(mut old) = self.sections.shift_remove(&section) {
                let destroyed = old.instance.tear_down(&mut self.spawns, &mut *world);
                record_destroyed(&mut self.events, old.instance.context(), destroyed);
            }
        }

        let ids = &mut self.ids;
        let entry = self.sections.entry(section).or_insert_with(|| Section {
            instance: SequenceInstance::new(ids.alloc_context(), asset),
            start,
            active: false,
        });
        entry.start = start;
        entry.active = true;
        let context = entry.instance.context();
        if let Some(report) = entry.instance.add_or_update(&mut self.spawns, &mut *world) {
            record_report(&mut self.events, context, report);
        }
        self.events
            .push(CoreEvent::SectionActivated { section, context });
        Some(context)
    }

    /// A section stopped being relevant: destroy its spawned objects, keep its context.
    pub fn remove_section(&mut self, section: SectionId) {
        let Some(entry) = self.sections.get_mut(&section) else {
            return;
        };
        if !entry.active {
            return;
        }
        entry.active = false;
        let context = entry.instance.context();
        if let Some(shared) = self.world.upgrade() {
            if let Ok(mut world) = shared.try_borrow_mut() {
                let destroyed = entry.instance.remove(&mut self.spawns, &mut *world);
                record_destroyed(&mut self.events, context, destroyed);
                for pending in std::mem::take(&mut self.pending_teardown) {
                    let reaped = self.spawns.dispose(pending, &mut *world);
                    record_destroyed(&mut self.events, pending, reaped);
                }
            } else {
                warn!("remove_section: world is already borrowed; objects kept");
            }
        }
        self.events.push(CoreEvent::SectionDeactivated { section });
    }

    pub fn section_context(&self, section: SectionId) -> Option<ContextId> {
        self.sections.get(&section).map(|s| s.instance.context())
    }

    /// Runtime objects for `id` in the root performance.
    /// Without a root instance only the binding map is consulted.
    pub fn runtime_objects(&self, id: BindingId) -> Vec<EntityHandle> {
        let Some(shared) = self.world.upgrade() else {
            return Vec::new();
        };
        let Ok(world) = shared.try_borrow() else {
            return Vec::new();
        };
        match &self.root {
            Some(root) => root.runtime_objects(id, &self.bindings, &self.spawns, &*world),
            None => self.bindings.resolve_all(id, &*world),
        }
    }

    /// Runtime objects for `id` as seen from a section's context.
    pub fn section_runtime_objects(&self, section: SectionId, id: BindingId) -> Vec<EntityHandle> {
        let (Some(entry), Some(shared)) = (self.sections.get(&section), self.world.upgrade())
        else {
            return Vec::new();
        };
        let Ok(world) = shared.try_borrow() else {
            return Vec::new();
        };
        entry
            .instance
            .runtime_objects(id, &self.bindings, &self.spawns, &*world)
    }

    /// Objects spawned for the root performance.
    pub fn spawned_objects(&self) -> &[SpawnedObjectInfo] {
        match &self.root {
            Some(root) => self.spawns.spawned(root.context()),
            None => &[],
        }
    }

    /// Objects of torn-down instances that could not be destroyed yet because
    /// the world was borrowed at teardown time.
    pub fn leftover_objects(&self) -> Vec<SpawnedObjectInfo> {
        self.pending_teardown
            .iter()
            .flat_map(|c| self.spawns.spawned(*c).iter().copied())
            .collect()
    }

    /// Hand the leftover objects to the caller, who becomes responsible for
    /// destroying them.
    pub fn take_leftover_objects(&mut self) -> Vec<SpawnedObjectInfo> {
        let leftovers = self.leftover_objects();
        for context in self.pending_teardown.drain(..) {
            self.spawns.forget(context);
        }
        leftovers
    }

    /// Tear everything down and enter the terminal Disposed state.
    /// Calling it again retries any teardown deferred by a borrowed world.
    pub fn dispose(&mut self) {
        self.tear_down_all();
        if self.state != PlayState::Disposed {
            self.state = PlayState::Disposed;
            debug!("dispose: controller disposed");
        }
    }

    fn reap_pending(&mut self, world: &mut dyn World) {
        for context in std::mem::take(&mut self.pending_teardown) {
            let destroyed = self.spawns.dispose(context, world);
            debug!(
                "tear_down: destroyed {} deferred objects of {}",
                destroyed.len(),
                context
            );
            record_destroyed(&mut self.events, context, destroyed);
        }
    }

    fn tear_down_all(&mut self) {
        let mut instances: Vec<SequenceInstance> =
            self.sections.drain(..).map(|(_, s)| s.instance).collect();
        instances.extend(self.root.take());
        if instances.is_empty() && self.pending_teardown.is_empty() {
            return;
        }

        let Some(shared) = self.world.upgrade() else {
            for mut instance in instances {
                warn!(
                    "tear_down: world is gone; forgetting objects of {}",
                    instance.context()
                );
                instance.abandon(&mut self.spawns);
            }
            for context in self.pending_teardown.drain(..) {
                self.spawns.forget(context);
            }
            return;
        };
        let Ok(mut world) = shared.try_borrow_mut() else {
            for mut instance in instances {
                instance.detach();
                self.pending_teardown.push(instance.context());
            }
            let handles: Vec<EntityHandle> =
                self.leftover_objects().iter().map(|o| o.handle).collect();
            warn!(
                "tear_down: world is borrowed; destroying {:?} deferred",
                handles
            );
            return;
        };

        self.reap_pending(&mut *world);
        for mut instance in instances {
            let destroyed = instance.tear_down(&mut self.spawns, &mut *world);
            record_destroyed(&mut self.events, instance.context(), destroyed);
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.dispose();
        let leftovers = self.leftover_objects();
        if !leftovers.is_empty() {
            let handles: Vec<EntityHandle> = leftovers.iter().map(|o| o.handle).collect();
            warn!(
                "drop: world is borrowed; {} spawned objects outlive the controller: {:?}",
                handles.len(),
                handles
            );
        }
    }
}
