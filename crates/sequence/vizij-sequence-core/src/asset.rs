//! Sequence asset and binding resolver contracts.
//!
//! A sequence asset is read-only and may be shared by any number of
//! simultaneous instances. During evaluation it asks a [`BindingResolver`]
//! for the runtime objects of each binding it animates.

use serde::{Deserialize, Serialize};

use crate::ids::BindingId;
use crate::world::{EntityHandle, Transform, World};

/// Authored slot whose object is created fresh for every performance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnableDesc {
    pub id: BindingId,
    /// Class the world constructs.
    pub class: String,
    /// Display name; defaults to the class name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub transform: Transform,
}

impl SpawnableDesc {
    pub fn new(id: BindingId, class: impl Into<String>) -> Self {
        Self {
            id,
            class: class.into(),
            name: None,
            transform: Transform::default(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.class)
    }
}

/// Half-open evaluation window `(from, to]` in sequence seconds.
/// `from == to` is a valid scrub of a single instant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: f32,
    pub to: f32,
}

impl TimeRange {
    pub fn new(from: f32, to: f32) -> Self {
        Self { from, to }
    }

    pub fn at(t: f32) -> Self {
        Self { from: t, to: t }
    }

    /// True if `t` lies in `(from, to]`, or equals the instant of a scrub.
    pub fn contains(&self, t: f32) -> bool {
        if self.from == self.to {
            t == self.to
        } else {
            t > self.from && t <= self.to
        }
    }

    pub fn shifted(&self, offset: f32) -> Self {
        Self {
            from: self.from + offset,
            to: self.to + offset,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// Callback surface handed to the asset during evaluation.
pub trait BindingResolver {
    /// Runtime objects currently satisfying `id`; empty if none.
    fn runtime_objects(&self, id: BindingId) -> Vec<EntityHandle>;

    /// The asset switched the active camera.
    fn update_camera_cut(&mut self, camera: Option<EntityHandle>, is_cut: bool);

    fn playback_status(&self) -> PlaybackStatus;

    /// World the resolved objects live in, for applying track effects.
    fn world_mut(&mut self) -> &mut dyn World;
}

/// Read-only sequence data consumed by the engine.
pub trait SequenceAsset {
    fn name(&self) -> &str {
        ""
    }

    fn spawnables(&self) -> &[SpawnableDesc];

    /// Length in seconds, if bounded.
    fn duration(&self) -> Option<f32> {
        None
    }

    /// Apply every track's effect for `range`, resolving objects through `resolver`.
    fn evaluate_tracks(&self, range: TimeRange, resolver: &mut dyn BindingResolver);
}
