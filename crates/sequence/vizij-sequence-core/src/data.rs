//! Data-driven sequence asset (StoredSequence).
//!
//! A small, serializable sequence model: spawnable and possessable slots,
//! scalar property tracks and camera cuts. It implements [`SequenceAsset`] so
//! hosts without their own track system can play sequences straight from JSON.

use serde::{Deserialize, Serialize};

use crate::asset::{BindingResolver, SequenceAsset, SpawnableDesc, TimeRange};
use crate::binding::BindingMap;
use crate::ids::BindingId;
use crate::sampling::sample_keys;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interp {
    #[default]
    Linear,
    /// Hold the value until the next key.
    Step,
}

/// One key on a scalar track. `time` is in sequence seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub time: f32,
    pub value: f32,
    /// Interpolation towards the next key.
    #[serde(default)]
    pub interp: Interp,
}

/// Scalar property animated on every runtime object of a binding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyTrack {
    pub binding: BindingId,
    pub property: String,
    pub keys: Vec<Key>,
}

/// Slot resolved against an object that already exists in the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PossessableDesc {
    pub id: BindingId,
    pub name: String,
    /// Stable object path used to bind the slot without a live object.
    #[serde(default)]
    pub path: Option<String>,
    /// Component of the actor at `path`.
    #[serde(default)]
    pub component: Option<String>,
}

/// Switch the active camera at `time`. `camera: None` returns to the host camera.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraCutKey {
    pub time: f32,
    #[serde(default)]
    pub camera: Option<BindingId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceData {
    pub name: String,
    #[serde(default)]
    pub spawnables: Vec<SpawnableDesc>,
    #[serde(default)]
    pub possessables: Vec<PossessableDesc>,
    #[serde(default)]
    pub tracks: Vec<PropertyTrack>,
    #[serde(default, rename = "cameraCuts")]
    pub camera_cuts: Vec<CameraCutKey>,
    /// Length in seconds.
    pub duration: f32,
}

impl SequenceData {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            spawnables: Vec::new(),
            possessables: Vec::new(),
            tracks: Vec::new(),
            camera_cuts: Vec::new(),
            duration,
        }
    }

    /// Validate basic invariants (positive duration, ordered keys, unique slot ids).
    pub fn validate_basic(&self) -> Result<(), String> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err("SequenceData.duration must be > 0 seconds".into());
        }

        let mut ids: Vec<BindingId> = self
            .spawnables
            .iter()
            .map(|s| s.id)
            .chain(self.possessables.iter().map(|p| p.id))
            .collect();
        ids.sort();
        if let Some(w) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(format!("binding id {} is declared twice", w[0]));
        }

        for track in &self.tracks {
            let mut last = -f32::INFINITY;
            for k in &track.keys {
                if !k.time.is_finite() || !k.value.is_finite() {
                    return Err(format!(
                        "Keys must be finite for '{}' on {}",
                        track.property, track.binding
                    ));
                }
                if k.time < last {
                    return Err(format!(
                        "Key times must be non-decreasing for '{}' on {}",
                        track.property, track.binding
                    ));
                }
                last = k.time;
            }
        }

        let mut last = -f32::INFINITY;
        for cut in &self.camera_cuts {
            if cut.time < last {
                return Err("Camera cut times must be non-decreasing".into());
            }
            last = cut.time;
        }
        Ok(())
    }

    /// Add path references for every possessable that declares a path.
    pub fn bind_possessables(&self, bindings: &mut BindingMap) {
        for p in &self.possessables {
            if let Some(path) = &p.path {
                bindings.add_path_binding(p.id, path.clone(), p.component.clone());
            }
        }
    }
}

impl SequenceAsset for SequenceData {
    fn name(&self) -> &str {
        &self.name
    }

    fn spawnables(&self) -> &[SpawnableDesc] {
        &self.spawnables
    }

    fn duration(&self) -> Option<f32> {
        Some(self.duration)
    }

    fn evaluate_tracks(&self, range: TimeRange, resolver: &mut dyn BindingResolver) {
        for track in &self.tracks {
            let Some(value) = sample_keys(&track.keys, range.to) else {
                continue;
            };
            let objects = resolver.runtime_objects(track.binding);
            let world = resolver.world_mut();
            for object in objects {
                world.set_property(object, &track.property, value);
            }
        }

        if let Some(cut) = self.camera_cuts.iter().rev().find(|c| c.time <= range.to) {
            let camera = cut
                .camera
                .and_then(|id| resolver.runtime_objects(id).into_iter().next());
            let is_cut = range.from != range.to && range.contains(cut.time);
            resolver.update_camera_cut(camera, is_cut);
        }
    }
}
