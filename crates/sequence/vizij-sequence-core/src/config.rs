//! Core configuration for vizij-sequence-core.

use serde::{Deserialize, Serialize};

use crate::inputs::LoopMode;
use crate::world::{DestroyOptions, SpawnFlags};

/// Configuration handed to a PlaybackController.
/// Every field has a default; hosts usually override only `playback`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackSettings,
    /// Flags passed to `World::spawn_entity` for every spawnable.
    #[serde(default)]
    pub spawn: SpawnFlags,
    /// Options passed to `World::destroy_entity` on teardown.
    #[serde(default)]
    pub destroy: DestroyOptions,
}

/// Cursor behaviour of a controller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Multiplier applied to `dt` while playing.
    pub play_rate: f32,
    pub loop_mode: LoopMode,
    /// Cursor position after construction and after `stop()`.
    pub start_time: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            play_rate: 1.0,
            loop_mode: LoopMode::Once,
            start_time: 0.0,
        }
    }
}
