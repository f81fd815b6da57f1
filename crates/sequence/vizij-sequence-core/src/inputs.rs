//! Input contracts for the playback controller.
//!
//! Hosts that drive playback from data (scripts, network, a blackboard) build
//! these and pass them to `PlaybackController::apply()` before ticking.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackCommand {
    Play,
    Pause,
    Stop,
    Seek { time: f32 },
    SetPlayRate { rate: f32 },
    SetLoopMode { mode: LoopMode },
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Stop advancing at the end and pause.
    Once,
    /// Wrap back to zero at the end.
    Loop,
}
