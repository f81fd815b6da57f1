//! Vizij Sequence Core (engine-agnostic)
//!
//! Binding and lifecycle engine for cinematic sequences: resolves authored
//! binding ids to live world objects, spawns and destroys per-performance
//! objects, and drives per-frame evaluation. Each playback context is isolated,
//! so one sequence asset can be played by several controllers at once.
//!
//! Hosts implement [`World`] (and optionally [`SequenceAsset`]) and drive a
//! [`PlaybackController`] once per frame.

pub mod asset;
pub mod binding;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod ids;
pub mod inputs;
pub mod instance;
pub mod outputs;
pub mod sampling;
pub mod simple_world;
pub mod spawn;
pub mod stored_sequence;
pub mod world;

// Re-exports for consumers (hosts)
pub use asset::{BindingResolver, PlaybackStatus, SequenceAsset, SpawnableDesc, TimeRange};
pub use binding::{BindingEntry, BindingMap, BindingRecord, BindingRef};
pub use config::{Config, PlaybackSettings};
pub use controller::{PlayState, PlaybackController, SharedWorld};
pub use data::{CameraCutKey, Interp, Key, PossessableDesc, PropertyTrack, SequenceData};
pub use error::SequenceError;
pub use ids::{BindingId, ContextId, IdAllocator, SectionId};
pub use inputs::{LoopMode, PlaybackCommand};
pub use instance::{CameraCut, InstanceState, SequenceInstance};
pub use outputs::CoreEvent;
pub use sampling::sample_keys;
pub use simple_world::{ActorSpec, SimpleWorld, WorldSpec};
pub use spawn::{SpawnRegistry, SpawnReport, SpawnedObjectInfo};
pub use stored_sequence::parse_stored_sequence_json;
pub use world::{
    DestroyOptions, EntityDesc, EntityHandle, EntityKind, SpawnFlags, Transform, World, WorldId,
};
