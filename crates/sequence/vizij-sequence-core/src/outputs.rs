//! Output contracts from the playback controller.
//!
//! The controller queues semantic events while it plays; hosts drain them
//! after each call that can change lifecycle state.

use serde::{Deserialize, Serialize};

use crate::ids::{BindingId, ContextId, SectionId};
use crate::world::EntityHandle;

/// Lifecycle event queued by one controller.
///
/// Context ids are only unique within the controller that emitted the event:
/// every controller numbers its contexts from zero. Hosts running several
/// controllers attribute events by the controller they drained them from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreEvent {
    PlaybackStarted {
        context: ContextId,
    },
    PlaybackPaused {
        time: f32,
    },
    PlaybackResumed {
        time: f32,
    },
    PlaybackStopped,
    /// A `Once` sequence reached its end.
    PlaybackFinished {
        time: f32,
    },
    ObjectSpawned {
        context: ContextId,
        binding: BindingId,
        handle: EntityHandle,
    },
    ObjectDestroyed {
        context: ContextId,
        binding: BindingId,
        handle: EntityHandle,
    },
    SpawnFailed {
        context: ContextId,
        message: String,
    },
    SectionActivated {
        section: SectionId,
        context: ContextId,
    },
    SectionDeactivated {
        section: SectionId,
    },
    CameraCut {
        context: ContextId,
        camera: Option<EntityHandle>,
        is_cut: bool,
    },
}
