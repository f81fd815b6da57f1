//! Error values for recoverable sequence failures.
//!
//! None of these are fatal: the lifecycle API logs them and degrades to an
//! empty result. They are surfaced as values (spawn reports, binding results,
//! fixture parsing) so hosts and tests can inspect what went wrong.

use crate::ids::BindingId;
use crate::world::EntityHandle;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SequenceError {
    /// The referenced object no longer exists in the world.
    #[error("Object {handle:?} does not exist")]
    ObjectGone { handle: EntityHandle },

    /// Only actors and actor components can be bound.
    #[error("Object {handle:?} is not an actor or component")]
    UnsupportedObject { handle: EntityHandle },

    /// A component whose owning actor cannot be found.
    #[error("Component {handle:?} has no owning actor")]
    OrphanComponent { handle: EntityHandle },

    /// The world does not know how to construct this class.
    #[error("Unknown class '{class}' for spawnable {binding}")]
    UnknownClass { binding: BindingId, class: String },

    /// The class exists but is not an actor kind.
    #[error("Class '{class}' for spawnable {binding} is not spawnable")]
    UnsupportedClass { binding: BindingId, class: String },

    /// The world refused to construct the object.
    #[error("World rejected spawn of '{class}' for spawnable {binding}")]
    SpawnRejected { binding: BindingId, class: String },

    /// Stored sequence data failed to parse.
    #[error("Parse error: {reason}")]
    Parse { reason: String },

    /// Stored sequence data parsed but violates basic invariants.
    #[error("Invalid sequence: {reason}")]
    InvalidSequence { reason: String },
}
