//! Binding map: authored slots to the world objects that currently satisfy them.
//!
//! Entries are non-owning. Each reference keeps the stable object path (the
//! persisted part) plus a cached `(world, handle)` pair used as the fast path
//! while the same world is loaded. Resolution falls back to the path whenever
//! the cache is stale or belongs to another world, e.g. a new play session.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::SequenceError;
use crate::ids::BindingId;
use crate::world::{EntityHandle, EntityKind, World, WorldId};

/// One non-owning reference to a bound actor, optionally narrowed to a named component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BindingRef {
    /// Stable path of the actor.
    pub path: String,
    /// Component name within the actor, if the binding targets a component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip)]
    cached: Option<(WorldId, EntityHandle)>,
}

impl BindingRef {
    pub fn new(path: impl Into<String>, tag: Option<String>) -> Self {
        Self {
            path: path.into(),
            tag,
            cached: None,
        }
    }

    fn resolve(&self, world: &dyn World) -> Option<EntityHandle> {
        let wid = world.id();
        let actor = self
            .cached
            .filter(|(w, h)| *w == wid && world.is_alive(*h))
            .map(|(_, h)| h)
            .or_else(|| world.find_by_path(&self.path))?;
        match &self.tag {
            Some(tag) => world.find_component(actor, tag),
            None => Some(actor),
        }
    }
}

/// All references recorded for one binding id. Empty means unbound.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingEntry {
    pub refs: Vec<BindingRef>,
}

/// Flat persisted form of a single reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BindingRecord {
    pub id: BindingId,
    pub path: String,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingMap {
    entries: IndexMap<BindingId, BindingEntry>,
}

impl BindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BindingId> + '_ {
        self.entries.keys().copied()
    }

    pub fn entry(&self, id: BindingId) -> Option<&BindingEntry> {
        self.entries.get(&id)
    }

    /// True iff `id` has at least one reference.
    pub fn has_binding(&self, id: BindingId) -> bool {
        self.entries.get(&id).is_some_and(|e| !e.refs.is_empty())
    }

    /// Record `object` as a runtime object for `id` within `world`.
    ///
    /// Components are stored as their owning actor plus the component name.
    /// Objects of any other kind are rejected with a warning and nothing is
    /// recorded. Binding the same object twice refreshes the cached handle.
    pub fn create_binding(
        &mut self,
        id: BindingId,
        object: EntityHandle,
        world: &dyn World,
    ) -> Result<(), SequenceError> {
        let desc = match world.describe(object) {
            Some(d) => d,
            None => {
                warn!("create_binding: object {:?} for {} does not exist", object, id);
                return Err(SequenceError::ObjectGone { handle: object });
            }
        };

        let (actor, path, tag) = match desc.kind {
            EntityKind::Actor => (object, desc.path, None),
            EntityKind::Component => {
                let owner = desc
                    .owner
                    .and_then(|o| world.describe(o).map(|od| (o, od)))
                    .filter(|(_, od)| od.kind == EntityKind::Actor);
                match owner {
                    Some((o, od)) => (o, od.path, Some(desc.name)),
                    None => {
                        warn!(
                            "create_binding: component '{}' for {} has no owning actor",
                            desc.path, id
                        );
                        return Err(SequenceError::OrphanComponent { handle: object });
                    }
                }
            }
            EntityKind::Other => {
                warn!(
                    "create_binding: '{}' ({}) is not an actor or component; binding {} skipped",
                    desc.path, desc.class, id
                );
                return Err(SequenceError::UnsupportedObject { handle: object });
            }
        };

        let cached = Some((world.id(), actor));
        let entry = self.entries.entry(id).or_default();
        if let Some(existing) = entry
            .refs
            .iter_mut()
            .find(|r| r.path == path && r.tag == tag)
        {
            existing.cached = cached;
        } else {
            debug!("create_binding: {} -> '{}' tag={:?}", id, path, tag);
            entry.refs.push(BindingRef { path, tag, cached });
        }
        Ok(())
    }

    /// Delete the entry for `id`. Returns whether anything was removed.
    pub fn remove_binding(&mut self, id: BindingId) -> bool {
        self.entries.shift_remove(&id).is_some()
    }

    /// First live object bound to `id` in `world`.
    pub fn resolve_binding(&self, id: BindingId, world: &dyn World) -> Option<EntityHandle> {
        self.entries
            .get(&id)?
            .refs
            .iter()
            .find_map(|r| r.resolve(world))
    }

    /// Every live object bound to `id` in `world`; stale references are skipped.
    pub fn resolve_all(&self, id: BindingId, world: &dyn World) -> Vec<EntityHandle> {
        match self.entries.get(&id) {
            Some(entry) => entry.refs.iter().filter_map(|r| r.resolve(world)).collect(),
            None => Vec::new(),
        }
    }

    /// Reverse lookup: the binding that currently resolves to `object`.
    pub fn find_binding_id(&self, object: EntityHandle, world: &dyn World) -> Option<BindingId> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.refs.iter().any(|r| r.resolve(world) == Some(object)))
            .map(|(id, _)| *id)
    }

    pub fn to_records(&self) -> Vec<BindingRecord> {
        self.entries
            .iter()
            .flat_map(|(id, entry)| {
                entry.refs.iter().map(move |r| BindingRecord {
                    id: *id,
                    path: r.path.clone(),
                    tag: r.tag.clone(),
                })
            })
            .collect()
    }

    pub fn from_records(records: impl IntoIterator<Item = BindingRecord>) -> Self {
        let mut map = Self::new();
        for rec in records {
            map.entries
                .entry(rec.id)
                .or_default()
                .refs
                .push(BindingRef::new(rec.path, rec.tag));
        }
        map
    }

    /// Append a path reference without a world, e.g. from authored possessable data.
    pub fn add_path_binding(&mut self, id: BindingId, path: impl Into<String>, tag: Option<String>) {
        let r = BindingRef::new(path, tag);
        let entry = self.entries.entry(id).or_default();
        if !entry.refs.iter().any(|e| e.path == r.path && e.tag == r.tag) {
            entry.refs.push(r);
        }
    }
}
