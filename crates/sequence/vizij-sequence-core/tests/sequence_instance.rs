use std::sync::{Arc, Mutex};

use vizij_sequence_core::{
    BindingId, BindingMap, BindingResolver, ContextId, EntityHandle, EntityKind, InstanceState,
    Key, Interp, PlaybackStatus, PropertyTrack, SequenceAsset, SequenceData, SequenceInstance,
    SimpleWorld, SpawnRegistry, SpawnableDesc, TimeRange, World, WorldId,
};

const SPAWNED: BindingId = BindingId::from_u128(0xa1);
const HERO: BindingId = BindingId::from_u128(0xb2);

/// Asset that records what the resolver hands back for one probe binding.
struct RecordingAsset {
    spawnables: Vec<SpawnableDesc>,
    probe: BindingId,
    seen: Mutex<Vec<(TimeRange, PlaybackStatus, Vec<EntityHandle>)>>,
}

impl RecordingAsset {
    fn new(spawnables: Vec<SpawnableDesc>, probe: BindingId) -> Self {
        Self {
            spawnables,
            probe,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl SequenceAsset for RecordingAsset {
    fn spawnables(&self) -> &[SpawnableDesc] {
        &self.spawnables
    }

    fn evaluate_tracks(&self, range: TimeRange, resolver: &mut dyn BindingResolver) {
        let objects = resolver.runtime_objects(self.probe);
        self.seen
            .lock()
            .unwrap()
            .push((range, resolver.playback_status(), objects));
    }
}

fn world() -> (SimpleWorld, EntityHandle) {
    let mut w = SimpleWorld::new(WorldId(0));
    w.register_class("Box", EntityKind::Actor);
    let hero = w.add_actor("Hero", "Character");
    (w, hero)
}

fn lift_sequence() -> SequenceData {
    let mut data = SequenceData::new("Lift", 4.0);
    data.spawnables.push(SpawnableDesc::new(SPAWNED, "Box"));
    for id in [SPAWNED, HERO] {
        data.tracks.push(PropertyTrack {
            binding: id,
            property: "height".into(),
            keys: vec![
                Key {
                    time: 0.0,
                    value: 0.0,
                    interp: Interp::Linear,
                },
                Key {
                    time: 4.0,
                    value: 8.0,
                    interp: Interp::Linear,
                },
            ],
        });
    }
    data
}

/// it should resolve through the binding map only when evaluated before refresh
#[test]
fn evaluate_before_refresh_uses_bindings_only() {
    let (mut w, hero) = world();
    let mut bindings = BindingMap::new();
    bindings.create_binding(HERO, hero, &w).unwrap();
    let spawns = SpawnRegistry::default();

    let mut inst = SequenceInstance::new(ContextId(0), Arc::new(lift_sequence()));
    assert_eq!(inst.state(), InstanceState::Idle);

    inst.evaluate(
        TimeRange::new(0.0, 1.0),
        PlaybackStatus::Playing,
        &bindings,
        &spawns,
        &mut w,
    );
    assert_eq!(inst.state(), InstanceState::Active);
    assert_eq!(inst.time(), 1.0);
    assert_eq!(w.property(hero, "height"), Some(2.0));
    assert_eq!(w.count_of_class("Box"), 0);
    assert!(inst.runtime_objects(SPAWNED, &bindings, &spawns, &w).is_empty());
}

/// it should prefer the spawned object, then bound objects, then nothing
#[test]
fn runtime_objects_resolution_order() {
    let (mut w, hero) = world();
    let mut bindings = BindingMap::new();
    // Also bind the spawnable slot to an existing actor.
    bindings.create_binding(SPAWNED, hero, &w).unwrap();
    let mut spawns = SpawnRegistry::default();
    let mut inst = SequenceInstance::new(ContextId(0), Arc::new(lift_sequence()));

    inst.refresh(&mut spawns, &mut w).unwrap();
    let spawned = spawns.spawned(ContextId(0))[0].handle;
    assert_eq!(
        inst.runtime_objects(SPAWNED, &bindings, &spawns, &w),
        vec![spawned]
    );

    spawns.destroy_all(ContextId(0), &mut w);
    assert_eq!(
        inst.runtime_objects(SPAWNED, &bindings, &spawns, &w),
        vec![hero]
    );

    bindings.remove_binding(SPAWNED);
    assert!(inst
        .runtime_objects(SPAWNED, &bindings, &spawns, &w)
        .is_empty());
}

/// it should animate spawned objects once refreshed
#[test]
fn refresh_then_evaluate_drives_spawned_objects() {
    let (mut w, hero) = world();
    let mut bindings = BindingMap::new();
    bindings.create_binding(HERO, hero, &w).unwrap();
    let mut spawns = SpawnRegistry::default();
    let mut inst = SequenceInstance::new(ContextId(0), Arc::new(lift_sequence()));

    let report = inst.refresh(&mut spawns, &mut w).unwrap();
    assert_eq!(report.spawned.len(), 1);
    let spawned = report.spawned[0].handle;

    inst.evaluate(
        TimeRange::new(0.0, 2.0),
        PlaybackStatus::Playing,
        &bindings,
        &spawns,
        &mut w,
    );
    assert_eq!(w.property(spawned, "height"), Some(4.0));
    assert_eq!(w.property(hero, "height"), Some(4.0));

    // Refreshing again replaces the spawned object rather than adding one.
    inst.refresh(&mut spawns, &mut w).unwrap();
    assert_eq!(w.count_of_class("Box"), 1);
    assert!(!w.is_alive(spawned));
}

/// it should make refresh a cheap no-op for assets without spawnables
#[test]
fn refresh_without_spawnables_spawns_nothing() {
    let (mut w, _hero) = world();
    let before = w.len();
    let mut spawns = SpawnRegistry::default();
    let asset = Arc::new(RecordingAsset::new(Vec::new(), HERO));
    let mut inst = SequenceInstance::new(ContextId(0), asset);

    let report = inst.refresh(&mut spawns, &mut w).unwrap();
    assert!(report.spawned.is_empty() && report.failures.is_empty());
    assert_eq!(inst.state(), InstanceState::Active);
    assert_eq!(w.len(), before);
}

/// it should pass the range, status and resolved objects to the asset
#[test]
fn asset_sees_resolver_view() {
    let (mut w, _hero) = world();
    let bindings = BindingMap::new();
    let mut spawns = SpawnRegistry::default();
    let asset = Arc::new(RecordingAsset::new(
        vec![SpawnableDesc::new(SPAWNED, "Box")],
        SPAWNED,
    ));
    let mut inst = SequenceInstance::new(ContextId(4), asset.clone());

    inst.evaluate(
        TimeRange::at(0.0),
        PlaybackStatus::Paused,
        &bindings,
        &spawns,
        &mut w,
    );
    inst.refresh(&mut spawns, &mut w).unwrap();
    inst.evaluate(
        TimeRange::new(0.0, 0.5),
        PlaybackStatus::Playing,
        &bindings,
        &spawns,
        &mut w,
    );

    let seen = asset.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, TimeRange::at(0.0));
    assert_eq!(seen[0].1, PlaybackStatus::Paused);
    assert!(seen[0].2.is_empty());
    assert_eq!(seen[1].1, PlaybackStatus::Playing);
    assert_eq!(seen[1].2, vec![spawns.spawned(ContextId(4))[0].handle]);
}

/// it should become terminal after teardown and ignore further calls
#[test]
fn teardown_is_terminal() {
    let (mut w, hero) = world();
    let mut bindings = BindingMap::new();
    bindings.create_binding(HERO, hero, &w).unwrap();
    let mut spawns = SpawnRegistry::default();
    let mut inst = SequenceInstance::new(ContextId(0), Arc::new(lift_sequence()));

    inst.refresh(&mut spawns, &mut w).unwrap();
    assert_eq!(inst.tear_down(&mut spawns, &mut w).len(), 1);
    assert_eq!(inst.state(), InstanceState::TornDown);
    assert_eq!(w.count_of_class("Box"), 0);
    assert!(spawns.is_empty());

    // Double teardown, refresh and evaluate are all harmless.
    assert!(inst.tear_down(&mut spawns, &mut w).is_empty());
    assert!(inst.refresh(&mut spawns, &mut w).is_none());
    inst.evaluate(
        TimeRange::new(0.0, 4.0),
        PlaybackStatus::Playing,
        &bindings,
        &spawns,
        &mut w,
    );
    assert_eq!(w.property(hero, "height"), None);
    assert_eq!(w.count_of_class("Box"), 0);
}
