use vizij_sequence_core::{
    BindingId, BindingMap, BindingRecord, EntityKind, SequenceError, SimpleWorld, World, WorldId,
};

const DOOR: BindingId = BindingId::from_u128(0xb2);
const HINGE: BindingId = BindingId::from_u128(0xb3);

fn courtyard(id: u32) -> SimpleWorld {
    let mut w = SimpleWorld::new(WorldId(id));
    w.register_class("Material", EntityKind::Other);
    w
}

/// it should resolve an actor binding through the cached handle
#[test]
fn actor_binding_resolves_in_same_world() {
    let mut world = courtyard(0);
    let door = world.add_actor("Door", "DoorActor");

    let mut map = BindingMap::new();
    assert!(!map.has_binding(DOOR));
    map.create_binding(DOOR, door, &world).unwrap();

    assert!(map.has_binding(DOOR));
    assert_eq!(map.resolve_binding(DOOR, &world), Some(door));
    assert_eq!(map.resolve_all(DOOR, &world), vec![door]);
}

/// it should store components as owner path plus tag and resolve back to the component
#[test]
fn component_binding_is_tagged_with_component_name() {
    let mut world = courtyard(0);
    let door = world.add_actor("Door", "DoorActor");
    let hinge = world.add_component(door, "Hinge").unwrap();

    let mut map = BindingMap::new();
    map.create_binding(HINGE, hinge, &world).unwrap();

    let records = map.to_records();
    assert_eq!(
        records,
        vec![BindingRecord {
            id: HINGE,
            path: "PersistentLevel.Door".into(),
            tag: Some("Hinge".into()),
        }]
    );
    assert_eq!(map.resolve_binding(HINGE, &world), Some(hinge));
}

/// it should reject unsupported and missing objects without recording anything
#[test]
fn unsupported_objects_are_not_bound() {
    let mut world = courtyard(0);
    let material = world.add_object("M_Wood", "Material");
    let door = world.add_actor("Door", "DoorActor");
    world.remove(door);

    let mut map = BindingMap::new();
    let err = map.create_binding(DOOR, material, &world).unwrap_err();
    assert_eq!(err, SequenceError::UnsupportedObject { handle: material });
    let err = map.create_binding(DOOR, door, &world).unwrap_err();
    assert_eq!(err, SequenceError::ObjectGone { handle: door });

    assert!(!map.has_binding(DOOR));
    assert!(map.is_empty());
    assert_eq!(map.resolve_binding(DOOR, &world), None);
}

/// it should skip stale references instead of returning dead handles
#[test]
fn stale_references_are_skipped() {
    let mut world = courtyard(0);
    let door = world.add_actor("Door", "DoorActor");
    let lamp = world.add_actor("Lamp", "LampActor");

    let mut map = BindingMap::new();
    map.create_binding(DOOR, door, &world).unwrap();
    map.create_binding(DOOR, lamp, &world).unwrap();
    assert_eq!(map.resolve_all(DOOR, &world), vec![door, lamp]);

    world.remove(door);
    assert_eq!(map.resolve_all(DOOR, &world), vec![lamp]);
    assert_eq!(map.resolve_binding(DOOR, &world), Some(lamp));

    world.remove(lamp);
    assert!(map.resolve_all(DOOR, &world).is_empty());
    assert_eq!(map.resolve_binding(DOOR, &world), None);
    // Still has references; they just resolve to nothing right now.
    assert!(map.has_binding(DOOR));
}

/// it should fall back to the stable path when played in another world
#[test]
fn path_fallback_remaps_into_a_new_world() {
    let mut editor = courtyard(0);
    let door = editor.add_actor("Door", "DoorActor");
    editor.add_component(door, "Hinge").unwrap();
    let hinge = editor.find_component(door, "Hinge").unwrap();

    let mut map = BindingMap::new();
    map.create_binding(DOOR, door, &editor).unwrap();
    map.create_binding(HINGE, hinge, &editor).unwrap();

    // Same level loaded into a play session: different handles, same paths.
    let mut session = courtyard(1);
    session.add_actor("Lamp", "LampActor");
    session.add_actor("Filler", "LampActor");
    let session_door = session.add_actor("Door", "DoorActor");
    let session_hinge = session.add_component(session_door, "Hinge").unwrap();
    assert_ne!(session_door, door);

    assert_eq!(map.resolve_binding(DOOR, &session), Some(session_door));
    assert_eq!(map.resolve_binding(HINGE, &session), Some(session_hinge));
    // The original world still resolves through the cache.
    assert_eq!(map.resolve_binding(DOOR, &editor), Some(door));
}

/// it should find the binding id for a bound object and nothing for strangers
#[test]
fn reverse_lookup_finds_binding_id() {
    let mut world = courtyard(0);
    let door = world.add_actor("Door", "DoorActor");
    let hinge = world.add_component(door, "Hinge").unwrap();
    let lamp = world.add_actor("Lamp", "LampActor");

    let mut map = BindingMap::new();
    map.create_binding(DOOR, door, &world).unwrap();
    map.create_binding(HINGE, hinge, &world).unwrap();

    assert_eq!(map.find_binding_id(door, &world), Some(DOOR));
    assert_eq!(map.find_binding_id(hinge, &world), Some(HINGE));
    assert_eq!(map.find_binding_id(lamp, &world), None);
}

/// it should treat removal of an absent binding as a no-op
#[test]
fn remove_binding_is_idempotent() {
    let mut world = courtyard(0);
    let door = world.add_actor("Door", "DoorActor");
    let mut map = BindingMap::new();
    map.create_binding(DOOR, door, &world).unwrap();

    assert!(map.remove_binding(DOOR));
    assert!(!map.remove_binding(DOOR));
    assert!(!map.remove_binding(HINGE));
    assert!(!map.has_binding(DOOR));
}

/// it should not duplicate references when the same object is bound twice
#[test]
fn binding_same_object_twice_keeps_one_reference() {
    let mut world = courtyard(0);
    let door = world.add_actor("Door", "DoorActor");
    let mut map = BindingMap::new();
    map.create_binding(DOOR, door, &world).unwrap();
    map.create_binding(DOOR, door, &world).unwrap();
    assert_eq!(map.entry(DOOR).unwrap().refs.len(), 1);
}

/// it should persist as (id, path, tag) records and as JSON, resolving by path afterwards
#[test]
fn records_and_json_persist_paths_only() {
    let mut world = courtyard(0);
    let door = world.add_actor("Door", "DoorActor");
    let hinge = world.add_component(door, "Hinge").unwrap();

    let mut map = BindingMap::new();
    map.create_binding(DOOR, door, &world).unwrap();
    map.create_binding(HINGE, hinge, &world).unwrap();

    let restored = BindingMap::from_records(map.to_records());
    assert_eq!(restored.resolve_binding(DOOR, &world), Some(door));
    assert_eq!(restored.resolve_binding(HINGE, &world), Some(hinge));

    let json = serde_json::to_string(&map).unwrap();
    assert!(!json.contains("cached"));
    let back: BindingMap = serde_json::from_str(&json).unwrap();
    assert_eq!(back.to_records(), map.to_records());
    assert_eq!(back.resolve_binding(HINGE, &world), Some(hinge));
}
