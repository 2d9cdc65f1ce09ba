//! Persistence tests: one run's output becomes the next run's input

use crate::common::*;

#[test]
fn column_file_round_trips_a_processing_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.blm");

    fixture_source(3).save(&path).unwrap();

    let mut bus = EventBus::new("reco");
    bus.attach(Box::new(ColumnStore::open(&path).unwrap()));

    let mut seen = 0i64;
    while bus.advance().unwrap() {
        seen += 1;
        // the header is eagerly available after a successful advance
        assert_eq!(bus.event_number(), seen);
        assert_eq!(bus.event_header().run, 1);

        let hits = bus.fetch_sequence("Hits", "sim").unwrap();
        assert_eq!(hits.len(), seen as usize);

        bus.reset_cycle();
    }
    assert_eq!(seen, 3);

    // past the end the cursor stays put and advance keeps reporting false
    assert!(!bus.advance().unwrap());
}

#[test]
fn produced_output_is_readable_through_the_detached_store() {
    init_tracing();
    let mut bus = EventBus::new("sim");
    bus.add_drop_rule("^Tmp").unwrap();
    bus.attach(Box::new(ColumnStore::new()));

    for event in 1..=2i64 {
        *bus.event_header_mut() = header_for_event(event);
        bus.publish_default("Hits", hits_for_event(event)).unwrap();
        bus.publish_default("TmpScratch", hits_for_event(event))
            .unwrap();
        bus.write_cycle().unwrap();
        bus.reset_cycle();
    }

    let store = bus.detach().unwrap();
    assert_eq!(store.entry_count(), 2);

    let hits_key = StorageKey::new("Hits", "sim");
    for entry in 0..2u64 {
        let passenger = store.read_entry(&hits_key, entry).unwrap();
        assert_eq!(passenger.as_sequence().unwrap().len(), entry as usize + 1);

        let header = store.read_entry(&StorageKey::header(), entry).unwrap();
        let header = EventHeader::from_passenger(&header).unwrap();
        assert_eq!(header.event_number, entry as i64 + 1);
    }

    // the dropped key was retained in memory during the run but never
    // wired to durable output
    assert!(store
        .read_entry(&StorageKey::new("TmpScratch", "sim"), 0)
        .is_err());
}

#[test]
fn switching_sources_requires_detach_and_rebuilds_the_catalog() {
    init_tracing();
    let mut bus = EventBus::new("reco");

    bus.attach(Box::new(fixture_source(1)));
    assert!(bus.advance().unwrap());
    assert!(bus.exists("Hits", "sim"));

    bus.detach();

    // a different source with a different product set
    let mut other = ColumnStore::new();
    let header_key = StorageKey::header();
    let tracks_key = StorageKey::new("Tracks", "sim");
    other
        .write_entry(&[
            (&header_key, &header_for_event(1).to_passenger()),
            (&tracks_key, &hits_for_event(1)),
        ])
        .unwrap();
    bus.attach(Box::new(other));

    assert!(bus.exists("Tracks", "sim"));
    assert!(!bus.exists("Hits", "sim"));

    assert!(bus.advance().unwrap());
    assert_eq!(bus.fetch_sequence("Tracks", "").unwrap().len(), 1);
}
