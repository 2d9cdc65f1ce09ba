//! Shared helpers for integration tests

#![allow(dead_code)]

pub use beamline::{
    read_library, BackingStore, ColumnStore, Error, EventBus, EventHeader, LibraryWriter,
    Passenger, StorageKey, Value,
};
use std::collections::BTreeMap;
use std::sync::Once;

/// Install a test-friendly tracing subscriber once per process
pub fn init_tracing() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Build a calorimeter-hit record
pub fn calo_hit(id: i64, energy: f64) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("id".to_string(), Value::Int(id));
    fields.insert("energy".to_string(), Value::Float(energy));
    Value::Record(fields)
}

/// The producer pattern used across these tests: event N carries N hits
/// with ids 10*N + index
pub fn hits_for_event(event: i64) -> Passenger {
    let hits = (0..event)
        .map(|i| calo_hit(event * 10 + i, 0.5 * i as f64))
        .collect();
    Passenger::Sequence(hits)
}

/// Header for event N of run 1
pub fn header_for_event(event: i64) -> EventHeader {
    EventHeader {
        event_number: event,
        run: 1,
        timestamp: 1_700_000_000 + event,
        weight: 1.0,
    }
}

/// Input fixture: `events` entries of header plus "Hits_sim"
pub fn fixture_source(events: i64) -> ColumnStore {
    let mut store = ColumnStore::new();
    let header_key = StorageKey::header();
    let hits_key = StorageKey::new("Hits", "sim");
    for event in 1..=events {
        let header = header_for_event(event).to_passenger();
        store
            .write_entry(&[(&header_key, &header), (&hits_key, &hits_for_event(event))])
            .expect("fixture write");
    }
    store
}
