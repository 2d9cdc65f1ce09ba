//! Produce/analyze pipeline tests
//!
//! Drives the bus the way a run driver does: a producer stage publishes,
//! an analyzer stage fetches, one cycle per event.

use crate::common::*;

#[test]
fn produce_analyze_loop_into_an_event_library() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.lib");

    let mut bus = EventBus::new("test");
    bus.add_drop_rule("Scoring.*").unwrap();
    bus.attach(Box::new(LibraryWriter::create(&path).unwrap()));

    for event in 1..=4i64 {
        // a write-only sink puts the bus in generation mode
        assert!(bus.advance().unwrap());
        *bus.event_header_mut() = header_for_event(event);

        // producer stage
        bus.publish_default("Hits", hits_for_event(event)).unwrap();
        bus.publish_default("Veto", Passenger::Single(Value::Bool(event % 2 == 0)))
            .unwrap();
        bus.publish_default("ScoringPlaneHits", hits_for_event(event))
            .unwrap();

        // analyzer stage, fetching without a pass name
        let hits = bus.fetch_sequence("Hits", "").unwrap();
        assert_eq!(hits.len(), event as usize);
        for (i, hit) in hits.iter().enumerate() {
            let record = hit.as_record().unwrap();
            assert_eq!(record["id"], Value::Int(event * 10 + i as i64));
        }
        let veto = bus.fetch_single("Veto", "").unwrap();
        assert_eq!(veto, &Value::Bool(event % 2 == 0));

        // the dropped collection is still on the bus for this stage
        assert_eq!(
            bus.fetch_sequence("ScoringPlaneHits", "").unwrap().len(),
            event as usize
        );

        bus.write_cycle().unwrap();
        bus.reset_cycle();
    }
    bus.detach();

    let records = read_library(&path).unwrap();
    assert_eq!(records.len(), 4);
    for (index, record) in records.iter().enumerate() {
        let branches: Vec<&str> = record.iter().map(|(name, _)| name.as_str()).collect();
        assert!(branches.contains(&"EventHeader"));
        assert!(branches.contains(&"Hits_test"));
        assert!(branches.contains(&"Veto_test"));
        // dropped key never reaches durable output
        assert!(!branches.iter().any(|b| b.starts_with("ScoringPlaneHits")));

        let header = record
            .iter()
            .find(|(name, _)| name == "EventHeader")
            .map(|(_, p)| EventHeader::from_passenger(p).unwrap())
            .unwrap();
        assert_eq!(header.event_number, index as i64 + 1);
    }
}

#[test]
fn later_stage_cannot_overwrite_an_earlier_product() {
    init_tracing();
    let mut bus = EventBus::new("test");
    bus.attach(Box::new(fixture_source(2)));

    assert!(bus.advance().unwrap());
    bus.publish_default("Clusters", hits_for_event(1)).unwrap();

    // a second stage producing the same key in the same cycle is a bug
    let err = bus
        .publish_default("Clusters", hits_for_event(1))
        .unwrap_err();
    assert!(matches!(err, Error::ProductExists { .. }));

    // the next cycle starts clean
    assert!(bus.advance().unwrap());
    bus.reset_cycle();
    bus.publish_default("Clusters", hits_for_event(2)).unwrap();
}

#[test]
fn multi_pass_products_need_explicit_disambiguation() {
    init_tracing();
    let mut bus = EventBus::new("reco");
    bus.attach(Box::new(fixture_source(1)));
    assert!(bus.advance().unwrap());

    // unique across passes: bare fetch works
    assert_eq!(bus.fetch_sequence("Hits", "").unwrap().len(), 1);

    // reprocessing publishes Hits under its own pass
    bus.publish_default("Hits", hits_for_event(5)).unwrap();

    let err = bus.fetch("Hits", "").unwrap_err();
    match err {
        Error::ProductAmbiguous { passes, .. } => {
            assert!(passes.contains(&"sim".to_string()));
            assert!(passes.contains(&"reco".to_string()));
        }
        other => panic!("expected ProductAmbiguous, got {other:?}"),
    }

    // explicit passes still resolve
    assert_eq!(bus.fetch_sequence("Hits", "sim").unwrap().len(), 1);
    assert_eq!(bus.fetch_sequence("Hits", "reco").unwrap().len(), 5);

    // exists follows the same rule without raising
    assert!(!bus.exists("Hits", ""));
    assert!(bus.exists("Hits", "sim"));
    assert!(bus.exists("Hits", "reco"));
}

#[test]
fn catalog_discovery_across_a_run() {
    init_tracing();
    let mut bus = EventBus::new("reco");
    bus.attach(Box::new(fixture_source(1)));
    assert!(bus.advance().unwrap());
    bus.publish_default("Clusters", hits_for_event(1)).unwrap();

    // every product of the source plus the new one
    let all = bus.search_products("", "", "").unwrap();
    assert_eq!(all.len(), 3);

    let reco_only = bus.search_products("", "^reco$", "").unwrap();
    assert_eq!(reco_only.len(), 1);
    assert_eq!(reco_only[0].collection(), "Clusters");

    assert!(bus.search_products("(", "", "").is_err());
}
