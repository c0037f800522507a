//! Aggregator behavior: materializing notifications into published records.

use catscale_config::AggregatorCfg;
use catscale_core::EventAggregator;
use catscale_core::event::EventNotification;
use catscale_core::mocks::{FailingSink, MemorySink, OfflineSink};
use chrono::{DateTime, TimeZone, Utc};

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn start(secs: i64) -> EventNotification {
    EventNotification::StartOfEvent {
        timestamp: ts(secs),
    }
}

fn stable(secs: i64, length: f64, value: f64) -> EventNotification {
    EventNotification::StablePhase {
        timestamp: ts(secs),
        length,
        value,
    }
}

fn end(secs: i64) -> EventNotification {
    EventNotification::EndOfEvent {
        timestamp: ts(secs),
    }
}

fn aggregator(sink: MemorySink) -> EventAggregator<MemorySink> {
    EventAggregator::new(sink, &AggregatorCfg::default())
}

#[test]
fn complete_sequence_publishes_one_record() {
    let sink = MemorySink::new();
    let mut agg = aggregator(sink.clone());
    for n in [
        start(0),
        stable(10, 5.0, 120.0),
        stable(20, 3.0, 125.0),
        end(30),
    ] {
        agg.handle(n);
    }

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let (topic, payload) = &records[0];
    assert_eq!(topic, "ScaleEvent");

    let json: serde_json::Value = serde_json::from_slice(payload).unwrap();
    let phases = json["stablePhases"].as_array().unwrap();
    assert_eq!(phases.len(), 2);
    assert_eq!(phases[0]["value"], 120.0);
    assert_eq!(phases[1]["value"], 125.0);
    assert_eq!(json["startTime"], "2023-11-14T22:13:20.000Z");
    assert_eq!(json["endTime"], "2023-11-14T22:13:50.000Z");
}

#[test]
fn orphan_stable_phase_is_dropped() {
    let sink = MemorySink::new();
    let mut agg = aggregator(sink.clone());
    agg.handle(stable(0, 5.0, 99.0));
    agg.handle(start(10));
    agg.handle(end(20));

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let json: serde_json::Value = serde_json::from_slice(&records[0].1).unwrap();
    // The phase seen before the start must not leak into the fresh event.
    assert_eq!(json["stablePhases"].as_array().unwrap().len(), 0);
}

#[test]
fn restart_discards_the_open_event() {
    let sink = MemorySink::new();
    let mut agg = aggregator(sink.clone());
    agg.handle(start(0));
    agg.handle(stable(5, 4.0, 300.0));
    agg.handle(start(10)); // the earlier event's end was lost
    agg.handle(end(20));

    let records = sink.records();
    assert_eq!(records.len(), 1, "the stale event must not be reported");
    let json: serde_json::Value = serde_json::from_slice(&records[0].1).unwrap();
    assert_eq!(json["startTime"], "2023-11-14T22:13:30.000Z");
    assert_eq!(json["stablePhases"].as_array().unwrap().len(), 0);
}

#[test]
fn end_without_start_is_dropped() {
    let sink = MemorySink::new();
    let mut agg = aggregator(sink.clone());
    agg.handle(end(0));
    assert!(sink.records().is_empty());
}

#[test]
fn replay_yields_byte_identical_output() {
    let sequence = [
        start(0),
        stable(10, 5.0, 120.0),
        stable(20, 3.0, 125.0),
        end(30),
    ];

    let sink_a = MemorySink::new();
    let mut a = aggregator(sink_a.clone());
    let sink_b = MemorySink::new();
    let mut b = aggregator(sink_b.clone());
    for n in &sequence {
        a.handle(n.clone());
        b.handle(n.clone());
    }
    assert_eq!(sink_a.records(), sink_b.records());
}

#[test]
fn oversized_record_is_dropped_not_truncated() {
    let sink = MemorySink::new();
    let cfg = AggregatorCfg {
        max_stable_phases: 1,
        ..AggregatorCfg::default()
    };
    let mut agg = EventAggregator::new(sink.clone(), &cfg);

    agg.handle(start(0));
    for i in 0..10 {
        agg.handle(stable(i, 2.0, 100.0 + i as f64));
    }
    agg.handle(end(60));
    assert!(
        sink.records().is_empty(),
        "a record over the size limit must not be published"
    );

    // The next event is unaffected.
    agg.handle(start(100));
    agg.handle(end(110));
    assert_eq!(sink.records().len(), 1);
}

#[test]
fn publish_failure_does_not_poison_the_aggregator() {
    let mut agg = EventAggregator::new(FailingSink, &AggregatorCfg::default());
    agg.handle(start(0));
    agg.handle(end(10));
    // Second event goes through the same (still failing) path cleanly.
    agg.handle(start(20));
    agg.handle(stable(25, 3.0, 50.0));
    agg.handle(end(30));
}

#[test]
fn offline_sink_drops_the_record() {
    let mut agg = EventAggregator::new(OfflineSink, &AggregatorCfg::default());
    agg.handle(start(0));
    agg.handle(end(10));
    // Nothing to observe but the absence of a panic; ready() short-circuits
    // before publish.
}
