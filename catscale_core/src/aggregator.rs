//! Materializes the notification stream into `ScaleEvent` records.
//!
//! Single consumer, processing notifications strictly in arrival order. At
//! most one event is open at a time; a fresh start while one is open discards
//! the stale record, which protects against a lost end-of-event upstream.

use catscale_config::AggregatorCfg;
use catscale_traits::PublishSink;
use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;

use crate::error::CoreError;
use crate::event::{EventNotification, ScaleEvent, StablePhase};

/// Serialized-size allowance per record plus per stable phase. Generous for
/// the fixed field layout; the overflow check below is the hard backstop.
const RECORD_OVERHEAD_BYTES: usize = 128;
const PHASE_BYTES: usize = 128;

struct OpenEvent {
    start_time: DateTime<Utc>,
    phases: Vec<StablePhase>,
}

pub struct EventAggregator<K: PublishSink> {
    sink: K,
    topic: String,
    output_limit: usize,
    open: Option<OpenEvent>,
}

impl<K: PublishSink> EventAggregator<K> {
    pub fn new(sink: K, cfg: &AggregatorCfg) -> Self {
        Self {
            sink,
            topic: cfg.topic.clone(),
            output_limit: RECORD_OVERHEAD_BYTES + PHASE_BYTES * cfg.max_stable_phases,
            open: None,
        }
    }

    /// Consume notifications until every sender is gone.
    pub fn run(&mut self, rx: &Receiver<EventNotification>) {
        for notification in rx.iter() {
            self.handle(notification);
        }
        if self.open.is_some() {
            tracing::warn!("aggregator shutting down with an unfinished event");
        }
    }

    /// Apply a single notification to the in-flight record.
    pub fn handle(&mut self, notification: EventNotification) {
        match notification {
            EventNotification::StartOfEvent { timestamp } => {
                if self.open.is_some() {
                    tracing::warn!("new event started while one was open, discarding stale event");
                }
                self.open = Some(OpenEvent {
                    start_time: timestamp,
                    phases: Vec::new(),
                });
            }
            EventNotification::StablePhase {
                timestamp,
                length,
                value,
            } => match self.open.as_mut() {
                Some(event) => event.phases.push(StablePhase {
                    timestamp,
                    length,
                    value,
                }),
                None => {
                    tracing::warn!(length, value, "stable phase with no open event, dropped");
                }
            },
            EventNotification::EndOfEvent { timestamp } => match self.open.take() {
                Some(event) => self.finalize(event, timestamp),
                None => {
                    tracing::warn!("end of event with no open event, dropped");
                }
            },
        }
    }

    fn finalize(&mut self, event: OpenEvent, end_time: DateTime<Utc>) {
        let record = ScaleEvent {
            start_time: event.start_time,
            end_time,
            stable_phases: event.phases,
        };

        let payload = match record.to_json(self.output_limit) {
            Ok(bytes) => bytes,
            Err(CoreError::SerializationOverflow { limit, actual }) => {
                tracing::error!(limit, actual, "event record too large, not published");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "event record serialization failed");
                return;
            }
        };

        if !self.sink.ready() {
            tracing::warn!("publish sink not ready, event record lost");
            return;
        }
        match self.sink.publish(&self.topic, &payload) {
            Ok(()) => {
                tracing::info!(
                    topic = %self.topic,
                    phases = record.stable_phases.len(),
                    "event record published"
                );
            }
            Err(e) => {
                // No retry and no buffering; event detection is unaffected.
                tracing::error!(error = %e, "publish failed, event record lost");
            }
        }
    }
}
