//! Bounded notification queue between the sampling loop and the aggregator.
//!
//! Capacity should be generous enough that a slow publish never drops
//! notifications belonging to the same event. When the queue does fill, the
//! producer discards the oldest unconsumed notification (with a warning) and
//! enqueues the new one; losing the newest would corrupt the aggregator's
//! in-flight record more often than losing the oldest.

use crossbeam_channel as xch;

use crate::event::EventNotification;

/// Producer half. Holds a receiver clone so it can evict the oldest entry
/// on overflow.
pub struct QueueSender {
    tx: xch::Sender<EventNotification>,
    evict_rx: xch::Receiver<EventNotification>,
}

impl QueueSender {
    /// Best-effort enqueue; never blocks the sampling loop.
    pub fn push(&self, notification: EventNotification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(xch::TrySendError::Full(notification)) => {
                if self.evict_rx.try_recv().is_ok() {
                    tracing::warn!("notification queue full, dropped oldest entry");
                }
                if self.tx.try_send(notification).is_err() {
                    tracing::warn!("notification queue still full, dropped entry");
                }
            }
            Err(xch::TrySendError::Disconnected(_)) => {
                tracing::debug!("notification consumer gone, dropping entry");
            }
        }
    }
}

/// Create a bounded queue of the given capacity.
pub fn bounded(capacity: usize) -> (QueueSender, xch::Receiver<EventNotification>) {
    let (tx, rx) = xch::bounded(capacity.max(1));
    (
        QueueSender {
            tx,
            evict_rx: rx.clone(),
        },
        rx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn start(secs: i64) -> EventNotification {
        EventNotification::StartOfEvent {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn preserves_fifo_order() {
        let (tx, rx) = bounded(8);
        for i in 0..5 {
            tx.push(start(i));
        }
        for i in 0..5 {
            assert_eq!(rx.recv().unwrap(), start(i));
        }
    }

    #[test]
    fn overflow_drops_oldest_entry() {
        let (tx, rx) = bounded(2);
        tx.push(start(0));
        tx.push(start(1));
        tx.push(start(2)); // evicts start(0)
        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(got, vec![start(1), start(2)]);
    }

    #[test]
    fn push_after_consumer_drop_is_silent() {
        let (tx, rx) = bounded(2);
        drop(rx);
        tx.push(start(0)); // must not panic
    }
}
