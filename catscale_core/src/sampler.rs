//! The sampling loop that drives the filter cascade.
//!
//! Runs on its own thread and exclusively owns the scale, the cascade, and
//! the optional tare stage; there is no locking anywhere in the signal path.
//! Pacing targets the nominal period, but every cascade call receives the
//! actually measured elapsed time so timers do not drift under jitter.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use catscale_traits::{Clock, Scale, WallClock};

use crate::cascade::FilterCascade;
use crate::queue::QueueSender;
use crate::tare::AutoTare;

pub struct SamplingLoop<S, C, W> {
    pub scale: S,
    pub cascade: FilterCascade,
    pub tare: Option<AutoTare>,
    pub sender: QueueSender,
    pub clock: C,
    pub wall: W,
    pub period: Duration,
    pub read_timeout: Duration,
    pub shutdown: Arc<AtomicBool>,
}

impl<S: Scale, C: Clock, W: WallClock> SamplingLoop<S, C, W> {
    pub fn run(mut self) {
        let mut prev = self.clock.now();
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            match self.scale.read(self.read_timeout) {
                Ok(raw) => {
                    let tick = self.clock.now();
                    let dt = tick.saturating_duration_since(prev).as_secs_f64();
                    prev = tick;

                    let raw = match self.tare.as_mut() {
                        Some(tare) => tare.apply(raw, self.cascade.is_active()),
                        None => raw,
                    };

                    let step = self.cascade.process(raw, dt, self.wall.now_utc());
                    tracing::trace!(weight = step.weight, "sample processed");
                    for notification in step.notifications {
                        self.sender.push(notification);
                    }
                }
                Err(e) => {
                    // Skipped tick; the elapsed time keeps accumulating and
                    // is charged to the next successful sample.
                    tracing::debug!(error = %e, "sample read failed, tick skipped");
                }
            }

            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }
            self.clock.sleep(self.period);
        }
        tracing::trace!("sampling loop exiting");
    }
}
