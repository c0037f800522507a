//! The filter cascade and its hold-switch state machine.
//!
//! One cascade instance conditions one weight channel. Every call to
//! [`FilterCascade::process`] consumes a raw sample plus the measured elapsed
//! time and returns the conditioned weight together with any event
//! notifications raised by this sample. The cascade never touches a channel
//! itself; delivery is the caller's concern.

use chrono::{DateTime, Utc};

use catscale_config::{Config, DetectionCfg, FilterCfg};

use crate::error::Result;
use crate::event::EventNotification;
use crate::filters::{Differentiator, HighPassFilter, LowPassFilter, MeanFilter, MedianFilter};
use crate::history::History;

/// Slots in the high-pass offset history. The oldest slot is frozen as the
/// hold offset at event start, so the captured offset predates the transient
/// that triggered the event.
const OFFSET_HISTORY_SLOTS: usize = 10;

#[derive(Debug, Clone)]
pub struct CascadeConfig {
    pub filter: FilterCfg,
    pub detection: DetectionCfg,
    /// Grams per raw sensor unit (inverse of the calibration factor)
    pub grams_per_unit: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            filter: FilterCfg::default(),
            detection: DetectionCfg::default(),
            grams_per_unit: 1.0 / 23.0,
        }
    }
}

impl CascadeConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            filter: cfg.filter,
            detection: cfg.detection,
            grams_per_unit: 1.0 / cfg.calibration.units_per_gram(),
        }
    }
}

/// Result of one cascade step.
#[derive(Debug)]
pub struct CascadeStep {
    /// Conditioned weight in grams
    pub weight: f64,
    /// Notifications raised by this sample, in emission order
    pub notifications: Vec<EventNotification>,
}

/// Two-state hysteresis switch bracketing an event.
///
/// Idle -> Active on a trigger edge; Active -> Idle when the deactivation
/// timer runs out or the stable accumulator exceeds its hold timeout.
#[derive(Debug)]
struct HoldSwitch {
    active: bool,
    /// High-pass offset frozen at event start; replaces the high-pass stage
    /// while active so drift correction cannot fight a genuine weight change
    offset: f64,
    deactivation_timer: f64,
}

/// Accumulates stable samples between flushes. Elapsed time always advances
/// by dt; the sample list is count-capped and drops (not evicts) overflow.
#[derive(Debug)]
struct StablePhaseAccumulator {
    elapsed: f64,
    values: Vec<f64>,
    max_samples: usize,
    dropped: usize,
}

impl StablePhaseAccumulator {
    fn new(max_samples: usize) -> Self {
        Self {
            elapsed: 0.0,
            values: Vec::with_capacity(max_samples.min(1024)),
            max_samples,
            dropped: 0,
        }
    }

    fn accumulate(&mut self, value: f64, dt: f64) {
        self.elapsed += dt;
        if self.values.len() < self.max_samples {
            self.values.push(value);
        } else {
            self.dropped += 1;
        }
    }

    /// Mean over the captured samples only.
    fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().sum();
        Some(sum / self.values.len() as f64)
    }

    fn clear(&mut self) {
        self.elapsed = 0.0;
        self.values.clear();
        self.dropped = 0;
    }
}

pub struct FilterCascade {
    hpf: HighPassFilter,
    lpf: LowPassFilter,
    mean: MeanFilter,
    median: MedianFilter,
    dxdt: Differentiator,
    offset_history: History,
    hold: HoldSwitch,
    stable: StablePhaseAccumulator,
    detection: DetectionCfg,
    grams_per_unit: f64,
}

impl FilterCascade {
    pub fn new(cfg: &CascadeConfig) -> Result<Self> {
        let f = &cfg.filter;
        Ok(Self {
            hpf: HighPassFilter::new(f.sampling_frequency_hz, f.hpf_cutoff_hz),
            lpf: LowPassFilter::new(f.sampling_frequency_hz, f.lpf_cutoff_hz),
            mean: MeanFilter::new(f.mean_window)?,
            median: MedianFilter::new(f.median_window)?,
            dxdt: Differentiator::new(f.sampling_frequency_hz),
            offset_history: History::new(OFFSET_HISTORY_SLOTS),
            hold: HoldSwitch {
                active: false,
                offset: 0.0,
                deactivation_timer: 0.0,
            },
            stable: StablePhaseAccumulator::new(cfg.detection.stable_max_samples),
            detection: cfg.detection,
            grams_per_unit: cfg.grams_per_unit,
        })
    }

    /// Whether an event is currently in progress.
    pub fn is_active(&self) -> bool {
        self.hold.active
    }

    /// Flag every filter stage for reset so the next sample reseeds state.
    pub fn reset_all(&mut self) {
        self.hpf.reset();
        self.lpf.reset();
        self.mean.reset();
        self.median.reset();
        self.dxdt.reset();
    }

    /// Condition one raw sample. `dt` is the measured elapsed time since the
    /// previous call in seconds; `now` stamps any notifications raised.
    pub fn process(&mut self, raw: f64, dt: f64, now: DateTime<Utc>) -> CascadeStep {
        let hpf_out = self.hpf.process(raw);
        self.offset_history.push(hpf_out - raw);

        let lpf_input = if self.hold.active {
            raw + self.hold.offset
        } else {
            hpf_out
        };
        let lpf_out = self.lpf.process(lpf_input);
        let mean_out = self.mean.process(lpf_out);
        let median_out = self.median.process(mean_out);
        let weight = median_out * self.grams_per_unit;
        let dxdt = self.dxdt.process(weight);

        let mut notifications = Vec::new();

        let signal_stable = dxdt.abs() < self.detection.dxdt_threshold;
        let hold_trigger = !signal_stable
            || weight < self.detection.weight_low_bound_g
            || weight > self.detection.weight_high_bound_g;

        if signal_stable {
            self.stable.accumulate(weight, dt);
        } else {
            self.flush_stable_phase(now, &mut notifications);
        }

        if hold_trigger {
            if !self.hold.active {
                self.hold.active = true;
                self.hold.offset = self.offset_history.oldest();
                notifications.push(EventNotification::StartOfEvent { timestamp: now });
                tracing::debug!(weight, dxdt, "start of event");
            }
            self.hold.deactivation_timer = self.detection.hold_timer_s;
        }

        if self.hold.active {
            self.hold.deactivation_timer -= dt;
            let timer_expired = self.hold.deactivation_timer <= 0.0;
            let stable_timeout = self.stable.elapsed > self.detection.max_stable_phase_s;
            if timer_expired || stable_timeout {
                self.flush_stable_phase(now, &mut notifications);
                notifications.push(EventNotification::EndOfEvent { timestamp: now });
                tracing::debug!(weight, stable_timeout, "end of event");
                self.hold.active = false;
                self.reset_all();
            }
        }

        CascadeStep {
            weight,
            notifications,
        }
    }

    /// Emit the accumulated stable phase if it qualifies, then clear the
    /// accumulator unconditionally. A phase qualifies only while an event is
    /// active, with enough accumulated time and at least one captured sample;
    /// idle baseline noise flushes silently.
    fn flush_stable_phase(&mut self, now: DateTime<Utc>, out: &mut Vec<EventNotification>) {
        if self.hold.active
            && self.stable.elapsed >= self.detection.min_stable_phase_s
            && let Some(mean) = self.stable.mean()
        {
            if self.stable.dropped > 0 {
                tracing::debug!(
                    dropped = self.stable.dropped,
                    "stable phase exceeded sample cap"
                );
            }
            out.push(EventNotification::StablePhase {
                timestamp: now,
                length: self.stable.elapsed,
                value: mean,
            });
        }
        self.stable.clear();
    }
}
