//! Primitive stateful signal filters.
//!
//! Each filter owns its history and a `reset` flag. While the flag is set,
//! the next `process` call seeds all internal state from the incoming sample
//! before computing, so a restarted filter does not ramp up from zero. The
//! cascade flags every stage for reset when an event ends.
//!
//! None of these are thread-safe; each is owned exclusively by the cascade
//! that calls it sequentially.

use std::f64::consts::TAU;

use crate::error::CoreError;
use crate::history::History;

/// Arithmetic mean of the last `window_size` samples.
#[derive(Debug)]
pub struct MeanFilter {
    history: History,
    reset: bool,
}

impl MeanFilter {
    pub fn new(window_size: usize) -> Result<Self, CoreError> {
        if window_size <= 1 {
            return Err(CoreError::InvalidConfiguration(
                "mean filter window must be > 1",
            ));
        }
        Ok(Self {
            history: History::new(window_size),
            reset: true,
        })
    }

    pub fn process(&mut self, input: f64) -> f64 {
        if self.reset {
            self.reset = false;
            self.history.fill(input);
        }
        self.history.push(input);
        let sum: f64 = self.history.as_slice().iter().sum();
        sum / self.history.len() as f64
    }

    pub fn reset(&mut self) {
        self.reset = true;
    }
}

/// Median of the last `window_size` samples.
///
/// Uses the lower-median rule for even windows: the value at index
/// `(window_size - 1) / 2` of the sorted window.
#[derive(Debug)]
pub struct MedianFilter {
    history: History,
    scratch: Vec<f64>,
    reset: bool,
}

impl MedianFilter {
    pub fn new(window_size: usize) -> Result<Self, CoreError> {
        if window_size <= 1 {
            return Err(CoreError::InvalidConfiguration(
                "median filter window must be > 1",
            ));
        }
        Ok(Self {
            history: History::new(window_size),
            scratch: Vec::with_capacity(window_size),
            reset: true,
        })
    }

    pub fn process(&mut self, input: f64) -> f64 {
        if self.reset {
            self.reset = false;
            self.history.fill(input);
        }
        self.history.push(input);
        // Sort a scratch copy to avoid per-call allocation.
        self.scratch.clear();
        self.scratch.extend_from_slice(self.history.as_slice());
        self.scratch.sort_unstable_by(|a, b| a.total_cmp(b));
        self.scratch[(self.scratch.len() - 1) / 2]
    }

    pub fn reset(&mut self) {
        self.reset = true;
    }
}

/// Single-pole low-pass (exponential smoothing).
#[derive(Debug)]
pub struct LowPassFilter {
    alpha: f64,
    prev_output: f64,
    reset: bool,
}

impl LowPassFilter {
    pub fn new(sampling_frequency: f64, cutoff_frequency: f64) -> Self {
        let rc = 1.0 / (cutoff_frequency * TAU);
        let alpha = 1.0 / (1.0 + rc * sampling_frequency);
        Self {
            alpha,
            prev_output: 0.0,
            reset: true,
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        if self.reset {
            self.reset = false;
            self.prev_output = input;
        }
        let output = self.alpha * input + (1.0 - self.alpha) * self.prev_output;
        self.prev_output = output;
        output
    }

    pub fn reset(&mut self) {
        self.reset = true;
    }
}

/// First-order RC high-pass.
#[derive(Debug)]
pub struct HighPassFilter {
    alpha: f64,
    prev_input: f64,
    prev_output: f64,
    reset: bool,
}

impl HighPassFilter {
    pub fn new(sampling_frequency: f64, cutoff_frequency: f64) -> Self {
        let dt = 1.0 / sampling_frequency;
        let rc = 1.0 / (TAU * cutoff_frequency);
        let alpha = rc / (rc + dt);
        Self {
            alpha,
            prev_input: 0.0,
            prev_output: 0.0,
            reset: true,
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        if self.reset {
            self.reset = false;
            self.prev_input = input;
            self.prev_output = 0.0;
        }
        let output = self.alpha * (self.prev_output + input - self.prev_input);
        self.prev_input = input;
        self.prev_output = output;
        output
    }

    pub fn reset(&mut self) {
        self.reset = true;
    }
}

/// Discrete differentiator over the nominal sampling period.
///
/// `dt` is fixed at construction from the nominal sampling frequency; the
/// per-call elapsed time is deliberately not used here, so the output is a
/// rate per nominal tick rather than per wall-clock second under jitter.
#[derive(Debug)]
pub struct Differentiator {
    dt: f64,
    prev_input: f64,
    reset: bool,
}

impl Differentiator {
    pub fn new(sampling_frequency: f64) -> Self {
        Self {
            dt: 1.0 / sampling_frequency,
            prev_input: 0.0,
            reset: true,
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        if self.reset {
            self.reset = false;
            self.prev_input = input;
        }
        let output = (input - self.prev_input) / self.dt;
        self.prev_input = input;
        output
    }

    pub fn reset(&mut self) {
        self.reset = true;
    }
}
