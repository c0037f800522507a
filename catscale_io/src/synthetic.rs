//! Synthetic load-cell signal for bench runs without hardware.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use catscale_traits::Scale;

/// One constant-level stretch of the synthetic signal, in sensor units.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub ticks: usize,
    pub level_units: f64,
}

/// Plays back a sequence of level segments with uniform noise on top.
/// After the last segment the final level repeats forever.
pub struct SyntheticScale {
    profile: Vec<Segment>,
    noise_units: f64,
    rng: StdRng,
    tick: usize,
}

impl SyntheticScale {
    pub fn new(profile: Vec<Segment>, noise_units: f64, seed: u64) -> Self {
        Self {
            profile,
            noise_units,
            rng: StdRng::seed_from_u64(seed),
            tick: 0,
        }
    }

    /// A single cat visit: idle baseline, the cat on the platform, then idle
    /// again with a small residual left behind.
    pub fn demo_visit(sampling_hz: f64, units_per_gram: f64, cat_grams: f64, seed: u64) -> Self {
        let ticks = |secs: f64| (secs * sampling_hz).round() as usize;
        let profile = vec![
            Segment {
                ticks: ticks(10.0),
                level_units: 0.0,
            },
            Segment {
                ticks: ticks(20.0),
                level_units: cat_grams * units_per_gram,
            },
            Segment {
                ticks: ticks(10.0),
                level_units: 30.0 * units_per_gram,
            },
        ];
        Self::new(profile, 2.0 * units_per_gram, seed)
    }

    fn level_at(&self, tick: usize) -> f64 {
        let mut remaining = tick;
        for segment in &self.profile {
            if remaining < segment.ticks {
                return segment.level_units;
            }
            remaining -= segment.ticks;
        }
        self.profile.last().map(|s| s.level_units).unwrap_or(0.0)
    }
}

impl Scale for SyntheticScale {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let level = self.level_at(self.tick);
        self.tick += 1;
        let noise = if self.noise_units > 0.0 {
            self.rng.gen_range(-self.noise_units..self.noise_units)
        } else {
            0.0
        };
        Ok(level + noise)
    }
}
