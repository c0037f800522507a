#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the scale pipeline.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Calibration is a two-point raw-counts-to-grams fit, reduced to a single
//!   sensor-units-per-gram factor for the cascade.
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct FilterCfg {
    /// Nominal sampling frequency in Hz; filter coefficients and the
    /// differentiator step are derived from this, not from per-call dt.
    pub sampling_frequency_hz: f64,
    /// Low-pass cutoff frequency in Hz
    pub lpf_cutoff_hz: f64,
    /// High-pass cutoff frequency in Hz
    pub hpf_cutoff_hz: f64,
    /// Moving mean window size (samples)
    pub mean_window: usize,
    /// Moving median window size (samples)
    pub median_window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            sampling_frequency_hz: 10.0,
            lpf_cutoff_hz: 0.5,
            hpf_cutoff_hz: 0.1,
            mean_window: 10,
            median_window: 10,
        }
    }
}

/// Two-point load-cell calibration in raw sensor counts.
/// units_per_gram = (raw_span - raw_zero) / grams_span
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Raw reading with the platform empty
    pub raw_zero: f64,
    /// Raw reading with the reference mass on the platform
    pub raw_span: f64,
    /// Reference mass in grams
    pub grams_span: f64,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            raw_zero: 8_612_000.0,
            raw_span: 8_825_500.0,
            grams_span: 9_800.0,
        }
    }
}

impl CalibrationCfg {
    /// Sensor units per gram derived from the two calibration points.
    pub fn units_per_gram(&self) -> f64 {
        (self.raw_span - self.raw_zero) / self.grams_span
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DetectionCfg {
    /// Rate-of-change threshold (g/s) below which the signal counts as stable
    pub dxdt_threshold: f64,
    /// Weight below this bound (grams) triggers the hold switch
    pub weight_low_bound_g: f64,
    /// Weight above this bound (grams) triggers the hold switch
    pub weight_high_bound_g: f64,
    /// Seconds the hold switch stays armed after the last trigger
    pub hold_timer_s: f64,
    /// Minimum accumulated stable time (seconds) for a phase to be reported
    pub min_stable_phase_s: f64,
    /// Accumulated stable time (seconds) after which an active event is
    /// force-closed even while the hold switch keeps re-arming
    pub max_stable_phase_s: f64,
    /// Cap on captured samples per stable phase; excess samples still count
    /// toward elapsed time but are not stored
    pub stable_max_samples: usize,
}

impl Default for DetectionCfg {
    fn default() -> Self {
        Self {
            dxdt_threshold: 50.0,
            weight_low_bound_g: -400.0,
            weight_high_bound_g: 1000.0,
            hold_timer_s: 5.0,
            min_stable_phase_s: 2.0,
            max_stable_phase_s: 120.0,
            stable_max_samples: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ChannelCfg {
    /// Bounded capacity of the notification queue between the sampling loop
    /// and the aggregator. Sized to hold several whole events.
    pub capacity: usize,
}

impl Default for ChannelCfg {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AggregatorCfg {
    /// Maximum stable phases per serialized event record; bounds the output
    /// buffer size check
    pub max_stable_phases: usize,
    /// Topic / path handed to the publish sink
    pub topic: String,
}

impl Default for AggregatorCfg {
    fn default() -> Self {
        Self {
            max_stable_phases: 32,
            topic: "ScaleEvent".to_string(),
        }
    }
}

/// Slow zero-offset tracking applied to the raw signal before the cascade.
/// Off by default; the cascade's high-pass stage already corrects drift.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct TareCfg {
    pub enabled: bool,
    /// Number of recent raw samples inspected for quiescence
    pub window: usize,
    /// Maximum raw-value spread over the window to accept a new zero offset
    pub spread_threshold: f64,
}

impl Default for TareCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            window: 60,
            spread_threshold: 2300.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub filter: FilterCfg,
    pub calibration: CalibrationCfg,
    pub detection: DetectionCfg,
    pub channel: ChannelCfg,
    pub aggregator: AggregatorCfg,
    pub tare: TareCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Filter
        if !self.filter.sampling_frequency_hz.is_finite() || self.filter.sampling_frequency_hz <= 0.0 {
            eyre::bail!("filter.sampling_frequency_hz must be > 0");
        }
        if !self.filter.lpf_cutoff_hz.is_finite() || self.filter.lpf_cutoff_hz <= 0.0 {
            eyre::bail!("filter.lpf_cutoff_hz must be > 0");
        }
        if !self.filter.hpf_cutoff_hz.is_finite() || self.filter.hpf_cutoff_hz <= 0.0 {
            eyre::bail!("filter.hpf_cutoff_hz must be > 0");
        }
        if self.filter.mean_window <= 1 {
            eyre::bail!("filter.mean_window must be > 1");
        }
        if self.filter.median_window <= 1 {
            eyre::bail!("filter.median_window must be > 1");
        }

        // Calibration
        let upg = self.calibration.units_per_gram();
        if !upg.is_finite() || upg == 0.0 {
            eyre::bail!("calibration points produce a degenerate units-per-gram factor");
        }

        // Detection
        if !self.detection.dxdt_threshold.is_finite() || self.detection.dxdt_threshold <= 0.0 {
            eyre::bail!("detection.dxdt_threshold must be > 0");
        }
        if self.detection.weight_low_bound_g >= self.detection.weight_high_bound_g {
            eyre::bail!("detection.weight_low_bound_g must be below weight_high_bound_g");
        }
        if !self.detection.hold_timer_s.is_finite() || self.detection.hold_timer_s <= 0.0 {
            eyre::bail!("detection.hold_timer_s must be > 0");
        }
        if !self.detection.min_stable_phase_s.is_finite() || self.detection.min_stable_phase_s <= 0.0 {
            eyre::bail!("detection.min_stable_phase_s must be > 0");
        }
        if self.detection.min_stable_phase_s >= self.detection.max_stable_phase_s {
            eyre::bail!("detection.min_stable_phase_s must be below max_stable_phase_s");
        }
        if self.detection.stable_max_samples == 0 {
            eyre::bail!("detection.stable_max_samples must be >= 1");
        }

        // Channel
        if self.channel.capacity == 0 {
            eyre::bail!("channel.capacity must be >= 1");
        }

        // Aggregator
        if self.aggregator.max_stable_phases == 0 {
            eyre::bail!("aggregator.max_stable_phases must be >= 1");
        }
        if self.aggregator.topic.is_empty() {
            eyre::bail!("aggregator.topic must not be empty");
        }

        // Tare
        if self.tare.enabled {
            if self.tare.window < 2 {
                eyre::bail!("tare.window must be >= 2");
            }
            if !self.tare.spread_threshold.is_finite() || self.tare.spread_threshold <= 0.0 {
                eyre::bail!("tare.spread_threshold must be > 0");
            }
        }

        Ok(())
    }
}
