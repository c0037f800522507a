//! Offline replay of a recorded weight trace through the cascade.
//!
//! The trace is padded with a fixed prefix and suffix of the first/last
//! sample at the nominal period, so events still open at either edge of the
//! recording settle and close instead of dangling.

use std::path::Path;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use eyre::{Result, WrapErr};

use catscale_config::Config;
use catscale_core::cascade::{CascadeConfig, FilterCascade};
use catscale_core::event::EventNotification;
use catscale_core::EventAggregator;
use catscale_io::JsonlSink;
use catscale_traits::PublishSink;

const PREFIX_SECS: f64 = 10.0;
const SUFFIX_SECS: f64 = 80.0;

pub fn execute(config: &Config, input: &Path, output: Option<&Path>) -> Result<()> {
    let trace = read_trace(input)?;
    tracing::info!(samples = trace.len(), input = %input.display(), "replaying trace");

    match output {
        Some(path) => {
            let sink = JsonlSink::file(path)
                .wrap_err_with(|| format!("failed to open output {}", path.display()))?;
            replay(config, &trace, sink)
        }
        None => replay(config, &trace, JsonlSink::stdout()),
    }
}

fn replay<K: PublishSink>(
    config: &Config,
    trace: &[(DateTime<Utc>, f64)],
    sink: K,
) -> Result<()> {
    let mut cascade = FilterCascade::new(&CascadeConfig::from_config(config))?;
    let mut aggregator = EventAggregator::new(sink, &config.aggregator);

    let ideal_dt = 1.0 / config.filter.sampling_frequency_hz;
    let prefix_ticks = (PREFIX_SECS / ideal_dt) as usize;
    let suffix_ticks = (SUFFIX_SECS / ideal_dt) as usize;
    let step_ms = (ideal_dt * 1000.0) as i64;

    let mut events = 0usize;
    let mut deliver = |aggregator: &mut EventAggregator<K>, notes: Vec<EventNotification>| {
        for note in notes {
            if matches!(note, EventNotification::EndOfEvent { .. }) {
                events += 1;
            }
            aggregator.handle(note);
        }
    };

    // Prefix: the first sample, backdated at the nominal period.
    let (first_time, first_raw) = trace[0];
    for i in 0..prefix_ticks {
        let t = first_time - ChronoDuration::milliseconds((prefix_ticks - i) as i64 * step_ms);
        let step = cascade.process(first_raw, ideal_dt, t);
        deliver(&mut aggregator, step.notifications);
    }

    // The recording itself, with the real inter-sample spacing. The first
    // sample was already consumed by the prefix.
    for pair in trace.windows(2) {
        let (t0, _) = pair[0];
        let (t1, raw) = pair[1];
        let dt = (t1 - t0)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(ideal_dt);
        let step = cascade.process(raw, dt, t1);
        deliver(&mut aggregator, step.notifications);
    }

    // Suffix: hold the last sample long enough for open events to settle.
    let (last_time, last_raw) = trace[trace.len() - 1];
    for i in 1..=suffix_ticks {
        let t = last_time + ChronoDuration::milliseconds(i as i64 * step_ms);
        let step = cascade.process(last_raw, ideal_dt, t);
        deliver(&mut aggregator, step.notifications);
    }

    tracing::info!(events, "replay complete");
    Ok(())
}

fn read_trace(path: &Path) -> Result<Vec<(DateTime<Utc>, f64)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open trace {}: {}", path.display(), e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read trace headers {}: {}", path.display(), e))?
        .clone();
    let expected = ["timestamp", "raw"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "trace CSV must have headers 'timestamp,raw', got: {}",
            actual.join(",")
        );
    }

    let mut out = Vec::new();
    for (idx, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        let time = DateTime::parse_from_rfc3339(rec[0].trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| eyre::eyre!("invalid timestamp in row {}: {}", idx + 2, e))?;
        let raw: f64 = rec[1]
            .trim()
            .parse()
            .map_err(|e| eyre::eyre!("invalid raw value in row {}: {}", idx + 2, e))?;
        out.push((time, raw));
    }
    if out.is_empty() {
        eyre::bail!("trace {} contains no samples", path.display());
    }
    Ok(out)
}
