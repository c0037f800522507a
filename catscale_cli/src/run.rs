//! Live pipeline against the synthetic load cell.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use eyre::{Result, WrapErr};

use catscale_config::Config;
use catscale_core::Pipeline;
use catscale_io::{JsonlSink, SyntheticScale};
use catscale_traits::PublishSink;

pub fn execute(
    config: &Config,
    duration_s: u64,
    cat_grams: f64,
    seed: u64,
    output: Option<&Path>,
) -> Result<()> {
    let scale = SyntheticScale::demo_visit(
        config.filter.sampling_frequency_hz,
        config.calibration.units_per_gram(),
        cat_grams,
        seed,
    );

    match output {
        Some(path) => {
            let sink = JsonlSink::file(path)
                .wrap_err_with(|| format!("failed to open output {}", path.display()))?;
            drive(scale, sink, config, duration_s)
        }
        None => drive(scale, JsonlSink::stdout(), config, duration_s),
    }
}

fn drive<K>(scale: SyntheticScale, sink: K, config: &Config, duration_s: u64) -> Result<()>
where
    K: PublishSink + Send + 'static,
{
    let pipeline = Pipeline::spawn(scale, sink, config)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    tracing::info!(duration_s, "pipeline running");
    let started = Instant::now();
    while !stop.load(Ordering::Relaxed) {
        if duration_s > 0 && started.elapsed() >= Duration::from_secs(duration_s) {
            break;
        }
        thread::sleep(Duration::from_millis(100));
    }

    drop(pipeline);
    tracing::info!("pipeline stopped");
    Ok(())
}
