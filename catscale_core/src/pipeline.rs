//! Wires the sampling thread, the notification queue, and the aggregator
//! thread into one runnable pipeline.
//!
//! Safety: `Pipeline` owns both threads and shuts them down when dropped,
//! preventing thread leaks in tests and embedders.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use catscale_config::Config;
use catscale_traits::{Clock, MonotonicClock, PublishSink, Scale, SystemWallClock, WallClock};
use eyre::WrapErr;

use crate::aggregator::EventAggregator;
use crate::cascade::{CascadeConfig, FilterCascade};
use crate::error::Result;
use crate::queue;
use crate::sampler::SamplingLoop;
use crate::tare::AutoTare;

pub struct Pipeline {
    shutdown: Arc<AtomicBool>,
    sampler: Option<thread::JoinHandle<()>>,
    aggregator: Option<thread::JoinHandle<()>>,
}

impl Pipeline {
    /// Spawn the pipeline with the real monotonic and wall clocks.
    pub fn spawn<S, K>(scale: S, sink: K, config: &Config) -> Result<Self>
    where
        S: Scale + Send + 'static,
        K: PublishSink + Send + 'static,
    {
        Self::spawn_with_clocks(scale, sink, config, MonotonicClock::new(), SystemWallClock::new())
    }

    /// Spawn with injected clocks (deterministic tests).
    pub fn spawn_with_clocks<S, K, C, W>(
        scale: S,
        sink: K,
        config: &Config,
        clock: C,
        wall: W,
    ) -> Result<Self>
    where
        S: Scale + Send + 'static,
        K: PublishSink + Send + 'static,
        C: Clock + Send + 'static,
        W: WallClock + Send + 'static,
    {
        config.validate()?;

        let cascade = FilterCascade::new(&CascadeConfig::from_config(config))?;
        let tare = config.tare.enabled.then(|| AutoTare::new(&config.tare));
        let (sender, rx) = queue::bounded(config.channel.capacity);

        let period = Duration::from_secs_f64(1.0 / config.filter.sampling_frequency_hz);
        // Reads that outlast two periods are treated as a skipped tick.
        let read_timeout = period * 2;

        let shutdown = Arc::new(AtomicBool::new(false));

        let sampling = SamplingLoop {
            scale,
            cascade,
            tare,
            sender,
            clock,
            wall,
            period,
            read_timeout,
            shutdown: shutdown.clone(),
        };
        let sampler = thread::Builder::new()
            .name("catscale-sampler".into())
            .spawn(move || sampling.run())
            .wrap_err("spawn sampler thread")?;

        let mut aggregator = EventAggregator::new(sink, &config.aggregator);
        let aggregator = thread::Builder::new()
            .name("catscale-aggregator".into())
            .spawn(move || aggregator.run(&rx))
            .wrap_err("spawn aggregator thread")?;

        Ok(Self {
            shutdown,
            sampler: Some(sampler),
            aggregator: Some(aggregator),
        })
    }

    /// Request shutdown without waiting. Drop still joins.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Joining the sampler drops its queue sender, which in turn ends the
        // aggregator's receive loop.
        if let Some(handle) = self.sampler.take() {
            if let Err(e) = handle.join() {
                tracing::warn!(?e, "sampler thread panicked during shutdown");
            }
        }
        if let Some(handle) = self.aggregator.take() {
            if let Err(e) = handle.join() {
                tracing::warn!(?e, "aggregator thread panicked during shutdown");
            }
        }
    }
}
