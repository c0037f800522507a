//! Test and helper mocks for catscale_core

use std::sync::{Arc, Mutex};

use catscale_traits::{PublishError, PublishSink, Scale};

/// A scale that always errors on read; useful for wiring tests that never
/// want a sample processed.
pub struct NoopScale;

impl Scale for NoopScale {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop scale")))
    }
}

/// Scale that returns a fixed sequence, then repeats the last value.
pub struct SequenceScale {
    seq: Vec<f64>,
    idx: usize,
}

impl SequenceScale {
    pub fn new(seq: impl Into<Vec<f64>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }
}

impl Scale for SequenceScale {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let v = if self.idx < self.seq.len() {
            let x = self.seq[self.idx];
            self.idx += 1;
            x
        } else {
            self.seq.last().copied().unwrap_or(0.0)
        };
        Ok(v)
    }
}

/// In-memory sink capturing published records. Clone keeps a handle to the
/// same storage, so tests can inspect what a pipeline thread published.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, Vec<u8>)> {
        self.records.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl PublishSink for MemorySink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if let Ok(mut records) = self.records.lock() {
            records.push((topic.to_string(), payload.to_vec()));
        }
        Ok(())
    }
}

/// Sink whose publish always fails.
pub struct FailingSink;

impl PublishSink for FailingSink {
    fn publish(&mut self, _topic: &str, _payload: &[u8]) -> Result<(), PublishError> {
        Err(PublishError::Io("injected failure".into()))
    }
}

/// Sink that reports the transport as down.
pub struct OfflineSink;

impl PublishSink for OfflineSink {
    fn publish(&mut self, _topic: &str, _payload: &[u8]) -> Result<(), PublishError> {
        Err(PublishError::NotReady)
    }

    fn ready(&self) -> bool {
        false
    }
}
