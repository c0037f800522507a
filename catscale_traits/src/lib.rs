pub mod clock;

pub use clock::{Clock, MonotonicClock, SystemWallClock, WallClock};

use thiserror::Error;

/// Failure of the publish sink. The core records these and moves on; retry
/// policy belongs to the sink implementation or its owner.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("sink not ready")]
    NotReady,
    #[error("io error: {0}")]
    Io(String),
    #[error("rejected by remote: {0}")]
    Rejected(String),
}

/// Raw load-cell sample source. One reading per sampling tick, in sensor
/// units (not grams).
pub trait Scale {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

/// One-way, fire-and-forget transport for serialized event records.
pub trait PublishSink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;

    /// Whether the transport behind the sink is currently usable.
    fn ready(&self) -> bool {
        true
    }
}
