//! Publish sinks writing one serialized record per line.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use catscale_traits::{PublishError, PublishSink};

/// Writes each published record as one JSON line. The topic is carried as a
/// log field only; consumers of the file see the bare records.
pub struct JsonlSink<W: Write + Send> {
    writer: W,
}

impl JsonlSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            writer: io::stdout(),
        }
    }
}

impl JsonlSink<BufWriter<File>> {
    pub fn file(path: &Path) -> io::Result<Self> {
        let file = File::options().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> PublishSink for JsonlSink<W> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        tracing::debug!(topic, bytes = payload.len(), "writing record");
        self.writer
            .write_all(payload)
            .and_then(|()| self.writer.write_all(b"\n"))
            .and_then(|()| self.writer.flush())
            .map_err(|e| PublishError::Io(e.to_string()))
    }
}
