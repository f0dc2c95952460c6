use log::info;

use crate::error::SnapshotError;

/// Persists visual evidence of a new fall, e.g. by writing the current frame
/// to disk. Errors are reported by the caller and never abort a frame.
pub trait SnapshotSink {
    fn write(&mut self, stream: &str, sequence: u64) -> Result<(), SnapshotError>;
}

impl<F> SnapshotSink for F
where
    F: FnMut(&str, u64) -> Result<(), SnapshotError>,
{
    #[inline]
    fn write(&mut self, stream: &str, sequence: u64) -> Result<(), SnapshotError> {
        self(stream, sequence)
    }
}

/// Discards snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    #[inline]
    fn write(&mut self, _stream: &str, _sequence: u64) -> Result<(), SnapshotError> {
        Ok(())
    }
}

/// Only logs the snapshot request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl SnapshotSink for LogSink {
    fn write(&mut self, stream: &str, sequence: u64) -> Result<(), SnapshotError> {
        info!("snapshot requested: stream={} sequence={}", stream, sequence);
        Ok(())
    }
}
