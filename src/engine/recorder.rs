use crate::core::error::KmcResult;
use crate::solvers::Snapshot;

/// Sink for periodic snapshots.
/// A failing recorder never affects engine state; the simulator logs the
/// fault and keeps running.
pub trait Recorder: Send {
    fn record(&mut self, snapshot: &Snapshot) -> KmcResult<()>;

    /// Flushes anything buffered. Called once after the last tick.
    fn finish(&mut self) -> KmcResult<()> {
        Ok(())
    }

    /// Returns the name of the sink (e.g., "CSV ledger").
    fn name(&self) -> &str;
}

/// Keeps snapshots in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecorder {
    pub snapshots: Vec<Snapshot>,
}

impl Recorder for MemoryRecorder {
    fn record(&mut self, snapshot: &Snapshot) -> KmcResult<()> {
        self.snapshots.push(*snapshot);
        Ok(())
    }

    fn name(&self) -> &str {
        "Memory"
    }
}
