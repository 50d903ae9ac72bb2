//! Analysis gateway: the engine capability set and the worker adapter.
//!
//! The engine boundary is a pull interface: the control thread submits
//! frames and later drains completed result batches, one per call. Results
//! may come back out of submission order; each batch carries its own frame
//! and timestamp, so recording order is drain order.

mod stub;
mod worker;

pub use stub::StubAnalyzer;
pub use worker::WorkerEngine;

use anyhow::Result;

use crate::error::PipelineError;
use crate::frame::Frame;
use crate::metrics::{FaceMap, ResultBatch};

/// A blocking face analyzer, run on the engine's worker thread.
///
/// Implementations must treat the frame as read-only and must not retain
/// pixel data beyond the `analyze` call. An error terminates the worker; it
/// surfaces to the control thread on the next drain.
pub trait FaceAnalyzer: Send {
    /// Backend identifier, as selected by configuration.
    fn name(&self) -> &'static str;

    /// Analyze one frame, returning the metrics for every detected face.
    fn analyze(&mut self, frame: &Frame) -> Result<FaceMap>;
}

/// The asynchronous analysis engine as seen from the control thread.
///
/// All operations are non-blocking. `is_running` is the authoritative stop
/// signal for the outer loop; the controller evaluates it after attempting a
/// drain so a final pending batch is still delivered.
pub trait AnalysisEngine {
    /// Hand a frame to the engine. Never blocks; the engine may drop the
    /// frame when its internal buffer is full.
    fn submit(&mut self, frame: Frame) -> Result<(), PipelineError>;

    /// Number of completed batches waiting to be drained.
    fn pending(&self) -> usize;

    /// Pull at most one completed batch. Safe to call when nothing is ready.
    fn drain(&mut self) -> Result<Option<ResultBatch>, PipelineError>;

    /// Whether the engine's processing thread is alive.
    fn is_running(&self) -> bool;

    /// Stop processing and release engine resources. Idempotent.
    fn stop(&mut self);

    /// Frames discarded because the engine's buffer was full.
    fn frames_dropped(&self) -> u64 {
        0
    }
}

/// Construct the analyzer backend selected by name.
pub fn build_analyzer(name: &str) -> Result<Box<dyn FaceAnalyzer>> {
    match name {
        "stub" => Ok(Box::new(StubAnalyzer::new())),
        other => Err(anyhow::anyhow!(
            "unknown analyzer backend '{}'; available: stub",
            other
        )),
    }
}
