//! Worker-thread adapter from a blocking `FaceAnalyzer` to the non-blocking
//! `AnalysisEngine` capability set.
//!
//! Frames flow to the worker over a bounded channel; when it is full the
//! frame is dropped and counted rather than blocking the control thread.
//! Completed batches come back over an unbounded channel drained with
//! `try_recv`. An analyzer error is queued in the same channel, terminates
//! the worker, and flips the liveness flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use crate::engine::{AnalysisEngine, FaceAnalyzer};
use crate::error::PipelineError;
use crate::frame::Frame;
use crate::metrics::ResultBatch;

enum WorkerOutput {
    Batch(ResultBatch),
    Fault(String),
}

pub struct WorkerEngine {
    frame_tx: Option<Sender<Frame>>,
    result_rx: Receiver<WorkerOutput>,
    alive: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    dropped: u64,
}

impl WorkerEngine {
    /// Spawn the worker thread around `analyzer`. `buffer_frames` bounds how
    /// many submitted frames may wait for the analyzer at once.
    pub fn start(
        analyzer: Box<dyn FaceAnalyzer>,
        buffer_frames: usize,
    ) -> Result<Self, PipelineError> {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(buffer_frames);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<WorkerOutput>();
        let alive = Arc::new(AtomicBool::new(true));

        let worker_alive = alive.clone();
        let backend = analyzer.name();
        let handle = std::thread::Builder::new()
            .name("analysis-engine".into())
            .spawn(move || {
                let mut analyzer = analyzer;
                for frame in frame_rx {
                    match analyzer.analyze(&frame) {
                        Ok(faces) => {
                            let batch = ResultBatch { frame, faces };
                            if result_tx.send(WorkerOutput::Batch(batch)).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            log::error!("analyzer failed: {:#}", e);
                            let _ = result_tx.send(WorkerOutput::Fault(format!("{:#}", e)));
                            break;
                        }
                    }
                }
                worker_alive.store(false, Ordering::Release);
            })
            .map_err(|e| {
                PipelineError::EngineInit(format!("spawn analysis worker for '{}': {}", backend, e))
            })?;

        log::info!(
            "analysis engine started (backend={}, buffer={} frames)",
            backend,
            buffer_frames
        );
        Ok(Self {
            frame_tx: Some(frame_tx),
            result_rx,
            alive,
            handle: Some(handle),
            dropped: 0,
        })
    }
}

impl AnalysisEngine for WorkerEngine {
    fn submit(&mut self, frame: Frame) -> Result<(), PipelineError> {
        let Some(tx) = self.frame_tx.as_ref() else {
            return Ok(());
        };
        match tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                log::debug!("engine buffer full; frame dropped ({} total)", self.dropped);
                Ok(())
            }
            // Worker already exited; its fault (if any) is waiting in the
            // drain queue and liveness ends the loop this iteration.
            Err(TrySendError::Disconnected(_)) => Ok(()),
        }
    }

    fn pending(&self) -> usize {
        self.result_rx.len()
    }

    fn drain(&mut self) -> Result<Option<ResultBatch>, PipelineError> {
        match self.result_rx.try_recv() {
            Ok(WorkerOutput::Batch(batch)) => Ok(Some(batch)),
            Ok(WorkerOutput::Fault(message)) => Err(PipelineError::EngineRuntime(message)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
        }
    }

    fn is_running(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn stop(&mut self) {
        // Dropping the sender ends the worker's frame loop.
        self.frame_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("analysis worker panicked during shutdown");
            }
        }
    }

    fn frames_dropped(&self) -> u64 {
        self.dropped
    }
}

impl Drop for WorkerEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StubAnalyzer;
    use crate::frame::ColorFormat;
    use std::time::{Duration, Instant};

    fn frame(seed: u8) -> Frame {
        Frame::new(4, 4, ColorFormat::Monochrome, vec![seed; 16], 0.0)
    }

    fn wait_for_pending(engine: &WorkerEngine) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while engine.pending() == 0 {
            assert!(Instant::now() < deadline, "worker produced no batch");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn submitted_frame_comes_back_as_a_batch() {
        let mut engine = WorkerEngine::start(Box::new(StubAnalyzer::new()), 4).unwrap();
        assert!(engine.is_running());
        engine.submit(frame(1)).unwrap();
        wait_for_pending(&engine);
        let batch = engine.drain().unwrap().expect("one batch pending");
        assert_eq!(batch.faces.len(), 1);
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn drain_on_empty_queue_returns_none() {
        let mut engine = WorkerEngine::start(Box::new(StubAnalyzer::new()), 4).unwrap();
        assert_eq!(engine.pending(), 0);
        assert!(engine.drain().unwrap().is_none());
        assert!(engine.drain().unwrap().is_none());
    }

    struct FailingAnalyzer;

    impl FaceAnalyzer for FailingAnalyzer {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn analyze(&mut self, _frame: &Frame) -> anyhow::Result<crate::metrics::FaceMap> {
            anyhow::bail!("classifier fault")
        }
    }

    #[test]
    fn analyzer_error_surfaces_on_drain_and_stops_the_worker() {
        let mut engine = WorkerEngine::start(Box::new(FailingAnalyzer), 4).unwrap();
        engine.submit(frame(1)).unwrap();
        wait_for_pending(&engine);
        let err = engine.drain().unwrap_err();
        assert!(matches!(err, PipelineError::EngineRuntime(_)));
        // The worker flips the liveness flag as it exits.
        let deadline = Instant::now() + Duration::from_secs(5);
        while engine.is_running() {
            assert!(Instant::now() < deadline, "worker stayed alive after fault");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn full_buffer_drops_frames_instead_of_blocking() {
        struct SlowAnalyzer;

        impl FaceAnalyzer for SlowAnalyzer {
            fn name(&self) -> &'static str {
                "slow"
            }

            fn analyze(&mut self, _frame: &Frame) -> anyhow::Result<crate::metrics::FaceMap> {
                std::thread::sleep(Duration::from_millis(200));
                Ok(crate::metrics::FaceMap::new())
            }
        }

        let mut engine = WorkerEngine::start(Box::new(SlowAnalyzer), 1).unwrap();
        for seed in 0..8 {
            engine.submit(frame(seed)).unwrap();
        }
        assert!(engine.frames_dropped() > 0);
    }
}
