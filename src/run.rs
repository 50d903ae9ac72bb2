//! Run controller: the ingestion loop and its state machine.
//!
//! One control thread drives `receive → stamp → submit → drain → record`
//! every iteration. The quit flag and the engine's liveness are polled once
//! per iteration, liveness after the drain attempt so a batch completed
//! during the final iteration is still recorded. Entering `Draining` flushes
//! every already-completed batch without waiting for frames still inside
//! the engine.
//!
//! `Stopped` and `Failed` share one release sequence, run exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::clock::CaptureClock;
use crate::display::MetricsDisplay;
use crate::engine::AnalysisEngine;
use crate::error::PipelineError;
use crate::ingest::{FrameSource, Received};
use crate::metrics::ResultBatch;
use crate::record::ExperienceRecorder;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Connected,
    Streaming,
    Draining,
    Stopped,
    Failed,
}

/// Counters reported after a clean run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub frames_received: u64,
    pub frames_submitted: u64,
    pub frames_dropped: u64,
    pub batches_recorded: u64,
    pub elapsed_seconds: f64,
    pub processing_fps: f64,
    pub final_state: RunState,
}

pub struct RunController<S: FrameSource, E: AnalysisEngine> {
    source: S,
    engine: E,
    recorder: ExperienceRecorder,
    display: Option<Box<dyn MetricsDisplay>>,
    quit: Arc<AtomicBool>,
    clock: CaptureClock,
    state: RunState,
    started: Instant,
    frames_received: u64,
    frames_submitted: u64,
    batches_recorded: u64,
    last_capture_fps: f32,
}

impl<S: FrameSource, E: AnalysisEngine> RunController<S, E> {
    pub fn new(
        source: S,
        engine: E,
        recorder: ExperienceRecorder,
        quit: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            engine,
            recorder,
            display: None,
            quit,
            clock: CaptureClock::new(),
            state: RunState::Idle,
            started: Instant::now(),
            frames_received: 0,
            frames_submitted: 0,
            batches_recorded: 0,
            last_capture_fps: crate::clock::UNDEFINED_CAPTURE_FPS,
        }
    }

    pub fn with_display(mut self, display: Box<dyn MetricsDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    /// Drive the run to completion. Releases the socket and the engine
    /// exactly once on every exit path; a fatal error is returned after
    /// release has run.
    pub fn run(mut self) -> Result<RunSummary, PipelineError> {
        let outcome = self.drive();
        match &outcome {
            Ok(()) => self.transition(RunState::Stopped),
            Err(_) => self.transition(RunState::Failed),
        }
        self.release();

        let elapsed = self.started.elapsed().as_secs_f64();
        match outcome {
            Ok(()) => {
                Ok(RunSummary {
                    frames_received: self.frames_received,
                    frames_submitted: self.frames_submitted,
                    frames_dropped: self.engine.frames_dropped(),
                    batches_recorded: self.batches_recorded,
                    elapsed_seconds: elapsed,
                    processing_fps: if elapsed > 0.0 {
                        self.batches_recorded as f64 / elapsed
                    } else {
                        0.0
                    },
                    final_state: RunState::Stopped,
                })
            }
            Err(err) => {
                log::error!("run failed after {:.1}s: {}", elapsed, err);
                Err(err)
            }
        }
    }

    fn drive(&mut self) -> Result<(), PipelineError> {
        self.source.connect()?;
        self.transition(RunState::Connected);
        self.transition(RunState::Streaming);

        loop {
            match self.source.receive()? {
                Received::Image(image) => {
                    let (frame, capture_fps) = self.clock.stamp(image);
                    self.frames_received += 1;
                    self.last_capture_fps = capture_fps;
                    log::trace!(
                        "frame {} at {:.3}s (capture {:.2} fps)",
                        self.frames_received,
                        frame.timestamp(),
                        capture_fps
                    );
                    self.engine.submit(frame)?;
                    self.frames_submitted += 1;
                }
                Received::NoData => {
                    log::trace!("receive timed out; no frame this iteration");
                }
                Received::Closed => {
                    log::info!("peer closed the connection");
                    break;
                }
            }

            if self.engine.pending() > 0 {
                if let Some(batch) = self.engine.drain()? {
                    self.record_batch(&batch)?;
                }
            }

            if !self.engine.is_running() {
                log::info!("analysis engine stopped");
                break;
            }
            if self.quit.load(Ordering::Relaxed) {
                log::info!("quit requested");
                break;
            }
        }

        self.transition(RunState::Draining);
        while self.engine.pending() > 0 {
            match self.engine.drain()? {
                Some(batch) => self.record_batch(&batch)?,
                None => break,
            }
        }
        Ok(())
    }

    fn record_batch(&mut self, batch: &ResultBatch) -> Result<(), PipelineError> {
        self.recorder.record(batch)?;
        self.batches_recorded += 1;
        if let Some(display) = self.display.as_mut() {
            display.render(&batch.faces, &batch.frame);
        }
        if log::log_enabled!(log::Level::Debug) {
            let dominant = batch
                .faces
                .values()
                .next()
                .map(|metrics| metrics.emojis.dominant())
                .unwrap_or("none");
            let elapsed = self.started.elapsed().as_secs_f64();
            let pfps = if elapsed > 0.0 {
                self.batches_recorded as f64 / elapsed
            } else {
                0.0
            };
            log::debug!(
                "cfps {:.2} pfps {:.2} faces {} dominant emoji {}",
                self.last_capture_fps,
                pfps,
                batch.faces.len(),
                dominant
            );
        }
        Ok(())
    }

    fn release(&mut self) {
        self.engine.stop();
        self.source.close();
        log::debug!("engine and connection released");
    }

    fn transition(&mut self, next: RunState) {
        log::debug!("run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
