//! End-to-end runs over a loopback TCP peer.
//!
//! The peer is an in-test listener pushing raw unframed bytes; the engine is
//! either a scripted implementation of the gateway trait (for deterministic
//! result injection) or the real worker engine over the stub analyzer.

use std::collections::VecDeque;
use std::io::Write;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use affect_relay::config::{FrameSettings, PeerSettings};
use affect_relay::engine::{AnalysisEngine, StubAnalyzer, WorkerEngine};
use affect_relay::ingest::TcpSource;
use affect_relay::metrics::{FaceId, FaceMap, FaceMetrics, ResultBatch};
use affect_relay::record::{read_experience_log, ExperienceRecorder};
use affect_relay::run::{RunController, RunState};
use affect_relay::{Frame, PipelineError};

fn peer_settings(port: u16, read_timeout: Duration) -> PeerSettings {
    PeerSettings {
        host: "127.0.0.1".to_string(),
        port,
        read_timeout,
        connect_timeout: Duration::from_secs(5),
    }
}

fn frame_settings(width: u32, height: u32) -> FrameSettings {
    FrameSettings {
        width,
        height,
        stride: width as usize,
    }
}

/// Gateway fake that completes the first `batches` submitted frames
/// synchronously with one scripted face each.
struct ScriptedEngine {
    batches: usize,
    completed: VecDeque<ResultBatch>,
    metrics: FaceMetrics,
}

impl ScriptedEngine {
    fn new(batches: usize, metrics: FaceMetrics) -> Self {
        Self {
            batches,
            completed: VecDeque::new(),
            metrics,
        }
    }
}

impl AnalysisEngine for ScriptedEngine {
    fn submit(&mut self, frame: Frame) -> Result<(), PipelineError> {
        if self.batches > 0 {
            self.batches -= 1;
            let mut faces = FaceMap::new();
            faces.insert(FaceId(0), self.metrics);
            self.completed.push_back(ResultBatch { frame, faces });
        }
        Ok(())
    }

    fn pending(&self) -> usize {
        self.completed.len()
    }

    fn drain(&mut self) -> Result<Option<ResultBatch>, PipelineError> {
        Ok(self.completed.pop_front())
    }

    fn is_running(&self) -> bool {
        true
    }

    fn stop(&mut self) {}
}

#[test]
fn single_frame_produces_one_document_with_scripted_metrics() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let peer = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(&vec![128u8; 640 * 480]).unwrap();
        // Orderly shutdown ends the run after the buffered bytes drain.
    });

    let mut metrics = FaceMetrics::default();
    metrics.emotions.joy = 50.0;
    metrics.head_orientation.yaw = 1.2;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("experience.json");
    let controller = RunController::new(
        TcpSource::new(
            peer_settings(port, Duration::from_secs(2)),
            &frame_settings(640, 480),
        ),
        ScriptedEngine::new(1, metrics),
        ExperienceRecorder::open(&path).unwrap(),
        Arc::new(AtomicBool::new(false)),
    );
    let summary = controller.run().unwrap();
    peer.join().unwrap();

    assert_eq!(summary.final_state, RunState::Stopped);
    assert!(summary.frames_received >= 1);
    assert_eq!(summary.batches_recorded, 1);

    let docs = read_experience_log(&path).unwrap();
    assert_eq!(docs.len(), 1);
    let person = &docs[0].persons[0];
    assert_eq!(person.id, 0);
    assert_eq!(person.emotions.joy, 50.0);
    assert_eq!(person.head_orientation.yaw, 1.2);
}

#[test]
fn silent_peer_and_quit_signal_stop_cleanly_with_empty_log() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let peer = std::thread::spawn(move || {
        // Accept and hold the connection open without sending anything.
        let (stream, _) = listener.accept().unwrap();
        std::thread::sleep(Duration::from_secs(2));
        drop(stream);
    });

    let quit = Arc::new(AtomicBool::new(false));
    let quitter = quit.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(150));
        quitter.store(true, Ordering::Relaxed);
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("experience.json");
    let controller = RunController::new(
        TcpSource::new(
            peer_settings(port, Duration::from_millis(50)),
            &frame_settings(16, 16),
        ),
        ScriptedEngine::new(0, FaceMetrics::default()),
        ExperienceRecorder::open(&path).unwrap(),
        quit,
    );
    let summary = controller.run().unwrap();
    peer.join().unwrap();

    assert_eq!(summary.final_state, RunState::Stopped);
    assert_eq!(summary.frames_received, 0);
    assert_eq!(summary.batches_recorded, 0);
    assert!(read_experience_log(&path).unwrap().is_empty());
}

struct FaultyEngine;

impl AnalysisEngine for FaultyEngine {
    fn submit(&mut self, _frame: Frame) -> Result<(), PipelineError> {
        Ok(())
    }

    fn pending(&self) -> usize {
        1
    }

    fn drain(&mut self) -> Result<Option<ResultBatch>, PipelineError> {
        Err(PipelineError::EngineRuntime("classifier fault".into()))
    }

    fn is_running(&self) -> bool {
        true
    }

    fn stop(&mut self) {}
}

#[test]
fn engine_runtime_fault_fails_the_run_without_partial_documents() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let peer = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(&[5u8; 16 * 16]).unwrap();
        std::thread::sleep(Duration::from_secs(1));
        drop(stream);
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("experience.json");
    let controller = RunController::new(
        TcpSource::new(
            peer_settings(port, Duration::from_secs(2)),
            &frame_settings(16, 16),
        ),
        FaultyEngine,
        ExperienceRecorder::open(&path).unwrap(),
        Arc::new(AtomicBool::new(false)),
    );
    let err = controller.run().unwrap_err();
    peer.join().unwrap();

    assert!(matches!(err, PipelineError::EngineRuntime(_)));
    assert!(read_experience_log(&path).unwrap().is_empty());
}

#[test]
fn worker_engine_over_stub_analyzer_records_batches() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let stop_peer = Arc::new(AtomicBool::new(false));
    let peer_stop = stop_peer.clone();
    let peer = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        while !peer_stop.load(Ordering::Relaxed) {
            if stream.write_all(&[200u8; 16 * 16]).is_err() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("experience.json");
    let quit = Arc::new(AtomicBool::new(false));
    let engine = WorkerEngine::start(Box::new(StubAnalyzer::new()), 8).unwrap();
    let controller = RunController::new(
        TcpSource::new(
            peer_settings(port, Duration::from_secs(2)),
            &frame_settings(16, 16),
        ),
        engine,
        ExperienceRecorder::open(&path).unwrap(),
        quit.clone(),
    );
    let run = std::thread::spawn(move || controller.run());

    // Wait for at least one recorded document before requesting shutdown.
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let docs = read_experience_log(&path).map(|d| d.len()).unwrap_or(0);
        if docs >= 1 {
            break;
        }
        assert!(Instant::now() < deadline, "no document recorded in time");
        std::thread::sleep(Duration::from_millis(20));
    }
    quit.store(true, Ordering::Relaxed);
    let summary = run.join().unwrap().unwrap();
    stop_peer.store(true, Ordering::Relaxed);
    peer.join().unwrap();

    assert_eq!(summary.final_state, RunState::Stopped);
    assert!(summary.batches_recorded >= 1);
    let docs = read_experience_log(&path).unwrap();
    assert_eq!(docs.len() as u64, summary.batches_recorded);
    assert_eq!(docs[0].persons.len(), 1);
}
