//! affect-relay
//!
//! A client for a remote frame source: it receives raw grayscale image
//! buffers over one TCP connection, reconstructs and timestamps frames,
//! hands them to an asynchronous face-analysis engine, and appends the
//! engine's per-face metrics to an append-only experience log of
//! back-to-back JSON documents.
//!
//! # Module Structure
//!
//! - `ingest`: frame assembly from the byte stream and the TCP peer source
//! - `clock`: monotonic per-frame timestamps and the capture rate
//! - `engine`: the analysis gateway trait, worker adapter, and stub backend
//! - `record`: the output document schema and the append-only recorder
//! - `run`: the controller state machine driving the ingestion loop
//! - `metrics` / `frame`: the data model shared across the pipeline
//! - `config` / `error` / `display`: configuration, the closed error
//!   taxonomy, and the optional render seam

pub mod clock;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod metrics;
pub mod record;
pub mod run;

pub use clock::CaptureClock;
pub use config::RelayConfig;
pub use engine::{build_analyzer, AnalysisEngine, FaceAnalyzer, StubAnalyzer, WorkerEngine};
pub use error::PipelineError;
pub use frame::{ColorFormat, Frame, RawImage};
pub use ingest::{FrameAssembler, FrameSource, Received, TcpSource};
pub use metrics::{FaceId, FaceMap, FaceMetrics, ResultBatch};
pub use record::{ExperienceDocument, ExperienceRecorder};
pub use run::{RunController, RunState, RunSummary};
