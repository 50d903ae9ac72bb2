//! The closed error taxonomy for the ingestion pipeline.
//!
//! Every variant is fatal: it unwinds to the run controller, which performs
//! the release sequence exactly once and hands the error to the caller.
//! Malformed frame data (short or over-long reads) is deliberately absent —
//! it is handled by the assembler's partial-fill policy and never becomes an
//! error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Socket create/connect/receive failure.
    #[error("connection failure: {context}: {source}")]
    Connection {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Analysis engine failed to construct or start.
    #[error("engine initialization failure: {0}")]
    EngineInit(String),

    /// Asynchronous engine failure surfaced at submit or drain.
    #[error("engine runtime failure: {0}")]
    EngineRuntime(String),

    /// Experience log open/write failure.
    #[error("experience log failure: {context}: {source}")]
    OutputIo {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn connection(context: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Connection {
            context: context.into(),
            source,
        }
    }

    pub fn output_io(context: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::OutputIo {
            context: context.into(),
            source,
        }
    }

    /// Short category label for diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Connection { .. } => "connection",
            PipelineError::EngineInit(_) => "engine-init",
            PipelineError::EngineRuntime(_) => "engine-runtime",
            PipelineError::OutputIo { .. } => "output-io",
        }
    }

    /// Per-category process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Connection { .. } => 2,
            PipelineError::EngineInit(_) => 3,
            PipelineError::EngineRuntime(_) => 4,
            PipelineError::OutputIo { .. } => 5,
        }
    }
}
