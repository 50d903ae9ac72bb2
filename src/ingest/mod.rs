//! Frame ingestion: the byte-window assembler and the TCP peer source.

mod assembler;
mod tcp;

pub use assembler::{FrameAssembler, Received};
pub use tcp::TcpSource;

use crate::error::PipelineError;

/// One-connection frame source driven by the run controller.
///
/// `receive` performs at most one blocking read bounded by the source's
/// read timeout; `close` is idempotent and safe to call from the release
/// sequence regardless of connection state.
pub trait FrameSource {
    fn connect(&mut self) -> Result<(), PipelineError>;
    fn receive(&mut self) -> Result<Received, PipelineError>;
    fn close(&mut self);
}
