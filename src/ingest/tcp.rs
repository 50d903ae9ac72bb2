//! TCP peer source.
//!
//! Single-connection client socket: connect with a bounded timeout, bound
//! every read with the configured read timeout, delegate reconstruction to
//! the assembler. No reconnect logic; a lost peer ends the run.

use std::net::{TcpStream, ToSocketAddrs};

use crate::config::{FrameSettings, PeerSettings};
use crate::error::PipelineError;
use crate::ingest::{FrameAssembler, FrameSource, Received};

pub struct TcpSource {
    peer: PeerSettings,
    assembler: FrameAssembler,
    stream: Option<TcpStream>,
}

impl TcpSource {
    pub fn new(peer: PeerSettings, frame: &FrameSettings) -> Self {
        Self {
            peer,
            assembler: FrameAssembler::new(frame.width, frame.height, frame.stride),
            stream: None,
        }
    }

    fn resolve(&self) -> Result<std::net::SocketAddr, PipelineError> {
        let target = format!("{}:{}", self.peer.host, self.peer.port);
        target
            .to_socket_addrs()
            .map_err(|e| PipelineError::connection(format!("resolve {}", target), e))?
            .next()
            .ok_or_else(|| {
                PipelineError::connection(
                    format!("resolve {}", target),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no address for peer"),
                )
            })
    }
}

impl FrameSource for TcpSource {
    fn connect(&mut self) -> Result<(), PipelineError> {
        let addr = self.resolve()?;
        let stream = TcpStream::connect_timeout(&addr, self.peer.connect_timeout)
            .map_err(|e| PipelineError::connection(format!("connect to {}", addr), e))?;
        stream
            .set_read_timeout(Some(self.peer.read_timeout))
            .map_err(|e| PipelineError::connection("set read timeout", e))?;
        log::info!(
            "connected to frame peer {} (read timeout {:?})",
            addr,
            self.peer.read_timeout
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn receive(&mut self) -> Result<Received, PipelineError> {
        let stream = self.stream.as_mut().ok_or_else(|| {
            PipelineError::connection(
                "receive",
                std::io::Error::new(std::io::ErrorKind::NotConnected, "source not connected"),
            )
        })?;
        self.assembler
            .receive(stream)
            .map_err(|e| PipelineError::connection("receive frame bytes", e))
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
            log::debug!("frame peer connection closed");
        }
    }
}

impl Drop for TcpSource {
    fn drop(&mut self) {
        self.close();
    }
}
