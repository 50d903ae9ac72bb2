//! Frame reconstruction from the raw byte stream.
//!
//! The peer sends unframed single-channel intensity bytes; frame boundaries
//! are inferred purely from the configured width and height. The assembler
//! owns one fixed-capacity scratch window, reused (never reallocated) across
//! iterations; each read overwrites only the prefix it filled.
//!
//! Staleness contract: a short read leaves the tail of the window untouched,
//! so rows below the filled region carry the previous iteration's pixels.
//! That partial-fill behavior is deliberate and covered by tests, not an
//! error condition — the loop keeps running and the next full read heals the
//! image.

use std::io::{ErrorKind, Read};

use crate::frame::{ColorFormat, RawImage};

/// Floor on the scratch window size; matches the largest single receive the
/// peer protocol is expected to produce.
const WINDOW_BYTES: usize = 1_000_000;

/// Outcome of one receive attempt.
#[derive(Debug)]
pub enum Received {
    /// A read returned data; the window was reinterpreted as a frame.
    Image(RawImage),
    /// The read timed out; no new frame this iteration.
    NoData,
    /// The peer performed an orderly shutdown.
    Closed,
}

/// Rebuilds fixed-geometry monochrome images from a byte stream.
pub struct FrameAssembler {
    width: u32,
    height: u32,
    stride: usize,
    format: ColorFormat,
    window: Vec<u8>,
}

impl FrameAssembler {
    /// `stride` is the source row stride in bytes and must be >= `width`;
    /// callers validate geometry before construction.
    pub fn new(width: u32, height: u32, stride: usize) -> Self {
        debug_assert!(stride >= width as usize);
        let span = stride * height as usize;
        Self {
            width,
            height,
            stride,
            format: ColorFormat::Monochrome,
            window: vec![0u8; WINDOW_BYTES.max(span)],
        }
    }

    /// Perform one read from `conn` and, if it produced bytes, reinterpret
    /// the window as a row-major pixel grid.
    ///
    /// The read length is not validated against `width * height`: a short
    /// read produces a partially-stale image per the module contract, and
    /// surplus bytes beyond the grid are ignored.
    pub fn receive(&mut self, conn: &mut dyn Read) -> std::io::Result<Received> {
        let read = match conn.read(&mut self.window) {
            Ok(0) => return Ok(Received::Closed),
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Ok(Received::NoData)
            }
            Err(e) => return Err(e),
        };
        log::trace!(
            "received {} bytes ({} expected for a full frame)",
            read,
            self.width as usize * self.height as usize
        );
        Ok(Received::Image(self.assemble()))
    }

    fn assemble(&self) -> RawImage {
        let width = self.width as usize;
        let height = self.height as usize;
        let mut pixels = vec![0u8; width * height];
        for row in 0..height {
            let src = row * self.stride;
            let dst = row * width;
            pixels[dst..dst + width].copy_from_slice(&self.window[src..src + width]);
        }
        RawImage::new(self.width, self.height, self.format, pixels)
    }
}
