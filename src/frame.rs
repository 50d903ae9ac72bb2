//! Frame value types shared across the pipeline.
//!
//! `RawImage` is the assembler's unstamped product; `Frame` is the immutable,
//! timestamped value handed to the analysis engine. The engine keeps its own
//! clone of a `Frame` until the matching result batch is drained, so both
//! types are cheap plain-data values with no interior mutability.

/// Pixel layout of a frame's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    /// Single-channel intensity, one byte per pixel.
    Monochrome,
    /// Interleaved blue/green/red, three bytes per pixel.
    Bgr,
}

impl ColorFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorFormat::Monochrome => 1,
            ColorFormat::Bgr => 3,
        }
    }
}

/// An assembled-but-unstamped image.
///
/// Produced by the frame assembler, consumed by the capture clock, which
/// turns it into a `Frame`.
#[derive(Clone, Debug)]
pub struct RawImage {
    width: u32,
    height: u32,
    format: ColorFormat,
    pixels: Vec<u8>,
}

impl RawImage {
    pub fn new(width: u32, height: u32, format: ColorFormat, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * format.bytes_per_pixel()
        );
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at `(row, col)` for single-byte-per-pixel formats.
    pub fn pixel_at(&self, row: u32, col: u32) -> u8 {
        let idx =
            (row as usize * self.width as usize + col as usize) * self.format.bytes_per_pixel();
        self.pixels[idx]
    }

    pub(crate) fn into_parts(self) -> (u32, u32, ColorFormat, Vec<u8>) {
        (self.width, self.height, self.format, self.pixels)
    }
}

/// A timestamped frame, immutable once constructed.
///
/// The timestamp is seconds since process start, assigned by the capture
/// clock. Submission transfers ownership to the engine; the engine clones
/// the frame it needs to carry alongside its result.
#[derive(Clone, Debug)]
pub struct Frame {
    width: u32,
    height: u32,
    format: ColorFormat,
    pixels: Vec<u8>,
    timestamp: f32,
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        format: ColorFormat,
        pixels: Vec<u8>,
        timestamp: f32,
    ) -> Self {
        Self {
            width,
            height,
            format,
            pixels,
            timestamp,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Seconds since process start at capture time.
    pub fn timestamp(&self) -> f32 {
        self.timestamp
    }
}
