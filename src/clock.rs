//! Capture clock: per-frame timestamps and the rolling capture rate.

use std::time::Instant;

use crate::frame::{Frame, RawImage};

/// Capture rate reported before any previous frame exists.
///
/// Surfaced as-is to the caller; the value is diagnostic only and masking it
/// would hide the warm-up condition.
pub const UNDEFINED_CAPTURE_FPS: f32 = -1.0;

/// Stamps assembled images with monotonic seconds since construction and
/// tracks the instantaneous capture frame rate.
///
/// The previous-timestamp register updates exactly once per stamped frame —
/// network reads that produce no frame must not touch the clock.
pub struct CaptureClock {
    start: Instant,
    last_timestamp: f32,
}

impl CaptureClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_timestamp: UNDEFINED_CAPTURE_FPS,
        }
    }

    /// Stamp an image, producing the frame and the capture rate computed
    /// from the interval since the previous stamp.
    ///
    /// A zero interval yields an infinite rate; both that and the first-call
    /// sentinel pass through unmasked.
    pub fn stamp(&mut self, image: RawImage) -> (Frame, f32) {
        let timestamp = self.start.elapsed().as_secs_f32();
        self.stamp_at(image, timestamp)
    }

    fn stamp_at(&mut self, image: RawImage, timestamp: f32) -> (Frame, f32) {
        let capture_fps = if self.last_timestamp < 0.0 {
            UNDEFINED_CAPTURE_FPS
        } else {
            1.0 / (timestamp - self.last_timestamp)
        };
        self.last_timestamp = timestamp;
        let (width, height, format, pixels) = image.into_parts();
        (Frame::new(width, height, format, pixels, timestamp), capture_fps)
    }
}

impl Default for CaptureClock {
    fn default() -> Self {
        Self::new()
    }
}
