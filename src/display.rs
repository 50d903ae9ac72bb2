//! Display seam for drained batches.
//!
//! Rendering is an external collaborator; the pipeline only defines the
//! seam and a logging implementation. Disabled by default.

use crate::frame::Frame;
use crate::metrics::FaceMap;

/// Receives `(faces, frame)` for rendering. No return value is observed by
/// the pipeline.
pub trait MetricsDisplay: Send {
    fn render(&mut self, faces: &FaceMap, frame: &Frame);
}

/// Logs a per-face summary instead of drawing anything.
pub struct LogDisplay;

impl MetricsDisplay for LogDisplay {
    fn render(&mut self, faces: &FaceMap, frame: &Frame) {
        for (id, metrics) in faces {
            log::info!(
                "t={:.2}s face {}: joy={:.2} valence={:.2} yaw={:.2} emoji={}",
                frame.timestamp(),
                id.0,
                metrics.emotions.joy,
                metrics.emotions.valence,
                metrics.head_orientation.yaw,
                metrics.emojis.dominant()
            );
        }
    }
}
