//! Stub analyzer: deterministic single-face metrics derived from a pixel
//! digest. Keeps the full pipeline runnable without a real classifier.

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::engine::FaceAnalyzer;
use crate::frame::Frame;
use crate::metrics::{
    Appearance, Emojis, Emotions, Expressions, FaceId, FaceMap, FaceMetrics, HeadOrientation,
    Measurements,
};

pub struct StubAnalyzer;

impl StubAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceAnalyzer for StubAnalyzer {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn analyze(&mut self, frame: &Frame) -> Result<FaceMap> {
        let digest: [u8; 32] = Sha256::digest(frame.pixels()).into();
        // Digest bytes mapped onto the engine's 0..100 score scale.
        let score = |i: usize| digest[i % 32] as f32 * 100.0 / 255.0;
        // Angles on a -45..45 degree range.
        let angle = |i: usize| (digest[i % 32] as f32 - 127.5) * 45.0 / 127.5;

        let metrics = FaceMetrics {
            emotions: Emotions {
                joy: score(0),
                fear: score(1),
                disgust: score(2),
                sadness: score(3),
                anger: score(4),
                surprise: score(5),
                contempt: score(6),
                valence: score(7) - 50.0,
                engagement: score(8),
            },
            expressions: Expressions {
                smile: score(9),
                inner_brow_raise: score(10),
                brow_raise: score(11),
                brow_furrow: score(12),
                nose_wrinkle: score(13),
                upper_lip_raise: score(14),
                lip_corner_depressor: score(15),
                chin_raise: score(16),
                lip_pucker: score(17),
                lip_press: score(18),
                lip_suck: score(19),
                mouth_open: score(20),
                smirk: score(21),
                eye_closure: score(22),
                attention: score(23),
                eye_widen: score(24),
                cheek_raise: score(25),
                lid_tighten: score(26),
                dimpler: score(27),
                lip_stretch: score(28),
                jaw_drop: score(29),
            },
            emojis: Emojis {
                relaxed: score(30),
                smiley: score(31),
                laughing: score(1),
                kissing: score(3),
                disappointed: score(5),
                rage: score(7),
                smirk: score(9),
                wink: score(11),
                stuck_out_tongue_winking_eye: score(13),
                stuck_out_tongue: score(15),
                flushed: score(17),
                scream: score(19),
            },
            head_orientation: HeadOrientation {
                pitch: angle(21),
                yaw: angle(23),
                roll: angle(25),
            },
            measurements: Measurements {
                interocular_distance: 40.0 + score(27) / 2.0,
            },
            appearance: Appearance::default(),
        };

        let mut faces = FaceMap::new();
        faces.insert(FaceId(0), metrics);
        Ok(faces)
    }
}
