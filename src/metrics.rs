//! Per-face metric types produced by the analysis engine.
//!
//! Field names mirror the engine's wire vocabulary exactly (including the
//! lowercase `stuckOutTongue*` emoji keys). Scores are engine-defined floats
//! on a bounded scale; the pipeline passes them through without validating
//! or clamping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// Opaque face identifier assigned by the engine.
///
/// Stable for a tracked face across frames; ordering gives the deterministic
/// enumeration order used by the recorder.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct FaceId(pub u32);

/// Named emotion scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Emotions {
    pub joy: f32,
    pub fear: f32,
    pub disgust: f32,
    pub sadness: f32,
    pub anger: f32,
    pub surprise: f32,
    pub contempt: f32,
    pub valence: f32,
    pub engagement: f32,
}

/// Named emoji-likelihood scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Emojis {
    pub relaxed: f32,
    pub smiley: f32,
    pub laughing: f32,
    pub kissing: f32,
    pub disappointed: f32,
    pub rage: f32,
    pub smirk: f32,
    pub wink: f32,
    #[serde(rename = "stuckOutTongueWinkingEye")]
    pub stuck_out_tongue_winking_eye: f32,
    #[serde(rename = "stuckOutTongue")]
    pub stuck_out_tongue: f32,
    pub flushed: f32,
    pub scream: f32,
}

impl Emojis {
    /// Name of the highest-scoring emoji. Diagnostic use only; the score
    /// itself is not part of the output schema.
    pub fn dominant(&self) -> &'static str {
        let scored = [
            ("Relaxed", self.relaxed),
            ("Smiley", self.smiley),
            ("Laughing", self.laughing),
            ("Kissing", self.kissing),
            ("Disappointed", self.disappointed),
            ("Rage", self.rage),
            ("Smirk", self.smirk),
            ("Wink", self.wink),
            ("stuckOutTongueWinkingEye", self.stuck_out_tongue_winking_eye),
            ("stuckOutTongue", self.stuck_out_tongue),
            ("Flushed", self.flushed),
            ("Scream", self.scream),
        ];
        let mut best = scored[0];
        for candidate in &scored[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        best.0
    }
}

/// Named facial-expression scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Expressions {
    pub smile: f32,
    pub inner_brow_raise: f32,
    pub brow_raise: f32,
    pub brow_furrow: f32,
    pub nose_wrinkle: f32,
    pub upper_lip_raise: f32,
    pub lip_corner_depressor: f32,
    pub chin_raise: f32,
    pub lip_pucker: f32,
    pub lip_press: f32,
    pub lip_suck: f32,
    pub mouth_open: f32,
    pub smirk: f32,
    pub eye_closure: f32,
    pub attention: f32,
    pub eye_widen: f32,
    pub cheek_raise: f32,
    pub lid_tighten: f32,
    pub dimpler: f32,
    pub lip_stretch: f32,
    pub jaw_drop: f32,
}

/// Head-pose angles in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeadOrientation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Geometric measurements reported per face.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Measurements {
    pub interocular_distance: f32,
}

/// Coarse age bucket, encoded as the engine's integer code on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AgeBucket {
    #[default]
    Unknown,
    Under18,
    From18To24,
    From25To34,
    From35To44,
    From45To54,
    From55To64,
    Over65,
}

impl From<AgeBucket> for u8 {
    fn from(bucket: AgeBucket) -> u8 {
        bucket as u8
    }
}

impl TryFrom<u8> for AgeBucket {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(AgeBucket::Unknown),
            1 => Ok(AgeBucket::Under18),
            2 => Ok(AgeBucket::From18To24),
            3 => Ok(AgeBucket::From25To34),
            4 => Ok(AgeBucket::From35To44),
            5 => Ok(AgeBucket::From45To54),
            6 => Ok(AgeBucket::From55To64),
            7 => Ok(AgeBucket::Over65),
            other => Err(format!("unknown age bucket code {}", other)),
        }
    }
}

/// Coarse ethnicity bucket, encoded as the engine's integer code on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EthnicityBucket {
    #[default]
    Unknown,
    Caucasian,
    BlackAfrican,
    SouthAsian,
    EastAsian,
    Hispanic,
}

impl From<EthnicityBucket> for u8 {
    fn from(bucket: EthnicityBucket) -> u8 {
        bucket as u8
    }
}

impl TryFrom<u8> for EthnicityBucket {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(EthnicityBucket::Unknown),
            1 => Ok(EthnicityBucket::Caucasian),
            2 => Ok(EthnicityBucket::BlackAfrican),
            3 => Ok(EthnicityBucket::SouthAsian),
            4 => Ok(EthnicityBucket::EastAsian),
            5 => Ok(EthnicityBucket::Hispanic),
            other => Err(format!("unknown ethnicity bucket code {}", other)),
        }
    }
}

/// Coarse appearance attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Appearance {
    pub age: AgeBucket,
    pub ethnicity: EthnicityBucket,
}

/// Everything the engine reports for one face in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FaceMetrics {
    pub emotions: Emotions,
    pub expressions: Expressions,
    pub emojis: Emojis,
    pub head_orientation: HeadOrientation,
    pub measurements: Measurements,
    pub appearance: Appearance,
}

/// Faces in ascending-id order; the recorder relies on this ordering.
pub type FaceMap = BTreeMap<FaceId, FaceMetrics>;

/// One completed analysis: the frame plus the metrics for every face the
/// engine found in it. Produced exactly once per frame the engine finishes,
/// consumed exactly once by the recorder.
#[derive(Clone, Debug)]
pub struct ResultBatch {
    pub frame: Frame,
    pub faces: FaceMap,
}
