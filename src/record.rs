//! Experience log: the output document schema and the append-only recorder.
//!
//! One JSON document is appended per drained result batch, back-to-back
//! with no separator. `Person` is a JSON array with one element per face in
//! ascending id order. (The upstream client emitted repeated sibling
//! `Person` keys, which strict JSON parsers collapse to the last face; the
//! array keeps every face representable.)
//!
//! A document is fully serialized in memory before the single append write,
//! so a failed batch never leaves a partial document in the log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::metrics::{
    AgeBucket, Emojis, Emotions, EthnicityBucket, Expressions, HeadOrientation, ResultBatch,
};

/// One face inside an experience document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersonRecord {
    #[serde(rename = "Id")]
    pub id: u32,
    #[serde(rename = "Age")]
    pub age: AgeBucket,
    #[serde(rename = "InterocularDistance")]
    pub interocular_distance: f32,
    #[serde(rename = "Ethnicity")]
    pub ethnicity: EthnicityBucket,
    #[serde(rename = "HeadOrientation")]
    pub head_orientation: HeadOrientation,
    #[serde(rename = "Emotions")]
    pub emotions: Emotions,
    #[serde(rename = "Emojis")]
    pub emojis: Emojis,
    #[serde(rename = "Expressions")]
    pub expressions: Expressions,
}

/// One appended document: the frame's experience timestamp, the local
/// wall-clock time at write, and every face of the batch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperienceDocument {
    #[serde(rename = "Timestamp_experience")]
    pub timestamp_experience: f32,
    #[serde(rename = "Timestamp_local")]
    pub timestamp_local: String,
    #[serde(rename = "Person")]
    pub persons: Vec<PersonRecord>,
}

impl ExperienceDocument {
    /// Build the document for a batch. Metric values copy verbatim; faces
    /// enumerate in ascending id order.
    pub fn from_batch(batch: &ResultBatch) -> Self {
        let persons = batch
            .faces
            .iter()
            .map(|(id, metrics)| PersonRecord {
                id: id.0,
                age: metrics.appearance.age,
                interocular_distance: metrics.measurements.interocular_distance,
                ethnicity: metrics.appearance.ethnicity,
                head_orientation: metrics.head_orientation,
                emotions: metrics.emotions,
                emojis: metrics.emojis,
                expressions: metrics.expressions,
            })
            .collect();
        Self {
            timestamp_experience: batch.frame.timestamp(),
            timestamp_local: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            persons,
        }
    }
}

/// Append-only writer for the experience log.
///
/// Owns the file handle for the whole run; the handle is released on drop
/// on every exit path. The log only ever grows.
pub struct ExperienceRecorder {
    file: File,
    path: PathBuf,
    records_written: u64,
}

impl ExperienceRecorder {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| PipelineError::output_io(format!("open {}", path.display()), e))?;
        log::info!("experience log: {}", path.display());
        Ok(Self {
            file,
            path,
            records_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Serialize the batch's document and append it in one write.
    pub fn record(&mut self, batch: &ResultBatch) -> Result<(), PipelineError> {
        let document = ExperienceDocument::from_batch(batch);
        let bytes = serde_json::to_vec(&document).map_err(|e| {
            PipelineError::output_io("serialize document", std::io::Error::other(e))
        })?;
        self.file
            .write_all(&bytes)
            .and_then(|_| self.file.flush())
            .map_err(|e| PipelineError::output_io(format!("append {}", self.path.display()), e))?;
        self.records_written += 1;
        Ok(())
    }
}

/// Parse a log of back-to-back documents. Shared by `experience_dump` and
/// the integration tests.
pub fn read_experience_log(path: impl AsRef<Path>) -> Result<Vec<ExperienceDocument>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("open experience log {}", path.display()))?;
    let mut documents = Vec::new();
    for (index, entry) in serde_json::Deserializer::from_reader(std::io::BufReader::new(file))
        .into_iter::<ExperienceDocument>()
        .enumerate()
    {
        let doc =
            entry.with_context(|| format!("document {} in {}", index, path.display()))?;
        documents.push(doc);
    }
    Ok(documents)
}

/// Default log path when none is configured: `experience_<timestamp>.json`.
pub fn default_output_path() -> PathBuf {
    PathBuf::from(format!(
        "experience_{}.json",
        Local::now().format("%Y%m%dT%H%M%S")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ColorFormat, Frame};
    use crate::metrics::{FaceId, FaceMap, FaceMetrics};

    fn batch(face_ids: &[u32], timestamp: f32) -> ResultBatch {
        let mut faces = FaceMap::new();
        for id in face_ids {
            let mut metrics = FaceMetrics::default();
            metrics.emotions.joy = *id as f32 + 0.25;
            metrics.head_orientation.yaw = -(*id as f32);
            faces.insert(FaceId(*id), metrics);
        }
        ResultBatch {
            frame: Frame::new(2, 2, ColorFormat::Monochrome, vec![0; 4], timestamp),
            faces,
        }
    }

    #[test]
    fn one_person_entry_per_face() {
        let doc = ExperienceDocument::from_batch(&batch(&[0, 1, 2], 1.0));
        assert_eq!(doc.persons.len(), 3);
        let empty = ExperienceDocument::from_batch(&batch(&[], 1.0));
        assert!(empty.persons.is_empty());
    }

    #[test]
    fn sparse_ids_enumerate_ascending_and_keep_their_own_id() {
        let doc = ExperienceDocument::from_batch(&batch(&[9, 2, 5], 1.0));
        let ids: Vec<u32> = doc.persons.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn serialized_document_round_trips_exactly() {
        let doc = ExperienceDocument::from_batch(&batch(&[0, 4], 2.5));
        let json = serde_json::to_string(&doc).unwrap();
        let back: ExperienceDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp_experience, 2.5);
        assert_eq!(back.persons.len(), 2);
        assert_eq!(back.persons[0].emotions.joy, 0.25);
        assert_eq!(back.persons[1].emotions.joy, 4.25);
        assert_eq!(back.persons[1].head_orientation.yaw, -4.0);
    }

    #[test]
    fn appended_documents_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experience.json");
        let mut recorder = ExperienceRecorder::open(&path).unwrap();
        recorder.record(&batch(&[0], 0.1)).unwrap();
        recorder.record(&batch(&[0, 1], 0.2)).unwrap();
        assert_eq!(recorder.records_written(), 2);
        drop(recorder);

        let docs = read_experience_log(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].persons.len(), 1);
        assert_eq!(docs[1].persons.len(), 2);

        // No separator between documents.
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("}\n{"));
        assert!(raw.starts_with('{') && raw.ends_with('}'));
    }

    #[test]
    fn documents_use_the_wire_field_names() {
        let doc = ExperienceDocument::from_batch(&batch(&[0], 1.0));
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("Timestamp_experience").is_some());
        assert!(value.get("Timestamp_local").is_some());
        let person = &value["Person"][0];
        assert!(person.get("InterocularDistance").is_some());
        assert!(person["Emojis"].get("stuckOutTongue").is_some());
        assert!(person["Expressions"].get("LipCornerDepressor").is_some());
        assert!(person["HeadOrientation"].get("Pitch").is_some());
    }
}
