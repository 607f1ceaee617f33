use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use crate::ObjectDetector;
use crate::error::DetectError;
use platetrace_types::{BoundingBox, Detection, GrayFrame};

/// Serves detections computed by an external model from a JSON-lines file.
/// One line per frame: `{"frame": N, "detections": [{"x1": .., "y1": ..,
/// "x2": .., "y2": .., "score": .., "class_id": ..}]}`. Frames absent from
/// the file detect nothing.
pub struct ReplayDetector {
    frames: HashMap<u64, Vec<Detection>>,
    cursor: u64,
}

#[derive(Debug, Deserialize)]
struct ReplayLine {
    frame: u64,
    #[serde(default)]
    detections: Vec<ReplayDetection>,
}

#[derive(Debug, Deserialize)]
struct ReplayDetection {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    class_id: u32,
}

impl ReplayDetector {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DetectError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DetectError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut frames: HashMap<u64, Vec<Detection>> = HashMap::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| DetectError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ReplayLine =
                serde_json::from_str(&line).map_err(|source| DetectError::Parse {
                    path: path.to_path_buf(),
                    line: number + 1,
                    source,
                })?;
            let detections = convert(path, number + 1, record.detections)?;
            frames.entry(record.frame).or_default().extend(detections);
        }

        Ok(Self { frames, cursor: 0 })
    }
}

fn convert(
    path: &Path,
    line: usize,
    raw: Vec<ReplayDetection>,
) -> Result<Vec<Detection>, DetectError> {
    let mut detections = Vec::with_capacity(raw.len());
    for entry in raw {
        let bbox = BoundingBox::new(entry.x1, entry.y1, entry.x2, entry.y2);
        if !bbox.is_valid() {
            return Err(DetectError::InvalidRecord {
                path: path.to_path_buf(),
                line,
                reason: format!(
                    "degenerate box ({}, {}, {}, {})",
                    entry.x1, entry.y1, entry.x2, entry.y2
                ),
            });
        }
        detections.push(Detection::new(bbox, entry.score, entry.class_id));
    }
    Ok(detections)
}

impl ObjectDetector for ReplayDetector {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn detect(&mut self, frame: &GrayFrame) -> Result<Vec<Detection>, DetectError> {
        let index = frame.frame_index().unwrap_or(self.cursor);
        self.cursor = index + 1;
        Ok(self.frames.get(&index).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn frame(index: u64) -> GrayFrame {
        GrayFrame::from_owned(64, 64, 64, None, vec![0; 64 * 64])
            .unwrap()
            .with_frame_index(Some(index))
    }

    fn fixture(lines: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detections.jsonl");
        let mut file = File::create(&path).unwrap();
        file.write_all(lines.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn replay_serves_detections_for_known_frames() {
        let (_dir, path) = fixture(concat!(
            r#"{"frame": 0, "detections": [{"x1": 1.0, "y1": 2.0, "x2": 30.0, "y2": 20.0, "score": 0.95, "class_id": 2}]}"#,
            "\n",
            r#"{"frame": 2, "detections": []}"#,
            "\n",
        ));
        let mut detector = ReplayDetector::from_path(&path).unwrap();

        let hit = detector.detect(&frame(0)).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].class_id, 2);
        assert!(detector.detect(&frame(1)).unwrap().is_empty());
        assert!(detector.detect(&frame(2)).unwrap().is_empty());
    }

    #[test]
    fn replay_rejects_malformed_json() {
        let (_dir, path) = fixture("{\"frame\": not-json}\n");
        assert!(matches!(
            ReplayDetector::from_path(&path),
            Err(DetectError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn replay_rejects_degenerate_boxes() {
        let (_dir, path) = fixture(concat!(
            r#"{"frame": 0, "detections": [{"x1": 10.0, "y1": 2.0, "x2": 5.0, "y2": 20.0, "score": 0.9, "class_id": 2}]}"#,
            "\n",
        ));
        assert!(matches!(
            ReplayDetector::from_path(&path),
            Err(DetectError::InvalidRecord { .. })
        ));
    }
}
