use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::request::OcrRequest;
use crate::response::OcrOutput;
use platetrace_types::OcrSpan;

/// Serves OCR spans recorded by an external engine from a JSON-lines file.
/// One line per frame: `{"frame": N, "spans": [{"text": .., "confidence":
/// ..}]}`. Frames absent from the file read as empty output.
pub struct ReplayOcrEngine {
    frames: HashMap<u64, Vec<OcrSpan>>,
}

#[derive(Debug, Deserialize)]
struct ReplayLine {
    frame: u64,
    #[serde(default)]
    spans: Vec<ReplaySpan>,
}

#[derive(Debug, Deserialize)]
struct ReplaySpan {
    text: String,
    confidence: f32,
}

impl ReplayOcrEngine {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OcrError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| OcrError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut frames: HashMap<u64, Vec<OcrSpan>> = HashMap::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| OcrError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ReplayLine =
                serde_json::from_str(&line).map_err(|source| OcrError::Parse {
                    path: path.to_path_buf(),
                    line: number + 1,
                    source,
                })?;
            let spans = record
                .spans
                .into_iter()
                .map(|span| OcrSpan::new(span.text, span.confidence));
            frames.entry(record.frame).or_default().extend(spans);
        }

        Ok(Self { frames })
    }
}

impl OcrEngine for ReplayOcrEngine {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<OcrOutput, OcrError> {
        let spans = self
            .frames
            .get(&request.frame_index())
            .cloned()
            .unwrap_or_default();
        Ok(OcrOutput::new(spans))
    }
}
