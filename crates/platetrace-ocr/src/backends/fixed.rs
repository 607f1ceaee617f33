use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::request::OcrRequest;
use crate::response::OcrOutput;
use platetrace_types::OcrSpan;

/// Returns the same spans for every crop. Pairs with the mock scene for smoke
/// runs and keeps reader tests independent of any real engine.
#[derive(Debug, Clone)]
pub struct FixedOcrEngine {
    spans: Vec<OcrSpan>,
}

impl FixedOcrEngine {
    pub fn new(spans: Vec<OcrSpan>) -> Self {
        Self { spans }
    }

    pub fn from_text(text: impl Into<String>, confidence: f32) -> Self {
        Self::new(vec![OcrSpan::new(text, confidence)])
    }
}

impl OcrEngine for FixedOcrEngine {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn recognize(&self, _: &OcrRequest<'_>) -> Result<OcrOutput, OcrError> {
        Ok(OcrOutput::new(self.spans.clone()))
    }
}
