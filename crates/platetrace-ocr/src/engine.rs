use crate::error::OcrError;
use crate::request::OcrRequest;
use crate::response::OcrOutput;

/// Common interface for all OCR engines.
///
/// Engines are constructed by the caller and passed down explicitly; nothing
/// in this crate holds a process-wide instance.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn warm_up(&self) -> Result<(), OcrError> {
        Ok(())
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<OcrOutput, OcrError>;
}

/// Placeholder engine used while no real backend is wired. Reads nothing.
#[derive(Debug, Default)]
pub struct NoopOcrEngine;

impl OcrEngine for NoopOcrEngine {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn recognize(&self, _: &OcrRequest<'_>) -> Result<OcrOutput, OcrError> {
        Ok(OcrOutput::empty())
    }
}
