use platetrace_types::OcrSpan;

/// Everything one engine call produced for one plate crop. Span order is
/// engine-defined and meaningful: the plate reader takes the first span that
/// validates.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    pub spans: Vec<OcrSpan>,
}

impl OcrOutput {
    pub fn new(spans: Vec<OcrSpan>) -> Self {
        Self { spans }
    }

    pub fn empty() -> Self {
        Self { spans: Vec::new() }
    }
}
