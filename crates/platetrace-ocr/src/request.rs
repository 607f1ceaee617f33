use platetrace_types::GrayFrame;

/// OCR invocation metadata: the prepared plate crop plus the index of the
/// frame it was cut from.
#[derive(Debug)]
pub struct OcrRequest<'a> {
    crop: &'a GrayFrame,
    frame_index: u64,
}

impl<'a> OcrRequest<'a> {
    pub fn new(crop: &'a GrayFrame, frame_index: u64) -> Self {
        Self { crop, frame_index }
    }

    pub fn crop(&self) -> &'a GrayFrame {
        self.crop
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}
