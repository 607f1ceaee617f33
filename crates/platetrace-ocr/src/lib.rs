mod backends;
mod engine;
mod error;
mod prep;
mod request;
mod response;

pub use backends::{FixedOcrEngine, ReplayOcrEngine};
pub use engine::{NoopOcrEngine, OcrEngine};
pub use error::OcrError;
pub use prep::{PLATE_BINARY_THRESHOLD, binarize_plate_crop};
pub use request::OcrRequest;
pub use response::OcrOutput;

pub use platetrace_types::OcrSpan;
