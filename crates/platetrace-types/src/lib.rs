//! Shared domain models for the platetrace workspace.
//!
//! This crate centralizes the lightweight data structures exchanged between
//! the video, detector, tracker, OCR, and CLI crates. Keep it backend-agnostic
//! and free of heavy dependencies so every crate can depend on it without
//! pulling native SDKs or optional features.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub type FrameResult<T> = Result<T, FrameError>;

/// Axis-aligned rectangle in frame pixel coordinates.
///
/// Coordinates satisfy `x1 < x2` and `y1 < y2` for every box produced by a
/// well-behaved collaborator; `is_valid` exists for boundary checks on data
/// that crossed a serialization seam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// True when `inner` lies strictly inside `self` on all four sides.
    /// Touching or shared edges do not count as containment.
    pub fn strictly_contains(&self, inner: &BoundingBox) -> bool {
        inner.x1 > self.x1 && inner.y1 > self.y1 && inner.x2 < self.x2 && inner.y2 < self.y2
    }

    /// Intersection-over-union with `other`; 0.0 for disjoint boxes.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let iw = (ix2 - ix1).max(0.0);
        let ih = (iy2 - iy1).max(0.0);
        let intersection = iw * ih;
        if intersection <= 0.0 {
            return 0.0;
        }
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 { 0.0 } else { intersection / union }
    }
}

/// Single detector output for one frame: box, confidence, object class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub score: f32,
    pub class_id: u32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, score: f32, class_id: u32) -> Self {
        Self {
            bbox,
            score,
            class_id,
        }
    }
}

/// Vehicle box carrying the tracker-assigned stable identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedVehicle {
    pub bbox: BoundingBox,
    pub track_id: u64,
}

/// One OCR result span for a plate crop. Geometry is carried through for
/// engines that report it; the plate reader never inspects it.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrSpan {
    pub bounds: Option<BoundingBox>,
    pub text: String,
    pub confidence: f32,
}

impl OcrSpan {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bounds: None,
            text: text.into(),
            confidence,
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// Canonical plate text accepted by the grammar, with the confidence of the
/// span it was read from. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateReading {
    pub text: String,
    pub confidence: f32,
}

/// One exported row: the accepted reading for a vehicle in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateRecord {
    pub frame_index: u64,
    pub vehicle_id: u64,
    pub plate: String,
}

/// Single-plane 8-bit grayscale frame.
///
/// The plane is shared behind an `Arc` so crops and downstream stages can hold
/// frames without copying pixel data.
#[derive(Clone)]
pub struct GrayFrame {
    width: u32,
    height: u32,
    stride: usize,
    frame_index: Option<u64>,
    timestamp: Option<Duration>,
    data: Arc<[u8]>,
}

impl fmt::Debug for GrayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrayFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("frame_index", &self.frame_index)
            .field("timestamp", &self.timestamp)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl GrayFrame {
    pub fn from_owned(
        width: u32,
        height: u32,
        stride: usize,
        timestamp: Option<Duration>,
        data: Vec<u8>,
    ) -> FrameResult<Self> {
        if stride < width as usize {
            return Err(FrameError::InvalidFrame {
                reason: format!("stride {} is smaller than width {}", stride, width),
            });
        }
        let required = stride
            .checked_mul(height as usize)
            .ok_or_else(|| FrameError::InvalidFrame {
                reason: "calculated plane length overflowed".into(),
            })?;
        if data.len() < required {
            return Err(FrameError::InvalidFrame {
                reason: format!(
                    "insufficient plane bytes: got {} expected at least {}",
                    data.len(),
                    required
                ),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            frame_index: None,
            timestamp,
            data: Arc::from(data.into_boxed_slice()),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn timestamp(&self) -> Option<Duration> {
        self.timestamp
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel row `y`, `width` bytes long. Panics when `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {} out of bounds", y);
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize]
    }

    pub fn frame_index(&self) -> Option<u64> {
        self.frame_index
    }

    pub fn with_frame_index(mut self, index: Option<u64>) -> Self {
        self.frame_index = index;
        self
    }

    pub fn set_frame_index(&mut self, index: Option<u64>) {
        self.frame_index = index;
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("backend {backend} is not supported in this build")]
    Unsupported { backend: &'static str },

    #[error("{backend} backend failed: {message}")]
    BackendFailure {
        backend: &'static str,
        message: String,
    },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    pub fn unsupported(backend: &'static str) -> Self {
        Self::Unsupported { backend }
    }

    pub fn backend_failure(backend: &'static str, message: impl Into<String>) -> Self {
        Self::BackendFailure {
            backend,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2)
    }

    #[test]
    fn strict_containment_requires_all_four_sides() {
        let outer = bbox(0.0, 0.0, 100.0, 100.0);
        assert!(outer.strictly_contains(&bbox(10.0, 10.0, 90.0, 90.0)));
        assert!(!outer.strictly_contains(&bbox(0.0, 10.0, 90.0, 90.0)));
        assert!(!outer.strictly_contains(&bbox(10.0, 10.0, 100.0, 90.0)));
        assert!(!outer.strictly_contains(&bbox(10.0, 10.0, 90.0, 110.0)));
    }

    #[test]
    fn touching_edges_do_not_contain() {
        let outer = bbox(5.0, 5.0, 50.0, 50.0);
        let touching = bbox(5.0, 10.0, 40.0, 40.0);
        assert!(!outer.strictly_contains(&touching));
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = bbox(0.0, 0.0, 10.0, 10.0);
        assert!((b.iou(&b) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let b = bbox(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn gray_frame_rejects_short_plane() {
        let err = GrayFrame::from_owned(4, 4, 4, None, vec![0; 8]);
        assert!(matches!(err, Err(FrameError::InvalidFrame { .. })));
    }

    #[test]
    fn gray_frame_row_honors_stride() {
        let mut data = vec![0u8; 6 * 2];
        data[6] = 7;
        let frame = GrayFrame::from_owned(4, 2, 6, None, data).unwrap();
        assert_eq!(frame.row(1)[0], 7);
        assert_eq!(frame.row(0).len(), 4);
    }
}
