use platetrace_types::{BoundingBox, GrayFrame};

/// Gray level above which a pixel is considered background. Plate glyphs are
/// darker than the plate surface, so the threshold is inverted: anything at
/// or below the cutoff becomes foreground white.
pub const PLATE_BINARY_THRESHOLD: u8 = 64;

/// Cuts the plate region out of `frame` and applies the inverted binary
/// threshold expected by OCR engines trained on black-on-white glyphs.
///
/// The box is clamped to the frame bounds; a box whose clamped intersection
/// with the frame is empty yields `None` and the plate is skipped upstream.
pub fn binarize_plate_crop(frame: &GrayFrame, plate: &BoundingBox) -> Option<GrayFrame> {
    let frame_w = frame.width() as f32;
    let frame_h = frame.height() as f32;

    let left = plate.x1.floor().clamp(0.0, frame_w) as u32;
    let top = plate.y1.floor().clamp(0.0, frame_h) as u32;
    let right = plate.x2.ceil().clamp(0.0, frame_w) as u32;
    let bottom = plate.y2.ceil().clamp(0.0, frame_h) as u32;
    if right <= left || bottom <= top {
        return None;
    }

    let width = (right - left) as usize;
    let mut data = Vec::with_capacity(width * (bottom - top) as usize);
    for y in top..bottom {
        let row = frame.row(y);
        for &value in &row[left as usize..right as usize] {
            data.push(if value > PLATE_BINARY_THRESHOLD { 0 } else { 255 });
        }
    }

    GrayFrame::from_owned(right - left, bottom - top, width, frame.timestamp(), data)
        .ok()
        .map(|crop| crop.with_frame_index(frame.frame_index()))
}
