use std::collections::BTreeMap;
use std::fmt::Write as _;

use platetrace_types::{PlateReading, PlateRecord};

pub const CSV_HEADER: &str = "frame_number,vehicle_id,license_number";

/// Per-frame, per-vehicle accumulator for accepted plate readings.
///
/// The outer map keeps frames in ascending order; the inner vector keeps the
/// order vehicles were first recorded in within a frame. At most one record
/// exists per (frame, vehicle) pair and the first accepted reading wins —
/// later readings for the same pair in the same frame are dropped.
#[derive(Debug, Default)]
pub struct PlateLog {
    frames: BTreeMap<u64, Vec<PlateRecord>>,
    recorded: usize,
}

impl PlateLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the reading unless the (frame, vehicle) slot is already taken.
    /// Returns whether the record was inserted.
    pub fn record(&mut self, frame_index: u64, vehicle_id: u64, reading: &PlateReading) -> bool {
        let records = self.frames.entry(frame_index).or_default();
        if records.iter().any(|r| r.vehicle_id == vehicle_id) {
            return false;
        }
        records.push(PlateRecord {
            frame_index,
            vehicle_id,
            plate: reading.text.clone(),
        });
        self.recorded += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.recorded
    }

    pub fn is_empty(&self) -> bool {
        self.recorded == 0
    }

    /// Flattens the log into export order: frame-ascending, and within a
    /// frame in first-recorded order (not sorted by vehicle id).
    pub fn finalize(self) -> Vec<PlateRecord> {
        self.frames.into_values().flatten().collect()
    }
}

pub fn render_csv(records: &[PlateRecord]) -> String {
    let mut output = String::new();
    let _ = writeln!(&mut output, "{CSV_HEADER}");
    for record in records {
        let _ = writeln!(
            &mut output,
            "{},{},{}",
            record.frame_index, record.vehicle_id, record.plate
        );
    }
    output
}
