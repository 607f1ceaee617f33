//! Multi-object tracking seam.
//!
//! Track identity continuity is entirely the tracker's responsibility; the
//! rest of the pipeline treats identities as opaque stable integers. The
//! built-in implementation is a greedy IoU matcher; anything smarter (Kalman
//! prediction, appearance features) plugs in behind the same trait.

mod iou;

pub use iou::IouTracker;

use platetrace_types::{Detection, TrackedVehicle};

#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// Minimum IoU to match a detection to an existing track.
    pub min_iou: f32,
    /// Frames a track survives without a detection before deletion.
    pub max_coast_frames: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_iou: 0.3,
            max_coast_frames: 5,
        }
    }
}

/// Consumes one frame's vehicle detections, returns the tracked vehicles
/// visible in that frame with their stable identities.
pub trait VehicleTracker: Send {
    fn name(&self) -> &'static str;

    fn update(&mut self, detections: &[Detection]) -> Vec<TrackedVehicle>;
}
