//! Object detector seam for the platetrace pipeline.
//!
//! The vehicle and plate detectors are external collaborators; this crate
//! defines the trait they are called through plus two pure-Rust backends: a
//! deterministic mock scene and a replay backend that serves detections
//! pre-computed by an external model.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

mod backends;
mod error;

pub use backends::{MockSceneDetector, ReplayDetector};
pub use error::DetectError;

use platetrace_types::{Detection, GrayFrame};

/// COCO class identities treated as vehicles: car, motorcycle, bus, truck.
pub const VEHICLE_CLASS_IDS: [u32; 4] = [2, 3, 5, 7];

/// What a detector instance is looking for. The mock backend uses this to
/// pick its script; replay files are already role-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorRole {
    Vehicle,
    Plate,
}

impl DetectorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorRole::Vehicle => "vehicle",
            DetectorRole::Plate => "plate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Mock,
    Replay,
}

impl FromStr for DetectorKind {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(DetectorKind::Mock),
            "replay" => Ok(DetectorKind::Replay),
            other => Err(DetectError::configuration(format!(
                "unknown detector kind '{other}'"
            ))),
        }
    }
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Mock => "mock",
            DetectorKind::Replay => "replay",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub kind: DetectorKind,
    pub role: DetectorRole,
    pub replay_path: Option<PathBuf>,
}

impl DetectorConfig {
    pub fn mock(role: DetectorRole) -> Self {
        Self {
            kind: DetectorKind::Mock,
            role,
            replay_path: None,
        }
    }

    pub fn replay(role: DetectorRole, path: PathBuf) -> Self {
        Self {
            kind: DetectorKind::Replay,
            role,
            replay_path: Some(path),
        }
    }
}

/// Per-frame object detector. Implementations may keep a cursor for sources
/// that do not stamp frame indices, hence `&mut self`.
pub trait ObjectDetector: Send {
    fn name(&self) -> &'static str;

    fn detect(&mut self, frame: &GrayFrame) -> Result<Vec<Detection>, DetectError>;
}

pub fn build_detector(config: &DetectorConfig) -> Result<Box<dyn ObjectDetector>, DetectError> {
    match config.kind {
        DetectorKind::Mock => Ok(Box::new(MockSceneDetector::new(config.role))),
        DetectorKind::Replay => {
            let Some(path) = config.replay_path.as_ref() else {
                return Err(DetectError::configuration(format!(
                    "replay {} detector requires a detections file",
                    config.role.as_str()
                )));
            };
            Ok(Box::new(ReplayDetector::from_path(path)?))
        }
    }
}

/// Drops detections whose class is outside the vehicle allow-list or whose
/// score is below the cutoff. Applied before the tracker sees the frame.
pub fn retain_vehicles(
    detections: Vec<Detection>,
    classes: &[u32],
    min_score: f32,
) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| classes.contains(&d.class_id) && d.score >= min_score)
        .collect()
}
