use crate::error::DetectError;
use crate::{DetectorRole, ObjectDetector};
use platetrace_types::{BoundingBox, Detection, GrayFrame};

const SCENE_VEHICLES: u64 = 2;
const SCENE_CLASSES: [u32; 2] = [2, 7];

/// Deterministic scripted scene: two vehicles drifting across the frame, each
/// carrying a plate box strictly inside its own box. The same instance is
/// usable as either the vehicle or the plate detector; the role decides which
/// layer of the scene it reports.
pub struct MockSceneDetector {
    role: DetectorRole,
    cursor: u64,
}

impl MockSceneDetector {
    pub fn new(role: DetectorRole) -> Self {
        Self { role, cursor: 0 }
    }

    fn vehicle_box(frame_index: u64, lane: u64, width: f32, height: f32) -> BoundingBox {
        let w = (width * 0.34).max(8.0);
        let h = (height * 0.42).max(8.0);
        let travel = (width - w - 2.0).max(1.0);
        let x1 = 1.0 + ((frame_index * 4 + lane * 117) as f32 % travel);
        let y1 = if lane % 2 == 0 {
            height * 0.08
        } else {
            height * 0.52
        };
        BoundingBox::new(x1, y1, x1 + w, (y1 + h).min(height - 1.0))
    }

    fn plate_box(vehicle: &BoundingBox) -> BoundingBox {
        let w = vehicle.width();
        let h = vehicle.height();
        BoundingBox::new(
            vehicle.x1 + w * 0.36,
            vehicle.y1 + h * 0.72,
            vehicle.x1 + w * 0.64,
            vehicle.y1 + h * 0.88,
        )
    }
}

impl ObjectDetector for MockSceneDetector {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn detect(&mut self, frame: &GrayFrame) -> Result<Vec<Detection>, DetectError> {
        let index = frame.frame_index().unwrap_or(self.cursor);
        self.cursor = index + 1;

        let width = frame.width() as f32;
        let height = frame.height() as f32;
        let mut detections = Vec::with_capacity(SCENE_VEHICLES as usize);
        for lane in 0..SCENE_VEHICLES {
            let vehicle = Self::vehicle_box(index, lane, width, height);
            let detection = match self.role {
                DetectorRole::Vehicle => {
                    Detection::new(vehicle, 0.9, SCENE_CLASSES[lane as usize % 2])
                }
                DetectorRole::Plate => Detection::new(Self::plate_box(&vehicle), 0.8, 0),
            };
            detections.push(detection);
        }
        Ok(detections)
    }
}
