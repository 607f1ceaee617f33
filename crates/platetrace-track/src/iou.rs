use crate::{TrackerConfig, VehicleTracker};
use platetrace_types::{BoundingBox, Detection, TrackedVehicle};

struct Track {
    id: u64,
    bbox: BoundingBox,
    misses: u32,
}

/// Greedy IoU tracker. Matches the highest-overlap (track, detection) pairs
/// first, lets unmatched tracks coast for a bounded number of frames, and
/// promotes unmatched detections to new tracks immediately.
pub struct IouTracker {
    config: TrackerConfig,
    tracks: Vec<Track>,
    next_id: u64,
}

impl IouTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            next_id: 1,
        }
    }
}

impl VehicleTracker for IouTracker {
    fn name(&self) -> &'static str {
        "iou"
    }

    fn update(&mut self, detections: &[Detection]) -> Vec<TrackedVehicle> {
        let mut candidates = Vec::new();
        for (track_idx, track) in self.tracks.iter().enumerate() {
            for (det_idx, detection) in detections.iter().enumerate() {
                let iou = track.bbox.iou(&detection.bbox);
                if iou >= self.config.min_iou {
                    candidates.push((iou, track_idx, det_idx));
                }
            }
        }
        // Highest overlap wins; index order breaks exact ties deterministically.
        candidates.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (a.1, a.2).cmp(&(b.1, b.2)))
        });

        let mut track_matched = vec![false; self.tracks.len()];
        let mut det_matched = vec![false; detections.len()];
        for (_, track_idx, det_idx) in candidates {
            if track_matched[track_idx] || det_matched[det_idx] {
                continue;
            }
            track_matched[track_idx] = true;
            det_matched[det_idx] = true;
            let track = &mut self.tracks[track_idx];
            track.bbox = detections[det_idx].bbox;
            track.misses = 0;
        }

        let mut visible = Vec::new();
        for (track, matched) in self.tracks.iter_mut().zip(&track_matched) {
            if *matched {
                visible.push(TrackedVehicle {
                    bbox: track.bbox,
                    track_id: track.id,
                });
            } else {
                track.misses += 1;
            }
        }

        for (detection, matched) in detections.iter().zip(&det_matched) {
            if *matched {
                continue;
            }
            let id = self.next_id;
            self.next_id += 1;
            self.tracks.push(Track {
                id,
                bbox: detection.bbox,
                misses: 0,
            });
            visible.push(TrackedVehicle {
                bbox: detection.bbox,
                track_id: id,
            });
        }

        let max_coast = self.config.max_coast_frames;
        self.tracks.retain(|track| track.misses <= max_coast);

        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection::new(BoundingBox::new(x1, y1, x2, y2), 0.9, 2)
    }

    #[test]
    fn identity_is_stable_across_small_motion() {
        let mut tracker = IouTracker::new(TrackerConfig::default());
        let first = tracker.update(&[det(100.0, 100.0, 200.0, 180.0)]);
        let second = tracker.update(&[det(108.0, 101.0, 208.0, 181.0)]);
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].track_id, second[0].track_id);
    }

    #[test]
    fn disjoint_detection_gets_a_new_identity() {
        let mut tracker = IouTracker::new(TrackerConfig::default());
        let first = tracker.update(&[det(0.0, 0.0, 50.0, 50.0)]);
        let second = tracker.update(&[det(400.0, 300.0, 500.0, 380.0)]);
        assert_ne!(first[0].track_id, second[0].track_id);
    }

    #[test]
    fn track_survives_a_short_gap() {
        let mut tracker = IouTracker::new(TrackerConfig {
            min_iou: 0.3,
            max_coast_frames: 2,
        });
        let first = tracker.update(&[det(100.0, 100.0, 200.0, 180.0)]);
        assert!(tracker.update(&[]).is_empty());
        let back = tracker.update(&[det(104.0, 100.0, 204.0, 180.0)]);
        assert_eq!(back[0].track_id, first[0].track_id);
    }

    #[test]
    fn track_is_dropped_after_max_coast_frames() {
        let mut tracker = IouTracker::new(TrackerConfig {
            min_iou: 0.3,
            max_coast_frames: 1,
        });
        let first = tracker.update(&[det(100.0, 100.0, 200.0, 180.0)]);
        tracker.update(&[]);
        tracker.update(&[]);
        let reborn = tracker.update(&[det(100.0, 100.0, 200.0, 180.0)]);
        assert_ne!(reborn[0].track_id, first[0].track_id);
    }

    #[test]
    fn two_vehicles_keep_distinct_identities() {
        let mut tracker = IouTracker::new(TrackerConfig::default());
        let frame0 = tracker.update(&[
            det(0.0, 0.0, 100.0, 80.0),
            det(300.0, 200.0, 420.0, 300.0),
        ]);
        let frame1 = tracker.update(&[
            det(305.0, 202.0, 425.0, 302.0),
            det(4.0, 1.0, 104.0, 81.0),
        ]);
        assert_eq!(frame0.len(), 2);
        assert_eq!(frame1.len(), 2);
        let find = |vehicles: &[TrackedVehicle], x: f32| {
            vehicles
                .iter()
                .find(|v| (v.bbox.x1 - x).abs() < 20.0)
                .unwrap()
                .track_id
        };
        assert_eq!(find(&frame0, 0.0), find(&frame1, 4.0));
        assert_eq!(find(&frame0, 300.0), find(&frame1, 305.0));
    }
}
