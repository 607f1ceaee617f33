use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use platetrace::cli::OcrEngineChoice;
use platetrace::pipeline::{PipelineConfig, run_pipeline};
use platetrace::settings::{DetectorSettings, OcrSettings};
use platetrace_detect::{DetectorKind, VEHICLE_CLASS_IDS};
use platetrace_track::TrackerConfig;
use platetrace_video::{Backend, Configuration};

fn write_jsonl(path: &Path, lines: &[serde_json::Value]) {
    let mut contents = String::new();
    for line in lines {
        contents.push_str(&line.to_string());
        contents.push('\n');
    }
    fs::write(path, contents).unwrap();
}

fn replay_pipeline(
    vehicle_path: PathBuf,
    plate_path: PathBuf,
    spans_path: PathBuf,
    output: PathBuf,
) -> PipelineConfig {
    PipelineConfig {
        output,
        vehicle_detector: DetectorSettings {
            kind: DetectorKind::Replay,
            detections: Some(vehicle_path),
        },
        plate_detector: DetectorSettings {
            kind: DetectorKind::Replay,
            detections: Some(plate_path),
        },
        vehicle_classes: VEHICLE_CLASS_IDS.to_vec(),
        min_vehicle_score: 0.25,
        tracker: TrackerConfig::default(),
        ocr: OcrSettings {
            engine: OcrEngineChoice::Auto,
            spans: Some(spans_path),
            fixed_text: None,
        },
    }
}

fn mock_provider(frames: u64) -> platetrace_video::DynFrameProvider {
    let mut config = Configuration::default();
    config.backend = Backend::Mock;
    config.frame_limit = Some(frames);
    config.create_provider().unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn two_frame_run_exports_exactly_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let vehicle_path = dir.path().join("vehicles.jsonl");
    let plate_path = dir.path().join("plates.jsonl");
    let spans_path = dir.path().join("spans.jsonl");
    let output = dir.path().join("plates.csv");

    // One vehicle visible in both frames, drifting slightly so the tracker
    // keeps a single identity.
    write_jsonl(
        &vehicle_path,
        &[
            json!({"frame": 0, "detections": [
                {"x1": 100.0, "y1": 100.0, "x2": 400.0, "y2": 300.0, "score": 0.92, "class_id": 2}
            ]}),
            json!({"frame": 1, "detections": [
                {"x1": 104.0, "y1": 100.0, "x2": 404.0, "y2": 300.0, "score": 0.93, "class_id": 2}
            ]}),
        ],
    );
    write_jsonl(
        &plate_path,
        &[
            json!({"frame": 0, "detections": [
                {"x1": 200.0, "y1": 220.0, "x2": 300.0, "y2": 260.0, "score": 0.8, "class_id": 0}
            ]}),
            json!({"frame": 1, "detections": [
                {"x1": 204.0, "y1": 220.0, "x2": 304.0, "y2": 260.0, "score": 0.8, "class_id": 0}
            ]}),
        ],
    );
    // Frame 0 reads on the second span; frame 1 never validates.
    write_jsonl(
        &spans_path,
        &[
            json!({"frame": 0, "spans": [
                {"text": "AB12CD", "confidence": 0.93},
                {"text": "ab12 cde", "confidence": 0.77}
            ]}),
            json!({"frame": 1, "spans": [{"text": "???????", "confidence": 0.99}]}),
        ],
    );

    let pipeline = replay_pipeline(vehicle_path, plate_path, spans_path, output.clone());
    let summary = run_pipeline(mock_provider(2), &pipeline).await.unwrap();
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.plates, 1);

    let contents = fs::read_to_string(&output).unwrap();
    assert_eq!(
        contents,
        "frame_number,vehicle_id,license_number\n0,1,AB12CDE\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unassociated_plates_produce_no_rows() {
    let dir = tempfile::tempdir().unwrap();
    let vehicle_path = dir.path().join("vehicles.jsonl");
    let plate_path = dir.path().join("plates.jsonl");
    let spans_path = dir.path().join("spans.jsonl");
    let output = dir.path().join("plates.csv");

    write_jsonl(
        &vehicle_path,
        &[json!({"frame": 0, "detections": [
            {"x1": 10.0, "y1": 10.0, "x2": 120.0, "y2": 90.0, "score": 0.9, "class_id": 2}
        ]})],
    );
    // Plate far outside the only vehicle; the reading would validate if it
    // were ever consulted.
    write_jsonl(
        &plate_path,
        &[json!({"frame": 0, "detections": [
            {"x1": 400.0, "y1": 200.0, "x2": 500.0, "y2": 240.0, "score": 0.8, "class_id": 0}
        ]})],
    );
    write_jsonl(
        &spans_path,
        &[json!({"frame": 0, "spans": [{"text": "AB12CDE", "confidence": 0.95}]})],
    );

    let pipeline = replay_pipeline(vehicle_path, plate_path, spans_path, output.clone());
    let summary = run_pipeline(mock_provider(1), &pipeline).await.unwrap();
    assert_eq!(summary.plates, 0);

    let contents = fs::read_to_string(&output).unwrap();
    assert_eq!(contents, "frame_number,vehicle_id,license_number\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn output_file_is_overwritten_not_appended() {
    let dir = tempfile::tempdir().unwrap();
    let vehicle_path = dir.path().join("vehicles.jsonl");
    let plate_path = dir.path().join("plates.jsonl");
    let spans_path = dir.path().join("spans.jsonl");
    let output = dir.path().join("plates.csv");

    fs::write(&output, "stale contents from an earlier run\nrow,row,row\n").unwrap();

    write_jsonl(&vehicle_path, &[]);
    write_jsonl(&plate_path, &[]);
    write_jsonl(&spans_path, &[]);

    let pipeline = replay_pipeline(vehicle_path, plate_path, spans_path, output.clone());
    run_pipeline(mock_provider(1), &pipeline).await.unwrap();

    let contents = fs::read_to_string(&output).unwrap();
    assert_eq!(contents, "frame_number,vehicle_id,license_number\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn low_score_vehicles_never_reach_the_tracker() {
    let dir = tempfile::tempdir().unwrap();
    let vehicle_path = dir.path().join("vehicles.jsonl");
    let plate_path = dir.path().join("plates.jsonl");
    let spans_path = dir.path().join("spans.jsonl");
    let output = dir.path().join("plates.csv");

    // The only vehicle is below the score cutoff, so its plate has no owner.
    write_jsonl(
        &vehicle_path,
        &[json!({"frame": 0, "detections": [
            {"x1": 100.0, "y1": 100.0, "x2": 400.0, "y2": 300.0, "score": 0.1, "class_id": 2}
        ]})],
    );
    write_jsonl(
        &plate_path,
        &[json!({"frame": 0, "detections": [
            {"x1": 200.0, "y1": 220.0, "x2": 300.0, "y2": 260.0, "score": 0.8, "class_id": 0}
        ]})],
    );
    write_jsonl(
        &spans_path,
        &[json!({"frame": 0, "spans": [{"text": "AB12CDE", "confidence": 0.95}]})],
    );

    let pipeline = replay_pipeline(vehicle_path, plate_path, spans_path, output.clone());
    let summary = run_pipeline(mock_provider(1), &pipeline).await.unwrap();
    assert_eq!(summary.plates, 0);
}
