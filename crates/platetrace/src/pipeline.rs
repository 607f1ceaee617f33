use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::StreamExt;

use crate::associate::locate_owner;
use crate::cli::OcrEngineChoice;
use crate::progress::{ProgressEvent, build_progress, drive_progress, progress_channel_capacity};
use crate::results::{PlateLog, render_csv};
use crate::settings::{DetectorSettings, EffectiveSettings, OcrSettings};
use platetrace_detect::{
    DetectError, DetectorConfig, DetectorRole, ObjectDetector, build_detector, retain_vehicles,
};
use platetrace_ocr::{
    FixedOcrEngine, NoopOcrEngine, OcrEngine, OcrError, OcrRequest, ReplayOcrEngine,
    binarize_plate_crop,
};
use platetrace_reader::read_plate;
use platetrace_track::{IouTracker, TrackerConfig, VehicleTracker};
use platetrace_types::{FrameError, GrayFrame};
use platetrace_video::DynFrameProvider;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output: PathBuf,
    pub vehicle_detector: DetectorSettings,
    pub plate_detector: DetectorSettings,
    pub vehicle_classes: Vec<u32>,
    pub min_vehicle_score: f32,
    pub tracker: TrackerConfig,
    pub ocr: OcrSettings,
}

impl PipelineConfig {
    pub fn from_settings(settings: &EffectiveSettings) -> Self {
        Self {
            output: settings.output.clone(),
            vehicle_detector: settings.vehicle_detector.clone(),
            plate_detector: settings.plate_detector.clone(),
            vehicle_classes: settings.vehicle_classes.clone(),
            min_vehicle_score: settings.min_vehicle_score,
            tracker: settings.tracker,
            ocr: settings.ocr.clone(),
        }
    }
}

#[derive(Debug)]
pub struct PipelineSummary {
    pub frames: u64,
    pub plates: u64,
    pub output: PathBuf,
}

/// Sequential driver: detect, track, associate, read, and accumulate frame by
/// frame, then write the plate log. Returns the failure plus the number of
/// frames already processed when a collaborator faults mid-stream.
pub async fn run_pipeline(
    provider: DynFrameProvider,
    pipeline: &PipelineConfig,
) -> Result<PipelineSummary, (FrameError, u64)> {
    let total_frames = provider.total_frames();
    let mut stream = provider.into_stream();

    let mut worker = match FrameWorker::build(pipeline) {
        Ok(worker) => worker,
        Err(err) => return Err((err, 0)),
    };

    let progress = build_progress(total_frames);
    let (progress_tx, progress_rx) = mpsc::channel(progress_channel_capacity(total_frames));
    let progress_task = tokio::spawn(drive_progress(progress.clone(), progress_rx, total_frames));

    let mut log = PlateLog::new();
    let mut processed: u64 = 0;
    let mut failure: Option<FrameError> = None;

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(frame) => {
                processed = processed.saturating_add(1);
                let frame_index = frame.frame_index().unwrap_or(processed - 1);

                if let Err(err) = worker.handle_frame(&frame, frame_index, &mut log) {
                    failure = Some(err);
                    break;
                }

                let event = ProgressEvent {
                    index: processed,
                    plates: log.len() as u64,
                };
                if let Err(err) = progress_tx.try_send(event) {
                    let event = err.into_inner();
                    if progress_tx.send(event).await.is_err() {
                        break;
                    }
                }
            }
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    drop(progress_tx);
    let summary = progress_task.await.expect("progress task panicked");

    if let Some(err) = failure {
        progress.abandon_with_message(format!("failed after {} frames", summary.processed));
        return Err((err, summary.processed));
    }

    let records = log.finalize();
    let rendered = render_csv(&records);
    if let Err(err) = tokio::fs::write(&pipeline.output, rendered).await {
        progress.abandon_with_message("failed to write plate log".to_string());
        return Err((FrameError::Io(err), summary.processed));
    }

    progress.finish_with_message(format!("{} plates", records.len()));

    Ok(PipelineSummary {
        frames: summary.processed,
        plates: records.len() as u64,
        output: pipeline.output.clone(),
    })
}

/// Owns the per-run collaborators and applies the core resolution steps to
/// one frame at a time.
struct FrameWorker {
    vehicle_detector: Box<dyn ObjectDetector>,
    plate_detector: Box<dyn ObjectDetector>,
    tracker: Box<dyn VehicleTracker>,
    engine: Arc<dyn OcrEngine>,
    vehicle_classes: Vec<u32>,
    min_vehicle_score: f32,
}

impl FrameWorker {
    fn build(pipeline: &PipelineConfig) -> Result<Self, FrameError> {
        let vehicle_detector =
            build_role_detector(&pipeline.vehicle_detector, DetectorRole::Vehicle)
                .map_err(map_detect_init_error)?;
        let plate_detector = build_role_detector(&pipeline.plate_detector, DetectorRole::Plate)
            .map_err(map_detect_init_error)?;
        let tracker: Box<dyn VehicleTracker> = Box::new(IouTracker::new(pipeline.tracker));
        let engine = build_ocr_engine(&pipeline.ocr).map_err(map_ocr_init_error)?;

        Ok(Self {
            vehicle_detector,
            plate_detector,
            tracker,
            engine,
            vehicle_classes: pipeline.vehicle_classes.clone(),
            min_vehicle_score: pipeline.min_vehicle_score,
        })
    }

    fn handle_frame(
        &mut self,
        frame: &GrayFrame,
        frame_index: u64,
        log: &mut PlateLog,
    ) -> Result<(), FrameError> {
        let detections = self
            .vehicle_detector
            .detect(frame)
            .map_err(map_detect_error)?;
        let vehicles = retain_vehicles(detections, &self.vehicle_classes, self.min_vehicle_score);
        let tracked = self.tracker.update(&vehicles);

        let plates = self.plate_detector.detect(frame).map_err(map_detect_error)?;
        for plate in plates {
            let Some(owner) = locate_owner(&plate.bbox, &tracked) else {
                continue;
            };
            let Some(crop) = binarize_plate_crop(frame, &plate.bbox) else {
                continue;
            };
            let request = OcrRequest::new(&crop, frame_index);
            let output = self.engine.recognize(&request).map_err(map_ocr_error)?;
            if let Some(reading) = read_plate(&output.spans) {
                log.record(frame_index, owner.track_id, &reading);
            }
        }
        Ok(())
    }
}

fn build_role_detector(
    settings: &DetectorSettings,
    role: DetectorRole,
) -> Result<Box<dyn ObjectDetector>, DetectError> {
    let config = DetectorConfig {
        kind: settings.kind,
        role,
        replay_path: settings.detections.clone(),
    };
    build_detector(&config)
}

fn build_ocr_engine(ocr: &OcrSettings) -> Result<Arc<dyn OcrEngine>, OcrError> {
    match ocr.engine {
        OcrEngineChoice::Noop => build_noop_engine(),
        OcrEngineChoice::Fixed => build_fixed_engine(ocr),
        OcrEngineChoice::Replay => build_replay_engine(ocr),
        OcrEngineChoice::Auto => {
            if ocr.spans.is_some() {
                build_replay_engine(ocr)
            } else {
                build_noop_engine()
            }
        }
    }
}

fn build_noop_engine() -> Result<Arc<dyn OcrEngine>, OcrError> {
    let engine = NoopOcrEngine::default();
    engine.warm_up()?;
    Ok(Arc::new(engine))
}

fn build_fixed_engine(ocr: &OcrSettings) -> Result<Arc<dyn OcrEngine>, OcrError> {
    let Some(text) = ocr.fixed_text.as_ref() else {
        return Err(OcrError::backend(
            "fixed OCR engine requires configured text",
        ));
    };
    let engine = FixedOcrEngine::from_text(text.clone(), 1.0);
    engine.warm_up()?;
    Ok(Arc::new(engine))
}

fn build_replay_engine(ocr: &OcrSettings) -> Result<Arc<dyn OcrEngine>, OcrError> {
    let Some(path) = ocr.spans.as_ref() else {
        return Err(OcrError::backend("replay OCR engine requires a spans file"));
    };
    let engine = ReplayOcrEngine::from_path(path)?;
    engine.warm_up()?;
    Ok(Arc::new(engine))
}

fn map_detect_init_error(err: DetectError) -> FrameError {
    FrameError::configuration(format!("failed to initialize detector: {err}"))
}

fn map_ocr_init_error(err: OcrError) -> FrameError {
    FrameError::configuration(format!("failed to initialize OCR engine: {err}"))
}

fn map_detect_error(err: DetectError) -> FrameError {
    FrameError::backend_failure("detector", err.to_string())
}

fn map_ocr_error(err: OcrError) -> FrameError {
    FrameError::backend_failure("ocr", err.to_string())
}
