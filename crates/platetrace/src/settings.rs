use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::cli::{CliArgs, CliSources, DetectorChoice, OcrEngineChoice};
use platetrace_detect::{DetectorKind, VEHICLE_CLASS_IDS};
use platetrace_track::TrackerConfig;

const DEFAULT_OUTPUT: &str = "plates.csv";
const PROJECT_CONFIG: &str = "platetrace.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    backend: Option<String>,
    input: Option<String>,
    output: Option<String>,
    frame_width: Option<u32>,
    frame_height: Option<u32>,
    frame_limit: Option<u64>,
    channel_capacity: Option<usize>,
    min_vehicle_score: Option<f32>,
    vehicle_classes: Option<Vec<u32>>,
    vehicle_detector: Option<DetectorFileConfig>,
    plate_detector: Option<DetectorFileConfig>,
    tracker: Option<TrackerFileConfig>,
    ocr: Option<OcrFileConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct DetectorFileConfig {
    kind: Option<String>,
    detections: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct TrackerFileConfig {
    min_iou: Option<f32>,
    max_coast_frames: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct OcrFileConfig {
    engine: Option<String>,
    spans: Option<String>,
    fixed_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub kind: DetectorKind,
    pub detections: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OcrSettings {
    pub engine: OcrEngineChoice,
    pub spans: Option<PathBuf>,
    pub fixed_text: Option<String>,
}

#[derive(Debug)]
pub struct EffectiveSettings {
    pub backend: Option<String>,
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub frame_size: Option<(u32, u32)>,
    pub frame_limit: Option<u64>,
    pub channel_capacity: Option<usize>,
    pub min_vehicle_score: f32,
    pub vehicle_classes: Vec<u32>,
    pub vehicle_detector: DetectorSettings,
    pub plate_detector: DetectorSettings,
    pub tracker: TrackerConfig,
    pub ocr: OcrSettings,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    NotFound {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::NotFound { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = path.to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        let config = read_config(&path)?;
        return Ok((config, Some(path)));
    }

    let project_path = PathBuf::from(PROJECT_CONFIG);
    if project_path.exists() {
        let config = read_config(&project_path)?;
        return Ok((config, Some(project_path)));
    }

    let Some(default_path) = default_config_path() else {
        return Ok((FileConfig::default(), None));
    };
    if !default_path.exists() {
        return Ok((FileConfig::default(), None));
    }
    let config = read_config(&default_path)?;
    Ok((config, Some(default_path)))
}

fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "platetrace").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));

    let mut backend = normalize_string(cli.backend.clone());
    if backend.is_none() {
        backend = normalize_string(file.backend);
    }

    let input = cli.input.clone().or_else(|| {
        normalize_string(file.input)
            .map(|value| resolve_path_from_config(value, config_dir.as_deref()))
    });

    let output = cli
        .output
        .clone()
        .or_else(|| {
            normalize_string(file.output)
                .map(|value| resolve_path_from_config(value, config_dir.as_deref()))
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let frame_width = cli.frame_width.or(file.frame_width);
    let frame_height = cli.frame_height.or(file.frame_height);
    let frame_size = match (frame_width, frame_height) {
        (Some(width), Some(height)) => Some((width, height)),
        (None, None) => None,
        _ => {
            return Err(ConfigError::InvalidValue {
                path: config_path,
                field: "frame_size",
                value: "frame width and height must be set together".into(),
            });
        }
    };

    let mut min_vehicle_score = cli.min_vehicle_score;
    if !sources.min_vehicle_score_from_cli {
        if let Some(value) = file.min_vehicle_score {
            min_vehicle_score = value;
        }
    }

    let mut vehicle_classes = cli.vehicle_classes.clone();
    if !sources.vehicle_classes_from_cli || vehicle_classes.is_empty() {
        if let Some(values) = file.vehicle_classes {
            vehicle_classes = values;
        }
    }
    if vehicle_classes.is_empty() {
        vehicle_classes = VEHICLE_CLASS_IDS.to_vec();
    }

    let vehicle_detector = merge_detector(
        cli.vehicle_detector,
        cli.vehicle_detections.clone(),
        file.vehicle_detector,
        config_path.as_ref(),
        config_dir.as_deref(),
        "vehicle_detector.kind",
    )?;
    let plate_detector = merge_detector(
        cli.plate_detector,
        cli.plate_detections.clone(),
        file.plate_detector,
        config_path.as_ref(),
        config_dir.as_deref(),
        "plate_detector.kind",
    )?;

    let tracker_defaults = TrackerConfig::default();
    let file_tracker = file.tracker.unwrap_or_default();
    let tracker = TrackerConfig {
        min_iou: cli
            .tracker_min_iou
            .or(file_tracker.min_iou)
            .unwrap_or(tracker_defaults.min_iou),
        max_coast_frames: cli
            .tracker_max_coast
            .or(file_tracker.max_coast_frames)
            .unwrap_or(tracker_defaults.max_coast_frames),
    };

    let file_ocr = file.ocr.unwrap_or_default();
    let mut ocr_engine = cli.ocr_engine;
    if !sources.ocr_engine_from_cli {
        if let Some(name) = normalize_string(file_ocr.engine) {
            ocr_engine = parse_ocr_engine(&name, config_path.as_ref())?;
        }
    }
    let ocr_spans = cli.ocr_spans.clone().or_else(|| {
        normalize_string(file_ocr.spans)
            .map(|value| resolve_path_from_config(value, config_dir.as_deref()))
    });
    let ocr_fixed_text = normalize_string(cli.ocr_fixed_text.clone())
        .or_else(|| normalize_string(file_ocr.fixed_text));

    Ok(EffectiveSettings {
        backend,
        input,
        output,
        frame_size,
        frame_limit: cli.frame_limit.or(file.frame_limit),
        channel_capacity: cli.channel_capacity.or(file.channel_capacity),
        min_vehicle_score,
        vehicle_classes,
        vehicle_detector,
        plate_detector,
        tracker,
        ocr: OcrSettings {
            engine: ocr_engine,
            spans: ocr_spans,
            fixed_text: ocr_fixed_text,
        },
    })
}

fn merge_detector(
    cli_choice: Option<DetectorChoice>,
    cli_detections: Option<PathBuf>,
    file: Option<DetectorFileConfig>,
    config_path: Option<&PathBuf>,
    config_dir: Option<&Path>,
    field: &'static str,
) -> Result<DetectorSettings, ConfigError> {
    let file = file.unwrap_or_default();

    let kind = match cli_choice {
        Some(DetectorChoice::Mock) => DetectorKind::Mock,
        Some(DetectorChoice::Replay) => DetectorKind::Replay,
        None => match normalize_string(file.kind) {
            Some(name) => name.parse().map_err(|_| ConfigError::InvalidValue {
                path: config_path.cloned(),
                field,
                value: name.clone(),
            })?,
            // A configured detections file implies replay without further
            // ceremony; otherwise fall back to the mock scene.
            None if cli_detections.is_some() || file.detections.is_some() => DetectorKind::Replay,
            None => DetectorKind::Mock,
        },
    };

    let detections = cli_detections.or_else(|| {
        normalize_string(file.detections)
            .map(|value| resolve_path_from_config(value, config_dir))
    });

    Ok(DetectorSettings { kind, detections })
}

fn parse_ocr_engine(
    name: &str,
    config_path: Option<&PathBuf>,
) -> Result<OcrEngineChoice, ConfigError> {
    match name.to_ascii_lowercase().as_str() {
        "auto" => Ok(OcrEngineChoice::Auto),
        "noop" => Ok(OcrEngineChoice::Noop),
        "fixed" => Ok(OcrEngineChoice::Fixed),
        "replay" => Ok(OcrEngineChoice::Replay),
        other => Err(ConfigError::InvalidValue {
            path: config_path.cloned(),
            field: "ocr.engine",
            value: other.to_string(),
        }),
    }
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    })
}

fn resolve_path_from_config(value: String, config_dir: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        return path;
    }
    match config_dir {
        Some(dir) => dir.join(path),
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("platetrace").chain(argv.iter().copied()))
    }

    #[test]
    fn defaults_fill_unset_fields() {
        let settings = merge(
            &args(&[]),
            &CliSources::default(),
            FileConfig::default(),
            None,
        )
        .unwrap();
        assert_eq!(settings.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(settings.vehicle_classes, VEHICLE_CLASS_IDS.to_vec());
        assert_eq!(settings.vehicle_detector.kind, DetectorKind::Mock);
        assert_eq!(settings.ocr.engine, OcrEngineChoice::Auto);
    }

    #[test]
    fn cli_values_beat_file_values() {
        let mut file = FileConfig::default();
        file.backend = Some("raw".into());
        file.min_vehicle_score = Some(0.9);
        let cli = args(&["--backend", "mock", "--min-vehicle-score", "0.5"]);
        let sources = CliSources {
            min_vehicle_score_from_cli: true,
            ..CliSources::default()
        };
        let settings = merge(&cli, &sources, file, None).unwrap();
        assert_eq!(settings.backend.as_deref(), Some("mock"));
        assert!((settings.min_vehicle_score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn file_min_score_applies_when_cli_used_default() {
        let mut file = FileConfig::default();
        file.min_vehicle_score = Some(0.9);
        let settings = merge(&args(&[]), &CliSources::default(), file, None).unwrap();
        assert!((settings.min_vehicle_score - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn detections_file_implies_replay_detector() {
        let cli = args(&["--vehicle-detections", "dets.jsonl"]);
        let settings = merge(&cli, &CliSources::default(), FileConfig::default(), None).unwrap();
        assert_eq!(settings.vehicle_detector.kind, DetectorKind::Replay);
        assert_eq!(settings.plate_detector.kind, DetectorKind::Mock);
    }

    #[test]
    fn relative_file_paths_resolve_against_config_dir() {
        let mut file = FileConfig::default();
        file.ocr = Some(OcrFileConfig {
            engine: None,
            spans: Some("spans.jsonl".into()),
            fixed_text: None,
        });
        let settings = merge(
            &args(&[]),
            &CliSources::default(),
            file,
            Some(PathBuf::from("/etc/platetrace/config.toml")),
        )
        .unwrap();
        assert_eq!(
            settings.ocr.spans,
            Some(PathBuf::from("/etc/platetrace/spans.jsonl"))
        );
    }

    #[test]
    fn lone_frame_dimension_is_rejected() {
        let cli = args(&["--frame-width", "640"]);
        assert!(matches!(
            merge(&cli, &CliSources::default(), FileConfig::default(), None),
            Err(ConfigError::InvalidValue { field: "frame_size", .. })
        ));
    }

    #[test]
    fn unknown_ocr_engine_in_file_is_rejected() {
        let mut file = FileConfig::default();
        file.ocr = Some(OcrFileConfig {
            engine: Some("tesseract".into()),
            spans: None,
            fixed_text: None,
        });
        assert!(matches!(
            merge(&args(&[]), &CliSources::default(), file, None),
            Err(ConfigError::InvalidValue { field: "ocr.engine", .. })
        ));
    }
}
