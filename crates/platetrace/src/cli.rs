use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DetectorChoice {
    Mock,
    Replay,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OcrEngineChoice {
    Auto,
    Noop,
    Fixed,
    Replay,
}

/// Which argument values came from the command line, as opposed to clap
/// defaults. Needed so config-file values only fill the gaps the user left.
#[derive(Debug, Default)]
pub struct CliSources {
    pub min_vehicle_score_from_cli: bool,
    pub ocr_engine_from_cli: bool,
    pub vehicle_classes_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            min_vehicle_score_from_cli: value_from_cli(matches, "min_vehicle_score"),
            ocr_engine_from_cli: value_from_cli(matches, "ocr_engine"),
            vehicle_classes_from_cli: value_from_cli(matches, "vehicle_classes"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    let args = match CliArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(&matches);
    (args, sources)
}

#[derive(Debug, Parser)]
#[command(
    name = "platetrace",
    about = "Resolve license plates to tracked vehicles and export readings",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Lock frame input to a specific backend implementation
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Output path for the plate log (CSV)
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the list of available frame backends
    #[arg(long = "list-backends")]
    pub list_backends: bool,

    /// Frame width for headerless raw input
    #[arg(long = "frame-width", value_name = "PIXELS")]
    pub frame_width: Option<u32>,

    /// Frame height for headerless raw input
    #[arg(long = "frame-height", value_name = "PIXELS")]
    pub frame_height: Option<u32>,

    /// Stop after this many frames
    #[arg(long = "frame-limit")]
    pub frame_limit: Option<u64>,

    /// Vehicle detector backend
    #[arg(long = "vehicle-detector", value_enum)]
    pub vehicle_detector: Option<DetectorChoice>,

    /// Detections file for the replay vehicle detector
    #[arg(long = "vehicle-detections", value_name = "FILE")]
    pub vehicle_detections: Option<PathBuf>,

    /// Plate detector backend
    #[arg(long = "plate-detector", value_enum)]
    pub plate_detector: Option<DetectorChoice>,

    /// Detections file for the replay plate detector
    #[arg(long = "plate-detections", value_name = "FILE")]
    pub plate_detections: Option<PathBuf>,

    /// Minimum score for a vehicle detection to reach the tracker
    #[arg(
        long = "min-vehicle-score",
        id = "min_vehicle_score",
        default_value_t = 0.25
    )]
    pub min_vehicle_score: f32,

    /// Detector class id treated as a vehicle (repeatable)
    #[arg(long = "vehicle-class", id = "vehicle_classes", value_name = "ID")]
    pub vehicle_classes: Vec<u32>,

    /// Minimum IoU for the built-in tracker to keep an identity
    #[arg(long = "tracker-min-iou")]
    pub tracker_min_iou: Option<f32>,

    /// Frames the built-in tracker coasts through without a detection
    #[arg(long = "tracker-max-coast")]
    pub tracker_max_coast: Option<u32>,

    /// Preferred OCR engine
    #[arg(
        long = "ocr-engine",
        id = "ocr_engine",
        value_enum,
        default_value_t = OcrEngineChoice::Auto
    )]
    pub ocr_engine: OcrEngineChoice,

    /// Spans file for the replay OCR engine
    #[arg(long = "ocr-spans", value_name = "FILE")]
    pub ocr_spans: Option<PathBuf>,

    /// Constant text returned by the fixed OCR engine
    #[arg(long = "ocr-fixed-text", value_name = "TEXT")]
    pub ocr_fixed_text: Option<String>,

    /// Frame queue capacity before applying backpressure
    #[arg(long = "channel-capacity")]
    pub channel_capacity: Option<usize>,

    /// Input path (raw frame file)
    pub input: Option<PathBuf>,
}
