use std::num::NonZeroUsize;
use std::str::FromStr;

use platetrace::cli;
use platetrace::pipeline::{PipelineConfig, run_pipeline};
use platetrace::settings;
use platetrace_types::FrameError;
use platetrace_video::{Backend, Configuration};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), FrameError> {
    let (args, sources) = cli::parse_cli();

    if args.list_backends {
        print_available_backends();
        return Ok(());
    }

    let settings = settings::resolve_settings(&args, &sources)
        .map_err(|err| FrameError::configuration(err.to_string()))?;

    let mut config = Configuration::from_env().unwrap_or_default();
    if let Some(name) = settings.backend.as_deref() {
        config.backend = Backend::from_str(name)?;
    }
    if settings.input.is_some() {
        config.input = settings.input.clone();
    }
    if settings.frame_size.is_some() {
        config.frame_size = settings.frame_size;
    }
    if settings.frame_limit.is_some() {
        config.frame_limit = settings.frame_limit;
    }
    if let Some(capacity) = settings.channel_capacity {
        let Some(value) = NonZeroUsize::new(capacity) else {
            return Err(FrameError::configuration(
                "channel capacity must be greater than zero",
            ));
        };
        config.channel_capacity = Some(value);
    }

    if !Configuration::available_backends().contains(&config.backend) {
        return Err(FrameError::unsupported(config.backend.as_str()));
    }

    let provider = config.create_provider()?;
    let pipeline = PipelineConfig::from_settings(&settings);

    match run_pipeline(provider, &pipeline).await {
        Ok(summary) => {
            println!(
                "plate log written to {} ({} readings from {} frames)",
                summary.output.display(),
                summary.plates,
                summary.frames
            );
            Ok(())
        }
        Err((err, _)) => Err(err),
    }
}

fn print_available_backends() {
    let names: Vec<&'static str> = Configuration::available_backends()
        .iter()
        .map(Backend::as_str)
        .collect();
    println!("available backends: {}", names.join(", "));
}
