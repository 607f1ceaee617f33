use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

#[derive(Debug)]
pub struct ProgressEvent {
    pub index: u64,
    pub plates: u64,
}

#[derive(Debug)]
pub struct ProgressSummary {
    pub processed: u64,
    pub plates: u64,
}

pub fn build_progress(total_frames: Option<u64>) -> ProgressBar {
    let progress = match total_frames {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {percent:>3}% {pos}/{len} frames [{elapsed_precise}<{eta_precise}] {msg}",
                )
                .unwrap(),
            );
            bar
        }
        None => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan.bold} [{elapsed_precise}] frames {pos} • {msg}",
                )
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            spinner
        }
    };
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

pub fn progress_channel_capacity(total_frames: Option<u64>) -> usize {
    match total_frames {
        Some(total) => total.min(1024).max(64).try_into().unwrap_or(1024),
        None => 512,
    }
}

pub async fn drive_progress(
    progress: ProgressBar,
    mut rx: mpsc::Receiver<ProgressEvent>,
    total_frames: Option<u64>,
) -> ProgressSummary {
    let mut processed = 0u64;
    let mut plates = 0u64;

    while let Some(event) = rx.recv().await {
        processed = event.index;
        plates = event.plates;

        if let Some(total) = total_frames {
            if processed > total {
                progress.set_length(processed);
            }
        }

        progress.set_position(processed);
        progress.set_message(format!("{plates} plates"));
    }

    ProgressSummary { processed, plates }
}
