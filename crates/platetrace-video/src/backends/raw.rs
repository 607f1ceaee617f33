use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use tokio::sync::mpsc::Sender;

use crate::config::Configuration;
use crate::core::{FrameStream, FrameStreamProvider, spawn_stream_from_channel};
use platetrace_types::{FrameError, FrameResult, GrayFrame};

/// Reads concatenated 8-bit grayscale planes from a single headerless file.
/// Frame dimensions come from the configuration; the frame count is derived
/// from the file length.
#[derive(Debug)]
pub struct RawFileProvider {
    path: PathBuf,
    width: u32,
    height: u32,
    frame_count: u64,
    channel_capacity: usize,
}

impl RawFileProvider {
    const DEFAULT_CHANNEL_CAPACITY: usize = 8;

    pub fn new(config: &Configuration) -> FrameResult<Self> {
        let Some(path) = config.input.clone() else {
            return Err(FrameError::configuration(
                "raw backend requires an input path",
            ));
        };
        let Some((width, height)) = config.frame_size else {
            return Err(FrameError::configuration(
                "raw backend requires frame dimensions (width and height)",
            ));
        };
        if width == 0 || height == 0 {
            return Err(FrameError::configuration(
                "raw frame dimensions must be non-zero",
            ));
        }

        let frame_len = width as u64 * height as u64;
        let file_len = std::fs::metadata(&path)?.len();
        if file_len % frame_len != 0 {
            return Err(FrameError::backend_failure(
                "raw",
                format!(
                    "file length {} is not a multiple of the {}x{} frame size",
                    file_len, width, height
                ),
            ));
        }

        let mut frame_count = file_len / frame_len;
        if let Some(limit) = config.frame_limit {
            frame_count = frame_count.min(limit);
        }

        let capacity = config
            .channel_capacity
            .map(|n| n.get())
            .unwrap_or(Self::DEFAULT_CHANNEL_CAPACITY);

        Ok(Self {
            path,
            width,
            height,
            frame_count,
            channel_capacity: capacity.max(1),
        })
    }

    fn emit_frames(&self, tx: Sender<FrameResult<GrayFrame>>) {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) => {
                let _ = tx.blocking_send(Err(err.into()));
                return;
            }
        };
        let frame_len = self.width as usize * self.height as usize;
        for index in 0..self.frame_count {
            if tx.is_closed() {
                break;
            }
            let mut buffer = vec![0u8; frame_len];
            if let Err(err) = file.read_exact(&mut buffer) {
                let _ = tx.blocking_send(Err(err.into()));
                return;
            }
            let frame =
                GrayFrame::from_owned(self.width, self.height, self.width as usize, None, buffer)
                    .map(|frame| frame.with_frame_index(Some(index)));
            if tx.blocking_send(frame).is_err() {
                break;
            }
        }
    }
}

impl FrameStreamProvider for RawFileProvider {
    fn total_frames(&self) -> Option<u64> {
        Some(self.frame_count)
    }

    fn into_stream(self: Box<Self>) -> FrameStream {
        let provider = *self;
        let capacity = provider.channel_capacity;
        spawn_stream_from_channel(capacity, move |tx| {
            provider.emit_frames(tx);
        })
    }
}
