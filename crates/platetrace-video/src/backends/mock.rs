use std::thread;
use std::time::Duration;

use tokio::sync::mpsc::Sender;

use crate::config::Configuration;
use crate::core::{FrameStream, FrameStreamProvider, spawn_stream_from_channel};
use platetrace_types::{FrameResult, GrayFrame};

/// Synthetic frame source used by tests and smoke runs. Emits a fixed number
/// of gradient frames whose content varies with the frame index.
pub struct MockProvider {
    width: u32,
    height: u32,
    stride: usize,
    frame_count: u64,
    frame_interval: Duration,
    channel_capacity: usize,
}

impl MockProvider {
    const DEFAULT_CHANNEL_CAPACITY: usize = 8;
    const DEFAULT_FRAME_COUNT: u64 = 120;

    pub fn new(config: &Configuration) -> FrameResult<Self> {
        let capacity = config
            .channel_capacity
            .map(|n| n.get())
            .unwrap_or(Self::DEFAULT_CHANNEL_CAPACITY);
        let (width, height) = config.frame_size.unwrap_or((640, 360));
        Ok(Self {
            width,
            height,
            stride: width as usize,
            frame_count: config.frame_limit.unwrap_or(Self::DEFAULT_FRAME_COUNT),
            frame_interval: Duration::ZERO,
            channel_capacity: capacity.max(1),
        })
    }

    fn emit_frames(&self, tx: Sender<FrameResult<GrayFrame>>) {
        for index in 0..self.frame_count {
            if tx.is_closed() {
                break;
            }
            let mut buffer = vec![0u8; self.stride * self.height as usize];
            for (row, chunk) in buffer.chunks_mut(self.stride).enumerate() {
                let value = ((row as u64 + index) % 256) as u8;
                chunk.fill(value);
            }
            let timestamp = Some(Duration::from_millis(index * 33));
            let frame = GrayFrame::from_owned(self.width, self.height, self.stride, timestamp, buffer)
                .map(|frame| frame.with_frame_index(Some(index)));
            if tx.blocking_send(frame).is_err() {
                break;
            }
            if !self.frame_interval.is_zero() {
                thread::sleep(self.frame_interval);
            }
        }
    }
}

impl FrameStreamProvider for MockProvider {
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

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test(flavor = "multi_thread")]
    async fn mock_backend_emits_indexed_frames() {
        let mut config = Configuration::default();
        config.frame_limit = Some(3);
        let provider = Box::new(MockProvider::new(&config).unwrap());
        assert_eq!(provider.total_frames(), Some(3));
        let mut stream = provider.into_stream();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.frame_index(), Some(0));
        assert_eq!(first.width(), 640);
        assert_eq!(first.height(), 360);
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.frame_index(), Some(1));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mock_backend_honors_frame_size() {
        let mut config = Configuration::default();
        config.frame_size = Some((32, 16));
        config.frame_limit = Some(1);
        let provider = Box::new(MockProvider::new(&config).unwrap());
        let mut stream = provider.into_stream();
        let frame = stream.next().await.unwrap().unwrap();
        assert_eq!(frame.data().len(), 32 * 16);
    }
}
