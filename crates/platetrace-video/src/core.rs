use std::pin::Pin;

use futures_core::Stream;
use futures_util::stream::unfold;
use tokio::sync::mpsc::{self, Sender};

use platetrace_types::{FrameResult, GrayFrame};

pub type FrameStream = Pin<Box<dyn Stream<Item = FrameResult<GrayFrame>> + Send>>;

pub type DynFrameProvider = Box<dyn FrameStreamProvider>;

/// Source of grayscale frames for one processing run.
///
/// Providers emit frames in presentation order; `total_frames` is a hint used
/// for progress reporting and may be unknown for unbounded sources.
pub trait FrameStreamProvider: Send + 'static {
    fn total_frames(&self) -> Option<u64> {
        None
    }

    fn into_stream(self: Box<Self>) -> FrameStream;
}

/// Runs `task` on a blocking thread and exposes the frames it sends as a
/// bounded stream. Dropping the stream closes the channel and unblocks the
/// producer on its next send.
pub fn spawn_stream_from_channel(
    capacity: usize,
    task: impl FnOnce(Sender<FrameResult<GrayFrame>>) + Send + 'static,
) -> FrameStream {
    let (tx, rx) = mpsc::channel(capacity);
    tokio::task::spawn_blocking(move || task(tx));
    let stream = unfold(rx, |mut receiver| async {
        receiver.recv().await.map(|item| (item, receiver))
    });
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test(flavor = "multi_thread")]
    async fn spawn_stream_from_channel_pushes_values() {
        let mut stream = spawn_stream_from_channel(2, move |tx| {
            let frame = GrayFrame::from_owned(2, 2, 2, None, vec![1, 2, 3, 4]).unwrap();
            tx.blocking_send(Ok(frame)).unwrap();
        });
        let frame = stream.next().await.unwrap().unwrap();
        assert_eq!(frame.data(), &[1, 2, 3, 4]);
    }
}
