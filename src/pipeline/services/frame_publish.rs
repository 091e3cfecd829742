use crate::capture::FrameConsumer;
use crate::common::Frame;
use tokio::sync::broadcast;

/// Fans captured frames out to preview subscribers. Slow subscribers lag and
/// skip frames instead of holding the capture thread back.
#[derive(Clone)]
pub struct FramePublisher {
    preview_tx: broadcast::Sender<Frame>,
}

impl FramePublisher {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<Frame>) {
        let (preview_tx, preview_rx) = broadcast::channel(capacity);
        (Self { preview_tx }, preview_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.preview_tx.subscribe()
    }

    pub fn publish(&self, frame: Frame) {
        if self.preview_tx.send(frame).is_err() {
            tracing::trace!("No preview subscribers, frame not published");
        }
    }
}

impl FrameConsumer for FramePublisher {
    fn consume(&self, frame: Frame) {
        self.publish(frame);
    }
}
