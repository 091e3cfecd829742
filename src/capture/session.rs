use crate::capture::{CaptureSource, FrameConsumer, VideoFormat};
use crate::error::CaptureError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A running capture source. Frames are produced on a dedicated thread and
/// handed to every consumer in registration order.
pub struct CaptureSession {
    format: VideoFormat,
    cancel_token: CancellationToken,
    capture_thread: Option<std::thread::JoinHandle<()>>,
}

impl CaptureSession {
    pub fn builder() -> CaptureSessionBuilder {
        CaptureSessionBuilder::new()
    }

    fn start(
        mut source: Box<dyn CaptureSource>,
        consumers: Vec<Arc<dyn FrameConsumer>>,
    ) -> Result<Self, CaptureError> {
        let format = source.open().inspect_err(|e| {
            tracing::error!("Failed to open capture source '{}': {}", source.name(), e);
        })?;

        let cancel_token = CancellationToken::new();
        let thread_token = cancel_token.clone();
        let capture_thread = std::thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || Self::run(source, consumers, thread_token))
            .map_err(|e| CaptureError::Spawn(e.to_string()))?;

        Ok(Self {
            format,
            cancel_token,
            capture_thread: Some(capture_thread),
        })
    }

    fn run(
        mut source: Box<dyn CaptureSource>,
        consumers: Vec<Arc<dyn FrameConsumer>>,
        cancel_token: CancellationToken,
    ) {
        tracing::info!("Capture started on '{}'", source.name());
        let mut delivered: u64 = 0;
        while !cancel_token.is_cancelled() {
            let Some(frame) = source.next_frame() else {
                tracing::info!("Capture source '{}' has no more frames", source.name());
                break;
            };
            for consumer in &consumers {
                consumer.consume(frame.clone());
            }
            delivered += 1;
        }
        tracing::info!(
            "Capture stopped on '{}' after {} frames",
            source.name(),
            delivered
        );
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    pub fn stop(&mut self) {
        self.cancel_token.cancel();
        if let Some(thread) = self.capture_thread.take() {
            if thread.join().is_err() {
                tracing::error!("Capture thread panicked");
            }
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct CaptureSessionBuilder {
    source: Option<Box<dyn CaptureSource>>,
    consumers: Vec<Arc<dyn FrameConsumer>>,
}

impl CaptureSessionBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            consumers: Vec::new(),
        }
    }

    pub fn source(mut self, source: impl CaptureSource) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Consumers see frames in the order they were added.
    pub fn consumer(mut self, consumer: Arc<dyn FrameConsumer>) -> Self {
        self.consumers.push(consumer);
        self
    }

    /// Opens the source and starts the capture thread. Setup failures are
    /// returned to the caller.
    pub fn start(self) -> Result<CaptureSession, CaptureError> {
        let source = self
            .source
            .ok_or_else(|| CaptureError::DeviceNotFound("<none>".to_string()))?;
        CaptureSession::start(source, self.consumers)
    }
}

impl Default for CaptureSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
