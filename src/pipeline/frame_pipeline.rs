use crate::capture::FrameConsumer;
use crate::common::{Frame, PreviewGeometry};
use crate::error::DetectionError;
use crate::pipeline::gate::{DetectionGate, GatePermit};
use crate::pipeline::overlay::OverlayCommand;
use crate::pipeline::services::DetectionStack;
use crate::pipeline::stats::{PipelineStats, StatsSnapshot};
use crate::pipeline::types::{DetectionRequest, DetectionResult};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tower::{Service, ServiceExt};
use tracing::{debug, info, trace, warn};

pub type DetectionOutcome = Result<Option<DetectionResult>, DetectionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    /// The gate was idle and a detection request is now in flight.
    Dispatched,
    /// A detection was already in flight, the frame was discarded.
    Dropped,
}

/// Bridges the pushed frame stream to the single-shot detection capability.
///
/// Frames arriving while a detection is in flight are dropped, never queued.
/// Completions release the gate first, then publish one [`OverlayCommand`]
/// for the presentation context. Only the newest command is kept, so a
/// presentation context that stops reading never holds completions back.
#[derive(Clone)]
pub struct FramePipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    gate: Arc<DetectionGate>,
    detection: Mutex<DetectionStack>,
    overlay_tx: watch::Sender<OverlayCommand>,
    geometry_rx: watch::Receiver<PreviewGeometry>,
    stats: PipelineStats,
    runtime: Handle,
}

impl FramePipeline {
    pub fn new(
        detection: DetectionStack,
        overlay_tx: watch::Sender<OverlayCommand>,
        geometry_rx: watch::Receiver<PreviewGeometry>,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                gate: DetectionGate::new(),
                detection: Mutex::new(detection),
                overlay_tx,
                geometry_rx,
                stats: PipelineStats::default(),
                runtime,
            }),
        }
    }

    pub fn gate(&self) -> &Arc<DetectionGate> {
        &self.inner.gate
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Admission control plus fire-and-forget dispatch. Never blocks on detection.
    pub fn on_frame(&self, frame: Frame) -> FrameDisposition {
        self.inner.stats.record_received();
        let Some(permit) = self.inner.gate.try_acquire() else {
            self.inner.stats.record_dropped();
            trace!("Detection in flight, dropping frame {}", frame.id());
            return FrameDisposition::Dropped;
        };

        self.inner.stats.record_admitted();
        let request = DetectionRequest::new(frame);
        debug!(
            "Admitted frame {} as request {}",
            request.frame().id(),
            request.id()
        );

        let pipeline = self.clone();
        self.inner.runtime.spawn(async move {
            let outcome = pipeline.detect(request).await;
            pipeline.on_detection_complete(permit, outcome);
        });
        FrameDisposition::Dispatched
    }

    async fn detect(&self, request: DetectionRequest) -> DetectionOutcome {
        let mut detection = self
            .inner
            .detection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        detection.ready().await?.call(request).await
    }

    /// Completion path of one admitted request. Consuming the permit releases
    /// the gate before anything else happens.
    pub fn on_detection_complete(
        &self,
        permit: GatePermit,
        outcome: DetectionOutcome,
    ) -> OverlayCommand {
        permit.release();
        self.inner.stats.record_completed();

        let command = self.route(outcome);
        self.inner.overlay_tx.send_replace(command.clone());
        command
    }

    fn route(&self, outcome: DetectionOutcome) -> OverlayCommand {
        let result = match outcome {
            Ok(Some(result)) => result,
            Ok(None) => return OverlayCommand::Hide,
            Err(e) => {
                self.inner.stats.record_failed();
                warn!("Detection failed: {}", e);
                return OverlayCommand::Hide;
            }
        };

        let Some(payload) = result.payload() else {
            return OverlayCommand::Hide;
        };

        self.inner.stats.record_payload(payload);
        let geometry = *self.inner.geometry_rx.borrow();
        let frame = geometry.map_normalized(result.bounding_box());
        info!("Barcode value: {}", payload);
        debug!("Barcode frame in preview: {:?}", frame);
        OverlayCommand::Show {
            frame,
            text: payload.to_string(),
        }
    }
}

impl FrameConsumer for FramePipeline {
    fn consume(&self, frame: Frame) {
        self.on_frame(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{NormalizedRect, Orientation, Rect};
    use crate::pipeline::overlay::overlay_channel;
    use crate::pipeline::services::{BarcodeDetector, detection_stack};
    use async_trait::async_trait;
    use chrono::Utc;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex as AsyncMutex;
    use tokio::sync::mpsc;

    /// Detector whose every call waits for the test to hand it an outcome.
    struct ControlledDetector {
        outcomes: AsyncMutex<mpsc::UnboundedReceiver<DetectionOutcome>>,
        calls: AtomicUsize,
    }

    impl ControlledDetector {
        fn new() -> (Arc<Self>, mpsc::UnboundedSender<DetectionOutcome>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let detector = Arc::new(Self {
                outcomes: AsyncMutex::new(rx),
                calls: AtomicUsize::new(0),
            });
            (detector, tx)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BarcodeDetector for ControlledDetector {
        async fn detect(&self, _request: &DetectionRequest) -> DetectionOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcomes.lock().await.recv().await {
                Some(outcome) => outcome,
                None => Err(DetectionError::Capability("test finished".to_string())),
            }
        }

        fn name(&self) -> &'static str {
            "controlled"
        }
    }

    /// Detector that answers after a short delay and records peak concurrency.
    #[derive(Default)]
    struct CountingDetector {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl BarcodeDetector for CountingDetector {
        async fn detect(&self, _request: &DetectionRequest) -> DetectionOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(None)
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct InstantDetector;

    #[async_trait]
    impl BarcodeDetector for InstantDetector {
        async fn detect(&self, _request: &DetectionRequest) -> DetectionOutcome {
            Ok(None)
        }

        fn name(&self) -> &'static str {
            "instant"
        }
    }

    struct StalledDetector;

    #[async_trait]
    impl BarcodeDetector for StalledDetector {
        async fn detect(&self, _request: &DetectionRequest) -> DetectionOutcome {
            futures::future::pending().await
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    fn test_frame() -> Frame {
        Frame::new(
            DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
                16,
                16,
                Rgb([200, 200, 200]),
            )),
            Orientation::Up,
            Utc::now(),
        )
    }

    fn square_preview() -> PreviewGeometry {
        PreviewGeometry::new(Rect::new(0.0, 0.0, 1000.0, 1000.0))
    }

    fn test_pipeline(
        detector: Arc<dyn BarcodeDetector>,
        timeout: Duration,
    ) -> (
        FramePipeline,
        watch::Receiver<OverlayCommand>,
        watch::Sender<PreviewGeometry>,
    ) {
        let (overlay_tx, overlay_rx) = overlay_channel();
        let (geometry_tx, geometry_rx) = watch::channel(square_preview());
        let pipeline = FramePipeline::new(
            detection_stack(detector, timeout),
            overlay_tx,
            geometry_rx,
            Handle::current(),
        );
        (pipeline, overlay_rx, geometry_tx)
    }

    async fn next_command(overlay_rx: &mut watch::Receiver<OverlayCommand>) -> OverlayCommand {
        tokio::time::timeout(Duration::from_secs(2), overlay_rx.changed())
            .await
            .expect("overlay update arrives")
            .expect("pipeline is alive");
        overlay_rx.borrow_and_update().clone()
    }

    fn centered_result(payload: &str) -> DetectionResult {
        DetectionResult::new(
            Some(payload.to_string()),
            NormalizedRect::new(0.25, 0.25, 0.5, 0.5),
            Orientation::Up,
        )
    }

    #[tokio::test]
    async fn frames_arriving_while_busy_are_dropped() {
        let (detector, outcomes) = ControlledDetector::new();
        let (pipeline, mut overlay_rx, _geometry_tx) =
            test_pipeline(detector.clone(), Duration::from_secs(5));

        assert_eq!(pipeline.on_frame(test_frame()), FrameDisposition::Dispatched);
        assert_eq!(pipeline.on_frame(test_frame()), FrameDisposition::Dropped);
        assert_eq!(pipeline.on_frame(test_frame()), FrameDisposition::Dropped);
        assert!(pipeline.gate().is_busy());

        outcomes.send(Ok(None)).unwrap();
        assert_eq!(next_command(&mut overlay_rx).await, OverlayCommand::Hide);
        assert!(!pipeline.gate().is_busy());
        assert_eq!(detector.calls(), 1);

        let stats = pipeline.stats();
        assert_eq!(stats.frames_received, 3);
        assert_eq!(stats.frames_admitted, 1);
        assert_eq!(stats.frames_dropped, 2);

        // The next frame is admitted again once the gate is idle.
        assert_eq!(pipeline.on_frame(test_frame()), FrameDisposition::Dispatched);
        outcomes.send(Ok(None)).unwrap();
        assert_eq!(next_command(&mut overlay_rx).await, OverlayCommand::Hide);
        assert_eq!(detector.calls(), 2);
    }

    #[tokio::test]
    async fn payload_shows_overlay_at_mapped_rect() {
        let (detector, outcomes) = ControlledDetector::new();
        let (pipeline, mut overlay_rx, _geometry_tx) =
            test_pipeline(detector, Duration::from_secs(5));

        pipeline.on_frame(test_frame());
        outcomes.send(Ok(Some(centered_result("hello")))).unwrap();

        assert_eq!(
            next_command(&mut overlay_rx).await,
            OverlayCommand::Show {
                frame: Rect::new(250.0, 250.0, 500.0, 500.0),
                text: "hello".to_string(),
            }
        );
        assert!(!pipeline.gate().is_busy());
        assert_eq!(pipeline.stats().last_payload.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn mapping_follows_latest_preview_geometry() {
        let (detector, outcomes) = ControlledDetector::new();
        let (pipeline, mut overlay_rx, geometry_tx) =
            test_pipeline(detector, Duration::from_secs(5));
        geometry_tx
            .send(PreviewGeometry::new(Rect::new(0.0, 100.0, 1000.0, 1000.0)))
            .unwrap();

        pipeline.on_frame(test_frame());
        outcomes.send(Ok(Some(centered_result("offset")))).unwrap();

        match next_command(&mut overlay_rx).await {
            OverlayCommand::Show { frame, .. } => {
                assert_eq!(frame, Rect::new(250.0, 350.0, 500.0, 500.0))
            }
            other => panic!("expected overlay to be shown, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_payload_hides_overlay() {
        let (detector, outcomes) = ControlledDetector::new();
        let (pipeline, mut overlay_rx, _geometry_tx) =
            test_pipeline(detector, Duration::from_secs(5));

        pipeline.on_frame(test_frame());
        outcomes.send(Ok(Some(centered_result("")))).unwrap();
        assert_eq!(next_command(&mut overlay_rx).await, OverlayCommand::Hide);

        pipeline.on_frame(test_frame());
        outcomes
            .send(Ok(Some(DetectionResult::new(
                None,
                NormalizedRect::new(0.1, 0.1, 0.2, 0.2),
                Orientation::Up,
            ))))
            .unwrap();
        assert_eq!(next_command(&mut overlay_rx).await, OverlayCommand::Hide);
        assert_eq!(pipeline.stats().payloads_decoded, 0);
    }

    #[tokio::test]
    async fn detection_error_releases_gate_and_hides_overlay() {
        let (detector, outcomes) = ControlledDetector::new();
        let (pipeline, mut overlay_rx, _geometry_tx) =
            test_pipeline(detector, Duration::from_secs(5));

        pipeline.on_frame(test_frame());
        outcomes
            .send(Err(DetectionError::Capability("vision failed".to_string())))
            .unwrap();

        assert_eq!(next_command(&mut overlay_rx).await, OverlayCommand::Hide);
        assert!(!pipeline.gate().is_busy());
        let stats = pipeline.stats();
        assert_eq!(stats.detections_completed, 1);
        assert_eq!(stats.detections_failed, 1);
    }

    #[tokio::test]
    async fn stalled_detector_is_timed_out_and_gate_released() {
        let (pipeline, mut overlay_rx, _geometry_tx) =
            test_pipeline(Arc::new(StalledDetector), Duration::from_millis(20));

        pipeline.on_frame(test_frame());
        assert_eq!(next_command(&mut overlay_rx).await, OverlayCommand::Hide);
        assert!(!pipeline.gate().is_busy());
        assert_eq!(pipeline.stats().detections_failed, 1);
    }

    #[tokio::test]
    async fn completion_releases_gate_before_reporting() {
        let (detector, _outcomes) = ControlledDetector::new();
        let (pipeline, mut overlay_rx, _geometry_tx) =
            test_pipeline(detector, Duration::from_secs(5));

        let permit = pipeline.gate().try_acquire().unwrap();
        let command = pipeline.on_detection_complete(
            permit,
            Err(DetectionError::InvalidImage("empty buffer".to_string())),
        );
        assert_eq!(command, OverlayCommand::Hide);
        assert!(!pipeline.gate().is_busy());
        assert_eq!(next_command(&mut overlay_rx).await, OverlayCommand::Hide);
    }

    // Waits until every admitted frame has completed and its task has let go
    // of the pipeline.
    async fn wait_until_settled(pipeline: &FramePipeline) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let stats = pipeline.stats();
                if stats.detections_completed == stats.frames_admitted
                    && Arc::strong_count(&pipeline.inner) == 1
                {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("every admitted frame completes");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn detections_never_overlap_under_load() {
        let detector = Arc::new(CountingDetector::default());
        let (pipeline, mut overlay_rx, _geometry_tx) =
            test_pipeline(detector.clone(), Duration::from_secs(5));

        let feeders: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = pipeline.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        pipeline.on_frame(test_frame());
                        std::thread::sleep(Duration::from_millis(1));
                    }
                })
            })
            .collect();
        for feeder in feeders {
            feeder.join().unwrap();
        }

        wait_until_settled(&pipeline).await;
        assert_eq!(next_command(&mut overlay_rx).await, OverlayCommand::Hide);

        let stats = pipeline.stats();
        assert_eq!(stats.frames_received, 200);
        assert_eq!(stats.frames_admitted + stats.frames_dropped, 200);
        assert_eq!(stats.detections_completed, stats.frames_admitted);
        assert!(stats.frames_admitted >= 1);
        assert_eq!(detector.peak.load(Ordering::SeqCst), 1);
        assert!(!pipeline.gate().is_busy());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unread_overlay_updates_do_not_hold_back_completions() {
        let (pipeline, overlay_rx, _geometry_tx) =
            test_pipeline(Arc::new(InstantDetector), Duration::from_secs(5));

        let feeder = {
            let pipeline = pipeline.clone();
            std::thread::spawn(move || {
                for _ in 0..300 {
                    pipeline.on_frame(test_frame());
                    std::thread::sleep(Duration::from_millis(1));
                }
            })
        };
        feeder.join().unwrap();

        // Nobody reads the overlay receiver, yet no completion task stays parked.
        wait_until_settled(&pipeline).await;
        let stats = pipeline.stats();
        assert!(stats.frames_admitted > 1);
        assert_eq!(stats.detections_completed, stats.frames_admitted);
        assert_eq!(Arc::strong_count(&pipeline.inner), 1);
        assert!(!pipeline.gate().is_busy());
        assert_eq!(*overlay_rx.borrow(), OverlayCommand::Hide);
        assert!(overlay_rx.has_changed().unwrap());
    }
}
