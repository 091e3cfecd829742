use crate::capture::{CaptureSession, CaptureSource, SyntheticCamera};
use crate::common::{Frame, PreviewGeometry, Size};
use crate::config::Settings;
use crate::error::AppError;
use crate::pipeline::overlay::{OverlayCommand, PresentationSurface, apply_latest, overlay_channel};
use crate::pipeline::services::{BarcodeDetector, FramePublisher, MarkerDetector, detection_stack};
use crate::pipeline::{FramePipeline, StatsSnapshot};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

const PREVIEW_BUFFER: usize = 4;

/// The live barcode feature: capture session, detection pipeline and the
/// channels the presentation context reads from.
pub struct BarcodeFeature {
    session: CaptureSession,
    pipeline: FramePipeline,
    preview_rx: broadcast::Receiver<Frame>,
    overlay_rx: watch::Receiver<OverlayCommand>,
    geometry_tx: watch::Sender<PreviewGeometry>,
}

impl BarcodeFeature {
    /// Starts the feature on the configured device with the marker detector.
    pub fn start(settings: &Settings, runtime: Handle) -> Result<Self, AppError> {
        let detector = Arc::new(MarkerDetector::new(
            settings.detection.luminance_threshold,
            settings.detection.payload.clone(),
            settings.detection_latency(),
        ));
        Self::start_with(
            settings,
            runtime,
            SyntheticCamera::new(&settings.camera),
            detector,
        )
    }

    pub fn start_with(
        settings: &Settings,
        runtime: Handle,
        source: impl CaptureSource,
        detector: Arc<dyn BarcodeDetector>,
    ) -> Result<Self, AppError> {
        let (overlay_tx, overlay_rx) = overlay_channel();
        let (geometry_tx, geometry_rx) = watch::channel(PreviewGeometry::default());
        let pipeline = FramePipeline::new(
            detection_stack(detector, settings.detection_timeout()),
            overlay_tx,
            geometry_rx,
            runtime,
        );
        let (publisher, preview_rx) = FramePublisher::new(PREVIEW_BUFFER);

        let session = CaptureSession::builder()
            .source(source)
            .consumer(Arc::new(publisher))
            .consumer(Arc::new(pipeline.clone()))
            .start()?;
        info!("Barcode detection started: {:?}", session.format());

        Ok(Self {
            session,
            pipeline,
            preview_rx,
            overlay_rx,
            geometry_tx,
        })
    }

    /// Recomputes the letterboxed video rectangle for a preview area of
    /// `container` and publishes it to the pipeline when it changed.
    pub fn update_layout(&self, container: Size) -> PreviewGeometry {
        let geometry =
            PreviewGeometry::letterboxed(container, self.session.format().display_size());
        self.geometry_tx.send_if_modified(|current| {
            if *current == geometry {
                return false;
            }
            *current = geometry;
            true
        });
        geometry
    }

    /// Applies the newest overlay transition. Call only from the presentation context.
    pub fn apply_overlay_updates(&mut self, surface: &mut impl PresentationSurface) -> bool {
        apply_latest(&mut self.overlay_rx, surface)
    }

    /// Most recent preview frame since the last call, skipping any backlog.
    pub fn latest_frame(&mut self) -> Option<Frame> {
        let mut latest = None;
        loop {
            match self.preview_rx.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Preview lagged behind, skipping {} frames", n);
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => break,
            }
        }
        latest
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.pipeline.stats()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }
}
