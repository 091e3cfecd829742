use crate::error::DetectionError;
use crate::pipeline::services::BarcodeDetector;
use crate::pipeline::types::{DetectionRequest, DetectionResult};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tower::timeout::error::Elapsed;
use tower::util::BoxCloneService;
use tower::{BoxError, Service, ServiceBuilder};

/// The detection capability as the pipeline calls it: boxed, cloneable and
/// bounded by a timeout.
pub type DetectionStack = BoxCloneService<DetectionRequest, Option<DetectionResult>, DetectionError>;

/// Adapts a [`BarcodeDetector`] to a `tower::Service`.
#[derive(Clone)]
pub struct DetectionService {
    inner: Arc<dyn BarcodeDetector>,
}

impl DetectionService {
    pub fn new(inner: Arc<dyn BarcodeDetector>) -> Self {
        Self { inner }
    }
}

impl Service<DetectionRequest> for DetectionService {
    type Response = Option<DetectionResult>;
    type Error = DetectionError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: DetectionRequest) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move {
            tracing::debug!(
                "Running detector '{}' on request {}",
                inner.name(),
                request.id()
            );
            inner.detect(&request).await
        })
    }
}

/// Wraps `detector` with a timeout so a capability that never answers still
/// completes its request with [`DetectionError::Timeout`].
pub fn detection_stack(detector: Arc<dyn BarcodeDetector>, timeout: Duration) -> DetectionStack {
    let service = ServiceBuilder::new()
        .map_err(move |err: BoxError| classify_error(err, timeout))
        .timeout(timeout)
        .service(DetectionService::new(detector));
    BoxCloneService::new(service)
}

fn classify_error(err: BoxError, timeout: Duration) -> DetectionError {
    if err.is::<Elapsed>() {
        return DetectionError::Timeout(timeout);
    }
    match err.downcast::<DetectionError>() {
        Ok(err) => *err,
        Err(other) => DetectionError::Capability(other.to_string()),
    }
}
