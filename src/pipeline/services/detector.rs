use crate::error::DetectionError;
use crate::pipeline::types::{DetectionRequest, DetectionResult};
use async_trait::async_trait;

/// The external detection capability: one request in, at most one result out.
///
/// `Ok(None)` means the capability ran and found nothing.
#[async_trait]
pub trait BarcodeDetector: Send + Sync {
    async fn detect(
        &self,
        request: &DetectionRequest,
    ) -> Result<Option<DetectionResult>, DetectionError>;

    fn name(&self) -> &'static str;
}
