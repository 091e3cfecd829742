use crate::common::{NormalizedRect, Orientation};
use crate::error::DetectionError;
use crate::pipeline::services::BarcodeDetector;
use crate::pipeline::types::{DetectionRequest, DetectionResult};
use async_trait::async_trait;
use image::{DynamicImage, GrayImage};
use std::time::Duration;

/// Stand-in detection capability for the synthetic camera. It does not decode
/// anything: it turns the frame upright, finds the bounding box of every pixel
/// darker than `threshold` and reports it with a fixed payload.
pub struct MarkerDetector {
    threshold: u8,
    payload: String,
    latency: Duration,
}

impl MarkerDetector {
    pub fn new(threshold: u8, payload: impl Into<String>, latency: Duration) -> Self {
        Self {
            threshold,
            payload: payload.into(),
            latency,
        }
    }

    fn locate(image: &DynamicImage, orientation: Orientation, threshold: u8) -> Option<NormalizedRect> {
        let upright = orientation.apply(image).to_luma8();
        dark_region(&upright, threshold)
    }
}

fn dark_region(image: &GrayImage, threshold: u8) -> Option<NormalizedRect> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[0] >= threshold {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }

    let (min_x, min_y, max_x, max_y) = bounds?;
    let (width, height) = (width as f32, height as f32);
    let box_width = (max_x - min_x + 1) as f32 / width;
    let box_height = (max_y - min_y + 1) as f32 / height;
    let top = min_y as f32 / height;
    // Results are reported with a bottom-left origin.
    Some(NormalizedRect::new(
        min_x as f32 / width,
        1.0 - top - box_height,
        box_width,
        box_height,
    ))
}

#[async_trait]
impl BarcodeDetector for MarkerDetector {
    async fn detect(
        &self,
        request: &DetectionRequest,
    ) -> Result<Option<DetectionResult>, DetectionError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let frame = request.frame().clone();
        let orientation = request.orientation();
        let threshold = self.threshold;
        let located = tokio::task::spawn_blocking(move || {
            MarkerDetector::locate(frame.image(), orientation, threshold)
        })
        .await
        .map_err(|e| DetectionError::Capability(format!("marker scan task failed: {}", e)))?;

        Ok(located.map(|bounding_box| {
            DetectionResult::new(Some(self.payload.clone()), bounding_box, orientation)
        }))
    }

    fn name(&self) -> &'static str {
        "marker"
    }
}
