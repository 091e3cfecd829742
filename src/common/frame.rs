use crate::common::Orientation;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::sync::Arc;
use uuid::Uuid;

/// A captured video frame. The pixel buffer is shared, so handing a frame to
/// both the preview and the detection pipeline never copies it.
#[derive(Clone)]
pub struct Frame {
    frame_id: Uuid,
    image: Arc<DynamicImage>,
    orientation: Orientation,
    captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: DynamicImage, orientation: Orientation, captured_at: DateTime<Utc>) -> Self {
        Self {
            frame_id: Uuid::new_v4(),
            image: Arc::new(image),
            orientation,
            captured_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.frame_id
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("frame_id", &self.frame_id)
            .field("size", &(self.image.width(), self.image.height()))
            .field("orientation", &self.orientation)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
