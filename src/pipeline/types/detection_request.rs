use crate::common::{Frame, Orientation};
use uuid::Uuid;

/// One admitted frame on its way to the detection capability.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    request_id: Uuid,
    frame: Frame,
}

impl DetectionRequest {
    pub fn new(frame: Frame) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            frame,
        }
    }

    pub fn id(&self) -> Uuid {
        self.request_id
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn orientation(&self) -> Orientation {
        self.frame.orientation()
    }
}
