use crate::common::{NormalizedRect, Orientation};

/// What the detection capability reports for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    payload: Option<String>,
    bounding_box: NormalizedRect,
    orientation: Orientation,
}

impl DetectionResult {
    pub fn new(
        payload: Option<String>,
        bounding_box: NormalizedRect,
        orientation: Orientation,
    ) -> Self {
        Self {
            payload,
            bounding_box,
            orientation,
        }
    }

    /// The decoded payload, if there is one. An empty string counts as no payload.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref().filter(|payload| !payload.is_empty())
    }

    /// Normalized, bottom-left origin, in the axes of the upright source image.
    pub fn bounding_box(&self) -> NormalizedRect {
        self.bounding_box
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_treated_as_missing() {
        let result = DetectionResult::new(
            Some(String::new()),
            NormalizedRect::default(),
            Orientation::Up,
        );
        assert_eq!(result.payload(), None);

        let result = DetectionResult::new(
            Some("hello".to_string()),
            NormalizedRect::default(),
            Orientation::Up,
        );
        assert_eq!(result.payload(), Some("hello"));
    }
}
