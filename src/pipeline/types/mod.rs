mod detection_request;
mod detection_result;

pub use detection_request::DetectionRequest;
pub use detection_result::DetectionResult;
