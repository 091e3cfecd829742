pub mod detection_service;
pub mod detector;
pub mod frame_publish;
pub mod marker_detector;

pub use detection_service::{DetectionService, DetectionStack, detection_stack};
pub use detector::BarcodeDetector;
pub use frame_publish::FramePublisher;
pub use marker_detector::MarkerDetector;
