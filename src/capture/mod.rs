pub mod capture_source;
pub mod session;
pub mod synthetic_camera;

pub use capture_source::{CaptureSource, FrameConsumer, VideoFormat};
pub use session::{CaptureSession, CaptureSessionBuilder};
pub use synthetic_camera::SyntheticCamera;
