pub mod frame_pipeline;
pub mod gate;
pub mod overlay;
pub mod services;
pub mod stats;
pub mod types;

pub use frame_pipeline::{DetectionOutcome, FrameDisposition, FramePipeline};
pub use gate::{DetectionGate, GatePermit};
pub use overlay::{OverlayCommand, OverlayState, PresentationSurface, overlay_channel};
pub use stats::StatsSnapshot;
pub use types::{DetectionRequest, DetectionResult};
