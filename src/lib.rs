pub mod app;
pub mod capture;
pub mod common;
pub mod config;
pub mod error;
pub mod pipeline;

pub use error::{AppError, CaptureError, DetectionError};
pub use pipeline::{DetectionGate, FramePipeline};
