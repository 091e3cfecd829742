use std::time::Duration;
use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
    #[error("Capture Error: {0}")]
    Capture(#[from] CaptureError),
    #[error("Detection Error: {0}")]
    Detection(#[from] DetectionError),
    #[error("UI Error: {0}")]
    Ui(String),
}

// Capture Error Type, raised while setting up or running a capture source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("No capture device named '{0}' is available")]
    DeviceNotFound(String),
    #[error("Unsupported capture format {width}x{height} @ {fps} fps")]
    InvalidFormat { width: u32, height: u32, fps: u32 },
    #[error("Failed to spawn the capture thread: {0}")]
    Spawn(String),
}

// Detection Error Type, reported by the detection capability.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("Detection capability failed: {0}")]
    Capability(String),
    #[error("Detection did not complete within {0:?}")]
    Timeout(Duration),
    #[error("Frame could not be prepared for detection: {0}")]
    InvalidImage(String),
}
