use crate::common::Orientation;
use crate::error::AppError;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;
use std::time::Duration;
use tracing::Level;

const CONFIG_PATH_VAR: &str = "VISION_SAMPLER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/default";
const ENV_PREFIX: &str = "VISION_SAMPLER";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub camera: CameraSettings,
    pub detection: DetectionSettings,
    pub overlay: OverlaySettings,
    pub window: WindowSettings,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionSettings {
    pub timeout_ms: u64,
    /// Artificial latency of the stand-in detector, to make the busy window visible.
    pub latency_ms: u64,
    pub luminance_threshold: u8,
    pub payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OverlaySettings {
    pub label_offset: f32,
    pub label_width: f32,
    pub label_height: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowSettings {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera: CameraSettings {
                device: "synthetic".to_string(),
                width: 1280,
                height: 720,
                fps: 30,
                orientation: Orientation::Up,
            },
            detection: DetectionSettings {
                timeout_ms: 2000,
                latency_ms: 15,
                luminance_threshold: 64,
                payload: "https://example.com/vision-sampler".to_string(),
            },
            overlay: OverlaySettings {
                label_offset: 40.0,
                label_width: 300.0,
                label_height: 40.0,
            },
            window: WindowSettings {
                title: "Vision Sampler".to_string(),
                width: 1280.0,
                height: 720.0,
            },
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from the built-in defaults, then the optional config file
    /// (`config/default.toml` or the path in `VISION_SAMPLER_CONFIG`), then
    /// `VISION_SAMPLER_*` environment variables (`__` separates sections).
    pub fn load() -> Result<Self, AppError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_from(path: &str, environment: Environment) -> Result<Self, AppError> {
        let settings: Settings = Self::with_defaults(Config::builder())?
            .add_source(File::with_name(path).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, AppError> {
        let defaults = Settings::default();
        Ok(builder
            .set_default("log_level", defaults.log_level)?
            .set_default("camera.device", defaults.camera.device)?
            .set_default("camera.width", defaults.camera.width as i64)?
            .set_default("camera.height", defaults.camera.height as i64)?
            .set_default("camera.fps", defaults.camera.fps as i64)?
            .set_default("camera.orientation", defaults.camera.orientation.as_str())?
            .set_default("detection.timeout_ms", defaults.detection.timeout_ms as i64)?
            .set_default("detection.latency_ms", defaults.detection.latency_ms as i64)?
            .set_default(
                "detection.luminance_threshold",
                defaults.detection.luminance_threshold as i64,
            )?
            .set_default("detection.payload", defaults.detection.payload)?
            .set_default("overlay.label_offset", defaults.overlay.label_offset as f64)?
            .set_default("overlay.label_width", defaults.overlay.label_width as f64)?
            .set_default("overlay.label_height", defaults.overlay.label_height as f64)?
            .set_default("window.title", defaults.window.title)?
            .set_default("window.width", defaults.window.width as f64)?
            .set_default("window.height", defaults.window.height as f64)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AppError> {
        if self.camera.device.trim().is_empty() {
            return Err(AppError::InvalidSetting(
                "Camera device must not be empty".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(AppError::InvalidSetting(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.detection.timeout_ms == 0 {
            return Err(AppError::InvalidSetting(
                "Detection timeout must be greater than 0".to_string(),
            ));
        }

        if self.overlay.label_width <= 0.0 || self.overlay.label_height <= 0.0 {
            return Err(AppError::InvalidSetting(
                "Overlay label must have a positive size".to_string(),
            ));
        }

        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            return Err(AppError::InvalidSetting(
                "Window must have a positive size".to_string(),
            ));
        }

        self.log_level()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<Level, AppError> {
        self.log_level
            .parse::<Level>()
            .map_err(|_| AppError::InvalidSetting(format!("Unknown log level '{}'", self.log_level)))
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_millis(self.detection.timeout_ms)
    }

    pub fn detection_latency(&self) -> Duration {
        Duration::from_millis(self.detection.latency_ms)
    }

    // Overrides the capture device, used by tests and alternate front ends.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.camera.device = device.into();
        self
    }

    // Overrides the capture frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.camera.fps = fps;
        self
    }
}
