use crate::capture::{CaptureSource, VideoFormat};
use crate::common::{Frame, Orientation};
use crate::config::CameraSettings;
use crate::error::CaptureError;
use chrono::Utc;
use image::{DynamicImage, Rgb, RgbImage};
use std::time::{Duration, Instant};

pub const SYNTHETIC_DEVICE: &str = "synthetic";

const BACKGROUND: Rgb<u8> = Rgb([220, 220, 220]);
const MARKER: Rgb<u8> = Rgb([16, 16, 16]);
// Pixels the marker moves per frame.
const MARKER_STEP: u32 = 6;

/// Test-pattern camera: a light frame with a dark square bouncing across it.
pub struct SyntheticCamera {
    device: String,
    width: u32,
    height: u32,
    fps: u32,
    orientation: Orientation,
    tick: u64,
    next_due: Option<Instant>,
}

impl SyntheticCamera {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            device: settings.device.clone(),
            width: settings.width,
            height: settings.height,
            fps: settings.fps,
            orientation: settings.orientation,
            tick: 0,
            next_due: None,
        }
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    fn marker_size(&self) -> u32 {
        (self.width.min(self.height) / 4).max(1)
    }

    // Marker position for `tick`, moving diagonally and bouncing off the edges.
    fn marker_origin(&self, tick: u64) -> (u32, u32) {
        let size = self.marker_size();
        let bounce = |span: u32| -> u32 {
            let travel = span.saturating_sub(size) as u64;
            if travel == 0 {
                return 0;
            }
            let pos = (tick * MARKER_STEP as u64) % (2 * travel);
            (if pos > travel { 2 * travel - pos } else { pos }) as u32
        };
        (bounce(self.width), bounce(self.height))
    }

    fn render(&self, tick: u64) -> RgbImage {
        let mut image = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let size = self.marker_size();
        let (x0, y0) = self.marker_origin(tick);
        for y in y0..(y0 + size).min(self.height) {
            for x in x0..(x0 + size).min(self.width) {
                image.put_pixel(x, y, MARKER);
            }
        }
        image
    }

    fn wait_for_next_tick(&mut self) {
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            std::thread::sleep(due - now);
        }
        // Restart the schedule if the consumer fell more than a frame behind.
        let interval = self.frame_interval();
        self.next_due = Some(if Instant::now() > due + interval {
            Instant::now() + interval
        } else {
            due + interval
        });
    }
}

impl CaptureSource for SyntheticCamera {
    fn open(&mut self) -> Result<VideoFormat, CaptureError> {
        if self.device != SYNTHETIC_DEVICE {
            return Err(CaptureError::DeviceNotFound(self.device.clone()));
        }
        if self.width == 0 || self.height == 0 || self.fps == 0 {
            return Err(CaptureError::InvalidFormat {
                width: self.width,
                height: self.height,
                fps: self.fps,
            });
        }
        self.tick = 0;
        self.next_due = None;
        tracing::info!(
            "Opened synthetic camera {}x{} @ {} fps ({})",
            self.width,
            self.height,
            self.fps,
            self.orientation.as_str()
        );
        Ok(VideoFormat {
            width: self.width,
            height: self.height,
            fps: self.fps,
            orientation: self.orientation,
        })
    }

    fn next_frame(&mut self) -> Option<Frame> {
        self.wait_for_next_tick();
        let image = self.render(self.tick);
        self.tick += 1;
        Some(Frame::new(
            DynamicImage::ImageRgb8(image),
            self.orientation,
            Utc::now(),
        ))
    }

    fn name(&self) -> &str {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(device: &str, width: u32, height: u32, fps: u32) -> CameraSettings {
        CameraSettings {
            device: device.to_string(),
            width,
            height,
            fps,
            orientation: Orientation::Up,
        }
    }

    #[test]
    fn unknown_device_fails_to_open() {
        let mut camera = SyntheticCamera::new(&settings("usb-0", 64, 48, 30));
        assert_eq!(
            camera.open(),
            Err(CaptureError::DeviceNotFound("usb-0".to_string()))
        );
    }

    #[test]
    fn empty_format_fails_to_open() {
        let mut camera = SyntheticCamera::new(&settings(SYNTHETIC_DEVICE, 0, 48, 30));
        assert!(matches!(
            camera.open(),
            Err(CaptureError::InvalidFormat { width: 0, .. })
        ));
    }

    #[test]
    fn frames_contain_the_marker() {
        let mut camera = SyntheticCamera::new(&settings(SYNTHETIC_DEVICE, 64, 48, 1000));
        let format = camera.open().unwrap();
        assert_eq!((format.width, format.height), (64, 48));

        let frame = camera.next_frame().unwrap();
        let image = frame.image().to_rgb8();
        assert_eq!(image.dimensions(), (64, 48));
        // First tick puts the 12px marker at the origin.
        assert_eq!(image.get_pixel(0, 0), &MARKER);
        assert_eq!(image.get_pixel(11, 11), &MARKER);
        assert_eq!(image.get_pixel(12, 12), &BACKGROUND);
    }

    #[test]
    fn marker_stays_inside_the_frame() {
        let camera = SyntheticCamera::new(&settings(SYNTHETIC_DEVICE, 64, 48, 30));
        let size = camera.marker_size();
        for tick in 0..200 {
            let (x, y) = camera.marker_origin(tick);
            assert!(x + size <= 64, "x={} at tick {}", x, tick);
            assert!(y + size <= 48, "y={} at tick {}", y, tick);
        }
    }
}
