use crate::common::{Frame, Orientation, Size};
use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub orientation: Orientation,
}

impl VideoFormat {
    /// Size of the video once frames are turned upright for display.
    pub fn display_size(&self) -> Size {
        let (width, height) = self.orientation.upright_dimensions(self.width, self.height);
        Size::new(width as f32, height as f32)
    }
}

/// A device that produces frames. `open` performs all setup that can fail;
/// `next_frame` blocks until the next frame is due and returns `None` once
/// the device has nothing more to deliver.
pub trait CaptureSource: Send + 'static {
    fn open(&mut self) -> Result<VideoFormat, CaptureError>;
    fn next_frame(&mut self) -> Option<Frame>;
    fn name(&self) -> &str;
}

/// Receives every frame the capture thread produces. Must return quickly.
pub trait FrameConsumer: Send + Sync {
    fn consume(&self, frame: Frame);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_size_accounts_for_orientation() {
        let format = VideoFormat {
            width: 1920,
            height: 1080,
            fps: 30,
            orientation: Orientation::Right,
        };
        assert_eq!(format.display_size(), Size::new(1080.0, 1920.0));
    }
}
