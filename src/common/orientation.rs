use image::DynamicImage;
use serde::Deserialize;

/// Where the top row of the sensor image ends up once the frame is shown upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Up => "up",
            Orientation::Right => "right",
            Orientation::Down => "down",
            Orientation::Left => "left",
        }
    }

    pub fn is_transposed(&self) -> bool {
        matches!(self, Orientation::Right | Orientation::Left)
    }

    /// Dimensions of a `width` x `height` sensor image once it is turned upright.
    pub fn upright_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if self.is_transposed() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Turns a sensor image upright. `Right` means the image has to be rotated
    /// a quarter turn clockwise.
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        match self {
            Orientation::Up => image.clone(),
            Orientation::Right => image.rotate90(),
            Orientation::Down => image.rotate180(),
            Orientation::Left => image.rotate270(),
        }
    }
}
