#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A rectangle in display units with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// A rectangle in image-relative coordinates, each component in `[0, 1]`,
/// with the origin at the bottom-left of the image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Converts between bottom-left and top-left origin. The operation is its own inverse.
    pub fn flipped_vertically(&self) -> Self {
        Self::new(self.x, 1.0 - self.y - self.height, self.width, self.height)
    }

    /// Scales the rectangle into a `width` x `height` pixel space without changing its origin convention.
    pub fn to_pixels(&self, width: f32, height: f32) -> Rect {
        Rect::new(
            self.x * width,
            self.y * height,
            self.width * width,
            self.height * height,
        )
    }
}

/// Layout of the live preview: the letterboxed rectangle the video occupies
/// inside the area the preview is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PreviewGeometry {
    video: Rect,
}

impl PreviewGeometry {
    pub fn new(video: Rect) -> Self {
        Self { video }
    }

    /// Fits an upright video of `video_size` into `container`, preserving its
    /// aspect ratio and centering it. The leftover space becomes letterbox
    /// bars above and below, or pillarbox bars at the sides.
    pub fn letterboxed(container: Size, video_size: Size) -> Self {
        if container.is_empty() || video_size.is_empty() {
            return Self::new(Rect::default());
        }

        let scale =
            (container.width / video_size.width).min(container.height / video_size.height);
        let width = video_size.width * scale;
        let height = video_size.height * scale;
        let video = Rect::new(
            (container.width - width) / 2.0,
            (container.height - height) / 2.0,
            width,
            height,
        );
        Self::new(video)
    }

    pub fn video_rect(&self) -> Rect {
        self.video
    }

    /// Maps a detection bounding box (normalized, bottom-left origin, source
    /// image axes) to a rectangle in container coordinates.
    pub fn map_normalized(&self, bounding_box: NormalizedRect) -> Rect {
        bounding_box
            .flipped_vertically()
            .to_pixels(self.video.width, self.video.height)
            .translated(self.video.x, self.video.y)
    }
}
