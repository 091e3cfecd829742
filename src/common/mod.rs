pub mod frame;
pub mod geometry;
pub mod orientation;

pub use frame::Frame;
pub use geometry::{NormalizedRect, PreviewGeometry, Rect, Size};
pub use orientation::Orientation;
