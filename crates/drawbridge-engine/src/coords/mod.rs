//! Coordinate and geometry types shared by the canvas and the functor bridge.
//!
//! Canonical CPU space:
//! - device pixels of the canvas being recorded
//! - origin top-left
//! - +X right, +Y down
//!
//! Local coordinates are mapped to device space by a [`Transform`].

mod rect;
mod size;
mod transform;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use size::PixelSize;
pub use transform::Transform;
pub use vec2::Vec2;
pub use viewport::Viewport;
