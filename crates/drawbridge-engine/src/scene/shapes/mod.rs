pub(crate) mod image;
pub(crate) mod rect;

pub use image::ImageCmd;
pub use rect::RectCmd;
