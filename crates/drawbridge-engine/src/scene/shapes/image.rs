use crate::coords::{PixelSize, Rect};
use crate::functor::SurfaceId;
use crate::scene::{DrawCmd, DrawList, ZIndex};

/// Image draw payload: samples a whole offscreen surface into `dst`.
///
/// The surface is referenced by id only; resolving it to a GPU texture is the
/// compositor's job.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCmd {
    pub surface: SurfaceId,
    /// Destination rect in device pixels.
    pub dst: Rect,
    /// Pixel size of the sampled surface.
    pub size: PixelSize,
}

impl ImageCmd {
    #[inline]
    pub fn new(surface: SurfaceId, dst: Rect, size: PixelSize) -> Self {
        Self { surface, dst, size }
    }
}

impl DrawList {
    /// Records an image draw command.
    #[inline]
    pub fn push_image(&mut self, z: ZIndex, image: ImageCmd) {
        self.push(z, DrawCmd::Image(image));
    }
}
