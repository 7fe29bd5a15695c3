use crate::scene::shapes::{ImageCmd, RectCmd};

/// Renderer-agnostic draw command stream.
///
/// Bridged functor output never reaches the list as native GPU calls; it only
/// appears as an [`ImageCmd`] sampling the functor's offscreen surface.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Rect(RectCmd),
    Image(ImageCmd),
}

impl DrawCmd {
    #[inline]
    pub fn as_image(&self) -> Option<&ImageCmd> {
        match self {
            DrawCmd::Image(img) => Some(img),
            _ => None,
        }
    }
}
