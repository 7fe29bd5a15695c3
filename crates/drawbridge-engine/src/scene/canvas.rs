use crate::coords::{Rect, Transform, Vec2, Viewport};
use crate::paint::Color;

use super::{DrawList, ImageCmd, ZIndex};

#[derive(Debug, Copy, Clone)]
struct SavedState {
    transform: Transform,
    clip_depth: usize,
    z: ZIndex,
}

/// Recording canvas for one frame.
///
/// Wraps a [`DrawList`] with the state nodes need while recording: the current
/// local-to-device transform, the clip (kept on the list's clip stack), the
/// z-index new commands are recorded at, and the pixel format of the target
/// the list will eventually be composited into.
///
/// Clips are stored as device-space rects. A clip recorded under a transform
/// that does not preserve axis alignment is widened to its bounding box.
#[derive(Debug)]
pub struct Canvas {
    list: DrawList,
    viewport: Viewport,
    format: wgpu::TextureFormat,
    transform: Transform,
    z: ZIndex,
    save_stack: Vec<SavedState>,
}

impl Canvas {
    pub fn new(viewport: Viewport, format: wgpu::TextureFormat) -> Self {
        Self::with_list(DrawList::new(), viewport, format)
    }

    /// Creates a canvas recording into `list`, reusing its allocations.
    pub fn with_list(mut list: DrawList, viewport: Viewport, format: wgpu::TextureFormat) -> Self {
        list.clear();
        Self {
            list,
            viewport,
            format,
            transform: Transform::IDENTITY,
            z: ZIndex::default(),
            save_stack: Vec::new(),
        }
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Pixel format of the target this canvas is recorded for.
    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Current local-to-device transform.
    #[inline]
    pub fn total_transform(&self) -> Transform {
        self.transform
    }

    #[inline]
    pub fn z_index(&self) -> ZIndex {
        self.z
    }

    #[inline]
    pub fn set_z_index(&mut self, z: ZIndex) {
        self.z = z;
    }

    #[inline]
    pub fn list(&self) -> &DrawList {
        &self.list
    }

    /// Consumes the canvas and returns the recorded list.
    #[inline]
    pub fn finish(self) -> DrawList {
        self.list
    }

    pub fn save(&mut self) {
        self.save_stack.push(SavedState {
            transform: self.transform,
            clip_depth: self.list.clip_depth(),
            z: self.z,
        });
    }

    /// Restores the state captured by the matching [`save`](Self::save).
    ///
    /// An unbalanced restore is ignored.
    pub fn restore(&mut self) {
        let Some(saved) = self.save_stack.pop() else {
            log::debug!("Canvas::restore without matching save; ignored");
            return;
        };
        while self.list.clip_depth() > saved.clip_depth {
            self.list.pop_clip();
        }
        self.transform = saved.transform;
        self.z = saved.z;
    }

    #[inline]
    pub fn concat(&mut self, t: Transform) {
        self.transform = self.transform * t;
    }

    #[inline]
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.concat(Transform::translate(Vec2::new(dx, dy)));
    }

    #[inline]
    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.concat(Transform::scale(sx, sy));
    }

    /// Intersects the clip with `rect` given in local coordinates.
    pub fn clip_rect(&mut self, rect: Rect) {
        let device = self.transform.map_rect(rect);
        self.list.push_clip(device);
    }

    /// Visible device-space area: the active clip intersected with the viewport.
    ///
    /// Returns `None` when nothing recorded now could be visible.
    pub fn device_clip_bounds(&self) -> Option<Rect> {
        if !self.viewport.is_valid() {
            return None;
        }
        let viewport = self.viewport.bounds();
        match self.list.current_clip() {
            Some(clip) => clip.intersect(viewport),
            None => Some(viewport),
        }
    }

    /// Records a solid rect given in local coordinates.
    pub fn draw_rect(&mut self, rect: Rect, color: Color) {
        let device = self.transform.map_rect(rect);
        self.list.push_solid_rect(self.z, device, color);
    }

    /// Records an image command. `image.dst` is already in device pixels.
    pub fn draw_image(&mut self, image: ImageCmd) {
        self.list.push_image(self.z, image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::DrawCmd;

    fn canvas() -> Canvas {
        Canvas::new(Viewport::new(400.0, 300.0), wgpu::TextureFormat::Rgba8Unorm)
    }

    #[test]
    fn degenerate_viewport_exposes_nothing() {
        let zero = Canvas::new(Viewport::new(0.0, 300.0), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(zero.device_clip_bounds(), None);

        let nan = Canvas::new(Viewport::new(f32::NAN, 300.0), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(nan.device_clip_bounds(), None);
    }

    #[test]
    fn unclipped_canvas_exposes_viewport() {
        assert_eq!(canvas().device_clip_bounds(), Some(Rect::new(0.0, 0.0, 400.0, 300.0)));
    }

    #[test]
    fn clip_is_mapped_through_transform() {
        let mut c = canvas();
        c.translate(10.0, 20.0);
        c.scale(2.0, 2.0);
        c.clip_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(c.device_clip_bounds(), Some(Rect::new(10.0, 20.0, 100.0, 100.0)));
    }

    #[test]
    fn clip_outside_viewport_hides_everything() {
        let mut c = canvas();
        c.clip_rect(Rect::new(500.0, 500.0, 10.0, 10.0));
        assert_eq!(c.device_clip_bounds(), None);
    }

    #[test]
    fn restore_unwinds_transform_and_clip() {
        let mut c = canvas();
        c.save();
        c.translate(5.0, 5.0);
        c.clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        c.set_z_index(ZIndex(4));
        c.restore();

        assert!(c.total_transform().is_identity());
        assert_eq!(c.device_clip_bounds(), Some(Rect::new(0.0, 0.0, 400.0, 300.0)));
        assert_eq!(c.z_index(), ZIndex(0));
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut c = canvas();
        c.translate(1.0, 1.0);
        c.restore();
        assert_eq!(c.total_transform().translation(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn draw_rect_records_device_rect_with_clip() {
        let mut c = canvas();
        c.clip_rect(Rect::new(0.0, 0.0, 20.0, 20.0));
        c.translate(3.0, 4.0);
        c.draw_rect(Rect::new(0.0, 0.0, 5.0, 5.0), Color::transparent());

        let list = c.finish();
        let item = &list.items()[0];
        assert_eq!(item.clip_rect, Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
        match &item.cmd {
            DrawCmd::Rect(r) => assert_eq!(r.rect, Rect::new(3.0, 4.0, 5.0, 5.0)),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
