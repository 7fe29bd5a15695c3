use super::{PixelSize, Vec2};

/// Axis-aligned rectangle (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    #[inline]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::from_origin_size(min, max - min)
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let min = self.origin.min(self.max());
        let max = self.origin.max(self.max());
        Rect::from_min_max(min, max)
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let min = a.min().max(b.min());
        let max = a.max().min(b.max());

        if max.x - min.x <= 0.0 || max.y - min.y <= 0.0 {
            None
        } else {
            Some(Rect::from_min_max(min, max))
        }
    }

    /// Smallest rect with integral edges that contains `self`.
    #[inline]
    pub fn round_out(self) -> Rect {
        let r = self.normalized();
        Rect::from_min_max(r.min().floor(), r.max().ceil())
    }

    /// Pixel extent of the rect, rounding partially covered pixels outward.
    ///
    /// Non-finite rects have no extent.
    #[inline]
    pub fn pixel_size(self) -> PixelSize {
        if !self.is_finite() {
            return PixelSize::default();
        }
        let r = self.round_out();
        PixelSize::new(r.size.x.max(0.0) as u32, r.size.y.max(0.0) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── normalized ────────────────────────────────────────────────────────

    #[test]
    fn normalized_positive_is_identity() {
        let rect = r(1.0, 2.0, 10.0, 20.0);
        assert_eq!(rect.normalized(), rect);
    }

    #[test]
    fn normalized_negative_extent() {
        let n = r(10.0, 10.0, -4.0, -3.0).normalized();
        assert_eq!(n, r(6.0, 7.0, 4.0, 3.0));
    }

    // ── intersect ─────────────────────────────────────────────────────────

    #[test]
    fn intersect_overlapping() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let b = r(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(b).unwrap(), r(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn intersect_touching_edge_returns_none() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let b = r(10.0, 0.0, 10.0, 10.0);
        assert!(a.intersect(b).is_none());
    }

    #[test]
    fn intersect_disjoint_returns_none() {
        assert!(r(0.0, 0.0, 5.0, 5.0).intersect(r(20.0, 20.0, 5.0, 5.0)).is_none());
    }

    // ── rounding ──────────────────────────────────────────────────────────

    #[test]
    fn round_out_grows_to_pixel_grid() {
        assert_eq!(r(0.5, 1.25, 10.0, 10.0).round_out(), r(0.0, 1.0, 11.0, 11.0));
    }

    #[test]
    fn pixel_size_of_integral_rect() {
        assert_eq!(r(3.0, 4.0, 100.0, 150.0).pixel_size(), PixelSize::new(100, 150));
    }

    #[test]
    fn pixel_size_of_non_finite_rect_is_empty() {
        assert!(r(0.0, 0.0, f32::INFINITY, 10.0).pixel_size().is_empty());
    }
}
