use core::ops::Mul;

use super::{Rect, Vec2};

/// 2D affine transform, stored as the coefficients `[a, b, c, d, e, f]`:
///
/// ```text
/// x' = a * x + c * y + e
/// y' = b * x + d * y + f
/// ```
///
/// `lhs * rhs` applies `rhs` first, then `lhs`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub coeffs: [f32; 6],
}

impl Transform {
    pub const IDENTITY: Transform = Transform::new([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    #[inline]
    pub const fn new(coeffs: [f32; 6]) -> Self {
        Self { coeffs }
    }

    #[inline]
    pub const fn translate(offset: Vec2) -> Self {
        Self::new([1.0, 0.0, 0.0, 1.0, offset.x, offset.y])
    }

    #[inline]
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    #[inline]
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    /// Translation component.
    #[inline]
    pub fn translation(self) -> Vec2 {
        Vec2::new(self.coeffs[4], self.coeffs[5])
    }

    /// True when the transform maps axis-aligned rects to axis-aligned rects.
    #[inline]
    pub fn preserves_axis_alignment(self) -> bool {
        let [_, b, c, _, _, _] = self.coeffs;
        b == 0.0 && c == 0.0
    }

    #[inline]
    pub fn map_point(self, p: Vec2) -> Vec2 {
        let [a, b, c, d, e, f] = self.coeffs;
        Vec2::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Axis-aligned bounding box of `rect` after mapping.
    pub fn map_rect(self, rect: Rect) -> Rect {
        let r = rect.normalized();
        let (min, max) = (r.min(), r.max());
        let corners = [
            self.map_point(min),
            self.map_point(Vec2::new(max.x, min.y)),
            self.map_point(Vec2::new(min.x, max.y)),
            self.map_point(max),
        ];

        let mut lo = corners[0];
        let mut hi = corners[0];
        for p in &corners[1..] {
            lo = lo.min(*p);
            hi = hi.max(*p);
        }
        Rect::from_min_max(lo, hi)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform {
    type Output = Transform;

    #[inline]
    fn mul(self, rhs: Transform) -> Transform {
        let [a0, b0, c0, d0, e0, f0] = self.coeffs;
        let [a1, b1, c1, d1, e1, f1] = rhs.coeffs;
        Transform::new([
            a0 * a1 + c0 * b1,
            b0 * a1 + d0 * b1,
            a0 * c1 + c0 * d1,
            b0 * c1 + d0 * d1,
            a0 * e1 + c0 * f1 + e0,
            b0 * e1 + d0 * f1 + f0,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_maps_point_to_itself() {
        let p = Vec2::new(3.0, -2.0);
        assert_eq!(Transform::IDENTITY.map_point(p), p);
    }

    #[test]
    fn product_applies_rhs_first() {
        // Scale then translate: (1, 1) -> (2, 2) -> (12, 2).
        let t = Transform::translate(Vec2::new(10.0, 0.0)) * Transform::scale(2.0, 2.0);
        assert_eq!(t.map_point(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 2.0));
    }

    #[test]
    fn map_rect_under_scale_translate() {
        let t = Transform::translate(Vec2::new(5.0, 5.0)) * Transform::scale(2.0, 3.0);
        let mapped = t.map_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(mapped, Rect::new(5.0, 5.0, 20.0, 30.0));
        assert!(t.preserves_axis_alignment());
    }

    #[test]
    fn map_rect_under_rotation_is_bounding_box() {
        // 90 degrees: (x, y) -> (-y, x).
        let rot = Transform::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0]);
        let mapped = rot.map_rect(Rect::new(0.0, 0.0, 10.0, 4.0));
        assert_eq!(mapped, Rect::new(-4.0, 0.0, 4.0, 10.0));
        assert!(!rot.preserves_axis_alignment());
    }
}
