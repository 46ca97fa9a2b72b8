//! View-frustum classifier.
//!
//! Operates entirely in *local view space*: the viewer sits at the origin
//! looking down `+X`; `+Y` is to the viewer's right. Callers (the column-span
//! computer, the BSP walker's bounding-box test) are responsible for
//! transforming world-space points into this frame first.
//!
//! The outcode convention is **inverted** relative to the classic
//! Cohen-Sutherland scheme: `0b111` (all three bits set) means *inside* the
//! frustum, not outside. This module reproduces that convention exactly, as
//! required — see the Open Question in `DESIGN.md`. Concretely, bit 0 is set
//! when the point does *not* violate the left frustum half-plane, bit 1 when
//! it does not violate the right half-plane, and bit 2 when the point is in
//! front of the viewer; a point that violates none of the three conditions
//! yields `0b111`.
//!
//! The bit-to-side assignment (bit 0 ↔ left, bit 1 ↔ right) matches
//! `examples/original_source/bsp/bsp_map.py::_classify_point_to_view`
//! exactly. `spec.md` §4.2 labels bit 0 "outside right" and bit 1 "outside
//! left" — the reverse — but the control-flow rules in `edge_visible` and
//! `clip_edge` only ever test bit patterns (`0b011`, `0b111`, `0b100`)
//! produced by this same function, so the labelling is immaterial to
//! behaviour as long as `classify_point` and the two functions below stay in
//! lock-step, which they do by construction here.

use glam::Vec2;

use crate::geom::{self, Degenerate};

pub const OUTCODE_INSIDE: u8 = 0b111;
const BIT_LEFT: u8 = 0b001;
const BIT_RIGHT: u8 = 0b010;
const BIT_FRONT: u8 = 0b100;

/// The two view-frustum edge rays and their (outward-tested) normals,
/// precomputed once per frame from the horizontal field of view.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub left: Vec2,
    pub right: Vec2,
    left_norm: Vec2,
    right_norm: Vec2,
}

impl Frustum {
    pub fn new(fov: f32) -> Self {
        let half = fov * 0.5;
        let left = geom::rotate(Vec2::X, -half);
        let right = geom::rotate(Vec2::X, half);
        Self {
            left,
            right,
            left_norm: Vec2::new(-left.y, left.x),
            right_norm: Vec2::new(right.y, -right.x),
        }
    }

    /// 3-bit outcode for a point already in local view space. See module
    /// docs for the (inverted) sign convention.
    #[inline]
    pub fn classify_point(&self, p: Vec2) -> u8 {
        let mut c = 0u8;
        if (-p).dot(self.left_norm) < 0.0 {
            c |= BIT_LEFT;
        }
        if (-p).dot(self.right_norm) < 0.0 {
            c |= BIT_RIGHT;
        }
        if (-p).dot(Vec2::X) < 0.0 {
            c |= BIT_FRONT;
        }
        c
    }

    /// Visibility test for an edge given its endpoints' outcodes.
    ///
    /// Rules, evaluated in order (spec §4.2):
    /// 1. Either endpoint fully inside ⇒ visible.
    /// 2. Both endpoints violate the same half-plane ⇒ not visible.
    /// 3. Endpoints straddle opposite sides, with at least one in front ⇒
    ///    visible.
    /// 4. Endpoints differ on every bit ⇒ intersect with the forward axis;
    ///    visible iff the intersection lies ahead of the viewer.
    pub fn edge_visible(&self, p0: Vec2, p1: Vec2, c0: u8, c1: u8) -> bool {
        if c0 == OUTCODE_INSIDE || c1 == OUTCODE_INSIDE {
            return true;
        }
        let x = c0 ^ c1;
        if x == 0 {
            return false;
        }
        if x == (BIT_LEFT | BIT_RIGHT) && (c0 & BIT_FRONT) != 0 {
            return true;
        }
        if x == OUTCODE_INSIDE {
            if let Ok(p) = geom::line_intersection(p0, p1, Vec2::ZERO, Vec2::X) {
                return p.dot(Vec2::X) > 0.0;
            }
        }
        false
    }

    /// Clip an edge against the frustum, replacing any endpoint that is not
    /// fully inside with its intersection against the violated frustum ray.
    /// Caller must have already established (via `edge_visible`) that the
    /// edge is not degenerate-invisible.
    pub fn clip_edge(
        &self,
        p0: Vec2,
        p1: Vec2,
        c0: u8,
        c1: u8,
    ) -> Result<(Vec2, Vec2), Degenerate> {
        if c0 == OUTCODE_INSIDE && c1 == OUTCODE_INSIDE {
            return Ok((p0, p1));
        }

        if c0 == OUTCODE_INSIDE || c1 == OUTCODE_INSIDE {
            let inside_is_p1 = c1 == OUTCODE_INSIDE;
            let outside_code = if inside_is_p1 { c0 } else { c1 };

            let new_outside = if outside_code & BIT_RIGHT != 0 {
                geom::line_intersection(Vec2::ZERO, self.left, p0, p1)?
            } else if outside_code & BIT_LEFT != 0 {
                geom::line_intersection(Vec2::ZERO, self.right, p0, p1)?
            } else {
                let pl = geom::line_intersection(Vec2::ZERO, self.left, p0, p1)?;
                if (-pl).dot(Vec2::X) < 0.0 {
                    pl
                } else {
                    geom::line_intersection(Vec2::ZERO, self.right, p0, p1)?
                }
            };

            return Ok(if inside_is_p1 {
                (new_outside, p1)
            } else {
                (p0, new_outside)
            });
        }

        // Neither endpoint inside: p0 clips against the right ray, p1
        // against the left ray (spec §4.2, last sentence).
        let new_p0 = geom::line_intersection(Vec2::ZERO, self.right, p0, p1)?;
        let new_p1 = geom::line_intersection(Vec2::ZERO, self.left, p0, p1)?;
        Ok((new_p0, new_p1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn frustum_90() -> Frustum {
        Frustum::new(FRAC_PI_2)
    }

    #[test]
    fn point_straight_ahead_is_inside() {
        let f = frustum_90();
        assert_eq!(f.classify_point(Vec2::new(10.0, 0.0)), OUTCODE_INSIDE);
    }

    #[test]
    fn point_behind_viewer_is_not_inside() {
        let f = frustum_90();
        assert_ne!(f.classify_point(Vec2::new(-10.0, 0.0)), OUTCODE_INSIDE);
    }

    #[test]
    fn clip_edge_roundtrips_when_both_inside() {
        let f = frustum_90();
        let p0 = Vec2::new(5.0, -1.0);
        let p1 = Vec2::new(5.0, 1.0);
        let c0 = f.classify_point(p0);
        let c1 = f.classify_point(p1);
        assert_eq!(c0, OUTCODE_INSIDE);
        assert_eq!(c1, OUTCODE_INSIDE);
        let (q0, q1) = f.clip_edge(p0, p1, c0, c1).unwrap();
        assert_eq!((q0, q1), (p0, p1));
    }

    #[test]
    fn same_side_edge_not_visible() {
        let f = frustum_90();
        // Both points far to the left, outside the left half-plane.
        let p0 = Vec2::new(1.0, -50.0);
        let p1 = Vec2::new(2.0, -60.0);
        let c0 = f.classify_point(p0);
        let c1 = f.classify_point(p1);
        assert!(!f.edge_visible(p0, p1, c0, c1));
    }

    #[test]
    fn wall_spanning_whole_fov_is_visible() {
        let f = frustum_90();
        let p0 = Vec2::new(10.0, -20.0);
        let p1 = Vec2::new(10.0, 20.0);
        let c0 = f.classify_point(p0);
        let c1 = f.classify_point(p1);
        assert!(f.edge_visible(p0, p1, c0, c1));
    }
}
