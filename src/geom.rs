//! 2D vector/line utilities shared by the view classifier and the
//! column-span computer.
//!
//! Grounded on the teacher's use of `glam::Vec2` for all map-space math
//! (`world/bsp.rs`, `world/camera.rs`) rather than hand-rolled tuples.

use glam::Vec2;

/// A segment/line was degenerate (parallel, zero-length) where the caller
/// expected a well-defined result. Never surfaces past the view classifier
/// or column-span computer — callers fold it into "no output".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Degenerate;

/// Intersection of the two infinite lines through `(p0,p1)` and `(p2,p3)`,
/// solved in the standard `A·x + B·y = C` form.
///
/// Fails with [`Degenerate`] when the lines are parallel. The renderer never
/// calls this in a parallel configuration by construction — the view
/// classifier filters those cases before clipping.
pub fn line_intersection(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Result<Vec2, Degenerate> {
    let a1 = p1.y - p0.y;
    let b1 = p0.x - p1.x;
    let c1 = a1 * p0.x + b1 * p0.y;

    let a2 = p3.y - p2.y;
    let b2 = p2.x - p3.x;
    let c2 = a2 * p2.x + b2 * p2.y;

    let det = a1 * b2 - a2 * b1;
    if det.abs() < f32::EPSILON {
        return Err(Degenerate);
    }

    Ok(Vec2::new(
        (b2 * c1 - b1 * c2) / det,
        (a1 * c2 - a2 * c1) / det,
    ))
}

/// Rotate `v` by `angle` radians (counter-clockwise, right-handed 2D).
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

/// Inward-pointing normal of a frustum edge direction `dir`, such that a
/// point `p` is "inside" this half-plane when `p.dot(normal) >= 0`.
///
/// Rotating a ray by `-90°` gives the normal that points towards the
/// opposite ray (i.e. towards the frustum interior) for both the left and
/// right edges, given the rays are built as `rot(+X, -fov/2)` and
/// `rot(+X, +fov/2)`.
#[inline]
pub fn inward_normal(dir: Vec2) -> Vec2 {
    Vec2::new(dir.y, -dir.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersects_at_expected_point() {
        let p = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 0.0),
        )
        .unwrap();
        assert!((p - Vec2::new(5.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn parallel_lines_are_degenerate() {
        let err = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 5.0),
            Vec2::new(10.0, 5.0),
        );
        assert_eq!(err, Err(Degenerate));
    }

    #[test]
    fn rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!((v - Vec2::new(0.0, 1.0)).length() < 1e-4);
    }
}
