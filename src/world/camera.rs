//! Player view-point in world space, driven by the event loop's input
//! handling. Feeds a [`crate::span::Viewer`] at render time.

use glam::{Vec2, Vec3, vec2};

/// * Only **yaw** (heading) is simulated — Doom never tilts up/down.
/// * `z` holds eye height above the floor, not absolute altitude.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pos: Vec3,
    yaw: f32,
    fov: f32,
}

impl Camera {
    pub fn new(pos: Vec3, yaw: f32, fov: f32) -> Self {
        Self { pos, yaw, fov }
    }

    #[inline]
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Unit vector pointing where the camera looks on the X-Y plane.
    #[inline(always)]
    pub fn forward(self) -> Vec2 {
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(c, s)
    }

    /// Unit vector pointing to the camera's right on the X-Y plane.
    #[inline(always)]
    pub fn right(self) -> Vec2 {
        self.forward().perp()
    }

    /// Move by `forward` units and `side` (strafe), preserving eye-height.
    pub fn step(&mut self, forward: f32, side: f32) {
        let f = self.forward();
        let r = self.right();
        self.pos.x += f.x * forward + r.x * side;
        self.pos.y += f.y * forward + r.y * side;
    }

    /// Rotate around Z-axis (positive = turn left).
    pub fn turn(&mut self, delta_yaw: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
    }

    #[inline]
    pub fn xy(self) -> Vec2 {
        vec2(self.pos.x, self.pos.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn forward_and_right_are_orthonormal() {
        let cam = Camera::new(Vec3::ZERO, 0.3, 1.57);
        let f = cam.forward();
        let r = cam.right();
        assert!((f.length() - 1.0).abs() < 1e-5);
        assert!((r.length() - 1.0).abs() < 1e-5);
        assert!((f.dot(r)).abs() < 1e-5);
    }

    #[test]
    fn turn_wraps_into_0_tau() {
        let mut cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_2);
        cam.turn(-0.5);
        assert!(cam.yaw() > 0.0 && cam.yaw() < std::f32::consts::TAU);
    }

    #[test]
    fn step_moves_along_forward_axis() {
        let mut cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_2);
        cam.step(10.0, 0.0);
        assert!((cam.xy() - vec2(10.0, 0.0)).length() < 1e-4);
    }
}
