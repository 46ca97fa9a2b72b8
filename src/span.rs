//! The column-span computer (spec §4.4).
//!
//! Produces a [`ColumnSpan`]: the fully projected, perspective-correct
//! description of a clipped seg, ready for the clip-range buffer and the
//! rasterizer. Grounded in
//! `examples/original_source/bsp/bsp_map.py::test_render_seg` for the exact
//! projection formulas (`WALL_HEIGHT_SCALE`, NDC-x via `tan(FOV/2)`), and in
//! the teacher's `renderer/software/projection.rs::Edge` for the Rust shape
//! of a per-column-interpolated projected seg.

use glam::Vec2;

use crate::config::RenderConfig;
use crate::geom;
use crate::view::{Frustum, OUTCODE_INSIDE};

/// Per-column-interpolated projection of one clipped wall segment.
///
/// `first_col..last_col` is a half-open screen-column range (`last_col` is
/// one past the final drawn column, matching the rasterizer's `for i in
/// first_col..last_col` loop in spec §4.5).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSpan {
    pub first_col: i32,
    pub last_col: i32,

    pub top_start: f32,
    pub top_step: f32,
    pub bottom_start: f32,
    pub bottom_step: f32,

    pub u_start: f32,
    pub u_step: f32,
    pub invz_start: f32,
    pub invz_step: f32,

    pub wall_world_height: f32,
}

impl ColumnSpan {
    #[inline]
    pub fn n_columns(&self) -> i32 {
        self.last_col - self.first_col
    }

    /// Running value of `top`/`bottom`/`u`/`invz` at column `col`.
    #[inline]
    pub fn at(&self, col: i32) -> (f32, f32, f32, f32) {
        let n = (col - self.first_col) as f32;
        (
            self.top_start + self.top_step * n,
            self.bottom_start + self.bottom_step * n,
            self.u_start + self.u_step * n,
            self.invz_start + self.invz_step * n,
        )
    }
}

/// Re-derive the sub-range `[new_first, new_last)` of `span`, re-deriving
/// every per-column running value at the new bounds by linear
/// interpolation — the step values themselves are invariant (spec §4.3).
pub fn update_span(span: &ColumnSpan, new_first: i32, new_last: i32) -> ColumnSpan {
    let (top_start, bottom_start, u_start, invz_start) = span.at(new_first);
    ColumnSpan {
        first_col: new_first,
        last_col: new_last,
        top_start,
        bottom_start,
        u_start,
        invz_start,
        ..*span
    }
}

/// Everything the column-span computer needs about the seg/linedef/sector
/// combination it is projecting.
pub struct SegInput {
    pub v0: Vec2,
    pub v1: Vec2,
    /// Seg angle + π/2, the seg's stored outward normal direction.
    pub normal_angle: f32,
    pub linedef_len: f32,
    /// Distance from `linedef.start` to `seg.start` / `seg.end` to
    /// `linedef.end`, used to re-derive the untrimmed U range (spec §4.4
    /// step 4).
    pub seg_start_offset: f32,
    pub seg_end_offset: f32,
    pub ceiling_h: f32,
    pub floor_h: f32,
}

/// Viewer pose used to transform world-space points into view space.
#[derive(Clone, Copy, Debug)]
pub struct Viewer {
    pub pos: Vec2,
    pub yaw: f32,
    pub eye_height: f32,
}

impl Viewer {
    #[inline]
    pub fn to_view_space(&self, p: Vec2) -> Vec2 {
        geom::rotate(p - self.pos, -self.yaw)
    }
}

/// Reject reasons the caller folds into "no output"; never surfaced past
/// the BSP walker (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reject {
    BackFace,
    NotVisible,
    Degenerate,
    ZeroArea,
}

/// Run the full column-span computer pipeline (spec §4.4 steps 1-8).
pub fn compute_span(
    seg: &SegInput,
    viewer: &Viewer,
    frustum: &Frustum,
    cfg: &RenderConfig,
) -> Result<ColumnSpan, Reject> {
    // 1. Back-face cull.
    let to_viewer = viewer.pos - seg.v0;
    if to_viewer.length_squared() < 1e-4 {
        return Err(Reject::BackFace);
    }
    let seg_normal = Vec2::new(seg.normal_angle.cos(), seg.normal_angle.sin());
    if to_viewer.normalize().dot(seg_normal) < 0.0 {
        return Err(Reject::BackFace);
    }

    // 2. Transform to view space.
    let mut v0 = viewer.to_view_space(seg.v0);
    let mut v1 = viewer.to_view_space(seg.v1);

    // 3. Classify and test visibility.
    let c0 = frustum.classify_point(v0);
    let c1 = frustum.classify_point(v1);
    if !frustum.edge_visible(v0, v1, c0, c1) {
        return Err(Reject::NotVisible);
    }

    // 4. Clip if needed, and recover the U range.
    let mut u_left = 0.0_f32;
    let mut u_right = seg.linedef_len;
    if !(c0 == OUTCODE_INSIDE && c1 == OUTCODE_INSIDE) {
        let orig_v0 = v0;
        let orig_v1 = v1;
        let (cv0, cv1) = frustum
            .clip_edge(v0, v1, c0, c1)
            .map_err(|_| Reject::Degenerate)?;
        v0 = cv0;
        v1 = cv1;
        u_left = (orig_v0 - v0).length();
        u_right = seg.linedef_len - (orig_v1 - v1).length();
    }
    u_left += seg.seg_start_offset;
    u_right -= seg.seg_end_offset;

    // 5. Project to NDC x.
    let tan_half_fov = cfg.tan_half_fov();
    let mut x0 = v0.y / (tan_half_fov * -v0.x);
    let mut x1 = v1.y / (tan_half_fov * -v1.x);
    let (x0c, x1c) = (x0.clamp(-1.0, 1.0), x1.clamp(-1.0, 1.0));
    let half_w = cfg.res_w as f32 * 0.5;
    let mut first_col = ((x0c.min(x1c) + 1.0) * half_w) as i32;
    let mut last_col = ((x0c.max(x1c) + 1.0) * half_w) as i32;
    if first_col == last_col {
        return Err(Reject::ZeroArea);
    }

    // 6. Ensure v0/x0 is the left endpoint.
    if x0 > x1 {
        std::mem::swap(&mut v0, &mut v1);
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut u_left, &mut u_right);
    }
    let _ = (x0, x1);
    if first_col > last_col {
        std::mem::swap(&mut first_col, &mut last_col);
    }
    let n_columns = (last_col - first_col) as f32;

    // 7. Per-column steps.
    let vfov = cfg.wall_height_scale * cfg.res_h as f32;
    let half_h = cfg.res_h as f32 * 0.5;
    let y_scale0 = vfov / v0.x;
    let y_scale1 = vfov / v1.x;

    let top_start = half_h - y_scale0 * (seg.ceiling_h - viewer.eye_height);
    let top_end = half_h - y_scale1 * (seg.ceiling_h - viewer.eye_height);
    let bottom_start = half_h - y_scale0 * (seg.floor_h - viewer.eye_height);
    let bottom_end = half_h - y_scale1 * (seg.floor_h - viewer.eye_height);

    let invz_start = 1.0 / v0.x;
    let invz_end = 1.0 / v1.x;
    let uoz_start = u_left * invz_start;
    let uoz_end = u_right * invz_end;

    Ok(ColumnSpan {
        first_col,
        last_col,
        top_start,
        top_step: (top_end - top_start) / n_columns,
        bottom_start,
        bottom_step: (bottom_end - bottom_start) / n_columns,
        u_start: uoz_start,
        u_step: (uoz_end - uoz_start) / n_columns,
        invz_start,
        invz_step: (invz_end - invz_start) / n_columns,
        wall_world_height: seg.ceiling_h - seg.floor_h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RenderConfig {
        RenderConfig {
            res_w: 320,
            res_h: 200,
            fov: std::f32::consts::FRAC_PI_2,
            wall_height_scale: 1.0,
        }
    }

    fn viewer_at_origin() -> Viewer {
        Viewer {
            pos: Vec2::ZERO,
            yaw: 0.0,
            eye_height: 32.0,
        }
    }

    #[test]
    fn centered_front_facing_wall_projects_symmetrically() {
        // Wall from (10,-5) to (10,5) at FOV=90 (tan(half)=1) only fills the
        // middle half of the screen: at depth 10 the frustum edge reaches
        // y=±10, so a wall spanning y=±5 covers NDC x in [-0.5, 0.5].
        let cfg = cfg();
        let frustum = Frustum::new(cfg.fov);
        let seg = SegInput {
            v0: Vec2::new(10.0, -5.0),
            v1: Vec2::new(10.0, 5.0),
            normal_angle: std::f32::consts::PI, // faces -X, towards viewer at origin
            linedef_len: 10.0,
            seg_start_offset: 0.0,
            seg_end_offset: 0.0,
            ceiling_h: 64.0,
            floor_h: 0.0,
        };
        let span = compute_span(&seg, &viewer_at_origin(), &frustum, &cfg).unwrap();
        assert_eq!(span.first_col, cfg.res_w as i32 / 4);
        assert_eq!(span.last_col, cfg.res_w as i32 * 3 / 4);
        assert_eq!(span.wall_world_height, 64.0);
    }

    #[test]
    fn back_facing_wall_is_rejected() {
        let cfg = cfg();
        let frustum = Frustum::new(cfg.fov);
        let seg = SegInput {
            v0: Vec2::new(10.0, -5.0),
            v1: Vec2::new(10.0, 5.0),
            normal_angle: std::f32::consts::PI,
            linedef_len: 10.0,
            seg_start_offset: 0.0,
            seg_end_offset: 0.0,
            ceiling_h: 64.0,
            floor_h: 0.0,
        };
        let viewer = Viewer {
            pos: Vec2::new(20.0, 0.0),
            yaw: 0.0,
            eye_height: 32.0,
        };
        let result = compute_span(&seg, &viewer, &frustum, &cfg);
        assert_eq!(result, Err(Reject::BackFace));
    }
}
