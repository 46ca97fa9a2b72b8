//! The BSP walker (spec §4.6): the per-frame entry point that turns a
//! `Viewer` pose and a loaded `Level` into the list of vertical pixel strips
//! the window collaborator blits.
//!
//! Grounded in `examples/original_source/bsp/bsp_map.py::render_view`'s
//! recursive node/leaf split, translated into the iterative-by-recursion
//! shape the teacher's `engine/subsector.rs::render_bsp_node` already uses
//! for the same child-index convention (`world::bsp::SUBSECTOR_BIT`). Owns
//! the frame-lifetime [`crate::clip::ClipBuffer`] and
//! [`crate::raster::Bounds`] the teacher keeps as `Renderer` fields rather
//! than module-global arrays (spec §9 design note on module-global mutable
//! arrays).

use glam::{Vec2, vec2};

use crate::clip::ClipBuffer;
use crate::config::RenderConfig;
use crate::error::MapMalformed;
use crate::raster::{self, Bounds, DrawnColumn, WallKind, rasterize};
use crate::span::{self, ColumnSpan, SegInput, Viewer};
use crate::view::Frustum;
use crate::world::{Aabb, CHILD_MASK, Level, NO_TEXTURE, SUBSECTOR_BIT, TextureBank, TextureId};

/// Frame-lifetime renderer state: the clip buffer and occlusion bounds
/// live here instead of as module-global arrays (spec §9).
pub struct Renderer {
    cfg: RenderConfig,
    frustum: Frustum,
    clip: ClipBuffer,
    bounds: Bounds,
}

impl Renderer {
    pub fn new(cfg: RenderConfig) -> Self {
        let frustum = Frustum::new(cfg.fov);
        let clip = ClipBuffer::new(cfg.res_w as i32);
        let bounds = Bounds::new(cfg.res_w, cfg.res_h as f32);
        Self {
            cfg,
            frustum,
            clip,
            bounds,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.cfg
    }

    /// Render one frame from `viewer`'s pose. Fails only on structurally
    /// broken map data (spec §4.7) — never on anything the BSP walk itself
    /// encounters at runtime.
    pub fn render(
        &mut self,
        level: &Level,
        bank: &TextureBank,
        viewer: &Viewer,
    ) -> Result<Vec<DrawnColumn>, MapMalformed> {
        if level.nodes.is_empty() {
            return Err(MapMalformed::EmptyBsp);
        }

        self.clip.reset(self.cfg.res_w as i32);
        self.bounds.reset(self.cfg.res_h as f32);

        let mut out = Vec::new();
        self.walk_node(level.bsp_root(), level, bank, viewer, &mut out);
        Ok(out)
    }

    // Step 2-4: node recursion / leaf detection (spec §4.6).
    fn walk_node(
        &mut self,
        node_idx: u16,
        level: &Level,
        bank: &TextureBank,
        viewer: &Viewer,
        out: &mut Vec<DrawnColumn>,
    ) {
        if node_idx & SUBSECTOR_BIT != 0 {
            self.draw_subsector(node_idx & CHILD_MASK, level, bank, viewer, out);
            return;
        }

        let node = &level.nodes[node_idx as usize];
        // `Node::point_side` is the cross-product sign test; it picks the
        // same near side as comparing the viewer against the partition
        // normal rotated +π/2 (the two are negatives of one another, so the
        // "front"/"back" child indices line up exactly — see DESIGN.md).
        let near = node.point_side(viewer.pos) as usize;
        let far = 1 - near;

        self.walk_node(node.child[near], level, bank, viewer, out);
        if self.bbox_visible(node.bbox(far), viewer) {
            self.walk_node(node.child[far], level, bank, viewer, out);
        }
    }

    /// A bounding box is worth recursing into when the viewer sits inside
    /// it, or when any of its four edges passes the frustum's
    /// `edge_visible` test (spec §4.6 step 3).
    fn bbox_visible(&self, bbox: Aabb, viewer: &Viewer) -> bool {
        if viewer.pos.x >= bbox.min.x
            && viewer.pos.x <= bbox.max.x
            && viewer.pos.y >= bbox.min.y
            && viewer.pos.y <= bbox.max.y
        {
            return true;
        }

        let corners = [
            vec2(bbox.min.x, bbox.min.y),
            vec2(bbox.max.x, bbox.min.y),
            vec2(bbox.max.x, bbox.max.y),
            vec2(bbox.min.x, bbox.max.y),
        ];

        (0..4).any(|i| {
            let a = viewer.to_view_space(corners[i]);
            let b = viewer.to_view_space(corners[(i + 1) % 4]);
            let ca = self.frustum.classify_point(a);
            let cb = self.frustum.classify_point(b);
            self.frustum.edge_visible(a, b, ca, cb)
        })
    }

    fn draw_subsector(
        &mut self,
        ss_idx: u16,
        level: &Level,
        bank: &TextureBank,
        viewer: &Viewer,
        out: &mut Vec<DrawnColumn>,
    ) {
        log::debug!("bsp leaf: entering subsector {ss_idx}");
        for seg_idx in level.segs_of_subsector(ss_idx) {
            self.draw_seg(seg_idx, level, bank, viewer, out);
        }
    }

    // Step 5: one-sided vs two-sided LineDef dispatch (spec §4.6).
    fn draw_seg(
        &mut self,
        seg_idx: u16,
        level: &Level,
        bank: &TextureBank,
        viewer: &Viewer,
        out: &mut Vec<DrawnColumn>,
    ) {
        let seg = &level.segs[seg_idx as usize];
        let ld = &level.linedefs[seg.linedef as usize];

        // Resolve front/back sidedefs via the seg's own direction relative
        // to the LineDef (direction 1 swaps which side is "front").
        let (front_idx, back_idx) = if seg.dir == 0 {
            (ld.right_sidedef, ld.left_sidedef)
        } else {
            (ld.left_sidedef, ld.right_sidedef)
        };
        let Some(front_idx) = front_idx else {
            return;
        };
        let front = &level.sidedefs[front_idx as usize];
        let front_sector = &level.sectors[front.sector as usize];

        let v0 = level.vertices[seg.v1 as usize].pos;
        let v1 = level.vertices[seg.v2 as usize].pos;
        let ld_v0 = level.vertices[ld.v1 as usize].pos;
        let ld_v1 = level.vertices[ld.v2 as usize].pos;
        let linedef_len = (ld_v1 - ld_v0).length();
        let seg_len = (v1 - v0).length();
        let seg_end_offset = (linedef_len - seg.offset - seg_len).max(0.0);
        let normal_angle = seg.angle + std::f32::consts::FRAC_PI_2;

        match back_idx {
            None => {
                // One-sided LineDef: a solid wall spanning floor to ceiling.
                let wall = SegInput {
                    v0,
                    v1,
                    normal_angle,
                    linedef_len,
                    seg_start_offset: seg.offset,
                    seg_end_offset,
                    ceiling_h: front_sector.ceil_h,
                    floor_h: front_sector.floor_h,
                };
                if let Ok(full) = span::compute_span(&wall, viewer, &self.frustum, &self.cfg) {
                    for sub in self.clip.clip_solid(&full) {
                        self.emit(
                            &sub,
                            front.middle,
                            bank,
                            front.x_off as i32,
                            front.y_off as i32,
                            WallKind::Solid,
                            out,
                        );
                    }
                }
            }
            Some(back_idx) => {
                let back = &level.sidedefs[back_idx as usize];
                let back_sector = &level.sectors[back.sector as usize];

                // UPPER: the step down from this sector's ceiling to the
                // neighbour's, only present if there is one.
                if front_sector.ceil_h > back_sector.ceil_h {
                    let upper = SegInput {
                        v0,
                        v1,
                        normal_angle,
                        linedef_len,
                        seg_start_offset: seg.offset,
                        seg_end_offset,
                        ceiling_h: front_sector.ceil_h,
                        floor_h: back_sector.ceil_h,
                    };
                    if let Ok(span) = span::compute_span(&upper, viewer, &self.frustum, &self.cfg)
                    {
                        let [window] = ClipBuffer::clip_window(&span);
                        self.emit(
                            &window,
                            front.upper,
                            bank,
                            front.x_off as i32,
                            front.y_off as i32,
                            WallKind::Upper,
                            out,
                        );
                    }
                }

                // LOWER: the step up from the neighbour's floor to this
                // sector's, only present if there is one.
                if back_sector.floor_h > front_sector.floor_h {
                    let lower = SegInput {
                        v0,
                        v1,
                        normal_angle,
                        linedef_len,
                        seg_start_offset: seg.offset,
                        seg_end_offset,
                        ceiling_h: back_sector.floor_h,
                        floor_h: front_sector.floor_h,
                    };
                    if let Ok(span) = span::compute_span(&lower, viewer, &self.frustum, &self.cfg)
                    {
                        let [window] = ClipBuffer::clip_window(&span);
                        self.emit(
                            &window,
                            front.lower,
                            bank,
                            front.x_off as i32,
                            front.y_off as i32,
                            WallKind::Lower,
                            out,
                        );
                    }
                }
            }
        }
    }

    /// Rasterize `span` against `tex_id`, falling back to occlusion-only
    /// bookkeeping when the id is the bank's placeholder (spec §7
    /// `TextureMissing`: non-fatal, no pixels, bounds still update).
    fn emit(
        &mut self,
        span: &ColumnSpan,
        tex_id: TextureId,
        bank: &TextureBank,
        x_off: i32,
        y_off: i32,
        kind: WallKind,
        out: &mut Vec<DrawnColumn>,
    ) {
        if tex_id == NO_TEXTURE {
            raster::occlude_only(span, kind, &mut self.bounds);
            return;
        }
        match bank.texture(tex_id) {
            Ok(tex) => out.extend(rasterize(span, tex, x_off, y_off, kind, &mut self.bounds)),
            Err(e) => {
                log::warn!("texture {tex_id} missing from composed set: {e}");
                raster::occlude_only(span, kind, &mut self.bounds);
            }
        }
    }
}

/// Locate the sector containing `pos` by walking the BSP to its leaf and
/// reading off the precomputed owning sector of that subsector (spec §4.6,
/// last paragraph: "same traversal, no rendering"). `Level::finalise_bsp`
/// already performs exactly this traversal once at load time for every
/// subsector, so `sector_search` simply reuses that result rather than
/// re-deriving it per call.
pub fn sector_search(level: &Level, pos: Vec2) -> u16 {
    let ss = level.locate_subsector(pos);
    level.sector_of_subsector[ss as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Linedef, LinedefFlags, Node, Sector, Seg, Sidedef, Subsector, Texture, Vertex};

    // A single square room: four one-sided walls, viewer in the middle.
    fn square_room() -> (Level, TextureBank) {
        let mut bank = TextureBank::default_with_checker();
        let wall_tex = bank
            .insert(
                "WALL",
                Texture {
                    w: 4,
                    h: 64,
                    pixels: vec![0xFF_808080; 4 * 64],
                },
            )
            .unwrap();

        let vertices = vec![
            Vertex {
                pos: vec2(-50.0, -50.0),
            },
            Vertex {
                pos: vec2(50.0, -50.0),
            },
            Vertex {
                pos: vec2(50.0, 50.0),
            },
            Vertex {
                pos: vec2(-50.0, 50.0),
            },
        ];

        let linedefs = vec![Linedef {
            v1: 0,
            v2: 1,
            flags: LinedefFlags::IMPASSABLE,
            special: 0,
            tag: 0,
            right_sidedef: Some(0),
            left_sidedef: None,
        }];

        let sidedefs = vec![Sidedef {
            x_off: 0.0,
            y_off: 0.0,
            upper: NO_TEXTURE,
            lower: NO_TEXTURE,
            middle: wall_tex,
            sector: 0,
        }];

        let sectors = vec![Sector {
            floor_h: 0.0,
            ceil_h: 64.0,
            floor_tex: NO_TEXTURE,
            ceil_tex: NO_TEXTURE,
            light: 255,
            special: 0,
            tag: 0,
        }];

        let segs = vec![Seg {
            v1: 0,
            v2: 1,
            angle: 0.0,
            linedef: 0,
            dir: 0,
            offset: 0.0,
        }];

        let subsectors = vec![Subsector {
            seg_count: 1,
            first_seg: 0,
        }];

        // One node whose single child is the subsector leaf, so the root
        // index itself carries the SUBSECTOR_BIT.
        let nodes = vec![Node {
            x: 0.0,
            y: -50.0,
            dx: 1.0,
            dy: 0.0,
            bbox: [[50.0, -50.0, -50.0, 50.0], [50.0, -50.0, -50.0, 50.0]],
            child: [SUBSECTOR_BIT, SUBSECTOR_BIT],
        }];

        let mut level = Level {
            name: "TEST".into(),
            things: vec![],
            linedefs,
            sidedefs,
            vertices,
            segs,
            subsectors,
            nodes,
            sectors,
            sector_of_subsector: vec![],
        };
        level.finalise_bsp();
        (level, bank)
    }

    #[test]
    fn render_produces_columns_for_visible_wall() {
        let (level, bank) = square_room();
        let cfg = RenderConfig {
            res_w: 64,
            res_h: 48,
            fov: std::f32::consts::FRAC_PI_2,
            wall_height_scale: 1.0,
        };
        let mut renderer = Renderer::new(cfg);
        let viewer = Viewer {
            pos: vec2(0.0, 0.0),
            yaw: -std::f32::consts::FRAC_PI_2, // face -Y, towards the wall at y=-50
            eye_height: 32.0,
        };
        let cols = renderer.render(&level, &bank, &viewer).unwrap();
        assert!(!cols.is_empty());
    }

    #[test]
    fn render_fails_on_empty_bsp() {
        let (mut level, bank) = square_room();
        level.nodes.clear();
        let mut renderer = Renderer::new(RenderConfig::default());
        let viewer = Viewer {
            pos: vec2(0.0, 0.0),
            yaw: 0.0,
            eye_height: 32.0,
        };
        assert!(matches!(
            renderer.render(&level, &bank, &viewer),
            Err(MapMalformed::EmptyBsp)
        ));
    }

    #[test]
    fn sector_search_finds_owning_sector() {
        let (level, _bank) = square_room();
        let sector = sector_search(&level, vec2(0.0, 0.0));
        assert_eq!(sector, 0);
    }
}
