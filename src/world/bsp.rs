//! BSP tree helpers shared by the renderer's walker and `sector_search`.
//!
//! Grounded in the teacher's `world/bsp.rs` (child-index convention,
//! `Level::locate_subsector`/`finalise_bsp`/`segs_of_subsector`) merged with
//! the float-based `Node`/`Aabb` shape from `world/helpers.rs`, which this
//! module supersedes — the blockmap/`bbox_in_fov` angle-wedge machinery in
//! `helpers.rs` is dropped in favour of the `edge_visible`-based bounding-box
//! test in `crate::render` (spec §4.6).

use glam::{Vec2, vec2};

use crate::world::geometry::{Level, Node};

pub const CHILD_MASK: u16 = 0x7FFF;
pub const SUBSECTOR_BIT: u16 = 0x8000;

impl Level {
    /// Index of the BSP root (`nodes.len()-1` in Doom).
    #[inline(always)]
    pub fn bsp_root(&self) -> u16 {
        assert!(!self.nodes.is_empty());
        (self.nodes.len() - 1) as u16
    }

    /// Walk the BSP and return the subsector id containing `p`.
    pub fn locate_subsector(&self, p: Vec2) -> u16 {
        let mut idx = self.bsp_root();
        loop {
            let node = &self.nodes[idx as usize];
            let child = node.child[node.point_side(p) as usize];
            if child & SUBSECTOR_BIT != 0 {
                return child & CHILD_MASK;
            }
            idx = child;
        }
    }

    /// Build `sector_of_subsector` once after load.
    pub fn finalise_bsp(&mut self) {
        self.sector_of_subsector = self
            .subsectors
            .iter()
            .map(|ss| {
                let seg = &self.segs[ss.first_seg as usize];
                let ld = &self.linedefs[seg.linedef as usize];
                let side = if seg.dir == 0 {
                    ld.right_sidedef
                } else {
                    ld.left_sidedef
                };
                side.and_then(|s| self.sidedefs.get(s as usize))
                    .map(|sd| sd.sector)
                    .unwrap_or(0)
            })
            .collect();
    }

    /// Iterate **seg indices** that form subsector `ss_idx`.
    pub fn segs_of_subsector(&self, ss_idx: u16) -> impl Iterator<Item = u16> + '_ {
        let ss = &self.subsectors[ss_idx as usize];
        let start = ss.first_seg as usize;
        let end = start + ss.seg_count as usize;
        (start..end).map(|i| i as u16)
    }

    /// Iterate **linedef indices** bordering sector `sector_idx`.
    pub fn linedefs_of_sector(&self, sector_idx: u16) -> impl Iterator<Item = u16> + '_ {
        self.linedefs
            .iter()
            .enumerate()
            .filter(move |(_, ld)| {
                ld.right_sidedef
                    .and_then(|s| self.sidedefs.get(s as usize))
                    .is_some_and(|sd| sd.sector == sector_idx)
                    || ld
                        .left_sidedef
                        .and_then(|s| self.sidedefs.get(s as usize))
                        .is_some_and(|sd| sd.sector == sector_idx)
            })
            .map(|(i, _)| i as u16)
    }
}

/// Axis-aligned bounding box (map units).
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Node {
    /// 0 = front of the splitter, 1 = back.
    #[inline(always)]
    pub fn point_side(&self, p: Vec2) -> usize {
        let d = (p.x - self.x) * self.dy - (p.y - self.y) * self.dx;
        if d >= 0.0 { 0 } else { 1 }
    }

    /// Bounding box of child `side` (0 front, 1 back).
    pub fn bbox(&self, side: usize) -> Aabb {
        let bb = self.bbox[side];
        Aabb {
            min: vec2(bb[2], bb[1]), // x-min, y-min
            max: vec2(bb[3], bb[0]), // x-max, y-max
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(x: f32, y: f32, dx: f32, dy: f32) -> Node {
        Node {
            x,
            y,
            dx,
            dy,
            bbox: [[10.0, -10.0, -10.0, 10.0], [10.0, -10.0, -10.0, 10.0]],
            child: [0, 1],
        }
    }

    #[test]
    fn point_side_matches_cross_product_sign() {
        let n = node(0.0, 0.0, 1.0, 0.0); // splitter along +X
        assert_eq!(n.point_side(vec2(5.0, 1.0)), 0);
        assert_eq!(n.point_side(vec2(5.0, -1.0)), 1);
    }

    #[test]
    fn bbox_reads_doom_layout() {
        let n = node(0.0, 0.0, 1.0, 0.0);
        let bb = n.bbox(0);
        assert_eq!(bb.min, vec2(-10.0, -10.0));
        assert_eq!(bb.max, vec2(10.0, 10.0));
    }
}
