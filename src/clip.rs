//! The clip-range (solid_segs) occlusion buffer (spec §4.3).
//!
//! Maintains the sorted, disjoint set of screen-column ranges already
//! covered by solid walls and, given a candidate span, returns the
//! sub-spans that remain visible while marking them solid. This is the
//! classic Doom `R_ClipSolidWallSegment` algorithm as specified exactly in
//! spec.md §4.3, structurally grounded in
//! `examples/original_source/bsp/wall_clip.py::clip_solid_wall` (same
//! walk/split/merge/compact shape, same sentinel setup). Note: the emitted
//! gap bounds here use the `-1`/`+1` endpoint adjustments spec.md's
//! pseudocode states explicitly (step 2: `[first, solid[i].first - 1]`,
//! step 4: the gap "between the previous and current interval"); the Python
//! reference passes the stored range fields straight through to
//! `_update_screen_coords` without those adjustments, which would double-
//! count boundary columns, so spec.md's literal algorithm text is followed
//! over the Python source's literal call arguments here (see DESIGN.md).
//! Generalizes (does not merely keep) the teacher's merge-only
//! `add_solid_seg`/`init_solid_segs` in `engine/subsector.rs` and
//! `renderer/software/renderer.rs`, which never emitted visible sub-spans,
//! only recorded occlusion.

use crate::span::{ColumnSpan, update_span};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Range {
    first: i32,
    last: i32,
}

/// Sentinel value for "column count" bound on array growth (spec §4.3
/// sizing note: `RES_W/2 + 1` entries bound the number of disjoint
/// intervals). A `Vec` is used instead of a fixed array; `reset` clears it
/// back to the two sentinels every frame, matching the teacher's per-frame
/// `init_solid_segs`.
pub struct ClipBuffer {
    ranges: Vec<Range>,
}

impl ClipBuffer {
    pub fn new(res_w: i32) -> Self {
        let mut buf = Self { ranges: Vec::new() };
        buf.reset(res_w);
        buf
    }

    /// Reinstall the two sentinels at frame start (spec §4.3).
    pub fn reset(&mut self, res_w: i32) {
        self.ranges.clear();
        self.ranges.push(Range {
            first: -0x7fff_ffff,
            last: -1,
        });
        self.ranges.push(Range {
            first: res_w,
            last: 0x7fff_ffff,
        });
    }

    #[cfg(test)]
    fn disjoint_and_sorted(&self) -> bool {
        self.ranges
            .windows(2)
            .all(|w| w[0].first <= w[0].last && w[0].last + 1 < w[1].first)
    }

    /// Given a candidate solid span, return the visible sub-spans and mark
    /// them solid, merging with whatever already-solid ranges they touch.
    pub fn clip_solid(&mut self, span: &ColumnSpan) -> Vec<ColumnSpan> {
        let first = span.first_col;
        let last = span.last_col - 1; // inclusive column range
        let mut out = Vec::new();

        let mut i = 0usize;
        while first - 1 > self.ranges[i].last {
            i += 1;
        }

        if first < self.ranges[i].first {
            if last < self.ranges[i].first - 1 {
                // Entire span is visible and fits strictly before range i.
                out.push(update_span(span, first, last + 1));
                self.ranges.insert(i, Range { first, last });
                return out;
            }
            out.push(update_span(span, first, self.ranges[i].first));
            self.ranges[i].first = first;
        }

        if last <= self.ranges[i].last {
            // Fully covered by range i.
            return out;
        }

        let mut next = i;
        while last >= self.ranges[next + 1].first - 1 {
            next += 1;
            out.push(update_span(
                span,
                self.ranges[next - 1].last + 1,
                self.ranges[next].first,
            ));
            if last <= self.ranges[next].last {
                log::debug!(
                    "solid-seg merge: range {i} absorbs ranges {}..={next}, columns now {}..={}",
                    i + 1,
                    self.ranges[i].first,
                    self.ranges[next].last
                );
                self.ranges[i].last = self.ranges[next].last;
                self.ranges.drain(i + 1..=next);
                return out;
            }
        }

        out.push(update_span(span, self.ranges[next].last + 1, last + 1));
        self.ranges[i].last = last;

        if i != next {
            log::debug!(
                "solid-seg merge: range {i} absorbs ranges {}..={next}, columns now {}..={last}",
                i + 1,
                self.ranges[i].first
            );
            self.ranges.drain(i + 1..=next);
        }

        out
    }

    /// Two-sided (portal) walls never contribute to the solid buffer; this
    /// is the identity function kept as a component so the rasterizer's
    /// caller has one uniform entry point regardless of `WallKind` (spec
    /// §4.3, `clip_window`).
    pub fn clip_window(span: &ColumnSpan) -> [ColumnSpan; 1] {
        [*span]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(first_col: i32, last_col: i32) -> ColumnSpan {
        ColumnSpan {
            first_col,
            last_col,
            top_start: 10.0,
            top_step: 0.0,
            bottom_start: 100.0,
            bottom_step: 0.0,
            u_start: 0.0,
            u_step: 0.1,
            invz_start: 0.1,
            invz_step: 0.0,
            wall_world_height: 64.0,
        }
    }

    #[test]
    fn first_span_is_fully_visible() {
        let mut buf = ClipBuffer::new(320);
        let out = buf.clip_solid(&span(50, 100));
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].first_col, out[0].last_col), (50, 100));
        assert!(buf.disjoint_and_sorted());
    }

    #[test]
    fn fully_occluded_span_emits_nothing() {
        let mut buf = ClipBuffer::new(320);
        buf.clip_solid(&span(40, 120));
        let out = buf.clip_solid(&span(50, 100));
        assert!(out.is_empty());
    }

    #[test]
    fn closer_wall_splits_farther_wall_into_two_subspans() {
        // Scenario 4 (spec §8): A occludes [c0,c1) out of B's [0,RES_W).
        let mut buf = ClipBuffer::new(320);
        buf.clip_solid(&span(140, 180)); // wall A, already solid
        let out = buf.clip_solid(&span(0, 320)); // wall B, behind A

        assert_eq!(out.len(), 2);
        assert_eq!((out[0].first_col, out[0].last_col), (0, 140));
        assert_eq!((out[1].first_col, out[1].last_col), (180, 320));
        for sub in &out {
            assert_eq!(sub.top_step, 0.0);
            assert_eq!(sub.u_step, 0.1);
        }
        assert!(buf.disjoint_and_sorted());
    }

    #[test]
    fn touching_spans_merge_into_one_range() {
        let mut buf = ClipBuffer::new(320);
        buf.clip_solid(&span(0, 10));
        buf.clip_solid(&span(20, 30));
        // bridges the gap between the two existing ranges
        let out = buf.clip_solid(&span(9, 21));
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].first_col, out[0].last_col), (10, 20));
        assert!(buf.disjoint_and_sorted());
        // left sentinel absorbed both ranges; only it and the right sentinel remain.
        assert_eq!(buf.ranges.len(), 2);
    }
}
