//! Doom **map-lump parser** — builds on [`crate::wad::raw::Wad`].
//!
//! Classic Doom stores each playable map as **eight mandatory lumps**
//! following a *zero-length marker* (`E1M1`, `MAP01`, …):
//!
//! ```text
//! [marker] THINGS LINEDEFS SIDEDEFS VERTEXES SEGS SSECTORS NODES SECTORS
//! ```
//!
//! This module adds two helpers to `Wad`:
//!
//! * `level_indices()` — discover all marker lumps.
//! * `parse_level()`   — decode a single map into the `Raw*` structures
//!   below, still in WAD-native fixed-point form. [`crate::wad::loader`]
//!   converts these into [`crate::world::geometry::Level`].

use crate::wad::raw::{Wad, WadError};
use byteorder::{LittleEndian as LE, ReadBytesExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read};

/// Sentinel stored in `RawLinedef::right_sidedef`/`left_sidedef` for "no
/// sidedef on this side".
pub const NO_SIDEDEF: u16 = 0xFFFF;

/// An in-world object: monster, pickup, player start, etc.
#[derive(Clone, Debug)]
pub struct RawThing {
    pub x: i16,
    pub y: i16,
    pub angle: u16,
    pub type_id: u16,
    pub options: u16,
}

/// A map edge.
#[derive(Clone, Debug)]
pub struct RawLinedef {
    pub v1: u16,
    pub v2: u16,
    pub flags: u16,
    pub special: u16,
    pub tag: u16,
    pub right_sidedef: u16,
    pub left_sidedef: u16,
}

/// Texture information for one side of a linedef.
#[derive(Clone, Debug)]
pub struct RawSidedef {
    pub x_off: i16,
    pub y_off: i16,
    pub upper_tex: [u8; 8],
    pub lower_tex: [u8; 8],
    pub mid_tex: [u8; 8],
    pub sector: u16,
}

/// A vertex in map space.
#[derive(Clone, Copy, Debug)]
pub struct RawVertex {
    pub x: i16,
    pub y: i16,
}

/// Segment (part of a linedef inside a subsector).
#[derive(Clone, Debug)]
pub struct RawSeg {
    pub v1: u16,
    pub v2: u16,
    pub angle: i16,
    pub linedef: u16,
    pub dir: u16,
    pub offset: i16,
}

/// BSP leaf.
#[derive(Clone, Debug)]
pub struct RawSubsector {
    pub seg_count: u16,
    pub first_seg: u16,
}

/// One BSP node that splits space.
#[derive(Clone, Debug)]
pub struct RawNode {
    pub x: i16,
    pub y: i16,
    pub dx: i16,
    pub dy: i16,
    /// `[front: top, bottom, left, right]` then `[back: …]`.
    pub bbox: [[i16; 4]; 2],
    /// Child indices — bit 15 set ⇒ child is a subsector.
    pub child: [u16; 2],
}

/// A convex sector region (floor/ceiling/light).
#[derive(Clone, Debug)]
pub struct RawSector {
    pub floor_h: i16,
    pub ceil_h: i16,
    pub floor_tex: [u8; 8],
    pub ceil_tex: [u8; 8],
    pub light: i16,
    pub special: i16,
    pub tag: i16,
}

/// High-level representation of a playable map, still WAD-native.
#[derive(Clone, Debug)]
pub struct RawLevel {
    pub name: String,
    pub things: Vec<RawThing>,
    pub linedefs: Vec<RawLinedef>,
    pub sidedefs: Vec<RawSidedef>,
    pub vertices: Vec<RawVertex>,
    pub segs: Vec<RawSeg>,
    pub subsectors: Vec<RawSubsector>,
    pub nodes: Vec<RawNode>,
    pub sectors: Vec<RawSector>,
}

/// Things that can go wrong while decoding.
#[derive(thiserror::Error, Debug)]
pub enum LevelError {
    #[error("level marker idx {0} out of range")]
    MarkerOob(usize),
    #[error("required lump {0} missing between markers")]
    Missing(&'static str),
    #[error("truncated lump {0}")]
    Truncated(&'static str),
    #[error(transparent)]
    Wad(#[from] WadError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/*=======================================================================*/
/*                     Convenience helpers on `Wad`                      */
/*=======================================================================*/
impl Wad {
    /// Return directory indices of every map marker (`E#M#`, `MAP##`).
    pub fn level_indices(&self) -> Vec<usize> {
        static RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^(E[1-4]M[1-9]|MAP[0-3][0-9])$").unwrap());

        self.lumps
            .iter()
            .enumerate()
            .filter(|(_, l)| l.size == 0 && RE.is_match(Wad::lump_name_str(&l.name)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Deserialize the eight mandatory lumps that form one map.
    pub fn parse_level(&self, marker_idx: usize) -> Result<RawLevel, LevelError> {
        let marker = self.lumps.get(marker_idx).ok_or(LevelError::MarkerOob(marker_idx))?;
        let name = Wad::lump_name_str(&marker.name).to_string();

        // ---- work out the map span (up to next zero-length lump) ----------
        let mut span_end = self.lumps.len();
        for i in marker_idx + 1..self.lumps.len() {
            if self.lumps[i].size == 0 {
                span_end = i;
                break;
            }
        }

        // locate lump name inside span → directory index
        let find = |name: &str| -> Option<usize> {
            self.lumps[marker_idx + 1..span_end]
                .iter()
                .position(|l| Wad::lump_name_str(&l.name) == name)
                .map(|rel| rel + marker_idx + 1)
        };

        // verify mandatory lumps
        const NEED: &[&str] = &[
            "THINGS", "LINEDEFS", "SIDEDEFS", "VERTEXES", "SEGS", "SSECTORS", "NODES", "SECTORS",
        ];
        for &n in NEED {
            if find(n).is_none() {
                return Err(LevelError::Missing(n));
            }
        }

        // helper macro: parse repetitive arrays
        macro_rules! parse_vec {
            ($buf:expr, $size:expr, $label:expr, $body:expr) => {{
                if $buf.len() % $size != 0 {
                    return Err(LevelError::Truncated($label));
                }
                let mut cur = Cursor::new($buf);
                let mut v = Vec::with_capacity($buf.len() / $size);
                while (cur.position() as usize) < $buf.len() {
                    v.push($body(&mut cur)?);
                }
                v
            }};
        }

        let read_tex = |c: &mut Cursor<&[u8]>| -> std::io::Result<[u8; 8]> {
            let mut t = [0u8; 8];
            c.read_exact(&mut t)?;
            Ok(t)
        };

        // 1. THINGS (10 bytes)
        let things = {
            let buf = self.lump_bytes(find("THINGS").unwrap())?;
            parse_vec!(
                buf,
                10,
                "THINGS",
                |c: &mut Cursor<&[u8]>| -> std::io::Result<RawThing> {
                    Ok(RawThing {
                        x: c.read_i16::<LE>()?,
                        y: c.read_i16::<LE>()?,
                        angle: c.read_u16::<LE>()?,
                        type_id: c.read_u16::<LE>()?,
                        options: c.read_u16::<LE>()?,
                    })
                }
            )
        };

        // 2. LINEDEFS (14 bytes)
        let linedefs = {
            let buf = self.lump_bytes(find("LINEDEFS").unwrap())?;
            parse_vec!(
                buf,
                14,
                "LINEDEFS",
                |c: &mut Cursor<&[u8]>| -> std::io::Result<RawLinedef> {
                    Ok(RawLinedef {
                        v1: c.read_u16::<LE>()?,
                        v2: c.read_u16::<LE>()?,
                        flags: c.read_u16::<LE>()?,
                        special: c.read_u16::<LE>()?,
                        tag: c.read_u16::<LE>()?,
                        right_sidedef: c.read_u16::<LE>()?,
                        left_sidedef: c.read_u16::<LE>()?,
                    })
                }
            )
        };

        // 3. SIDEDEFS (30 bytes)
        let sidedefs = {
            let buf = self.lump_bytes(find("SIDEDEFS").unwrap())?;
            parse_vec!(
                buf,
                30,
                "SIDEDEFS",
                |c: &mut Cursor<&[u8]>| -> std::io::Result<RawSidedef> {
                    Ok(RawSidedef {
                        x_off: c.read_i16::<LE>()?,
                        y_off: c.read_i16::<LE>()?,
                        upper_tex: read_tex(c)?,
                        lower_tex: read_tex(c)?,
                        mid_tex: read_tex(c)?,
                        sector: c.read_u16::<LE>()?,
                    })
                }
            )
        };

        // 4. VERTEXES (4 bytes)
        let vertices = {
            let buf = self.lump_bytes(find("VERTEXES").unwrap())?;
            parse_vec!(
                buf,
                4,
                "VERTEXES",
                |c: &mut Cursor<&[u8]>| -> std::io::Result<RawVertex> {
                    Ok(RawVertex {
                        x: c.read_i16::<LE>()?,
                        y: c.read_i16::<LE>()?,
                    })
                }
            )
        };

        // 5. SEGS (12 bytes)
        let segs = {
            let buf = self.lump_bytes(find("SEGS").unwrap())?;
            parse_vec!(
                buf,
                12,
                "SEGS",
                |c: &mut Cursor<&[u8]>| -> std::io::Result<RawSeg> {
                    Ok(RawSeg {
                        v1: c.read_u16::<LE>()?,
                        v2: c.read_u16::<LE>()?,
                        angle: c.read_i16::<LE>()?,
                        linedef: c.read_u16::<LE>()?,
                        dir: c.read_u16::<LE>()?,
                        offset: c.read_i16::<LE>()?,
                    })
                }
            )
        };

        // 6. SSECTORS (4 bytes)
        let subsectors = {
            let buf = self.lump_bytes(find("SSECTORS").unwrap())?;
            parse_vec!(
                buf,
                4,
                "SSECTORS",
                |c: &mut Cursor<&[u8]>| -> std::io::Result<RawSubsector> {
                    Ok(RawSubsector {
                        seg_count: c.read_u16::<LE>()?,
                        first_seg: c.read_u16::<LE>()?,
                    })
                }
            )
        };

        // 7. NODES (28 bytes)
        let nodes = {
            let buf = self.lump_bytes(find("NODES").unwrap())?;
            parse_vec!(
                buf,
                28,
                "NODES",
                |c: &mut Cursor<&[u8]>| -> std::io::Result<RawNode> {
                    Ok(RawNode {
                        x: c.read_i16::<LE>()?,
                        y: c.read_i16::<LE>()?,
                        dx: c.read_i16::<LE>()?,
                        dy: c.read_i16::<LE>()?,
                        bbox: [
                            [
                                c.read_i16::<LE>()?,
                                c.read_i16::<LE>()?,
                                c.read_i16::<LE>()?,
                                c.read_i16::<LE>()?,
                            ],
                            [
                                c.read_i16::<LE>()?,
                                c.read_i16::<LE>()?,
                                c.read_i16::<LE>()?,
                                c.read_i16::<LE>()?,
                            ],
                        ],
                        child: [c.read_u16::<LE>()?, c.read_u16::<LE>()?],
                    })
                }
            )
        };

        // 8. SECTORS (26 bytes)
        let sectors = {
            let buf = self.lump_bytes(find("SECTORS").unwrap())?;
            parse_vec!(
                buf,
                26,
                "SECTORS",
                |c: &mut Cursor<&[u8]>| -> std::io::Result<RawSector> {
                    Ok(RawSector {
                        floor_h: c.read_i16::<LE>()?,
                        ceil_h: c.read_i16::<LE>()?,
                        floor_tex: read_tex(c)?,
                        ceil_tex: read_tex(c)?,
                        light: c.read_i16::<LE>()?,
                        special: c.read_i16::<LE>()?,
                        tag: c.read_i16::<LE>()?,
                    })
                }
            )
        };

        Ok(RawLevel {
            name,
            things,
            linedefs,
            sidedefs,
            vertices,
            segs,
            subsectors,
            nodes,
            sectors,
        })
    }
}

/*=======================================================================*/
/*                                Tests                                  */
/*=======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doom_wad() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("assets")
            .join("doom1.wad")
    }

    #[test]
    fn first_map_parses() {
        let wad = Wad::from_file(doom_wad()).expect("doom1.wad");
        let first_marker = wad
            .level_indices()
            .first()
            .copied()
            .expect("no map markers found");
        let level = wad.parse_level(first_marker).expect("parse");
        assert!(level.vertices.len() > 100, "suspiciously small map");
        assert_eq!(level.things[0].type_id, 1, "player 1 start missing?");
        assert_eq!(level.name, "E1M1");
    }

    #[test]
    fn missing_lump_is_reported() {
        let wad = Wad::from_file(doom_wad()).expect("doom1.wad");
        // index 0 is never a map marker in doom1.wad's own directory layout
        let err = wad.parse_level(0).unwrap_err();
        assert!(matches!(err, LevelError::Missing(_)));
    }
}
