//! Converts a raw, WAD-native map plus the IWAD's palette/patch lumps into
//! a [`crate::world::geometry::Level`] and a populated [`TextureBank`].
//!
//! ```text
//!   RawLevel (wad::level)         ──╮
//!   Palette / patches (from Wad)    │  --->  world::geometry::Level
//!   TextureBank (mut)               │         + populated TextureBank
//!                                   ╯
//! ```

use crate::{
    error::MapMalformed,
    wad::level::{self as raw_level, NO_SIDEDEF},
    wad::raw::{Wad, WadError},
    world::{
        geometry as geo,
        texture::{Colormap, NO_TEXTURE, Palette, Texture, TextureBank, TextureError, TextureId},
    },
};
use glam::vec2;
use std::f32::consts::TAU;
use thiserror::Error;

/*──────────────────────────── Error type ───────────────────────────*/

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Wad(#[from] WadError),

    #[error(transparent)]
    Level(#[from] raw_level::LevelError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Malformed(#[from] MapMalformed),

    #[error("PLAYPAL lump missing - cannot build palette")]
    NoPalette,

    #[error("COLORMAP lump missing - cannot build colormap")]
    NoColormap,
}

/// Check every cross-reference a raw level carries (linedef vertex/sidedef
/// indices, sidedef sector indices, seg vertex/linedef indices) against the
/// length of the vec it indexes into, before any of `raw_to_geo` runs.
/// `raw_to_geo::seg_from` and every downstream array index in `render`/
/// `world::bsp` trust these ranges rather than re-checking them (spec §7
/// `MapMalformed::DanglingIndex`, "no panics across the render boundary").
fn validate_raw_level(level: &raw_level::RawLevel) -> Result<(), MapMalformed> {
    let n_vertices = level.vertices.len();
    let n_sidedefs = level.sidedefs.len();
    let n_sectors = level.sectors.len();
    let n_linedefs = level.linedefs.len();

    let check = |what: &'static str, index: u16, len: usize| -> Result<(), MapMalformed> {
        if index as usize >= len {
            return Err(MapMalformed::DanglingIndex {
                what,
                index: index as usize,
                len,
            });
        }
        Ok(())
    };

    for ld in &level.linedefs {
        check("linedef.v1", ld.v1, n_vertices)?;
        check("linedef.v2", ld.v2, n_vertices)?;
        if ld.right_sidedef != NO_SIDEDEF {
            check("linedef.right_sidedef", ld.right_sidedef, n_sidedefs)?;
        }
        if ld.left_sidedef != NO_SIDEDEF {
            check("linedef.left_sidedef", ld.left_sidedef, n_sidedefs)?;
        }
    }

    for sd in &level.sidedefs {
        check("sidedef.sector", sd.sector, n_sectors)?;
    }

    for seg in &level.segs {
        check("seg.v1", seg.v1, n_vertices)?;
        check("seg.v2", seg.v2, n_vertices)?;
        check("seg.linedef", seg.linedef, n_linedefs)?;
    }

    Ok(())
}

/*====================================================================*/
/*                       Public API                                   */
/*====================================================================*/

/// Load the map at `marker` into a `world::Level` and populate `bank` with
/// every texture that map references. Unknown names are replaced by the
/// bank's checkerboard id (0).
pub fn load_level(
    wad: &Wad,
    marker: usize,
    bank: &mut TextureBank,
) -> Result<geo::Level, LoadError> {
    /*----- 1. Raw lumps --------------------------------------------------*/
    let raw = wad.parse_level(marker)?;
    if let Err(e) = validate_raw_level(&raw) {
        log::error!("level `{}` failed validation: {e}", raw.name);
        return Err(e.into());
    }

    /*----- 2. Palette/colormap needed to convert 8-bit patches/flats -----*/
    if bank.palette().is_none() {
        let palette = load_palette(wad).ok_or(LoadError::NoPalette)?;
        bank.set_palette(palette);
    }
    if bank.colormap().is_none() {
        let colormap = load_colormap(wad).ok_or(LoadError::NoColormap)?;
        bank.set_colormap(colormap);
    }
    let palette = *bank.palette().expect("just set");

    /*----- 3. Patch cache (index → indexed image) -------------------------*/
    let patch_vec = decode_all_patches(wad)?;

    /*----- 4. Helper: resolve name → TextureId ----------------------------*/
    let mut tex_id = |name_bytes: &[u8; 8]| -> Result<TextureId, LoadError> {
        let name = Wad::lump_name_str(name_bytes).to_ascii_uppercase();
        if name.is_empty() || name == "-" {
            return Ok(NO_TEXTURE);
        }
        if let Some(id) = bank.id(&name) {
            return Ok(id);
        }
        if let Some(img) = build_wall_texture(wad, &patch_vec, &name) {
            return Ok(bank.insert(name, indexed_to_texture(&img, &palette))?);
        }
        if let Some(img) = decode_flat(wad, &name) {
            return Ok(bank.insert(name, indexed_to_texture(&img, &palette))?);
        }
        Ok(NO_TEXTURE)
    };

    /*----- 5. Convert raw → geo lists -------------------------------------*/
    use geo::*;

    let things: Vec<Thing> = raw.things.into_iter().map(raw_to_geo::thing_from).collect();

    let linedefs: Vec<Linedef> = raw
        .linedefs
        .into_iter()
        .map(raw_to_geo::linedef_from)
        .collect();

    let vertices: Vec<Vertex> = raw
        .vertices
        .into_iter()
        .map(raw_to_geo::vertex_from)
        .collect();

    let segs: Vec<Seg> = raw
        .segs
        .iter()
        .map(|r| raw_to_geo::seg_from(r, &vertices))
        .collect();

    let subsectors: Vec<Subsector> = raw
        .subsectors
        .into_iter()
        .map(raw_to_geo::subsector_from)
        .collect();

    let nodes: Vec<Node> = raw.nodes.into_iter().map(raw_to_geo::node_from).collect();

    /*----- lists that need texture look-ups (may fail) --------------------*/
    let sidedefs: Vec<Sidedef> = raw
        .sidedefs
        .into_iter()
        .map(|s| {
            Ok(Sidedef {
                x_off: s.x_off as f32,
                y_off: s.y_off as f32,
                upper: tex_id(&s.upper_tex)?,
                lower: tex_id(&s.lower_tex)?,
                middle: tex_id(&s.mid_tex)?,
                sector: s.sector,
            })
        })
        .collect::<Result<_, LoadError>>()?;

    let sectors: Vec<Sector> = raw
        .sectors
        .into_iter()
        .map(|s| {
            Ok(Sector {
                floor_h: s.floor_h as f32,
                ceil_h: s.ceil_h as f32,
                floor_tex: tex_id(&s.floor_tex)?,
                ceil_tex: tex_id(&s.ceil_tex)?,
                light: s.light,
                special: s.special,
                tag: s.tag,
            })
        })
        .collect::<Result<_, LoadError>>()?;

    /*----- 6. Assemble world::Level ---------------------------------------*/
    let mut level = Level {
        name: raw.name,
        things,
        linedefs,
        sidedefs,
        vertices,
        segs,
        subsectors,
        nodes,
        sectors,
        sector_of_subsector: Vec::new(),
    };
    level.finalise_bsp();
    Ok(level)
}

/*====================================================================*/
/*                  Raw → Geo helpers (local)                         */
/*====================================================================*/
mod raw_to_geo {
    use super::*;

    pub fn thing_from(r: raw_level::RawThing) -> geo::Thing {
        let min_skill = match r.options & 0x0007 {
            0x0001 => 1,
            0x0002 => 2,
            0x0004 => 3,
            _ => 1,
        };
        geo::Thing {
            pos: vec2(r.x as f32, r.y as f32),
            angle: (r.angle as f32).to_radians(),
            type_id: r.type_id,
            min_skill,
            is_deaf: r.options & 0x0020 != 0,
            multiplayer: r.options & 0x0100 != 0,
        }
    }

    pub fn linedef_from(r: raw_level::RawLinedef) -> geo::Linedef {
        geo::Linedef {
            v1: r.v1,
            v2: r.v2,
            flags: geo::LinedefFlags::from_bits_truncate(r.flags),
            special: r.special,
            tag: r.tag,
            right_sidedef: (r.right_sidedef != NO_SIDEDEF).then_some(r.right_sidedef),
            left_sidedef: (r.left_sidedef != NO_SIDEDEF).then_some(r.left_sidedef),
        }
    }

    pub fn vertex_from(r: raw_level::RawVertex) -> geo::Vertex {
        geo::Vertex {
            pos: vec2(r.x as f32, r.y as f32),
        }
    }

    /// BAM (binary angle measurement): reinterpret the raw bit pattern as
    /// `u16` so the full 0..65536 range maps to `0..TAU` instead of wrapping
    /// through negative angles past 32768.
    fn bam_to_radians(raw: i16) -> f32 {
        (raw as u16 as f32 / 65536.0) * TAU
    }

    /// The seg's own endpoints are authoritative for its direction; the
    /// stored BAM angle is only a fallback for the degenerate zero-length
    /// case (which shouldn't occur in a well-formed WAD).
    pub fn seg_from(r: &raw_level::RawSeg, vertices: &[geo::Vertex]) -> geo::Seg {
        let v1 = vertices[r.v1 as usize].pos;
        let v2 = vertices[r.v2 as usize].pos;
        let delta = v2 - v1;
        let angle = if delta.length_squared() > 0.0 {
            delta.y.atan2(delta.x)
        } else {
            bam_to_radians(r.angle)
        };
        geo::Seg {
            v1: r.v1,
            v2: r.v2,
            angle,
            linedef: r.linedef,
            dir: r.dir,
            offset: r.offset as f32,
        }
    }

    pub fn subsector_from(r: raw_level::RawSubsector) -> geo::Subsector {
        geo::Subsector {
            seg_count: r.seg_count,
            first_seg: r.first_seg,
        }
    }

    const BOXTOP: usize = 0;
    const BOXBOTTOM: usize = 1;
    const BOXLEFT: usize = 2;
    const BOXRIGHT: usize = 3;

    pub fn node_from(r: raw_level::RawNode) -> geo::Node {
        let to_bbox = |raw: [i16; 4]| {
            [
                raw[BOXTOP] as f32,
                raw[BOXBOTTOM] as f32,
                raw[BOXLEFT] as f32,
                raw[BOXRIGHT] as f32,
            ]
        };
        geo::Node {
            x: r.x as f32,
            y: r.y as f32,
            dx: r.dx as f32,
            dy: r.dy as f32,
            bbox: [to_bbox(r.bbox[0]), to_bbox(r.bbox[1])],
            child: r.child,
        }
    }
}

/*====================================================================*/
/*                  Palette / patch / texture helpers                 */
/*====================================================================*/

/// An 8-bit, palette-indexed image: the on-disk form of every Doom graphic
/// (patches, flats, composed wall textures) before conversion to packed
/// ARGB `Texture`.
struct Indexed {
    w: usize,
    h: usize,
    /// Palette index per pixel; `None` marks a transparent (unpainted) texel.
    px: Vec<Option<u8>>,
}

fn indexed_to_texture(img: &Indexed, palette: &Palette) -> Texture {
    let pixels = img
        .px
        .iter()
        .map(|p| match p {
            Some(idx) => 0xFF00_0000 | palette[*idx as usize],
            None => 0,
        })
        .collect();
    Texture {
        w: img.w,
        h: img.h,
        pixels,
    }
}

fn load_palette(wad: &Wad) -> Option<Palette> {
    let idx = wad.find_lump("PLAYPAL")?;
    let bytes = wad.lump_bytes(idx).ok()?;
    let mut pal = [0u32; 256];
    for (i, slot) in pal.iter_mut().enumerate() {
        *slot =
            (bytes[i * 3] as u32) << 16 | (bytes[i * 3 + 1] as u32) << 8 | bytes[i * 3 + 2] as u32;
    }
    Some(pal)
}

fn load_colormap(wad: &Wad) -> Option<Colormap> {
    let idx = wad.find_lump("COLORMAP")?;
    let bytes = wad.lump_bytes(idx).ok()?;
    if bytes.len() < 34 * 256 {
        return None;
    }
    let mut cm = vec![[0u8; 256]; 34];
    for (table, slot) in cm.iter_mut().enumerate() {
        let start = table * 256;
        slot.copy_from_slice(&bytes[start..start + 256]);
    }
    Some(cm)
}

/*-------------------- patch cache -----------------------------------*/

fn decode_all_patches(wad: &Wad) -> Result<Vec<Indexed>, WadError> {
    let Some(idx) = wad.find_lump("PNAMES") else {
        return Ok(Vec::new());
    };
    let bytes = wad.lump_bytes(idx)?;
    let num = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;

    let mut vec = Vec::with_capacity(num);
    for i in 0..num {
        let name_bytes: &[u8; 8] = (&bytes[4 + i * 8..4 + i * 8 + 8]).try_into().unwrap();
        let name = Wad::lump_name_str(name_bytes);
        if let Some(id) = wad.find_lump(name) {
            vec.push(decode_patch(wad.lump_bytes(id)?));
        } else {
            vec.push(Indexed {
                w: 0,
                h: 0,
                px: Vec::new(),
            });
        }
    }
    Ok(vec)
}

fn decode_patch(raw: &[u8]) -> Indexed {
    let w = u16::from_le_bytes(raw[0..2].try_into().unwrap()) as usize;
    let h = u16::from_le_bytes(raw[2..4].try_into().unwrap()) as usize;
    let mut px = vec![None; w * h];
    let colofs = &raw[8..8 + w * 4];
    for x in 0..w {
        let mut p = u32::from_le_bytes(colofs[x * 4..][..4].try_into().unwrap()) as usize;
        loop {
            let row = raw[p] as usize;
            if row == 0xFF {
                break;
            }
            let len = raw[p + 1] as usize;
            p += 3;
            for i in 0..len {
                if row + i < h {
                    px[(row + i) * w + x] = Some(raw[p + i]);
                }
            }
            p += len + 1;
        }
    }
    Indexed { w, h, px }
}

/*-------------------- wall texture compose --------------------------*/

fn build_wall_texture(wad: &Wad, patches: &[Indexed], name: &str) -> Option<Indexed> {
    for table in ["TEXTURE1", "TEXTURE2"] {
        let Some(idx) = wad.find_lump(table) else {
            continue;
        };
        let bytes = wad.lump_bytes(idx).ok()?;
        let ntex = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let mut offs = &bytes[4..];
        for _ in 0..ntex {
            let off = u32::from_le_bytes(offs[0..4].try_into().unwrap()) as usize;
            offs = &offs[4..];
            let entry = &bytes[off..];
            let e_name_bytes: &[u8; 8] = (&entry[0..8]).try_into().unwrap();
            let e_name = Wad::lump_name_str(e_name_bytes);
            if !e_name.eq_ignore_ascii_case(name) {
                continue;
            }
            return Some(compose_texture(entry, patches));
        }
    }
    None
}

fn compose_texture(entry: &[u8], patches: &[Indexed]) -> Indexed {
    let w_tex = i16::from_le_bytes(entry[12..14].try_into().unwrap()) as usize;
    let h_tex = i16::from_le_bytes(entry[14..16].try_into().unwrap()) as usize;
    let np = u16::from_le_bytes(entry[20..22].try_into().unwrap()) as usize;

    let mut canvas = Indexed {
        w: w_tex,
        h: h_tex,
        px: vec![None; w_tex * h_tex],
    };
    let mut pinfo = &entry[22..];
    for _ in 0..np {
        let ox = i16::from_le_bytes(pinfo[0..2].try_into().unwrap()) as i32;
        let oy = i16::from_le_bytes(pinfo[2..4].try_into().unwrap()) as i32;
        let idx = u16::from_le_bytes(pinfo[4..6].try_into().unwrap()) as usize;
        if let Some(p) = patches.get(idx) {
            blit_patch(&mut canvas, p, ox, oy);
        }
        pinfo = &pinfo[10..];
    }
    canvas
}

fn blit_patch(dest: &mut Indexed, p: &Indexed, ox: i32, oy: i32) {
    for py in 0..p.h {
        let dy = oy + py as i32;
        if !(0..dest.h as i32).contains(&dy) {
            continue;
        }
        for px in 0..p.w {
            let dx = ox + px as i32;
            if !(0..dest.w as i32).contains(&dx) {
                continue;
            }
            if let Some(src) = p.px[py * p.w + px] {
                dest.px[dy as usize * dest.w + dx as usize] = Some(src);
            }
        }
    }
}

/*----------------------------- flats --------------------------------*/

fn decode_flat(wad: &Wad, name: &str) -> Option<Indexed> {
    let idx = wad.find_lump(name)?;
    let bytes = wad.lump_bytes(idx).ok()?;
    if bytes.len() != 4096 {
        return None;
    }
    Some(Indexed {
        w: 64,
        h: 64,
        px: bytes.iter().map(|&b| Some(b)).collect(),
    })
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
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
    fn level_and_textures_load() {
        let wad = Wad::from_file(doom_wad()).unwrap();
        let mut bank = TextureBank::default_with_checker();

        let marker = wad.level_indices()[0]; // E1M1
        let lvl = load_level(&wad, marker, &mut bank).expect("load");

        assert!(lvl.vertices.len() > 300);
        assert!(bank.len() > 1);
        assert_eq!(lvl.sector_of_subsector.len(), lvl.subsectors.len());
    }

    #[test]
    fn unknown_name_gets_checker() {
        let bank = TextureBank::default_with_checker();
        let id = bank.id_or_missing("NO_SUCH_TEXTURE_XYZ");
        assert_eq!(id, 0);
    }

    fn minimal_raw_level() -> raw_level::RawLevel {
        raw_level::RawLevel {
            name: "TEST".into(),
            things: vec![],
            linedefs: vec![raw_level::RawLinedef {
                v1: 0,
                v2: 1,
                flags: 0,
                special: 0,
                tag: 0,
                right_sidedef: 0,
                left_sidedef: NO_SIDEDEF,
            }],
            sidedefs: vec![raw_level::RawSidedef {
                x_off: 0,
                y_off: 0,
                upper_tex: *b"-\0\0\0\0\0\0\0",
                lower_tex: *b"-\0\0\0\0\0\0\0",
                mid_tex: *b"-\0\0\0\0\0\0\0",
                sector: 0,
            }],
            vertices: vec![
                raw_level::RawVertex { x: 0, y: 0 },
                raw_level::RawVertex { x: 10, y: 0 },
            ],
            segs: vec![],
            subsectors: vec![],
            nodes: vec![],
            sectors: vec![raw_level::RawSector {
                floor_h: 0,
                ceil_h: 64,
                floor_tex: *b"-\0\0\0\0\0\0\0",
                ceil_tex: *b"-\0\0\0\0\0\0\0",
                light: 255,
                special: 0,
                tag: 0,
            }],
        }
    }

    #[test]
    fn well_formed_raw_level_validates() {
        assert!(validate_raw_level(&minimal_raw_level()).is_ok());
    }

    #[test]
    fn dangling_linedef_vertex_is_rejected() {
        let mut raw = minimal_raw_level();
        raw.linedefs[0].v2 = 7; // only 2 vertices exist
        let err = validate_raw_level(&raw).unwrap_err();
        assert!(matches!(
            err,
            MapMalformed::DanglingIndex {
                what: "linedef.v2",
                index: 7,
                len: 2,
            }
        ));
    }

    #[test]
    fn dangling_sidedef_sector_is_rejected() {
        let mut raw = minimal_raw_level();
        raw.sidedefs[0].sector = 9; // only 1 sector exists
        let err = validate_raw_level(&raw).unwrap_err();
        assert!(matches!(
            err,
            MapMalformed::DanglingIndex {
                what: "sidedef.sector",
                index: 9,
                len: 1,
            }
        ));
    }

    #[test]
    fn dangling_linedef_sidedef_is_rejected() {
        let mut raw = minimal_raw_level();
        raw.linedefs[0].right_sidedef = 3; // only 1 sidedef exists
        let err = validate_raw_level(&raw).unwrap_err();
        assert!(matches!(
            err,
            MapMalformed::DanglingIndex {
                what: "linedef.right_sidedef",
                index: 3,
                len: 1,
            }
        ));
    }
}
