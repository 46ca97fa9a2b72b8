//! Renderer configuration.
//!
//! Threaded once through the CLI (`clap`) into a [`RenderConfig`] that the
//! renderer borrows at construction, replacing the teacher's scattered
//! `width`/`height`/`focal` fields and hard-coded `fov`.

use clap::Parser;

pub const DEFAULT_RES_W: usize = 1280;
pub const DEFAULT_RES_H: usize = 800;
pub const DEFAULT_FOV_DEG: f32 = 90.0;

/// `WALL_HEIGHT_SCALE` open question (spec §9): a value of `1.0` makes a
/// 90°-FOV view orthographic against square world units; earlier source
/// versions used `0.4`. Default here follows the spec's recommendation.
pub const DEFAULT_WALL_HEIGHT_SCALE: f32 = 1.0;

/// CLI surface: WAD path, level name, and the renderer's tunables.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "First-person BSP software renderer for classic WAD levels")]
pub struct Args {
    /// Path to the IWAD/PWAD file.
    pub wad_path: std::path::PathBuf,

    /// Level marker to load, e.g. `E1M1` or `MAP01`. Defaults to the first
    /// map found in the WAD's directory.
    pub level: Option<String>,

    #[arg(long, default_value_t = DEFAULT_RES_W)]
    pub width: usize,

    #[arg(long, default_value_t = DEFAULT_RES_H)]
    pub height: usize,

    #[arg(long, default_value_t = DEFAULT_FOV_DEG)]
    pub fov_deg: f32,

    #[arg(long, default_value_t = DEFAULT_WALL_HEIGHT_SCALE)]
    pub wall_height_scale: f32,
}

/// Resolved, renderer-facing configuration (radians, not degrees).
#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub res_w: usize,
    pub res_h: usize,
    pub fov: f32,
    pub wall_height_scale: f32,
}

impl RenderConfig {
    pub fn tan_half_fov(&self) -> f32 {
        (self.fov * 0.5).tan()
    }
}

impl From<&Args> for RenderConfig {
    fn from(args: &Args) -> Self {
        Self {
            res_w: args.width,
            res_h: args.height,
            fov: args.fov_deg.to_radians(),
            wall_height_scale: args.wall_height_scale,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            res_w: DEFAULT_RES_W,
            res_h: DEFAULT_RES_H,
            fov: DEFAULT_FOV_DEG.to_radians(),
            wall_height_scale: DEFAULT_WALL_HEIGHT_SCALE,
        }
    }
}
