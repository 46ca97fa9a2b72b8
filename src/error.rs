//! Crate-wide error taxonomy.
//!
//! Three kinds of failure exist in this renderer (see design notes):
//! `MapMalformed` is fatal and surfaced before rendering starts,
//! `TextureMissing` is non-fatal and only suppresses pixel output for the
//! affected column, and `Degenerate` never crosses a public boundary — it is
//! folded into `Option::None`/empty-output at the call site that can detect
//! it (the geometry kernel, the view classifier).

use thiserror::Error;

/// A structural problem with map data, detected before a frame is rendered.
///
/// Always fatal: the caller must not call [`crate::render::Renderer::render`]
/// with a level that failed to load.
#[derive(Error, Debug)]
pub enum MapMalformed {
    #[error("{what} index {index} out of range (len {len})")]
    DanglingIndex {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("level has no BSP nodes")]
    EmptyBsp,

    #[error(transparent)]
    Wad(#[from] crate::wad::raw::WadError),

    #[error(transparent)]
    Level(#[from] crate::wad::level::LevelError),

    #[error(transparent)]
    Texture(#[from] crate::world::texture::TextureError),
}

/// Raised by the rasterizer when a side references a texture name the
/// composer never produced. Non-fatal: the caller logs and the column's
/// occlusion bounds are still updated, only pixels are skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("texture `{0}` missing from composed set")]
pub struct TextureMissing(pub String);
