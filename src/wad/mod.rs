//! Doom WAD access: directory loading, map-lump parsing, and the asset
//! loader that turns raw lumps into [`crate::world`] types.
//!
//! * [`raw`]   — `Wad`: opens an IWAD, exposes lumps by index or name.
//! * [`level`] — decodes the eight mandatory per-map lumps into raw,
//!   WAD-native structures (still fixed-point, still 8-byte texture names).
//! * [`loader`] — converts a parsed map plus the IWAD's palette/patches into
//!   a [`crate::world::geometry::Level`] and a populated `TextureBank`.

pub mod level;
pub mod loader;
pub mod raw;

pub use raw::{LumpInfo, Wad, WadError};
