mod bsp;
mod camera;
pub(crate) mod geometry;
pub mod texture;

pub use bsp::{Aabb, CHILD_MASK, SUBSECTOR_BIT};
pub use camera::Camera;
pub use geometry::{
    Level, Linedef, LinedefFlags, Node, Sector, Seg, Sidedef, Subsector, Thing, Vertex,
};
pub use texture::{NO_TEXTURE, Texture, TextureBank, TextureError, TextureId};
