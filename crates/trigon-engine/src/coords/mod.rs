//! Value types shared by geometry and render code.
//!
//! Positions are clip-space: origin at the centre, +X right, +Y up, both in `[-1, 1]`.

mod colour;
mod vec3;

pub use colour::Colour;
pub use vec3::Vec3;
