//! Trigon engine crate.
//!
//! A small wgpu rendering pipeline: a GPU context with an explicit frame
//! lifecycle, staged buffer uploads, meshes, WGSL shader compilation, a named
//! pipeline-state registry and a winit runtime that drives it all.

pub mod command;
pub mod constant;
pub mod coords;
pub mod core;
pub mod device;
pub mod drawable;
pub mod input;
pub mod logging;
pub mod mesh;
pub mod pso;
pub mod shader;
pub mod window;
