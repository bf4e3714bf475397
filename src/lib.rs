//! gridscape: a tile-based 3D scene renderer.
//!
//! A 2D image is decoded into a grid of typed cells, a tileset OBJ supplies
//! the meshes batched by material, and each frame renders one instanced draw
//! per material group while a first-person camera (free-fly or grounded walk)
//! moves through the scene.

pub mod app;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod input;
pub mod pipelines;
pub mod resources;
pub mod scene;

pub use app::{run, AppConfig};
