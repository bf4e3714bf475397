//! Engine data structures: the grid, the tile catalog, materials and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `grid` is the 2D cell field decoded from the source image
//! - `catalog` owns tile types, their attachments and the material groups
//! - `material` batches geometry per material and owns its GPU buffers
//! - `instance` holds the per-occurrence transform data fed to instanced draws
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod catalog;
pub mod grid;
pub mod instance;
pub mod material;
pub mod texture;
