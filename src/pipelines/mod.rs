//! Render pipeline definitions.
//!
//! - `tile` builds the instanced tile pipeline used for the whole scene
//! - `light` holds the frame-global light uniform resources

pub mod light;
pub mod tile;
