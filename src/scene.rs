//! Scene composition: from the static grid to per-material instance lists.
//!
//! Every frame the grid and catalog are folded into one world-transform list
//! per material group, which then feeds one instanced draw each. The grid is
//! static after load so the lists come out identical every frame; rebuilding
//! them anyway is intentional simplicity over caching.

use cgmath::{Deg, Matrix4, Vector3};

use crate::data_structures::catalog::Catalog;
use crate::data_structures::grid::{CellDescriptor, Grid};

/// World-unit footprint of one tile mesh.
pub const TILE_STRIDE: f32 = 20.0;

/// Per-cell world transform, composed in this exact order:
/// translate to the cell's grid position, then the quadrant yaw rotation,
/// then the mirror scale.
pub fn cell_world(cell: &CellDescriptor) -> Matrix4<f32> {
    let translate = Matrix4::from_translation(Vector3::new(
        cell.grid_x as f32 * TILE_STRIDE,
        0.0,
        cell.grid_z as f32 * TILE_STRIDE,
    ));
    let rotate = Matrix4::from_angle_y(Deg(90.0 * cell.rotation as f32));
    let mirror = Matrix4::from_nonuniform_scale(if cell.mirrored { -1.0 } else { 1.0 }, 1.0, 1.0);
    translate * rotate * mirror
}

/// An attachment rides on its tile's transform at a fixed local offset.
pub fn attachment_world(tile_world: Matrix4<f32>, offset: Vector3<f32>) -> Matrix4<f32> {
    tile_world * Matrix4::from_translation(offset)
}

/// Build one instance-transform list per material group.
///
/// Each cell contributes exactly one transform for its base mesh (the empty
/// tile contributes nothing) and one per attachment, appended to the list of
/// the group that owns the respective mesh. A cell referencing a tile type
/// the catalog does not know is a broken load invariant and panics.
pub fn build_instance_lists(grid: &Grid, catalog: &Catalog) -> Vec<Vec<Matrix4<f32>>> {
    let mut lists: Vec<Vec<Matrix4<f32>>> = vec![Vec::new(); catalog.groups.len()];
    for cell in grid.cells() {
        let tile = catalog.tile_type(cell.tile);
        let Some(base) = tile.base else {
            continue;
        };
        let world = cell_world(cell);
        lists[base.0].push(world);
        for attachment in &tile.attachments {
            lists[attachment.mesh.0].push(attachment_world(world, attachment.offset));
        }
    }
    lists
}
