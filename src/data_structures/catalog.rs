//! The tile catalog: meshes, materials and tile type metadata, loaded once.
//!
//! Geometry from the tileset OBJ is batched **by material**, not by tile
//! type: every triangle that uses a material lands in that material's
//! [`MaterialGroup`](crate::data_structures::material::MaterialGroup) stream,
//! so one instanced draw can cover instances of several tile types. A tile
//! type resolves its base mesh and attachment meshes to material groups via
//! lightweight [`MeshHandle`] indices; the catalog is the single owner of the
//! records and everything else holds non-owning ids into it.
//!
//! The whole catalog is read-only after the load phase.

use std::collections::HashMap;

use cgmath::Vector3;
use serde::Deserialize;

use crate::data_structures::grid::TilePalette;
use crate::data_structures::material::{MaterialGroup, MaterialParams, TileVertex};

/// Index of a tile type inside the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileTypeId(pub usize);

/// Index of the [`MaterialGroup`] that owns a mesh's geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub usize);

/// Errors while loading the tileset geometry, textures or metadata.
///
/// All of these are fatal at startup; a partial catalog is not usable.
#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to parse tileset geometry")]
    Obj(#[from] tobj::LoadError),
    #[error("failed to parse tileset metadata")]
    Metadata(#[from] serde_json::Error),
    #[error("tile type {tile:?} references unknown mesh {mesh:?}")]
    UnknownMesh { tile: String, mesh: String },
    #[error("material {material:?} references missing texture {texture:?}")]
    MissingTexture { material: String, texture: String },
    #[error("failed to read asset {path:?}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A decorative sub-mesh drawn at a fixed local offset from its tile.
///
/// Attachments are exactly one level deep, an attachment never has further
/// attachments of its own.
#[derive(Clone, Debug)]
pub struct Attachment {
    pub offset: Vector3<f32>,
    pub mesh: MeshHandle,
}

/// A named mesh template plus its fixed attachments, shared by many cells.
#[derive(Clone, Debug)]
pub struct TileType {
    pub name: String,
    /// `None` marks the designated empty tile, it renders nothing.
    pub base: Option<MeshHandle>,
    pub attachments: Vec<Attachment>,
}

/// Tileset metadata as stored on disk, binding tile types to meshes,
/// pixel keys and attachment offsets.
#[derive(Debug, Deserialize)]
pub struct TilesetMetadata {
    #[serde(default = "default_stride")]
    pub pixel_stride: u32,
    pub tiles: Vec<TileEntry>,
}

fn default_stride() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct TileEntry {
    pub name: String,
    /// Red-channel key identifying this tile in the grid image.
    pub pixel: Option<u8>,
    /// OBJ object name of the base mesh; absent for the empty tile.
    pub mesh: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentEntry {
    pub mesh: String,
    pub offset: [f32; 3],
}

/// The immutable authority over tile types and material groups.
#[derive(Debug)]
pub struct Catalog {
    pub groups: Vec<MaterialGroup>,
    tile_types: Vec<TileType>,
    palette: TilePalette,
}

impl Catalog {
    /// Assemble a catalog from parsed OBJ data, metadata and texture bytes.
    ///
    /// `textures` maps each diffuse texture filename referenced by the MTL to
    /// its raw file contents; a referenced-but-absent entry is fatal. The
    /// file-based wrapper lives in [`crate::resources::load_catalog`].
    pub fn assemble(
        models: &[tobj::Model],
        materials: &[tobj::Material],
        metadata: TilesetMetadata,
        mut textures: HashMap<String, Vec<u8>>,
    ) -> Result<Self, AssetLoadError> {
        let mut groups: Vec<MaterialGroup> = materials
            .iter()
            .map(|m| {
                let diffuse = match &m.diffuse_texture {
                    Some(name) => Some(textures.remove(name).ok_or_else(|| {
                        AssetLoadError::MissingTexture {
                            material: m.name.clone(),
                            texture: name.clone(),
                        }
                    })?),
                    None => None,
                };
                Ok(MaterialGroup::new(
                    &m.name,
                    MaterialParams::from_mtl(m),
                    diffuse,
                ))
            })
            .collect::<Result<_, AssetLoadError>>()?;
        if groups.is_empty() {
            // Tilesets without an MTL still get one untextured group.
            groups.push(MaterialGroup::new(
                "default",
                MaterialParams::default(),
                None,
            ));
        }

        // Accumulate every model's triangles into its material's stream and
        // remember which group each named mesh resolves to.
        let mut mesh_index: HashMap<String, MeshHandle> = HashMap::new();
        for model in models {
            let group_id = model.mesh.material_id.unwrap_or(0);
            let group = &mut groups[group_id];
            let base = group.staged_vertex_count() as u32;
            let mesh = &model.mesh;
            for i in 0..mesh.positions.len() / 3 {
                group.push_vertex(TileVertex {
                    position: [
                        mesh.positions[i * 3],
                        mesh.positions[i * 3 + 1],
                        mesh.positions[i * 3 + 2],
                    ],
                    tex_coords: [
                        mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                        1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                    ],
                    normal: [
                        mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                        mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                        mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                    ],
                });
            }
            group.push_indices(mesh.indices.iter().map(|i| i + base));
            mesh_index.insert(model.name.clone(), MeshHandle(group_id));
        }

        let resolve = |tile: &str, mesh: &str| {
            mesh_index
                .get(mesh)
                .copied()
                .ok_or_else(|| AssetLoadError::UnknownMesh {
                    tile: tile.to_string(),
                    mesh: mesh.to_string(),
                })
        };

        let mut tile_types = Vec::with_capacity(metadata.tiles.len() + 1);
        let mut keys = Vec::with_capacity(metadata.tiles.len() + 1);
        let mut empty = None;
        for entry in &metadata.tiles {
            let base = match &entry.mesh {
                Some(mesh) => Some(resolve(&entry.name, mesh)?),
                None => {
                    empty = Some(TileTypeId(tile_types.len()));
                    None
                }
            };
            let attachments = entry
                .attachments
                .iter()
                .map(|a| {
                    Ok(Attachment {
                        offset: a.offset.into(),
                        mesh: resolve(&entry.name, &a.mesh)?,
                    })
                })
                .collect::<Result<_, AssetLoadError>>()?;
            tile_types.push(TileType {
                name: entry.name.clone(),
                base,
                attachments,
            });
            keys.push(entry.pixel);
        }
        let empty = empty.unwrap_or_else(|| {
            // No empty tile declared, synthesize one for decode substitution.
            let id = TileTypeId(tile_types.len());
            tile_types.push(TileType {
                name: "empty".to_string(),
                base: None,
                attachments: Vec::new(),
            });
            keys.push(None);
            id
        });

        let palette = TilePalette::new(keys, empty, metadata.pixel_stride);
        log::info!(
            "catalog loaded: {} tile types, {} material groups",
            tile_types.len(),
            groups.len()
        );
        Ok(Self {
            groups,
            tile_types,
            palette,
        })
    }

    /// Look up a tile type by id.
    ///
    /// A cell referencing an unknown id after the load phase is a broken
    /// invariant, not bad input, so this panics.
    pub fn tile_type(&self, id: TileTypeId) -> &TileType {
        &self.tile_types[id.0]
    }

    pub fn tile_types(&self) -> &[TileType] {
        &self.tile_types
    }

    pub fn palette(&self) -> &TilePalette {
        &self.palette
    }

    /// Move every group's staged geometry onto the GPU.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> anyhow::Result<()> {
        for group in &mut self.groups {
            group.upload(device, queue, layout)?;
        }
        Ok(())
    }
}
