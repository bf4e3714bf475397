//! Loading of the tileset geometry, textures and metadata from disk.
//!
//! Everything here runs once during the load phase; after
//! [`load_catalog`] returns, the catalog is immutable and no further
//! file I/O happens for the rest of the session.

use std::collections::HashMap;
use std::io::{BufReader, Cursor};
use std::path::Path;

use crate::data_structures::catalog::{AssetLoadError, Catalog, TilesetMetadata};

pub async fn load_string(path: impl AsRef<Path>) -> Result<String, AssetLoadError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| AssetLoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub async fn load_binary(path: impl AsRef<Path>) -> Result<Vec<u8>, AssetLoadError> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| AssetLoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load the tile catalog: OBJ geometry grouped by material, the material
/// textures from `texture_dir`, and the tile type metadata JSON.
///
/// Any missing or malformed file is fatal, a partial catalog is not usable.
/// The returned catalog is CPU-side only; GPU upload happens separately via
/// [`Catalog::upload`].
pub async fn load_catalog(
    obj_path: impl AsRef<Path>,
    texture_dir: impl AsRef<Path>,
    metadata_path: impl AsRef<Path>,
) -> Result<Catalog, AssetLoadError> {
    let obj_path = obj_path.as_ref();
    let obj_dir = obj_path.parent().unwrap_or(Path::new(".")).to_path_buf();

    let obj_text = load_string(obj_path).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        move |p| {
            let mtl_path = obj_dir.join(&p);
            async move {
                match std::fs::read_to_string(&mtl_path) {
                    Ok(mtl_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mtl_text))),
                    Err(e) => {
                        log::error!("could not read material library {:?}: {e}", mtl_path);
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await?;
    let materials = obj_materials?;

    let metadata: TilesetMetadata = serde_json::from_str(&load_string(metadata_path).await?)?;

    let mut textures: HashMap<String, Vec<u8>> = HashMap::new();
    for material in &materials {
        if let Some(name) = &material.diffuse_texture {
            let bytes = load_binary(texture_dir.as_ref().join(name))
                .await
                .map_err(|_| AssetLoadError::MissingTexture {
                    material: material.name.clone(),
                    texture: name.clone(),
                })?;
            textures.insert(name.clone(), bytes);
        }
    }

    Catalog::assemble(&models, &materials, metadata, textures)
}
