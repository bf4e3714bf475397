use std::fs;
use std::path::PathBuf;

use gridscape::data_structures::catalog::AssetLoadError;
use gridscape::resources;

const TILESET_OBJ: &str = "\
mtllib tileset.mtl
o floor
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 0.0 1.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 1.0 0.0
usemtl stone
f 1/1/1 2/2/1 3/3/1
";

const TILESET_MTL: &str = "\
newmtl stone
Kd 1.0 1.0 1.0
map_Kd stone.png
";

const METADATA: &str = r#"{
    "tiles": [
        { "name": "empty", "pixel": 0 },
        { "name": "floor", "pixel": 10, "mesh": "floor" }
    ]
}"#;

/// Per-test scratch directory with fixture files, removed on drop.
struct FixtureDir(PathBuf);

impl FixtureDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("gridscape-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("fixture dir is creatable");
        Self(dir)
    }

    fn write(&self, name: &str, contents: &[u8]) {
        fs::write(self.0.join(name), contents).expect("fixture file is writable");
    }

    fn path(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for FixtureDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

#[tokio::test]
async fn load_catalog_reads_obj_mtl_and_metadata_from_disk() {
    let dir = FixtureDir::new("load-catalog");
    dir.write("tileset.obj", TILESET_OBJ.as_bytes());
    dir.write("tileset.mtl", TILESET_MTL.as_bytes());
    dir.write("metadata.json", METADATA.as_bytes());
    dir.write("stone.png", &[0u8; 4]);

    let catalog = resources::load_catalog(
        dir.path("tileset.obj"),
        &dir.0,
        dir.path("metadata.json"),
    )
    .await
    .expect("complete fixture loads");

    assert_eq!(catalog.groups.len(), 1);
    assert_eq!(catalog.groups[0].name, "stone");
    assert_eq!(catalog.tile_types().len(), 2);
    assert_eq!(
        catalog.tile_type(catalog.palette().tile_for_pixel(10).expect("floor key")).name,
        "floor"
    );
}

#[tokio::test]
async fn missing_texture_file_is_reported_with_its_material() {
    let dir = FixtureDir::new("missing-texture");
    dir.write("tileset.obj", TILESET_OBJ.as_bytes());
    dir.write("tileset.mtl", TILESET_MTL.as_bytes());
    dir.write("metadata.json", METADATA.as_bytes());

    let err = resources::load_catalog(
        dir.path("tileset.obj"),
        &dir.0,
        dir.path("metadata.json"),
    )
    .await
    .expect_err("referenced texture is absent");

    assert!(matches!(
        err,
        AssetLoadError::MissingTexture { material, texture }
            if material == "stone" && texture == "stone.png"
    ));
}

#[tokio::test]
async fn missing_metadata_file_is_an_io_error() {
    let dir = FixtureDir::new("missing-metadata");
    dir.write("tileset.obj", TILESET_OBJ.as_bytes());
    dir.write("tileset.mtl", TILESET_MTL.as_bytes());
    dir.write("stone.png", &[0u8; 4]);

    let err = resources::load_catalog(
        dir.path("tileset.obj"),
        &dir.0,
        dir.path("metadata.json"),
    )
    .await
    .expect_err("metadata file is absent");

    assert!(matches!(err, AssetLoadError::Io { .. }));
}
