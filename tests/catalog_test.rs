use std::collections::HashMap;
use std::io::{BufReader, Cursor};

use gridscape::data_structures::catalog::{AssetLoadError, Catalog, MeshHandle, TilesetMetadata};

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
o pillar
v 0.0 0.0 0.0
v 0.0 1.0 0.0
v 1.0 1.0 0.0
usemtl metal
f 4/1/1 5/2/1 6/3/1
";

const TILESET_MTL: &str = "\
newmtl stone
Kd 1.0 1.0 1.0
map_Kd stone.png
Pr 0.8
Pm 0.1
newmtl metal
Pm 1.0
Pr 0.2
";

const METADATA: &str = r#"{
    "pixel_stride": 1,
    "tiles": [
        { "name": "empty", "pixel": 0 },
        { "name": "floor", "pixel": 10, "mesh": "floor" },
        {
            "name": "floor_pillar",
            "pixel": 20,
            "mesh": "floor",
            "attachments": [ { "mesh": "pillar", "offset": [5.0, 0.0, 5.0] } ]
        }
    ]
}"#;

fn load_fixture_obj() -> (Vec<tobj::Model>, Vec<tobj::Material>) {
    let mut reader = BufReader::new(Cursor::new(TILESET_OBJ));
    let (models, materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(TILESET_MTL))),
    )
    .expect("fixture OBJ parses");
    (models, materials.expect("fixture MTL parses"))
}

fn metadata(json: &str) -> TilesetMetadata {
    serde_json::from_str(json).expect("fixture metadata parses")
}

fn textures() -> HashMap<String, Vec<u8>> {
    HashMap::from([("stone.png".to_string(), vec![0u8; 4])])
}

fn fixture_catalog() -> Catalog {
    let (models, materials) = load_fixture_obj();
    Catalog::assemble(&models, &materials, metadata(METADATA), textures())
        .expect("fixture catalog assembles")
}

#[test]
fn geometry_is_batched_by_material_not_by_tile_type() {
    let catalog = fixture_catalog();

    assert_eq!(catalog.groups.len(), 2);
    assert_eq!(catalog.groups[0].name, "stone");
    assert_eq!(catalog.groups[1].name, "metal");

    // Both floor-based tile types resolve to the same material group.
    let floor = catalog
        .tile_types()
        .iter()
        .find(|t| t.name == "floor")
        .expect("floor tile exists");
    let floor_pillar = catalog
        .tile_types()
        .iter()
        .find(|t| t.name == "floor_pillar")
        .expect("floor_pillar tile exists");
    assert_eq!(floor.base, Some(MeshHandle(0)));
    assert_eq!(floor_pillar.base, Some(MeshHandle(0)));
    assert_eq!(floor_pillar.attachments[0].mesh, MeshHandle(1));
    assert_eq!(floor_pillar.attachments[0].offset, [5.0, 0.0, 5.0].into());
}

#[test]
fn empty_tile_renders_nothing_and_owns_a_pixel_key() {
    let catalog = fixture_catalog();

    let empty = catalog.tile_type(catalog.palette().empty);
    assert_eq!(empty.name, "empty");
    assert!(empty.base.is_none());
    assert!(empty.attachments.is_empty());
    assert_eq!(
        catalog.palette().tile_for_pixel(0),
        Some(catalog.palette().empty)
    );
}

#[test]
fn empty_tile_is_synthesized_when_the_metadata_omits_one() {
    let (models, materials) = load_fixture_obj();
    let meta = metadata(
        r#"{ "tiles": [ { "name": "floor", "pixel": 10, "mesh": "floor" } ] }"#,
    );

    let catalog =
        Catalog::assemble(&models, &materials, meta, textures()).expect("catalog assembles");
    let empty = catalog.tile_type(catalog.palette().empty);
    assert!(empty.base.is_none());
}

#[test]
fn mtl_pbr_extension_params_are_read() {
    let catalog = fixture_catalog();

    assert_eq!(catalog.groups[0].params.roughness, 0.8);
    assert_eq!(catalog.groups[0].params.metallic, 0.1);
    assert_eq!(catalog.groups[1].params.metallic, 1.0);
    assert_eq!(catalog.groups[1].params.roughness, 0.2);
}

#[test]
fn tile_referencing_an_unknown_mesh_is_fatal() {
    let (models, materials) = load_fixture_obj();
    let meta = metadata(
        r#"{ "tiles": [ { "name": "tower", "pixel": 10, "mesh": "missing" } ] }"#,
    );

    let err = Catalog::assemble(&models, &materials, meta, textures())
        .expect_err("unknown mesh names must not be tolerated");
    assert!(matches!(
        err,
        AssetLoadError::UnknownMesh { tile, mesh } if tile == "tower" && mesh == "missing"
    ));
}

#[test]
fn material_referencing_a_missing_texture_is_fatal() {
    let (models, materials) = load_fixture_obj();

    let err = Catalog::assemble(&models, &materials, metadata(METADATA), HashMap::new())
        .expect_err("referenced texture bytes must be present");
    assert!(matches!(
        err,
        AssetLoadError::MissingTexture { material, texture }
            if material == "stone" && texture == "stone.png"
    ));
}

#[test]
fn palette_maps_pixel_keys_to_declared_tiles() {
    let catalog = fixture_catalog();
    let palette = catalog.palette();

    let floor = palette.tile_for_pixel(10).expect("floor key is mapped");
    assert_eq!(catalog.tile_type(floor).name, "floor");
    let floor_pillar = palette.tile_for_pixel(20).expect("floor_pillar key is mapped");
    assert_eq!(catalog.tile_type(floor_pillar).name, "floor_pillar");
    assert_eq!(palette.tile_for_pixel(42), None);
}
