//! Integration tests for the files under `resources/`
//!
//! Shipped meshes must match their generators, and every shader on disk must
//! reflect and link the same way as the embedded copy.

use std::path::PathBuf;

use gltut::assets::mesh::generator::MeshKind;
use gltut::assets::mesh::schema::{MESH_NAMESPACE, MESH_SCHEMA_RNC};
use gltut::assets::mesh::MeshData;
use gltut::assets::Resources;
use gltut::render::shader::{ShaderLibrary, BUILTIN_PROGRAMS};

fn resource_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources").join(name)
}

#[test]
fn test_shipped_meshes_match_generators() {
    let mut shipped = 0;
    for entry in std::fs::read_dir(resource_dir("meshes")).unwrap() {
        let path = entry.unwrap().path();
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap().to_string();
        let kind = MeshKind::from_name(&stem).unwrap_or_else(|| panic!("{stem} has no generator"));

        let loaded = MeshData::load(&path).unwrap();
        assert_eq!(loaded, kind.generate(), "{} differs from its generator", path.display());
        shipped += 1;
    }
    assert!(shipped >= 3);
}

#[test]
fn test_every_kind_loads_through_resources() {
    let mut resources = Resources::builtin().with_mesh_dir(resource_dir("meshes"));
    for kind in MeshKind::ALL {
        let mesh = resources.mesh_data(&kind.file_name()).unwrap();
        assert!(mesh.vertex_count() > 0, "{}", kind.name());
    }
}

#[test]
fn test_shader_files_link_like_builtins() {
    let builtin = ShaderLibrary::builtin();
    let mut from_disk = ShaderLibrary::new();
    let count = from_disk.load_dir(resource_dir("shaders")).unwrap();
    assert_eq!(count, builtin.len());

    for (vertex, fragment) in BUILTIN_PROGRAMS {
        let expected = builtin.link(vertex, fragment).unwrap();
        let actual = from_disk.link(vertex, fragment).unwrap();
        assert_eq!(actual, expected, "{vertex} + {fragment}");
    }
}

#[test]
fn test_schema_names_the_mesh_namespace() {
    let on_disk = std::fs::read_to_string(resource_dir("schema").join("mesh.rnc")).unwrap();
    assert_eq!(on_disk, MESH_SCHEMA_RNC);
    assert!(on_disk.contains(MESH_NAMESPACE));
}
