// Converted meshes survive a write/read cycle through the MST codec

use std::io::Cursor;
use std::sync::Arc;

use cgmath::Matrix4;
use mst_convert_lib::convert::{convert_scene, ConvertOptions};
use mst_convert_lib::mst::{from_bytes, read_mst, to_bytes, write_mst, MaterialKind, MeshMaterial, MstMesh};
use mst_convert_lib::scene::{EmbeddedTexture, Material, Node, TextureType};

#[path = "common/mod.rs"]
mod common;

use common::{byte_color, float_prop, quad_mesh, texture_prop, translation, two_level_scene};

fn rich_mesh() -> MstMesh {
    let mut scene = two_level_scene(translation(1.0, 2.0, 3.0), translation(-4.0, 0.0, 0.5));
    scene.materials.push(Material::new(vec![
        byte_color("$clr.specular", [50, 60, 70]),
        float_prop("$mat.shininess", 16.0),
        texture_prop("*0", TextureType::Diffuse),
    ]));
    scene.materials.push(Material::new(vec![
        float_prop("$mat.metallicFactor", 0.3),
        byte_color("$clr.emissive", [5, 5, 5]),
    ]));
    scene.materials.push(Material::new(vec![
        byte_color("$clr.specular", [7, 8, 9]),
        float_prop("$mat.shininess", 8.0),
    ]));
    scene.textures.push(EmbeddedTexture {
        width: 2,
        height: 1,
        data: vec![0, 0, 255, 255, 255, 0, 0, 128],
        ..Default::default()
    });
    scene.meshes.push(quad_mesh(1));
    let root = scene.root.unwrap();
    scene
        .add_child(root, Node::new("extra").with_meshes([1, 0]))
        .unwrap();

    convert_scene(Some(&scene), &ConvertOptions::default())
}

#[test]
fn converted_mesh_roundtrips() {
    let mesh = rich_mesh();
    assert_eq!(mesh.instances.len(), 4);

    let bytes = to_bytes(&mesh).unwrap();
    let back = from_bytes(&bytes).unwrap();

    assert_eq!(back.version, mesh.version);
    assert_eq!(back.materials, mesh.materials);
    let kinds: Vec<_> = back.materials.iter().map(|m| m.kind()).collect();
    assert_eq!(
        kinds,
        vec![MaterialKind::Lambert, MaterialKind::Textured, MaterialKind::Pbr, MaterialKind::Phong]
    );
    assert_eq!(back.nodes.len(), mesh.nodes.len());
    for (a, b) in back.nodes.iter().zip(&mesh.nodes) {
        assert_eq!(**a, **b);
    }
    assert_eq!(back.instances.len(), mesh.instances.len());
    for (a, b) in back.instances.iter().zip(&mesh.instances) {
        assert_eq!(a.transforms, b.transforms);
        assert_eq!(back.node_index_of(a), mesh.node_index_of(b));
    }

    // writing the decoded mesh reproduces the same bytes
    assert_eq!(to_bytes(&back).unwrap(), bytes);
}

#[test]
fn decoded_instances_share_node_allocations() {
    let back = from_bytes(&to_bytes(&rich_mesh()).unwrap()).unwrap();
    for inst in &back.instances {
        assert!(back.nodes.iter().any(|n| Arc::ptr_eq(n, &inst.mesh)));
    }
    assert!(Arc::ptr_eq(&back.instances[0].mesh, &back.instances[1].mesh));
}

#[test]
fn embedded_texture_pixels_survive() {
    let back = from_bytes(&to_bytes(&rich_mesh()).unwrap()).unwrap();
    let MeshMaterial::Textured(t) = &back.materials[1] else {
        panic!("expected Textured, got {:?}", back.materials[1].kind());
    };
    let tex = t.texture.as_ref().unwrap();
    assert_eq!(tex.size, [2, 1]);
    assert_eq!(tex.pixels().unwrap(), vec![255, 0, 0, 255, 0, 0, 255, 128]);
}

#[test]
fn streams_through_writer_and_reader() {
    let mesh = rich_mesh();
    let mut cursor = Cursor::new(Vec::new());
    write_mst(&mesh, &mut cursor).unwrap();
    cursor.set_position(0);

    let back = read_mst(&mut cursor).unwrap();
    assert_eq!(back.triangle_count(), mesh.triangle_count());
    assert_eq!(back.vertex_count(), mesh.vertex_count());
}

#[test]
fn truncated_stream_is_an_error() {
    let bytes = to_bytes(&rich_mesh()).unwrap();
    assert!(from_bytes(&bytes[..bytes.len() / 2]).is_err());
}

#[test]
fn identity_instance_written_for_untransformed_node() {
    let mut scene = two_level_scene(Matrix4::from_scale(1.0), Matrix4::from_scale(1.0));
    scene.nodes[0].transform = None;
    let mesh = convert_scene(Some(&scene), &ConvertOptions::default());
    let back = from_bytes(&to_bytes(&mesh).unwrap()).unwrap();
    assert_eq!(back.instances[0].transforms[0], Matrix4::from_scale(1.0));
}
