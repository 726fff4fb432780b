// Common test utilities and scene fixtures
#![allow(dead_code)]

use std::path::Path;

use cgmath::{Matrix4, Vector3};
use image::{ImageFormat, Rgba, RgbaImage};
use mst_convert_lib::scene::{
    Face, Material, MaterialProperty, Mesh, Node, PropertyTypeInfo, Scene, TextureType,
};

pub fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(x, y, z))
}

/// Unit quad in the XY plane with one color and one UV channel.
pub fn quad_mesh(material_index: usize) -> Mesh {
    let mut mesh = Mesh {
        name: "quad".to_string(),
        vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        faces: vec![Face::new([0, 1, 2, 3])],
        material_index,
        ..Default::default()
    };
    mesh.color_sets[0] = vec![[1.0, 0.0, 0.0, 1.0]; 4];
    mesh.tex_coords[0] = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
    mesh
}

pub fn byte_color(key: &str, rgb: [u8; 3]) -> MaterialProperty {
    MaterialProperty::new(key, PropertyTypeInfo::Buffer, rgb.to_vec())
}

pub fn float_prop(key: &str, value: f32) -> MaterialProperty {
    MaterialProperty::new(key, PropertyTypeInfo::Float32, value.to_le_bytes().to_vec())
}

pub fn texture_prop(path: &str, semantic: TextureType) -> MaterialProperty {
    let mut data = path.as_bytes().to_vec();
    data.push(0);
    MaterialProperty::new("$tex.file", PropertyTypeInfo::String, data).with_semantic(semantic)
}

/// Root with transform `t0` and one child with `t1`, both placing mesh 0.
pub fn two_level_scene(t0: Matrix4<f32>, t1: Matrix4<f32>) -> Scene {
    let mut scene = Scene::new();
    scene.meshes.push(quad_mesh(0));
    scene.materials.push(Material::new(vec![byte_color("$clr.diffuse", [255, 0, 0])]));
    let root = scene.set_root(Node::new("root").with_transform(t0).with_meshes([0]));
    scene
        .add_child(root, Node::new("child").with_transform(t1).with_meshes([0]))
        .unwrap();
    scene
}

/// Write a small gradient PNG fixture.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = RgbaImage::from_fn(width, height, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 200, 255]));
    img.save_with_format(path, ImageFormat::Png).unwrap();
}
