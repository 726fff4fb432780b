//! On-disk MST records.
//!
//! Layout (little-endian):
//! ```text
//! [4 bytes]  magic "MST\0"
//! [4 bytes]  version
//! [4 bytes]  material_num, then material_num × material record
//!            (1-byte variant tag + variant payload)
//! [4 bytes]  node_num, then node_num × node record
//!            (counted vertex / normal / color / uv / face-group arrays)
//! [4 bytes]  instance_num, then instance_num × instance record
//!            (counted 16-double column-major transforms + u32 node index)
//! ```
//! Texture pixel data is stored exactly as held in memory (already compressed).

use binrw::{binrw, NullString};

#[cfg(test)]
pub(crate) const MST_MAGIC: &[u8; 4] = b"MST\0";

#[binrw]
#[derive(Debug, Clone)]
pub(crate) struct WireTexture {
    pub id: i32,
    pub name: NullString,
    pub width: u64,
    pub height: u64,
    pub format: u32,
    pub pixel_type: u32,
    pub compression: u32,
    #[br(temp)]
    #[bw(calc = data.len() as u32)]
    data_len: u32,
    #[br(count = data_len)]
    pub data: Vec<u8>,
}

#[binrw]
#[derive(Debug, Clone)]
pub(crate) struct WireBase {
    pub color: [u8; 3],
    pub transparency: f32,
}

#[binrw]
#[derive(Debug, Clone)]
pub(crate) struct WireTextured {
    pub base: WireBase,
    #[br(temp)]
    #[bw(calc = u8::from(texture.is_some()))]
    has_texture: u8,
    #[br(if(has_texture != 0))]
    pub texture: Option<WireTexture>,
    #[br(temp)]
    #[bw(calc = u8::from(normal.is_some()))]
    has_normal: u8,
    #[br(if(has_normal != 0))]
    pub normal: Option<WireTexture>,
}

#[binrw]
#[derive(Debug, Clone)]
pub(crate) struct WireLambert {
    pub textured: WireTextured,
    pub ambient: [u8; 3],
    pub diffuse: [u8; 3],
    pub emissive: [u8; 3],
}

#[binrw]
#[derive(Debug, Clone)]
pub(crate) struct WirePhong {
    pub lambert: WireLambert,
    pub specular: [u8; 3],
    pub shininess: f32,
    pub specularity: f32,
}

#[binrw]
#[derive(Debug, Clone)]
pub(crate) struct WirePbr {
    pub textured: WireTextured,
    pub emissive: [u8; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub reflectance: f32,
}

#[binrw]
#[derive(Debug, Clone)]
pub(crate) enum WireMaterial {
    #[brw(magic = 0u8)]
    Base(WireBase),
    #[brw(magic = 1u8)]
    Textured(WireTextured),
    #[brw(magic = 2u8)]
    Lambert(WireLambert),
    #[brw(magic = 3u8)]
    Phong(WirePhong),
    #[brw(magic = 4u8)]
    Pbr(WirePbr),
}

#[binrw]
#[derive(Debug, Clone)]
pub(crate) struct WireFaceGroup {
    pub batch_id: i32,
    #[br(temp)]
    #[bw(calc = faces.len() as u32)]
    face_num: u32,
    #[br(count = face_num)]
    pub faces: Vec<[u32; 3]>,
}

#[binrw]
#[derive(Debug, Clone)]
pub(crate) struct WireNode {
    #[br(temp)]
    #[bw(calc = vertices.len() as u32)]
    vertex_num: u32,
    #[br(count = vertex_num)]
    pub vertices: Vec<[f32; 3]>,

    #[br(temp)]
    #[bw(calc = normals.len() as u32)]
    normal_num: u32,
    #[br(count = normal_num)]
    pub normals: Vec<[f32; 3]>,

    #[br(temp)]
    #[bw(calc = colors.len() as u32)]
    color_num: u32,
    #[br(count = color_num)]
    pub colors: Vec<[u8; 3]>,

    #[br(temp)]
    #[bw(calc = tex_coords.len() as u32)]
    tex_coord_num: u32,
    #[br(count = tex_coord_num)]
    pub tex_coords: Vec<[f32; 2]>,

    #[br(temp)]
    #[bw(calc = face_groups.len() as u32)]
    face_group_num: u32,
    #[br(count = face_group_num)]
    pub face_groups: Vec<WireFaceGroup>,
}

#[binrw]
#[derive(Debug, Clone)]
pub(crate) struct WireInstance {
    #[br(temp)]
    #[bw(calc = transforms.len() as u32)]
    transform_num: u32,
    #[br(count = transform_num)]
    pub transforms: Vec<[f64; 16]>,
    pub node_index: u32,
}

#[binrw]
#[brw(little, magic = b"MST\0")]
#[derive(Debug, Clone)]
pub(crate) struct WireFile {
    pub version: u32,

    #[br(temp)]
    #[bw(calc = materials.len() as u32)]
    material_num: u32,
    #[br(count = material_num)]
    pub materials: Vec<WireMaterial>,

    #[br(temp)]
    #[bw(calc = nodes.len() as u32)]
    node_num: u32,
    #[br(count = node_num)]
    pub nodes: Vec<WireNode>,

    #[br(temp)]
    #[bw(calc = instances.len() as u32)]
    instance_num: u32,
    #[br(count = instance_num)]
    pub instances: Vec<WireInstance>,
}
