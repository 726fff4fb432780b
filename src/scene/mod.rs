//! Source scene model, an immutable snapshot of what the asset importer produced.
//!
//! The node hierarchy is stored as an arena: `Scene::nodes` owns every node,
//! `Node::children` lists child ids in order and `Node::parent` is a plain
//! back-index, never a second ownership edge.

use std::collections::HashMap;

use cgmath::Matrix4;
use serde::{Deserialize, Serialize};

pub const MAX_COLOR_SETS: usize = 8;
pub const MAX_TEX_COORDS: usize = 8;

// ============================================================================
// Enums mirrored from the importer
// ============================================================================

/// Texture semantic attached to material properties.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum TextureType {
    #[default]
    None = 0,
    Diffuse = 1,
    Specular = 2,
    Ambient = 3,
    Emissive = 4,
    Height = 5,
    Normal = 6,
    Shininess = 7,
    Opacity = 8,
    Displacement = 9,
    Lightmap = 10,
    Reflection = 11,
    BaseColor = 12,
    NormalCamera = 13,
    EmissionColor = 14,
    Metalness = 15,
    DiffuseRoughness = 16,
    AmbientOcclusion = 17,
    Unknown = 18,
}

impl From<TextureType> for u32 {
    fn from(v: TextureType) -> u32 {
        v as u32
    }
}

impl TryFrom<u32> for TextureType {
    type Error = String;
    fn try_from(v: u32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::None),
            1 => Ok(Self::Diffuse),
            2 => Ok(Self::Specular),
            3 => Ok(Self::Ambient),
            4 => Ok(Self::Emissive),
            5 => Ok(Self::Height),
            6 => Ok(Self::Normal),
            7 => Ok(Self::Shininess),
            8 => Ok(Self::Opacity),
            9 => Ok(Self::Displacement),
            10 => Ok(Self::Lightmap),
            11 => Ok(Self::Reflection),
            12 => Ok(Self::BaseColor),
            13 => Ok(Self::NormalCamera),
            14 => Ok(Self::EmissionColor),
            15 => Ok(Self::Metalness),
            16 => Ok(Self::DiffuseRoughness),
            17 => Ok(Self::AmbientOcclusion),
            18 => Ok(Self::Unknown),
            _ => Err(format!("Invalid TextureType: {}", v)),
        }
    }
}

/// Declared storage type of a material property payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum PropertyTypeInfo {
    Float32 = 1,
    Float64 = 2,
    String = 3,
    Int32 = 4,
    #[default]
    Buffer = 5,
}

impl PropertyTypeInfo {
    /// Minimum payload width for numeric types.
    pub fn numeric_width(self) -> Option<usize> {
        match self {
            Self::Float32 | Self::Int32 => Some(4),
            Self::Float64 => Some(8),
            Self::String | Self::Buffer => None,
        }
    }
}

impl From<PropertyTypeInfo> for u32 {
    fn from(v: PropertyTypeInfo) -> u32 {
        v as u32
    }
}

impl TryFrom<u32> for PropertyTypeInfo {
    type Error = String;
    fn try_from(v: u32) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Float32),
            2 => Ok(Self::Float64),
            3 => Ok(Self::String),
            4 => Ok(Self::Int32),
            5 => Ok(Self::Buffer),
            _ => Err(format!("Invalid PropertyTypeInfo: {}", v)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MorphMethod {
    #[default]
    Unknown,
    VertexBlend,
    MorphNormalized,
    MorphRelative,
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Metadata {
    Bool(bool),
    Int32(i32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Vec3([f32; 3]),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Local transform relative to the parent. `None` is treated as identity.
    #[serde(default)]
    pub transform: Option<Matrix4<f32>>,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub mesh_indices: Vec<usize>,
    #[serde(default)]
    pub metadata: HashMap<String, Metadata>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_meshes(mut self, mesh_indices: impl IntoIterator<Item = usize>) -> Self {
        self.mesh_indices = mesh_indices.into_iter().collect();
        self
    }
}

// ============================================================================
// Meshes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl Face {
    pub fn new(indices: impl IntoIterator<Item = u32>) -> Self {
        Self {
            indices: indices.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    /// Per-vertex RGBA colors, one list per channel; unused channels are empty.
    pub color_sets: [Vec<[f32; 4]>; MAX_COLOR_SETS],
    /// Per-vertex UVW coordinates, one list per channel; unused channels are empty.
    pub tex_coords: [Vec<[f32; 3]>; MAX_TEX_COORDS],
    pub faces: Vec<Face>,
    pub material_index: usize,
    pub aabb: Aabb,
    pub morph_method: MorphMethod,
}

// ============================================================================
// Materials
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperty {
    /// Importer key such as `$clr.diffuse` or `$tex.file`.
    pub key: String,
    #[serde(default)]
    pub semantic: TextureType,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub type_info: PropertyTypeInfo,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl MaterialProperty {
    pub fn new(key: impl Into<String>, type_info: PropertyTypeInfo, data: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            type_info,
            data,
            ..Default::default()
        }
    }

    pub fn with_semantic(mut self, semantic: TextureType) -> Self {
        self.semantic = semantic;
        self
    }

    /// True when a numeric type tag is paired with a payload too short for it.
    pub fn is_malformed(&self) -> bool {
        self.type_info
            .numeric_width()
            .map(|w| self.data.len() < w)
            .unwrap_or(false)
    }

    /// Payload interpreted as a string, with trailing NULs dropped.
    pub fn as_string(&self) -> String {
        let end = self.data.iter().position(|&b| b == 0).unwrap_or(self.data.len());
        String::from_utf8_lossy(&self.data[..end]).to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub properties: Vec<MaterialProperty>,
}

impl Material {
    pub fn new(properties: Vec<MaterialProperty>) -> Self {
        Self { properties }
    }
}

/// A texture stored inside the asset file rather than next to it.
///
/// `height == 0` marks a compressed image (PNG, JPEG, ...) whose raw file
/// bytes are in `data`. Otherwise `data` holds `width * height` BGRA texels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddedTexture {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub format_hint: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub filename: String,
}

impl EmbeddedTexture {
    pub fn is_compressed(&self) -> bool {
        self.height == 0
    }
}

// ============================================================================
// Scene
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub flags: u32,
    pub root: Option<NodeId>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<EmbeddedTexture>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `node` as the root, replacing any previous root reference.
    pub fn set_root(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        let id = self.push_node(node);
        self.root = Some(id);
        id
    }

    /// Append `node` as the last child of `parent`.
    ///
    /// Returns `None` if `parent` does not exist.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Option<NodeId> {
        if parent.0 >= self.nodes.len() {
            return None;
        }
        node.parent = Some(parent);
        let id = self.push_node(node);
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.root.and_then(|id| self.node(id))
    }

    pub fn parent_of(&self, id: NodeId) -> Option<&Node> {
        self.node(id)?.parent.and_then(|p| self.node(p))
    }

    fn push_node(&mut self, mut node: Node) -> NodeId {
        node.children.clear();
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

mod base64_bytes {
    use base64::prelude::BASE64_STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&BASE64_STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        BASE64_STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
