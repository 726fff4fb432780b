//! MST target mesh model.
//!
//! An `MstMesh` holds three flat lists: converted materials, geometry-only
//! mesh nodes, and instances that place a node in world space. Instances
//! share their node through an `Arc`, so one geometry block can appear at any
//! number of placements without copying vertex data.

pub mod reader;
mod wire;
pub mod writer;

use std::sync::Arc;

use cgmath::Matrix4;
use thiserror::Error;

pub use reader::{from_bytes, read_mst};
pub use writer::{to_bytes, write_mst};

/// Format revision written by this crate.
pub const MST_VERSION: u32 = 4;

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub vertex: [u32; 3],
}

/// Triangles that render with one material. `batch_id` is the source
/// material index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshTriangle {
    pub batch_id: i32,
    pub faces: Vec<Face>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshNode {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<[u8; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub face_groups: Vec<MeshTriangle>,
}

impl MeshNode {
    pub fn triangle_count(&self) -> usize {
        self.face_groups.iter().map(|g| g.faces.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct InstanceMesh {
    pub transforms: Vec<Matrix4<f64>>,
    pub mesh: Arc<MeshNode>,
}

// ============================================================================
// Textures
// ============================================================================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextureFormat {
    #[default]
    Rgba = 1,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PixelType {
    #[default]
    UnsignedByte = 1,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Compression {
    None = 0,
    #[default]
    Zstd = 1,
}

macro_rules! u32_enum {
    ($ty:ident { $($raw:literal => $variant:ident),+ $(,)? }) => {
        impl From<$ty> for u32 {
            fn from(v: $ty) -> u32 {
                v as u32
            }
        }

        impl TryFrom<u32> for $ty {
            type Error = MstError;
            fn try_from(v: u32) -> Result<Self, Self::Error> {
                match v {
                    $($raw => Ok(Self::$variant),)+
                    _ => Err(MstError::InvalidEnum {
                        name: stringify!($ty),
                        value: v,
                    }),
                }
            }
        }
    };
}

u32_enum!(TextureFormat { 1 => Rgba });
u32_enum!(PixelType { 1 => UnsignedByte });
u32_enum!(Compression { 0 => None, 1 => Zstd });

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub id: i32,
    pub name: String,
    pub size: [u64; 2],
    pub format: TextureFormat,
    pub pixel_type: PixelType,
    pub compression: Compression,
    pub data: Vec<u8>,
}

impl Texture {
    /// Build a texture from raw RGBA8 pixels, compressing them as requested.
    pub fn from_rgba(
        id: i32,
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixels: &[u8],
        compression: Compression,
        level: i32,
    ) -> Result<Self, MstError> {
        let data = match compression {
            Compression::None => pixels.to_vec(),
            Compression::Zstd => zstd::encode_all(pixels, level).map_err(MstError::Compression)?,
        };
        Ok(Self {
            id,
            name: name.into(),
            size: [u64::from(width), u64::from(height)],
            format: TextureFormat::Rgba,
            pixel_type: PixelType::UnsignedByte,
            compression,
            data,
        })
    }

    /// Decompress the stored buffer back to RGBA8 pixels.
    pub fn pixels(&self) -> Result<Vec<u8>, MstError> {
        match self.compression {
            Compression::None => Ok(self.data.clone()),
            Compression::Zstd => zstd::decode_all(self.data.as_slice()).map_err(MstError::Compression),
        }
    }
}

// ============================================================================
// Materials
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BaseMaterial {
    pub color: [u8; 3],
    pub transparency: f32,
}

impl Default for BaseMaterial {
    fn default() -> Self {
        Self {
            color: [128, 128, 128],
            transparency: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureMaterial {
    pub base: BaseMaterial,
    pub texture: Option<Texture>,
    pub normal: Option<Texture>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LambertMaterial {
    pub textured: TextureMaterial,
    pub ambient: [u8; 3],
    pub diffuse: [u8; 3],
    pub emissive: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhongMaterial {
    pub lambert: LambertMaterial,
    pub specular: [u8; 3],
    pub shininess: f32,
    pub specularity: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PbrMaterial {
    pub textured: TextureMaterial,
    pub emissive: [u8; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub reflectance: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MaterialKind {
    Base,
    Textured,
    Lambert,
    Phong,
    Pbr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeshMaterial {
    Base(BaseMaterial),
    Textured(TextureMaterial),
    Lambert(LambertMaterial),
    Phong(PhongMaterial),
    Pbr(PbrMaterial),
}

impl MeshMaterial {
    pub fn kind(&self) -> MaterialKind {
        match self {
            Self::Base(_) => MaterialKind::Base,
            Self::Textured(_) => MaterialKind::Textured,
            Self::Lambert(_) => MaterialKind::Lambert,
            Self::Phong(_) => MaterialKind::Phong,
            Self::Pbr(_) => MaterialKind::Pbr,
        }
    }

    pub fn base(&self) -> &BaseMaterial {
        match self {
            Self::Base(b) => b,
            Self::Textured(t) => &t.base,
            Self::Lambert(l) => &l.textured.base,
            Self::Phong(p) => &p.lambert.textured.base,
            Self::Pbr(p) => &p.textured.base,
        }
    }

    pub fn textured(&self) -> Option<&TextureMaterial> {
        match self {
            Self::Base(_) => None,
            Self::Textured(t) => Some(t),
            Self::Lambert(l) => Some(&l.textured),
            Self::Phong(p) => Some(&p.lambert.textured),
            Self::Pbr(p) => Some(&p.textured),
        }
    }

    pub fn color(&self) -> [u8; 3] {
        self.base().color
    }

    pub fn transparency(&self) -> f32 {
        self.base().transparency
    }

    pub fn diffuse_texture(&self) -> Option<&Texture> {
        self.textured().and_then(|t| t.texture.as_ref())
    }

    pub fn normal_texture(&self) -> Option<&Texture> {
        self.textured().and_then(|t| t.normal.as_ref())
    }
}

// ============================================================================
// Container
// ============================================================================

#[derive(Debug, Clone)]
pub struct MstMesh {
    pub version: u32,
    pub materials: Vec<MeshMaterial>,
    pub nodes: Vec<Arc<MeshNode>>,
    pub instances: Vec<InstanceMesh>,
}

impl Default for MstMesh {
    fn default() -> Self {
        Self {
            version: MST_VERSION,
            materials: Vec::new(),
            nodes: Vec::new(),
            instances: Vec::new(),
        }
    }
}

impl MstMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty() && self.nodes.is_empty() && self.instances.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.nodes.iter().map(|n| n.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.nodes.iter().map(|n| n.triangle_count()).sum()
    }

    /// Index of the flat node list entry an instance points at.
    pub fn node_index_of(&self, instance: &InstanceMesh) -> Option<usize> {
        self.nodes.iter().position(|n| Arc::ptr_eq(n, &instance.mesh))
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum MstError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed MST data: {0}")]
    Format(#[from] binrw::Error),

    #[error("unsupported MST version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid {name} value {value}")]
    InvalidEnum { name: &'static str, value: u32 },

    #[error("instance {0} references a mesh node that is not in the node list")]
    DanglingInstance(usize),

    #[error("instance {instance} references node {index}, but only {count} nodes exist")]
    NodeIndexOutOfRange {
        instance: usize,
        index: u32,
        count: usize,
    },

    #[error("texture compression failed: {0}")]
    Compression(std::io::Error),
}
