//! Scene → MST conversion.
//!
//! Conversion never fails: malformed properties keep their defaults,
//! unresolvable textures leave their slot empty and out-of-range mesh
//! references are skipped. Every such case is logged.

pub mod geometry;
pub mod hierarchy;
pub mod material;
pub mod texture;

use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use serde::Deserialize;

use crate::mst::MstMesh;
use crate::scene::Scene;

pub use geometry::{convert_mesh, triangulate_fan};
pub use hierarchy::collect_instances;
pub use material::{classify_material, PropertyKey};
pub use texture::{TextureResolver, TextureRole};

/// Which matrix an instance receives.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Node transform composed with all ancestor transforms.
    #[default]
    World,
    /// The node's own matrix only, ignoring ancestors.
    Local,
}

/// Options for scene conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub transform_mode: TransformMode,
    /// Directories probed, in order, for a texture whose path does not exist as given.
    pub texture_search_dirs: Vec<PathBuf>,
    /// Anchor for relative texture paths and search directories.
    /// `None` resolves against the working directory.
    pub base_dir: Option<PathBuf>,
    /// When false, no texture is ever loaded.
    pub load_textures: bool,
    /// zstd level for texture pixel data.
    pub compression_level: i32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            transform_mode: TransformMode::World,
            texture_search_dirs: [".", "..", "textures", "Textures", "../textures", "../Textures"]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            base_dir: None,
            load_textures: true,
            compression_level: 3,
        }
    }
}

/// Convert an imported scene into an instance-based MST mesh.
///
/// Materials and mesh nodes keep the source order, so a mesh's
/// `material_index` and a node's mesh indices stay valid in the output.
/// `None` yields an empty mesh.
pub fn convert_scene(scene: Option<&Scene>, options: &ConvertOptions) -> MstMesh {
    let mut out = MstMesh::new();
    let Some(scene) = scene else {
        return out;
    };

    let mut resolver = TextureResolver::new(options, &scene.textures);
    out.materials = scene
        .materials
        .iter()
        .map(|m| classify_material(Some(m), &mut resolver))
        .collect();

    out.nodes = scene
        .meshes
        .iter()
        .map(|m| Arc::new(convert_mesh(m)))
        .collect();

    out.instances = collect_instances(scene, &out.nodes, options.transform_mode);

    info!(
        "converted scene: {} materials, {} mesh nodes ({} vertices, {} triangles), {} instances",
        out.materials.len(),
        out.nodes.len(),
        out.vertex_count(),
        out.triangle_count(),
        out.instances.len()
    );
    out
}
