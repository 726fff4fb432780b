//! Flattens imported 3D scenes into instance-based MST meshes.
//!
//! [`scene`] holds the importer's output, [`convert`] turns it into an
//! [`mst::MstMesh`], and [`mst`] reads and writes the binary form.

pub mod convert;
pub mod math;
pub mod mst;
pub mod scene;

pub use convert::{convert_scene, ConvertOptions, TransformMode};
pub use mst::{MeshMaterial, MstError, MstMesh};
pub use scene::Scene;
