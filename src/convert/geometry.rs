//! Geometry conversion: one source mesh → one transform-free `MeshNode`.

use log::debug;

use crate::math::unit_rgb_to_bytes;
use crate::mst::{Face, MeshNode, MeshTriangle};
use crate::scene::Mesh;

/// Split a polygon into a triangle fan anchored at its first vertex.
///
/// `[i0, i1, i2, i3]` becomes `(i0, i1, i2), (i0, i2, i3)`. Polygons with
/// fewer than three indices produce nothing. Only correct for convex faces;
/// concave input is fanned the same way.
pub fn triangulate_fan(indices: &[u32]) -> Vec<Face> {
    let Some((&anchor, rest)) = indices.split_first() else {
        return Vec::new();
    };
    rest.windows(2)
        .map(|w| Face {
            vertex: [anchor, w[0], w[1]],
        })
        .collect()
}

/// Byte color from the RGB part of a 0..1 RGBA color.
pub fn color_to_bytes(c: [f32; 4]) -> [u8; 3] {
    unit_rgb_to_bytes([c[0], c[1], c[2]])
}

pub fn convert_mesh(mesh: &Mesh) -> MeshNode {
    let colors = mesh.color_sets[0].iter().copied().map(color_to_bytes).collect();
    let tex_coords = mesh.tex_coords[0].iter().map(|uv| [uv[0], uv[1]]).collect();

    let mut faces = Vec::with_capacity(mesh.faces.len());
    let mut skipped = 0usize;
    for face in &mesh.faces {
        if face.indices.len() < 3 {
            skipped += 1;
            continue;
        }
        faces.extend(triangulate_fan(&face.indices));
    }
    if skipped > 0 {
        debug!("mesh '{}': skipped {} degenerate faces", mesh.name, skipped);
    }

    let face_groups = if faces.is_empty() {
        Vec::new()
    } else {
        vec![MeshTriangle {
            batch_id: mesh.material_index as i32,
            faces,
        }]
    };

    MeshNode {
        vertices: mesh.vertices.clone(),
        normals: mesh.normals.clone(),
        colors,
        tex_coords,
        face_groups,
    }
}
