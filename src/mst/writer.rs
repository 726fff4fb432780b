//! MST binary writer: serializes an `MstMesh` to the on-disk layout in `wire`.

use std::collections::HashMap;
use std::io::{Cursor, Seek, Write};
use std::sync::Arc;

use binrw::{BinWriterExt, NullString};

use super::wire::{
    WireBase, WireFaceGroup, WireFile, WireInstance, WireLambert, WireMaterial, WireNode,
    WirePbr, WirePhong, WireTexture, WireTextured,
};
use super::{
    BaseMaterial, LambertMaterial, MeshMaterial, MeshNode, MstError, MstMesh, Texture,
    TextureMaterial,
};
use crate::math::mat4_to_flat;

// ============================================================================
// Record builders
// ============================================================================

fn texture_record(tex: &Texture) -> WireTexture {
    WireTexture {
        id: tex.id,
        name: NullString::from(tex.name.as_str()),
        width: tex.size[0],
        height: tex.size[1],
        format: tex.format.into(),
        pixel_type: tex.pixel_type.into(),
        compression: tex.compression.into(),
        data: tex.data.clone(),
    }
}

fn base_record(base: &BaseMaterial) -> WireBase {
    WireBase {
        color: base.color,
        transparency: base.transparency,
    }
}

fn textured_record(mat: &TextureMaterial) -> WireTextured {
    WireTextured {
        base: base_record(&mat.base),
        texture: mat.texture.as_ref().map(texture_record),
        normal: mat.normal.as_ref().map(texture_record),
    }
}

fn lambert_record(mat: &LambertMaterial) -> WireLambert {
    WireLambert {
        textured: textured_record(&mat.textured),
        ambient: mat.ambient,
        diffuse: mat.diffuse,
        emissive: mat.emissive,
    }
}

fn material_record(mat: &MeshMaterial) -> WireMaterial {
    match mat {
        MeshMaterial::Base(b) => WireMaterial::Base(base_record(b)),
        MeshMaterial::Textured(t) => WireMaterial::Textured(textured_record(t)),
        MeshMaterial::Lambert(l) => WireMaterial::Lambert(lambert_record(l)),
        MeshMaterial::Phong(p) => WireMaterial::Phong(WirePhong {
            lambert: lambert_record(&p.lambert),
            specular: p.specular,
            shininess: p.shininess,
            specularity: p.specularity,
        }),
        MeshMaterial::Pbr(p) => WireMaterial::Pbr(WirePbr {
            textured: textured_record(&p.textured),
            emissive: p.emissive,
            metallic: p.metallic,
            roughness: p.roughness,
            reflectance: p.reflectance,
        }),
    }
}

fn node_record(node: &MeshNode) -> WireNode {
    WireNode {
        vertices: node.vertices.clone(),
        normals: node.normals.clone(),
        colors: node.colors.clone(),
        tex_coords: node.tex_coords.clone(),
        face_groups: node
            .face_groups
            .iter()
            .map(|g| WireFaceGroup {
                batch_id: g.batch_id,
                faces: g.faces.iter().map(|f| f.vertex).collect(),
            })
            .collect(),
    }
}

fn file_record(mesh: &MstMesh) -> Result<WireFile, MstError> {
    let node_indices: HashMap<*const MeshNode, usize> = mesh
        .nodes
        .iter()
        .enumerate()
        .rev()
        .map(|(i, n)| (Arc::as_ptr(n), i))
        .collect();

    let mut instances = Vec::with_capacity(mesh.instances.len());
    for (i, inst) in mesh.instances.iter().enumerate() {
        let node_index = *node_indices
            .get(&Arc::as_ptr(&inst.mesh))
            .ok_or(MstError::DanglingInstance(i))?;
        instances.push(WireInstance {
            transforms: inst.transforms.iter().map(mat4_to_flat).collect(),
            node_index: node_index as u32,
        });
    }

    Ok(WireFile {
        version: mesh.version,
        materials: mesh.materials.iter().map(material_record).collect(),
        nodes: mesh.nodes.iter().map(|n| node_record(n)).collect(),
        instances,
    })
}

// ============================================================================
// Public API
// ============================================================================

/// Serialize `mesh` into `writer`.
///
/// Fails with `DanglingInstance` if an instance's geometry is not one of the
/// entries in `mesh.nodes`.
pub fn write_mst<W: Write + Seek>(mesh: &MstMesh, writer: &mut W) -> Result<(), MstError> {
    let record = file_record(mesh)?;
    writer.write_le(&record)?;
    Ok(())
}

pub fn to_bytes(mesh: &MstMesh) -> Result<Vec<u8>, MstError> {
    let mut cursor = Cursor::new(Vec::new());
    write_mst(mesh, &mut cursor)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use cgmath::{Matrix4, SquareMatrix};

    use super::*;
    use crate::mst::wire::MST_MAGIC;
    use crate::mst::{InstanceMesh, MST_VERSION};

    #[test]
    fn empty_mesh_writes_header_and_zero_counts() {
        let bytes = to_bytes(&MstMesh::new()).unwrap();
        assert_eq!(&bytes[0..4], MST_MAGIC);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), MST_VERSION);
        // three zero counts follow the version
        assert_eq!(bytes.len(), 8 + 12);
        assert!(bytes[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn instance_outside_node_list_is_rejected() {
        let mut mesh = MstMesh::new();
        mesh.nodes.push(Arc::new(MeshNode::default()));
        mesh.instances.push(InstanceMesh {
            transforms: vec![Matrix4::identity()],
            mesh: Arc::new(MeshNode::default()),
        });

        let err = to_bytes(&mesh).unwrap_err();
        assert!(matches!(err, MstError::DanglingInstance(0)));
    }

    #[test]
    fn instances_map_to_their_own_node_index() {
        let mut mesh = MstMesh::new();
        for _ in 0..3 {
            mesh.nodes.push(Arc::new(MeshNode::default()));
        }
        for &n in &[2usize, 0, 2, 1] {
            mesh.instances.push(InstanceMesh {
                transforms: vec![Matrix4::identity()],
                mesh: Arc::clone(&mesh.nodes[n]),
            });
        }

        let record = file_record(&mesh).unwrap();
        let indices: Vec<u32> = record.instances.iter().map(|i| i.node_index).collect();
        assert_eq!(indices, vec![2, 0, 2, 1]);
    }
}
