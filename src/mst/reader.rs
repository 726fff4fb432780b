//! MST binary reader.
//!
//! Instances are stored as node indices; on load they are re-linked to the
//! same `Arc` held in the node list so geometry stays shared.

use std::io::{Cursor, Read, Seek};
use std::sync::Arc;

use binrw::BinReaderExt;

use super::wire::{WireBase, WireFile, WireLambert, WireMaterial, WireNode, WireTexture, WireTextured};
use super::{
    BaseMaterial, Face, InstanceMesh, LambertMaterial, MeshMaterial, MeshNode, MeshTriangle,
    MstError, MstMesh, PbrMaterial, PhongMaterial, Texture, TextureMaterial, MST_VERSION,
};
use crate::math::flat_to_mat4;

fn texture_from(rec: WireTexture) -> Result<Texture, MstError> {
    Ok(Texture {
        id: rec.id,
        name: rec.name.to_string(),
        size: [rec.width, rec.height],
        format: rec.format.try_into()?,
        pixel_type: rec.pixel_type.try_into()?,
        compression: rec.compression.try_into()?,
        data: rec.data,
    })
}

fn base_from(rec: WireBase) -> BaseMaterial {
    BaseMaterial {
        color: rec.color,
        transparency: rec.transparency,
    }
}

fn textured_from(rec: WireTextured) -> Result<TextureMaterial, MstError> {
    Ok(TextureMaterial {
        base: base_from(rec.base),
        texture: rec.texture.map(texture_from).transpose()?,
        normal: rec.normal.map(texture_from).transpose()?,
    })
}

fn lambert_from(rec: WireLambert) -> Result<LambertMaterial, MstError> {
    Ok(LambertMaterial {
        textured: textured_from(rec.textured)?,
        ambient: rec.ambient,
        diffuse: rec.diffuse,
        emissive: rec.emissive,
    })
}

fn material_from(rec: WireMaterial) -> Result<MeshMaterial, MstError> {
    Ok(match rec {
        WireMaterial::Base(b) => MeshMaterial::Base(base_from(b)),
        WireMaterial::Textured(t) => MeshMaterial::Textured(textured_from(t)?),
        WireMaterial::Lambert(l) => MeshMaterial::Lambert(lambert_from(l)?),
        WireMaterial::Phong(p) => MeshMaterial::Phong(PhongMaterial {
            lambert: lambert_from(p.lambert)?,
            specular: p.specular,
            shininess: p.shininess,
            specularity: p.specularity,
        }),
        WireMaterial::Pbr(p) => MeshMaterial::Pbr(PbrMaterial {
            textured: textured_from(p.textured)?,
            emissive: p.emissive,
            metallic: p.metallic,
            roughness: p.roughness,
            reflectance: p.reflectance,
        }),
    })
}

fn node_from(rec: WireNode) -> MeshNode {
    MeshNode {
        vertices: rec.vertices,
        normals: rec.normals,
        colors: rec.colors,
        tex_coords: rec.tex_coords,
        face_groups: rec
            .face_groups
            .into_iter()
            .map(|g| MeshTriangle {
                batch_id: g.batch_id,
                faces: g.faces.into_iter().map(|vertex| Face { vertex }).collect(),
            })
            .collect(),
    }
}

/// Parse an MST stream produced by [`write_mst`](super::write_mst).
pub fn read_mst<R: Read + Seek>(reader: &mut R) -> Result<MstMesh, MstError> {
    let file: WireFile = reader.read_le()?;
    if file.version != MST_VERSION {
        return Err(MstError::UnsupportedVersion(file.version));
    }

    let materials = file
        .materials
        .into_iter()
        .map(material_from)
        .collect::<Result<Vec<_>, _>>()?;

    let nodes: Vec<Arc<MeshNode>> = file
        .nodes
        .into_iter()
        .map(|n| Arc::new(node_from(n)))
        .collect();

    let mut instances = Vec::with_capacity(file.instances.len());
    for (i, inst) in file.instances.into_iter().enumerate() {
        let mesh = nodes
            .get(inst.node_index as usize)
            .cloned()
            .ok_or(MstError::NodeIndexOutOfRange {
                instance: i,
                index: inst.node_index,
                count: nodes.len(),
            })?;
        instances.push(InstanceMesh {
            transforms: inst.transforms.iter().map(flat_to_mat4).collect(),
            mesh,
        });
    }

    Ok(MstMesh {
        version: file.version,
        materials,
        nodes,
        instances,
    })
}

pub fn from_bytes(bytes: &[u8]) -> Result<MstMesh, MstError> {
    read_mst(&mut Cursor::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mst::to_bytes;

    #[test]
    fn rejects_foreign_magic() {
        let err = from_bytes(b"GLTF\x04\0\0\0").unwrap_err();
        assert!(matches!(err, MstError::Format(_)));
    }

    #[test]
    fn rejects_other_versions() {
        let mut bytes = to_bytes(&MstMesh::new()).unwrap();
        bytes[4..8].copy_from_slice(&3u32.to_le_bytes());
        assert!(matches!(
            from_bytes(&bytes),
            Err(MstError::UnsupportedVersion(3))
        ));
    }

    #[test]
    fn rejects_instance_pointing_past_node_list() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"MST\0");
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // materials
        bytes.extend_from_slice(&0u32.to_le_bytes()); // nodes
        bytes.extend_from_slice(&1u32.to_le_bytes()); // instances
        bytes.extend_from_slice(&0u32.to_le_bytes()); // transforms
        bytes.extend_from_slice(&2u32.to_le_bytes()); // node index

        assert!(matches!(
            from_bytes(&bytes),
            Err(MstError::NodeIndexOutOfRange { index: 2, count: 0, .. })
        ));
    }
}
