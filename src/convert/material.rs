//! Material classification: importer property list → one `MeshMaterial` variant.
//!
//! Variant priority: PBR (metallic or roughness present) > Textured (a diffuse
//! or normal texture resolved) > Phong (specular color present) > Lambert.
//! PBR keeps any resolved textures on its textured base.

use log::{debug, warn};

use super::texture::{TextureResolver, TextureRole};
use crate::math::{read_f32_le, read_f64_le, read_i32_le};
use crate::mst::{
    BaseMaterial, LambertMaterial, MeshMaterial, PbrMaterial, PhongMaterial, Texture,
    TextureMaterial,
};
use crate::scene::{Material, MaterialProperty, PropertyTypeInfo};

const DEFAULT_COLOR: [u8; 3] = [128, 128, 128];
const DEFAULT_TRANSPARENCY: f32 = 1.0;
const DEFAULT_METALLIC: f32 = 0.0;
const DEFAULT_ROUGHNESS: f32 = 0.5;
const DEFAULT_SHININESS: f32 = 32.0;
const PHONG_SPECULARITY: f32 = 1.0;
const PBR_REFLECTANCE: f32 = 0.5;

/// Material properties the classifier understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PropertyKey {
    DiffuseColor,
    SpecularColor,
    AmbientColor,
    EmissiveColor,
    Opacity,
    Shininess,
    Metallic,
    Roughness,
    TextureFile,
}

impl PropertyKey {
    /// Map an importer key (`$clr.diffuse`) or its nice name (`COLOR_DIFFUSE`).
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "$clr.diffuse" | "COLOR_DIFFUSE" => Self::DiffuseColor,
            "$clr.specular" | "COLOR_SPECULAR" => Self::SpecularColor,
            "$clr.ambient" | "COLOR_AMBIENT" => Self::AmbientColor,
            "$clr.emissive" | "COLOR_EMISSIVE" => Self::EmissiveColor,
            "$mat.opacity" | "OPACITY" => Self::Opacity,
            "$mat.shininess" | "SHININESS" => Self::Shininess,
            "$mat.metallicFactor" | "METALLIC" => Self::Metallic,
            "$mat.roughnessFactor" | "ROUGHNESS" => Self::Roughness,
            "$tex.file" | "TEXTURE_BASE" => Self::TextureFile,
            _ => return None,
        };
        Some(key)
    }
}

// ============================================================================
// Payload decoding
// ============================================================================

/// Decode a color payload: the first three bytes, whatever the type tag.
pub fn decode_color(prop: &MaterialProperty) -> Option<[u8; 3]> {
    match prop.data.as_slice() {
        [r, g, b, ..] => Some([*r, *g, *b]),
        _ => None,
    }
}

/// Decode a scalar payload as a float.
///
/// Float64 and Int32 tags are honored; every other tag reads a float32.
/// A numeric tag with a payload shorter than its width is rejected.
pub fn decode_scalar(prop: &MaterialProperty) -> Option<f32> {
    if prop.is_malformed() {
        return None;
    }
    match prop.type_info {
        PropertyTypeInfo::Float64 => read_f64_le(&prop.data).map(|v| v as f32),
        PropertyTypeInfo::Int32 => read_i32_le(&prop.data).map(|v| v as f32),
        _ => read_f32_le(&prop.data),
    }
}

fn color_or_warn(prop: &MaterialProperty) -> Option<[u8; 3]> {
    let rgb = decode_color(prop);
    if rgb.is_none() {
        warn!("{} payload too short ({} bytes), keeping default", prop.key, prop.data.len());
    }
    rgb
}

fn scalar_or_warn(prop: &MaterialProperty) -> Option<f32> {
    let value = decode_scalar(prop);
    if value.is_none() {
        warn!("{} payload too short ({} bytes), keeping default", prop.key, prop.data.len());
    }
    value
}

// ============================================================================
// Extraction
// ============================================================================

/// Raw values pulled from a property list, before variant selection.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParams {
    pub color: [u8; 3],
    pub diffuse: [u8; 3],
    pub specular: [u8; 3],
    pub ambient: [u8; 3],
    pub emissive: [u8; 3],
    pub transparency: f32,
    pub metallic: f32,
    pub roughness: f32,
    pub shininess: f32,
    pub has_pbr: bool,
    pub has_specular: bool,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR,
            diffuse: DEFAULT_COLOR,
            specular: [0, 0, 0],
            ambient: [0, 0, 0],
            emissive: [0, 0, 0],
            transparency: DEFAULT_TRANSPARENCY,
            metallic: DEFAULT_METALLIC,
            roughness: DEFAULT_ROUGHNESS,
            shininess: DEFAULT_SHININESS,
            has_pbr: false,
            has_specular: false,
        }
    }
}

impl MaterialParams {
    /// Single pass over the property list. Unknown keys are ignored and
    /// malformed payloads leave the default in place.
    pub fn extract(material: &Material) -> Self {
        let mut params = Self::default();

        for prop in &material.properties {
            let Some(key) = PropertyKey::from_name(&prop.key) else {
                continue;
            };

            match key {
                PropertyKey::Metallic | PropertyKey::Roughness => params.has_pbr = true,
                PropertyKey::SpecularColor => params.has_specular = true,
                _ => {}
            }

            match key {
                PropertyKey::DiffuseColor => {
                    if let Some(rgb) = color_or_warn(prop) {
                        params.color = rgb;
                        params.diffuse = rgb;
                    }
                }
                PropertyKey::SpecularColor => {
                    params.specular = color_or_warn(prop).unwrap_or(params.specular)
                }
                PropertyKey::AmbientColor => {
                    params.ambient = color_or_warn(prop).unwrap_or(params.ambient)
                }
                PropertyKey::EmissiveColor => {
                    params.emissive = color_or_warn(prop).unwrap_or(params.emissive)
                }
                PropertyKey::Opacity => {
                    params.transparency = scalar_or_warn(prop).unwrap_or(params.transparency)
                }
                PropertyKey::Shininess => {
                    params.shininess = scalar_or_warn(prop).unwrap_or(params.shininess)
                }
                PropertyKey::Metallic => {
                    params.metallic = scalar_or_warn(prop).unwrap_or(params.metallic)
                }
                PropertyKey::Roughness => {
                    params.roughness = scalar_or_warn(prop).unwrap_or(params.roughness)
                }
                PropertyKey::TextureFile => {}
            }
        }

        params
    }
}

/// First texture-file property for `role` that actually resolves.
fn find_texture(
    material: &Material,
    role: TextureRole,
    resolver: &mut TextureResolver,
) -> Option<Texture> {
    material
        .properties
        .iter()
        .filter(|p| role.matches(p.semantic))
        .filter(|p| PropertyKey::from_name(&p.key) == Some(PropertyKey::TextureFile))
        .filter(|p| !p.data.is_empty())
        .find_map(|p| resolver.resolve(&p.as_string(), role))
}

// ============================================================================
// Classification
// ============================================================================

/// Convert one source material. `None` yields a flat gray `Base` material.
pub fn classify_material(
    material: Option<&Material>,
    resolver: &mut TextureResolver,
) -> MeshMaterial {
    let Some(material) = material else {
        return MeshMaterial::Base(BaseMaterial::default());
    };

    let params = MaterialParams::extract(material);
    let textured = TextureMaterial {
        base: BaseMaterial {
            color: params.color,
            transparency: params.transparency,
        },
        texture: find_texture(material, TextureRole::Diffuse, resolver),
        normal: find_texture(material, TextureRole::Normal, resolver),
    };
    let has_texture = textured.texture.is_some() || textured.normal.is_some();

    let converted = if params.has_pbr {
        MeshMaterial::Pbr(PbrMaterial {
            textured,
            emissive: params.emissive,
            metallic: params.metallic,
            roughness: params.roughness,
            reflectance: PBR_REFLECTANCE,
        })
    } else if has_texture {
        MeshMaterial::Textured(textured)
    } else if params.has_specular {
        MeshMaterial::Phong(PhongMaterial {
            lambert: LambertMaterial {
                textured,
                ambient: params.ambient,
                diffuse: params.diffuse,
                emissive: params.emissive,
            },
            specular: params.specular,
            shininess: params.shininess,
            specularity: PHONG_SPECULARITY,
        })
    } else {
        MeshMaterial::Lambert(LambertMaterial {
            textured,
            ambient: params.ambient,
            diffuse: params.diffuse,
            emissive: params.emissive,
        })
    };

    debug!(
        "classified material with {} properties as {:?}",
        material.properties.len(),
        converted.kind()
    );
    converted
}
