//! Texture resolution: material texture reference → decoded, compressed `Texture`.
//!
//! Resolution is best-effort. Every failure (missing file, unknown codec,
//! broken image data, bad embedded reference) ends as `None` plus a log line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use bytemuck::{Pod, Zeroable};
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{debug, warn};

use super::ConvertOptions;
use crate::math::texture_id;
use crate::mst::{Compression, Texture};
use crate::scene::{EmbeddedTexture, TextureType};

/// Which material slot a texture is being resolved for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextureRole {
    Diffuse,
    Normal,
}

impl TextureRole {
    /// Property semantics that feed this slot.
    pub fn matches(self, semantic: TextureType) -> bool {
        match self {
            Self::Diffuse => matches!(semantic, TextureType::Diffuse | TextureType::BaseColor),
            Self::Normal => matches!(semantic, TextureType::Normal | TextureType::NormalCamera),
        }
    }
}

/// Importer texel layout for uncompressed embedded textures.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Texel {
    b: u8,
    g: u8,
    r: u8,
    a: u8,
}

// ============================================================================
// Path handling
// ============================================================================

/// Strip surrounding whitespace and NUL terminators from a raw path payload.
pub fn clean_texture_path(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\0')
}

fn anchored(base_dir: Option<&Path>, path: &Path) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

/// Find the file a texture reference points at.
///
/// The path is tried as given first; failing that, its file name is looked
/// up in each search directory in order and the first existing candidate wins.
pub fn locate_texture(
    path: &str,
    search_dirs: &[PathBuf],
    base_dir: Option<&Path>,
) -> Option<PathBuf> {
    let direct = anchored(base_dir, Path::new(path));
    if direct.exists() {
        return Some(direct);
    }

    // Windows-authored assets often carry backslash separators.
    let normalized = path.replace('\\', "/");
    let file_name = Path::new(&normalized).file_name()?;

    search_dirs
        .iter()
        .map(|dir| anchored(base_dir, &dir.join(file_name)))
        .find(|candidate| candidate.exists())
}

// ============================================================================
// Decoding
// ============================================================================

fn format_from_extension(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "png" => Some(ImageFormat::Png),
        "gif" => Some(ImageFormat::Gif),
        "bmp" => Some(ImageFormat::Bmp),
        "tif" | "tiff" => Some(ImageFormat::Tiff),
        _ => None,
    }
}

/// Header sniffing first, file extension second.
fn sniff_format(bytes: &[u8], path: &Path) -> Option<ImageFormat> {
    image::guess_format(bytes)
        .ok()
        .or_else(|| format_from_extension(path))
}

fn decode_image_file(path: &Path) -> Result<DynamicImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read texture: {}", path.display()))?;
    let format = sniff_format(&bytes, path)
        .ok_or_else(|| anyhow!("unrecognized image format: {}", path.display()))?;
    image::load_from_memory_with_format(&bytes, format)
        .with_context(|| format!("Failed to decode {:?} texture: {}", format, path.display()))
}

fn decode_embedded(tex: &EmbeddedTexture) -> Result<RgbaImage> {
    if tex.is_compressed() {
        let format = image::guess_format(&tex.data)
            .ok()
            .or_else(|| ImageFormat::from_extension(&tex.format_hint))
            .ok_or_else(|| anyhow!("unrecognized embedded format hint '{}'", tex.format_hint))?;
        return Ok(image::load_from_memory_with_format(&tex.data, format)?.to_rgba8());
    }

    let expected = tex.width as usize * tex.height as usize * 4;
    if tex.data.len() != expected {
        bail!(
            "embedded texture holds {} bytes, expected {} for {}x{}",
            tex.data.len(),
            expected,
            tex.width,
            tex.height
        );
    }
    let texels: &[Texel] = bytemuck::try_cast_slice(&tex.data)
        .map_err(|e| anyhow!("embedded texel buffer: {:?}", e))?;
    let rgba: Vec<u8> = texels.iter().flat_map(|t| [t.r, t.g, t.b, t.a]).collect();
    RgbaImage::from_raw(tex.width, tex.height, rgba)
        .ok_or_else(|| anyhow!("failed to create RGBA image"))
}

fn texture_from_rgba(key: &str, name: &str, img: &RgbaImage, level: i32) -> Result<Texture> {
    let texture = Texture::from_rgba(
        texture_id(key),
        name,
        img.width(),
        img.height(),
        img.as_raw(),
        Compression::Zstd,
        level,
    )?;
    Ok(texture)
}

/// Decode an image file into a texture record.
///
/// The id is derived from `path` as given, so equal paths always yield equal ids.
pub fn load_texture_file(path: &Path, compression_level: i32) -> Result<Texture> {
    let rgba = decode_image_file(path)?.to_rgba8();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    texture_from_rgba(&path.to_string_lossy(), &name, &rgba, compression_level)
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolves texture references for one scene conversion.
///
/// Results are cached per cleaned reference, so materials sharing a texture
/// get identical records and the filesystem is probed once per reference.
pub struct TextureResolver<'a> {
    options: &'a ConvertOptions,
    embedded: &'a [EmbeddedTexture],
    cache: HashMap<String, Option<Texture>>,
}

impl<'a> TextureResolver<'a> {
    pub fn new(options: &'a ConvertOptions, embedded: &'a [EmbeddedTexture]) -> Self {
        Self {
            options,
            embedded,
            cache: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, raw_path: &str, role: TextureRole) -> Option<Texture> {
        if !self.options.load_textures {
            return None;
        }

        let path = clean_texture_path(raw_path);
        if path.is_empty() {
            return None;
        }
        if let Some(hit) = self.cache.get(path) {
            return hit.clone();
        }

        let resolved = match self.load(path) {
            Ok(tex) => {
                debug!("resolved {:?} texture '{}' as '{}'", role, path, tex.name);
                Some(tex)
            }
            Err(e) => {
                warn!("{:?} texture '{}' skipped: {:#}", role, path, e);
                None
            }
        };
        self.cache.insert(path.to_string(), resolved.clone());
        resolved
    }

    fn load(&self, path: &str) -> Result<Texture> {
        if let Some(index) = path.strip_prefix('*') {
            return self.load_embedded(path, index);
        }

        let found = locate_texture(
            path,
            &self.options.texture_search_dirs,
            self.options.base_dir.as_deref(),
        )
        .ok_or_else(|| anyhow!("not found in any search directory"))?;
        load_texture_file(&found, self.options.compression_level)
    }

    fn load_embedded(&self, reference: &str, index: &str) -> Result<Texture> {
        let index: usize = index
            .parse()
            .with_context(|| format!("bad embedded texture reference '{}'", reference))?;
        let tex = self.embedded.get(index).ok_or_else(|| {
            anyhow!(
                "embedded texture {} out of range ({} available)",
                index,
                self.embedded.len()
            )
        })?;

        let rgba = decode_embedded(tex)?;
        let name = if tex.filename.is_empty() {
            reference
        } else {
            tex.filename.as_str()
        };
        texture_from_rgba(reference, name, &rgba, self.options.compression_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_png(path: &Path, w: u32, h: u32) {
        let img = RgbaImage::from_fn(w, h, |x, y| image::Rgba([x as u8, y as u8, 7, 255]));
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    #[test]
    fn cleans_whitespace_and_terminators() {
        assert_eq!(clean_texture_path("  wall.png\0\0"), "wall.png");
        assert_eq!(clean_texture_path("\0 \n"), "");
    }

    #[test]
    fn roles_match_semantics() {
        assert!(TextureRole::Diffuse.matches(TextureType::Diffuse));
        assert!(TextureRole::Diffuse.matches(TextureType::BaseColor));
        assert!(!TextureRole::Diffuse.matches(TextureType::Normal));
        assert!(TextureRole::Normal.matches(TextureType::Normal));
        assert!(!TextureRole::Normal.matches(TextureType::Specular));
    }

    #[test]
    fn locate_falls_back_to_search_dirs_in_order() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("textures")).unwrap();
        std::fs::create_dir_all(tmp.path().join("Textures")).unwrap();
        write_png(&tmp.path().join("Textures/brick.png"), 2, 2);
        write_png(&tmp.path().join("textures/brick.png"), 2, 2);

        let dirs = ConvertOptions::default().texture_search_dirs;
        let found = locate_texture("C:\\art\\brick.png", &dirs, Some(tmp.path())).unwrap();
        assert_eq!(found, tmp.path().join("textures").join("brick.png"));

        assert!(locate_texture("missing.png", &dirs, Some(tmp.path())).is_none());
    }

    #[test]
    fn extension_fallback_when_header_is_unknown() {
        assert_eq!(sniff_format(b"????", Path::new("a.TIF")), Some(ImageFormat::Tiff));
        assert_eq!(sniff_format(b"????", Path::new("a.jpeg")), Some(ImageFormat::Jpeg));
        assert_eq!(sniff_format(b"????", Path::new("a.dds")), None);
    }

    #[test]
    fn loads_file_as_rgba_with_stable_id() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("grid.png");
        write_png(&path, 3, 2);

        let a = load_texture_file(&path, 3).unwrap();
        let b = load_texture_file(&path, 3).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.name, "grid.png");
        assert_eq!(a.size, [3, 2]);

        let pixels = a.pixels().unwrap();
        assert_eq!(pixels.len(), 3 * 2 * 4);
        // pixel (2, 1)
        assert_eq!(&pixels[(1 * 3 + 2) * 4..(1 * 3 + 2) * 4 + 4], &[2, 1, 7, 255]);
    }

    #[test]
    fn undecodable_file_resolves_to_none() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("broken.png"), b"not an image").unwrap();

        let options = ConvertOptions {
            base_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };
        let mut resolver = TextureResolver::new(&options, &[]);
        assert!(resolver.resolve("broken.png", TextureRole::Diffuse).is_none());
    }

    #[test]
    fn uncompressed_embedded_texels_are_swizzled() {
        let embedded = vec![EmbeddedTexture {
            width: 1,
            height: 1,
            data: vec![10, 20, 30, 40], // b g r a
            ..Default::default()
        }];
        let options = ConvertOptions::default();
        let mut resolver = TextureResolver::new(&options, &embedded);

        let tex = resolver.resolve("*0", TextureRole::Diffuse).unwrap();
        assert_eq!(tex.name, "*0");
        assert_eq!(tex.pixels().unwrap(), vec![30, 20, 10, 40]);

        assert!(resolver.resolve("*1", TextureRole::Diffuse).is_none());
        assert!(resolver.resolve("*x", TextureRole::Diffuse).is_none());
    }

    #[test]
    fn disabled_loading_never_resolves() {
        let embedded = vec![EmbeddedTexture {
            width: 1,
            height: 1,
            data: vec![0; 4],
            ..Default::default()
        }];
        let options = ConvertOptions {
            load_textures: false,
            ..Default::default()
        };
        let mut resolver = TextureResolver::new(&options, &embedded);
        assert!(resolver.resolve("*0", TextureRole::Diffuse).is_none());
    }
}
