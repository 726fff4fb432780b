//! Stateless numeric helpers shared by the converters and the codec.

use cgmath::{Matrix4, SquareMatrix};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

// ============================================================================
// Little-endian payload decoding
// ============================================================================

/// Reinterpret the first 4 bytes of `buf` as a little-endian IEEE-754 float.
/// Returns `None` when the payload is shorter than 4 bytes.
pub fn read_f32_le(buf: &[u8]) -> Option<f32> {
    let bytes: [u8; 4] = buf.get(..4)?.try_into().ok()?;
    Some(f32::from_le_bytes(bytes))
}

pub fn read_f64_le(buf: &[u8]) -> Option<f64> {
    let bytes: [u8; 8] = buf.get(..8)?.try_into().ok()?;
    Some(f64::from_le_bytes(bytes))
}

pub fn read_i32_le(buf: &[u8]) -> Option<i32> {
    let bytes: [u8; 4] = buf.get(..4)?.try_into().ok()?;
    Some(i32::from_le_bytes(bytes))
}

// ============================================================================
// Color helpers
// ============================================================================

/// Scale a 0..1 channel to a byte, clamping anything outside [0, 255].
/// NaN maps to 0.
pub fn unit_to_byte(v: f32) -> u8 {
    (v * 255.0).clamp(0.0, 255.0) as u8
}

pub fn unit_rgb_to_bytes(c: [f32; 3]) -> [u8; 3] {
    [unit_to_byte(c[0]), unit_to_byte(c[1]), unit_to_byte(c[2])]
}

// ============================================================================
// Matrices
// ============================================================================

/// Widen a single-precision transform to the double-precision matrices
/// stored on MST instances. Column order is preserved.
pub fn to_f64_matrix(m: &Matrix4<f32>) -> Matrix4<f64> {
    let cols: [[f32; 4]; 4] = (*m).into();
    Matrix4::from(cols.map(|c| c.map(f64::from)))
}

/// Resolve an optional node transform; a missing matrix is the identity.
pub fn transform_or_identity(m: Option<&Matrix4<f32>>) -> Matrix4<f32> {
    m.copied().unwrap_or_else(Matrix4::identity)
}

/// Flatten a matrix column by column into 16 floats.
pub fn mat4_to_flat(m: &Matrix4<f64>) -> [f64; 16] {
    let cols: [[f64; 4]; 4] = (*m).into();
    let mut out = [0.0; 16];
    for (i, col) in cols.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(col);
    }
    out
}

pub fn flat_to_mat4(flat: &[f64; 16]) -> Matrix4<f64> {
    let mut cols = [[0.0f64; 4]; 4];
    for (i, col) in cols.iter_mut().enumerate() {
        col.copy_from_slice(&flat[i * 4..i * 4 + 4]);
    }
    Matrix4::from(cols)
}

// ============================================================================
// Hashing
// ============================================================================

/// 32-bit FNV-1a.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Stable texture identifier derived from the resolved path string.
pub fn texture_id(path: &str) -> i32 {
    fnv1a_32(path.as_bytes()) as i32
}
