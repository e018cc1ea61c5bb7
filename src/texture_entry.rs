//! Per-face texture table decoding.
//!
//! The descriptor carries one base64-encoded field holding the packed
//! texture table: a default entry followed by override groups, each a
//! face bitmask plus the texture id those faces use. Only the texture
//! ids are extracted here; material parameters beyond the id are left to
//! the rendering layer.

use thiserror::Error;
use uuid::Uuid;

/// Highest face index an override bitmask can address.
const MAX_FACES: usize = 32;

#[derive(Debug, Error)]
pub enum TextureEntryError {
    #[error("texture table truncated")]
    Truncated,
}

/// Decoded texture table: one default entry plus per-face overrides.
#[derive(Clone, Debug)]
pub struct TextureSet {
    default_texture: Uuid,
    overrides: Vec<Option<Uuid>>,
}

impl TextureSet {
    /// Parse the packed binary table (after base64 decoding).
    ///
    /// Layout: 16 bytes default texture id, then zero or more groups of
    /// a continuation-bit face mask followed by a 16 byte texture id.
    /// A zero mask terminates the list early.
    pub fn parse(bytes: &[u8]) -> Result<Self, TextureEntryError> {
        let default_texture = read_uuid(bytes, 0)?;
        let mut overrides = vec![None; MAX_FACES];

        let mut pos = 16;
        while pos < bytes.len() {
            let (mask, next) = read_face_mask(bytes, pos)?;
            if mask == 0 {
                break;
            }
            let id = read_uuid(bytes, next)?;
            pos = next + 16;
            for face in 0..MAX_FACES {
                if mask & (1u64 << face) != 0 {
                    overrides[face] = Some(id);
                }
            }
        }

        Ok(Self {
            default_texture,
            overrides,
        })
    }

    /// Texture id for one face, falling back to the default entry.
    pub fn face_texture(&self, face: usize) -> Uuid {
        self.overrides
            .get(face)
            .copied()
            .flatten()
            .unwrap_or(self.default_texture)
    }

    pub fn default_texture(&self) -> Uuid {
        self.default_texture
    }
}

fn read_uuid(bytes: &[u8], pos: usize) -> Result<Uuid, TextureEntryError> {
    let slice = bytes
        .get(pos..pos + 16)
        .ok_or(TextureEntryError::Truncated)?;
    let mut raw = [0u8; 16];
    raw.copy_from_slice(slice);
    Ok(Uuid::from_bytes(raw))
}

/// Face masks are big-endian 7-bit groups; the high bit of each byte
/// flags a continuation.
fn read_face_mask(bytes: &[u8], mut pos: usize) -> Result<(u64, usize), TextureEntryError> {
    let mut mask: u64 = 0;
    loop {
        let b = *bytes.get(pos).ok_or(TextureEntryError::Truncated)?;
        pos += 1;
        mask = (mask << 7) | (b & 0x7f) as u64;
        if b & 0x80 == 0 {
            return Ok((mask, pos));
        }
    }
}
