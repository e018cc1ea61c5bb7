//! Mesh data types and face canonicalization.
//!
//! Both generators emit a raw list of [`MeshFace`] triangles tagged with
//! a coarse face-group number. [`canonicalize`] turns that raw list into
//! the finished [`GeneratedMesh`]: triangles sorted by group, degenerate
//! triangles dropped, and group numbers renumbered contiguously from 0.
//!
//! - `prim` is the deterministic profile/path extruder for primitives
//! - `sculpt` builds a height-field surface from a decoded image

use cgmath::Vector3;
use thiserror::Error;

pub mod prim;
pub mod sculpt;

/// Geometry generation failures. These are terminal for the object they
/// occur on; the object simply keeps no mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("sculpt image could not be decoded")]
    Decode(#[from] image::ImageError),
    #[error("sculpt image has fewer than 3 color channels")]
    Channels,
    #[error("sculpt image is too small to form a surface")]
    GridTooSmall,
    #[error("path or profile parameters leave no geometry to generate")]
    Geometry,
}

/// One triangle tagged with the face group it belongs to.
///
/// Face groups are coarse material-level groupings (a cube side, the
/// lateral surface of a cylinder), not per-triangle identities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshFace {
    pub v1: Vector3<f32>,
    pub v2: Vector3<f32>,
    pub v3: Vector3<f32>,
    pub face_number: u32,
}

impl MeshFace {
    pub fn new(v1: Vector3<f32>, v2: Vector3<f32>, v3: Vector3<f32>, face_number: u32) -> Self {
        Self {
            v1,
            v2,
            v3,
            face_number,
        }
    }

    /// A triangle with two coordinate-equal vertices has no area.
    pub fn is_degenerate(&self) -> bool {
        self.v1 == self.v2 || self.v1 == self.v3 || self.v2 == self.v3
    }
}

/// Finished, canonical geometry for one object.
///
/// Regeneration replaces a `GeneratedMesh` wholesale; it is never
/// mutated in place, so a concurrent consumer can never observe a
/// half-built mesh.
#[derive(Clone, Debug, Default)]
pub struct GeneratedMesh {
    pub faces: Vec<MeshFace>,
    /// Number of distinct face groups; group numbers are 0..num_faces.
    pub num_faces: u32,
}

/// Sort triangles by declared group, drop degenerates, and renumber the
/// surviving groups contiguously from 0 in first-seen order.
///
/// Idempotent: canonical input passes through unchanged.
pub fn canonicalize(mut raw: Vec<MeshFace>) -> GeneratedMesh {
    raw.sort_by_key(|f| f.face_number);

    let mut faces = Vec::with_capacity(raw.len());
    let mut group: u32 = 0;
    let mut prev_tag = 0;
    let mut started = false;
    for mut face in raw {
        if face.is_degenerate() {
            continue;
        }
        if !started {
            started = true;
            prev_tag = face.face_number;
        } else if face.face_number != prev_tag {
            prev_tag = face.face_number;
            group += 1;
        }
        face.face_number = group;
        faces.push(face);
    }

    GeneratedMesh {
        num_faces: if started { group + 1 } else { 0 },
        faces,
    }
}
