//! primshape
//!
//! Reconstruction of renderable 3D geometry from serialized
//! virtual-world object descriptors. The crate parses an attributed
//! descriptor tree into a typed shape record, resolves the external
//! binary assets the shape references, and runs the procedural
//! generator matching the shape's classification: profile/path
//! extrusion for primitives, height-field meshing for sculpts. The
//! rendering layer receives a canonical triangle list with contiguous
//! face-group numbers.
//!
//! High-level modules
//! - `tree`: the attributed-tree boundary type descriptors arrive as
//! - `descriptor`: tree to [`descriptor::ShapeDescriptor`] parsing
//! - `texture_entry`: per-face texture table decoding
//! - `fetch`: per-group asynchronous asset resolution
//! - `mesher`: mesh types, canonicalization, and the two generators
//! - `part`: object lifecycle tying parsing, fetching and meshing together
//!

pub mod descriptor;
pub mod fetch;
pub mod mesher;
pub mod part;
pub mod texture_entry;
pub mod tree;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::{Quaternion, Vector2, Vector3};
pub use descriptor::{Classification, Lod, ParseError, SculptKind, ShapeDescriptor};
pub use fetch::{ContentStore, FetchState};
pub use mesher::{GeneratedMesh, MeshError, MeshFace, canonicalize};
pub use part::{SceneObjectGroup, SceneObjectPart};
pub use tree::Node;
pub use uuid::Uuid;
