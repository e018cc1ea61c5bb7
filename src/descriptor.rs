//! Descriptor parsing: attributed tree in, typed shape record out.
//!
//! A [`ShapeDescriptor`] is built in one pass and immutable afterwards.
//! Required subtrees fail the whole parse with a [`ParseError`]; optional
//! numeric fields silently fall back to their documented defaults. The
//! serialized form is right-handed, so the Y axis of rotation and
//! position and the W component of rotation are negated on ingestion.

use base64::Engine as _;
use cgmath::{InnerSpace, Quaternion, Vector3};
use thiserror::Error;
use uuid::Uuid;

use crate::texture_entry::TextureSet;
use crate::tree::Node;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("descriptor has no identifier node")]
    MissingId,
    #[error("identifier is not a valid uuid")]
    BadId(#[from] uuid::Error),
    #[error("descriptor has no shape subtree")]
    MissingShape,
    #[error("shape has no sculpt type or sculpt texture reference")]
    MissingSculptInfo,
    #[error("per-face texture table is missing or undecodable")]
    BadTextureEntry,
    #[error("descriptor has no {0} subtree")]
    MissingSubtree(&'static str),
    #[error("{0} subtree is missing an axis child")]
    MissingAxis(&'static str),
}

/// Level of detail. Greater values mean coarser geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lod {
    #[default]
    High,
    Medium,
    Low,
}

/// Profile cross-section shape, from the serialized shape name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileShape {
    Circle = 0,
    Square = 1,
    IsoTriangle = 2,
    EqualTriangle = 3,
    RightTriangle = 4,
    HalfCircle = 5,
}

/// Hollow cross-section shape, from the serialized shape name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HollowShape {
    /// Inherit the outer profile's shape.
    Same = 0x00,
    Circle = 0x10,
    Square = 0x20,
    Triangle = 0x30,
}

/// Height-field surface topology for sculpted shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SculptKind {
    Sphere,
    Torus,
    Plane,
    Cylinder,
}

impl SculptKind {
    fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Sphere,
            2 => Self::Torus,
            4 => Self::Cylinder,
            _ => Self::Plane,
        }
    }
}

/// How the object's geometry is sourced, decoded once from the packed
/// sculpt-type byte. Raw bits are never re-inspected downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Procedural profile/path extrusion; needs no external asset.
    Prim,
    /// Uploaded mesh asset, decoded outside this crate.
    Mesh { asset_id: Uuid },
    /// Height-field surface derived from a sculpt texture.
    Sculpt {
        kind: SculptKind,
        mirror: bool,
        invert: bool,
        asset_id: Uuid,
    },
}

impl Classification {
    /// Asset to fetch before geometry can be finalized, if any.
    pub fn asset_id(&self) -> Option<Uuid> {
        match self {
            Classification::Prim => None,
            Classification::Mesh { asset_id } => Some(*asset_id),
            Classification::Sculpt { asset_id, .. } => Some(*asset_id),
        }
    }
}

/// Parsed shape and transform record for one scene object.
///
/// Path and profile numerics are stored raw, exactly as serialized; the
/// prim mesher applies the packed-encoding normalization once per
/// generation call.
#[derive(Clone, Debug)]
pub struct ShapeDescriptor {
    pub id: Uuid,
    pub classification: Classification,
    pub profile_shape: ProfileShape,
    pub hollow_shape: HollowShape,
    pub path_curve: i32,
    pub path_begin: f32,
    pub path_end: f32,
    pub path_radius_offset: f32,
    pub path_revolutions: f32,
    pub path_scale_x: f32,
    pub path_scale_y: f32,
    pub path_shear_x: f32,
    pub path_shear_y: f32,
    pub path_skew: f32,
    pub path_taper_x: f32,
    pub path_taper_y: f32,
    pub path_twist: f32,
    pub path_twist_begin: f32,
    pub profile_begin: f32,
    pub profile_end: f32,
    pub profile_hollow: f32,
    pub scale: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub position: Vector3<f32>,
    pub group_position: Vector3<f32>,
    /// Coarsest-permitted detail floor; tiny objects never mesh finer.
    pub max_lod: Lod,
    pub textures: TextureSet,
}

impl ShapeDescriptor {
    /// Parse one object descriptor. Any missing required subtree fails
    /// the whole parse; no partial descriptor is produced.
    pub fn parse(root: &Node) -> Result<Self, ParseError> {
        let id_node = root
            .first_child("UUID")
            .and_then(|n| n.children().first())
            .and_then(|n| n.text())
            .ok_or(ParseError::MissingId)?;
        let id = Uuid::parse_str(id_node)?;

        let shape = root.first_child("Shape").ok_or(ParseError::MissingShape)?;

        let sculpt_type_node = shape
            .first_child("SculptType")
            .ok_or(ParseError::MissingSculptInfo)?;
        let sculpt_texture = shape
            .first_child("SculptTexture")
            .and_then(|n| n.children().first())
            .and_then(|n| n.text())
            .ok_or(ParseError::MissingSculptInfo)?;

        let texture_entry = shape
            .first_child("TextureEntry")
            .and_then(|n| n.text())
            .ok_or(ParseError::BadTextureEntry)?;
        let raw = base64::engine::general_purpose::STANDARD
            .decode(texture_entry)
            .map_err(|_| ParseError::BadTextureEntry)?;
        let textures = TextureSet::parse(&raw).map_err(|_| ParseError::BadTextureEntry)?;

        let path_begin = read_f32(shape, "PathBegin", 0.0);
        let path_end = read_f32(shape, "PathEnd", 0.0);
        let path_radius_offset = read_f32(shape, "PathRadiusOffset", 0.0);
        let path_revolutions = read_f32(shape, "PathRevolutions", 0.0);
        let path_scale_x = read_f32(shape, "PathScaleX", 100.0);
        let path_scale_y = read_f32(shape, "PathScaleY", 100.0);
        let path_shear_x = read_f32(shape, "PathShearX", 0.0);
        let path_shear_y = read_f32(shape, "PathShearY", 0.0);
        let path_skew = read_f32(shape, "PathSkew", 0.0);
        let path_taper_x = read_f32(shape, "PathTaperX", 0.0);
        let path_taper_y = read_f32(shape, "PathTaperY", 0.0);
        let path_twist = read_f32(shape, "PathTwist", 0.0);
        let path_twist_begin = read_f32(shape, "PathTwistBegin", 0.0);
        let profile_begin = read_f32(shape, "ProfileBegin", 0.0);
        let profile_end = read_f32(shape, "ProfileEnd", 0.0);
        let profile_hollow = read_f32(shape, "ProfileHollow", 0.0);
        let path_curve = read_i32(shape, "PathCurve", 16);

        let profile_shape = match read_str(shape, "ProfileShape", "Square") {
            "Circle" => ProfileShape::Circle,
            "Square" => ProfileShape::Square,
            "IsometricTriangle" | "IsoTriangle" => ProfileShape::IsoTriangle,
            "EquilateralTriangle" | "EqualTriangle" => ProfileShape::EqualTriangle,
            "RightTriangle" => ProfileShape::RightTriangle,
            "HalfCircle" => ProfileShape::HalfCircle,
            _ => ProfileShape::Circle,
        };

        let hollow_shape = match read_str(shape, "HollowShape", "Square") {
            "Same" => HollowShape::Same,
            "Circle" => HollowShape::Circle,
            "Square" => HollowShape::Square,
            "Triangle" => HollowShape::Triangle,
            _ => HollowShape::Same,
        };

        let mut scale = read_vector(root, "Scale")?;
        scale.x = clamp_axis(scale.x);
        scale.y = clamp_axis(scale.y);
        scale.z = clamp_axis(scale.z);

        // The detail floor only ever coarsens as the object shrinks.
        let mut max_lod = Lod::High;
        if scale.x.abs() < 1.0 && scale.y.abs() < 1.0 && scale.z.abs() < 1.0 {
            max_lod = Lod::Medium;
        }
        if scale.x.abs() < 0.1 && scale.y.abs() < 0.1 && scale.z.abs() < 0.1 {
            max_lod = Lod::Low;
        }

        let rotation_node = root
            .first_child("RotationOffset")
            .ok_or(ParseError::MissingSubtree("RotationOffset"))?;
        let rotation = Quaternion::new(
            -read_axis(rotation_node, "W", "RotationOffset")?,
            read_axis(rotation_node, "X", "RotationOffset")?,
            -read_axis(rotation_node, "Y", "RotationOffset")?,
            read_axis(rotation_node, "Z", "RotationOffset")?,
        )
        .normalize();

        let mut position = read_vector(root, "OffsetPosition")?;
        position.y = -position.y;

        let mut group_position = read_vector(root, "GroupPosition")?;
        group_position.y = -group_position.y;

        let sculpt_type = sculpt_type_node
            .text()
            .and_then(|t| t.trim().parse::<i64>().ok())
            .unwrap_or(0) as u8;

        let classification = match sculpt_type & 0x3f {
            5 => Classification::Mesh {
                asset_id: Uuid::parse_str(sculpt_texture)?,
            },
            0 => Classification::Prim,
            kind => Classification::Sculpt {
                kind: SculptKind::from_code(kind),
                mirror: sculpt_type & 0x80 != 0,
                invert: sculpt_type & 0x40 != 0,
                asset_id: Uuid::parse_str(sculpt_texture)?,
            },
        };

        Ok(Self {
            id,
            classification,
            profile_shape,
            hollow_shape,
            path_curve,
            path_begin,
            path_end,
            path_radius_offset,
            path_revolutions,
            path_scale_x,
            path_scale_y,
            path_shear_x,
            path_shear_y,
            path_skew,
            path_taper_x,
            path_taper_y,
            path_twist,
            path_twist_begin,
            profile_begin,
            profile_end,
            profile_hollow,
            scale,
            rotation,
            position,
            group_position,
            max_lod,
            textures,
        })
    }
}

/// An axis magnitude below 1mm collapses the mesher's math; clamp it up
/// while keeping the sign.
fn clamp_axis(v: f32) -> f32 {
    if v == 0.0 {
        0.001
    } else if v.abs() < 0.001 {
        0.001 * v.signum()
    } else {
        v
    }
}

fn read_f32(parent: &Node, name: &str, def: f32) -> f32 {
    parent
        .first_child(name)
        .and_then(|n| n.text())
        .map(|t| t.trim().parse().unwrap_or(0.0))
        .unwrap_or(def)
}

fn read_i32(parent: &Node, name: &str, def: i32) -> i32 {
    parent
        .first_child(name)
        .and_then(|n| n.text())
        .map(|t| t.trim().parse().unwrap_or(0))
        .unwrap_or(def)
}

fn read_str<'a>(parent: &'a Node, name: &str, def: &'static str) -> &'a str {
    parent
        .first_child(name)
        .and_then(|n| n.text())
        .unwrap_or(def)
}

fn read_axis(parent: &Node, axis: &str, subtree: &'static str) -> Result<f32, ParseError> {
    let node = parent
        .first_child(axis)
        .ok_or(ParseError::MissingAxis(subtree))?;
    Ok(node
        .text()
        .and_then(|t| t.trim().parse().ok())
        .unwrap_or(0.0))
}

fn read_vector(root: &Node, name: &'static str) -> Result<Vector3<f32>, ParseError> {
    let node = root
        .first_child(name)
        .ok_or(ParseError::MissingSubtree(name))?;
    Ok(Vector3::new(
        read_axis(node, "X", name)?,
        read_axis(node, "Y", name)?,
        read_axis(node, "Z", name)?,
    ))
}
