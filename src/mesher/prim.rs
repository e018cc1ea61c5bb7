//! Profile/path extrusion for primitive shapes.
//!
//! A primitive is a 2D cross-section (the profile) swept along a path:
//! either a straight sweep along Z (box, cylinder, prism) or a revolved
//! sweep around Z (torus, tube, ring). The generator is a pure function
//! of the descriptor and the requested level of detail; identical inputs
//! produce identical triangle lists.
//!
//! The serialized numerics use packed legacy encodings (shear folded
//! into 0..255, cuts in units of 2e-5, scales offset by 100). They are
//! normalized here, once per generation call, leaving the descriptor
//! untouched.

use cgmath::{Vector2, Vector3};

use super::{MeshError, MeshFace};
use crate::descriptor::{HollowShape, Lod, ProfileShape, ShapeDescriptor};

const TAU: f32 = std::f32::consts::TAU;

/// Path-curve codes that select a straight (linear) sweep; every other
/// code revolves the profile around the Z axis.
const CURVE_LINE: i32 = 0x10;
const CURVE_FLEXIBLE: i32 = 0x80;

/// Generate the raw triangle list for a primitive at the given LOD.
///
/// The output is ordered but not canonical: faces carry coarse group
/// numbers with gaps, and tapered geometry may contain degenerate
/// triangles. Run [`super::canonicalize`] on the result.
pub fn generate(desc: &ShapeDescriptor, lod: Lod) -> Result<Vec<MeshFace>, MeshError> {
    let params = Params::from_descriptor(desc, lod)?;
    let profile = build_profile(&params)?;
    let nodes = if params.linear {
        linear_nodes(&params)?
    } else {
        circular_nodes(&params)?
    };

    let rings: Vec<Ring> = nodes.iter().map(|n| make_ring(&profile, n)).collect();

    let mut faces = Vec::new();
    stitch_sides(&rings, &profile, &params, &mut faces);
    if !params.closed_path {
        if let (Some(first), Some(last)) = (rings.first(), rings.last()) {
            cap(last, &profile, params.face_top, false, &mut faces);
            cap(first, &profile, params.face_bottom, true, &mut faces);
        }
    }

    if faces.is_empty() {
        return Err(MeshError::Geometry);
    }
    Ok(faces)
}

/// Fully normalized generation parameters.
struct Params {
    linear: bool,
    sides: usize,
    hollow_sides: usize,
    profile_begin: f32,
    profile_end: f32,
    hollow: f32,
    cut_begin: f32,
    cut_end: f32,
    shear_x: f32,
    shear_y: f32,
    twist_begin: f32,
    twist_end: f32,
    taper_x: f32,
    taper_y: f32,
    hole_x: f32,
    hole_y: f32,
    radius_offset: f32,
    revolutions: f32,
    skew: f32,
    steps_per_rev: usize,
    closed_path: bool,
    // face-group layout
    outer_groups: usize,
    face_top: u32,
    face_bottom: u32,
    face_cut0: u32,
    face_cut1: u32,
    face_hollow: u32,
}

impl Params {
    fn from_descriptor(desc: &ShapeDescriptor, lod: Lod) -> Result<Self, MeshError> {
        // Shear is folded into 0..255 with the upper half negative.
        let shear_x = unpack_shear(desc.path_shear_x);
        let shear_y = unpack_shear(desc.path_shear_y);

        let cut_begin = desc.path_begin * 2.0e-5;
        let cut_end = 1.0 - desc.path_end * 2.0e-5;
        let scale_x = (desc.path_scale_x - 100.0) * 0.01;
        let scale_y = (desc.path_scale_y - 100.0) * 0.01;

        let mut profile_begin = desc.profile_begin * 2.0e-5;
        let mut profile_end = 1.0 - desc.profile_end * 2.0e-5;
        let hollow = (desc.profile_hollow * 2.0e-5).min(0.95);

        let sides = match (desc.profile_shape as u8) & 0x07 {
            0 => match lod {
                Lod::High => 24,
                Lod::Medium => 12,
                Lod::Low => 6,
            },
            3 => 3,
            5 => {
                // Half circle: the prim is a sphere. Medium LOD keeps
                // the full side count.
                profile_begin = 0.5 * profile_begin + 0.5;
                profile_end = 0.5 * profile_end + 0.5;
                match lod {
                    Lod::Low => 6,
                    _ => 24,
                }
            }
            _ => 4,
        };

        let hollow_sides = match desc.hollow_shape {
            HollowShape::Same => sides,
            HollowShape::Circle => match lod {
                Lod::High => 24,
                Lod::Medium => 12,
                Lod::Low => 6,
            },
            HollowShape::Triangle => 3,
            HollowShape::Square => 4,
        };

        let steps_per_rev = match lod {
            Lod::High => 24,
            Lod::Medium => 12,
            Lod::Low => 6,
        };

        // Inverted or out-of-range cuts are clamped back into [0, 1]
        // and generation proceeds; it never fails on them.
        if profile_begin < 0.0 {
            profile_begin = 0.0;
        }
        if profile_end > 1.0 {
            profile_end = 1.0;
        }

        let linear = desc.path_curve == CURVE_LINE || desc.path_curve == CURVE_FLEXIBLE;

        let (twist_factor, hole_x, hole_y, radius_offset, revolutions, skew, taper_x, taper_y) =
            if linear {
                (1.8, 1.0, 1.0, 0.0, 1.0, 0.0, scale_x, scale_y)
            } else {
                (
                    3.6,
                    (200.0 - scale_x) * 0.01,
                    (200.0 - scale_y) * 0.01,
                    0.01 * desc.path_radius_offset,
                    1.0 + 0.015 * desc.path_revolutions,
                    0.01 * desc.path_skew,
                    desc.path_taper_x * 0.01,
                    desc.path_taper_y * 0.01,
                )
            };

        let twist_begin = (desc.path_twist_begin * twist_factor).to_radians();
        let twist_end = (desc.path_twist * twist_factor).to_radians();

        let closed_path = !linear
            && cut_begin <= 0.0
            && cut_end >= 1.0
            && (revolutions - revolutions.round()).abs() < 1.0e-6;

        let outer_groups = if sides > 4 { 1 } else { sides };
        let face_top = 0;
        let face_bottom = 1 + outer_groups as u32;
        let face_cut0 = face_bottom + 1;
        let face_cut1 = face_cut0 + 1;
        let face_hollow = face_cut1 + 1;

        if !(cut_end - cut_begin).is_finite() || !(profile_end - profile_begin).is_finite() {
            return Err(MeshError::Geometry);
        }

        Ok(Self {
            linear,
            sides,
            hollow_sides,
            profile_begin,
            profile_end,
            hollow,
            cut_begin,
            cut_end,
            shear_x,
            shear_y,
            twist_begin,
            twist_end,
            taper_x,
            taper_y,
            hole_x,
            hole_y,
            radius_offset,
            revolutions,
            skew,
            steps_per_rev,
            closed_path,
            outer_groups,
            face_top,
            face_bottom,
            face_cut0,
            face_cut1,
            face_hollow,
        })
    }
}

fn unpack_shear(v: f32) -> f32 {
    if v < 128.0 { v * 0.01 } else { (v - 256.0) * 0.01 }
}

/// The 2D cross-section: an outer ring, an optional hollow ring, and
/// the face-group number of every outer edge.
struct Profile {
    outer: Vec<Vector2<f32>>,
    outer_faces: Vec<u32>,
    hollow: Vec<Vector2<f32>>,
    center: Vector2<f32>,
    closed: bool,
}

impl Profile {
    fn outer_edges(&self) -> usize {
        if self.closed {
            self.outer.len()
        } else {
            self.outer.len() - 1
        }
    }

    fn hollow_edges(&self) -> usize {
        if self.hollow.is_empty() {
            0
        } else if self.closed {
            self.hollow.len()
        } else {
            self.hollow.len() - 1
        }
    }
}

fn ring_points(sides: usize, begin: f32, end: f32, radius: f32, closed: bool) -> Vec<Vector2<f32>> {
    let arc = end - begin;
    let edges = ((sides as f32) * arc).round().max(1.0) as usize;
    let count = if closed { edges } else { edges + 1 };
    (0..count)
        .map(|i| {
            let angle = TAU * (begin + arc * i as f32 / edges as f32);
            Vector2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn build_profile(p: &Params) -> Result<Profile, MeshError> {
    let arc = p.profile_end - p.profile_begin;
    if !(arc > 0.0) {
        // A cut that begins at or past its end leaves no arc to sweep.
        // Terminal for this object; the caller keeps any prior mesh.
        return Err(MeshError::Geometry);
    }
    let closed = p.profile_begin <= 0.0 && p.profile_end >= 1.0;

    let outer = ring_points(p.sides, p.profile_begin, p.profile_end, 0.5, closed);
    let edges = if closed { outer.len() } else { outer.len() - 1 };

    // Angular profiles give every flat side its own face group; round
    // profiles share one lateral group.
    let outer_faces = (0..edges)
        .map(|e| {
            if p.outer_groups == 1 {
                1
            } else {
                1 + ((e * p.sides / edges).min(p.outer_groups - 1)) as u32
            }
        })
        .collect();

    let hollow = if p.hollow > 0.0 {
        ring_points(
            p.hollow_sides,
            p.profile_begin,
            p.profile_end,
            0.5 * p.hollow,
            closed,
        )
    } else {
        Vec::new()
    };

    let center =
        outer.iter().fold(Vector2::new(0.0, 0.0), |acc, v| acc + *v) / outer.len() as f32;

    Ok(Profile {
        outer,
        outer_faces,
        hollow,
        center,
        closed,
    })
}

/// One station along the sweep: how the profile plane is scaled,
/// twisted, offset, and finally embedded in 3D space.
struct PathNode {
    scale: Vector2<f32>,
    twist: f32,
    offset: Vector2<f32>,
    embed: Embed,
}

enum Embed {
    Line { z: f32 },
    Revolve { angle: f32, radius: f32, z: f32 },
}

impl PathNode {
    fn place(&self, p: Vector2<f32>) -> Vector3<f32> {
        let scaled = Vector2::new(p.x * self.scale.x, p.y * self.scale.y);
        let (sin_t, cos_t) = self.twist.sin_cos();
        let q = Vector2::new(
            scaled.x * cos_t - scaled.y * sin_t + self.offset.x,
            scaled.x * sin_t + scaled.y * cos_t + self.offset.y,
        );
        match self.embed {
            Embed::Line { z } => Vector3::new(q.x, q.y, z),
            Embed::Revolve { angle, radius, z } => {
                let (sin_a, cos_a) = angle.sin_cos();
                Vector3::new((radius + q.x) * cos_a, (radius + q.x) * sin_a, q.y + z)
            }
        }
    }
}

/// Taper narrows one end of the sweep; which end depends on the sign.
fn taper_scale(taper: f32, t: f32) -> f32 {
    if taper > 0.0 {
        1.0 - t * taper
    } else {
        1.0 + (1.0 - t) * taper
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn linear_nodes(p: &Params) -> Result<Vec<PathNode>, MeshError> {
    let span = p.cut_end - p.cut_begin;
    if !(span > 0.0) {
        return Err(MeshError::Geometry);
    }

    let twist_total = (p.twist_end - p.twist_begin).abs();
    let steps = 1 + (twist_total / (TAU / p.steps_per_rev as f32)) as usize;

    Ok((0..=steps)
        .map(|i| {
            let t = p.cut_begin + span * i as f32 / steps as f32;
            PathNode {
                scale: Vector2::new(taper_scale(p.taper_x, t), taper_scale(p.taper_y, t)),
                twist: lerp(p.twist_begin, p.twist_end, t),
                offset: Vector2::new(p.shear_x * t, p.shear_y * t),
                embed: Embed::Line { z: t - 0.5 },
            }
        })
        .collect())
}

fn circular_nodes(p: &Params) -> Result<Vec<PathNode>, MeshError> {
    let span = p.cut_end - p.cut_begin;
    if !(span > 0.0) || !(p.revolutions > 0.0) {
        return Err(MeshError::Geometry);
    }

    let steps = (p.steps_per_rev as f32 * p.revolutions * span).ceil().max(1.0) as usize;
    let radius = 0.5 + p.radius_offset;

    Ok((0..=steps)
        .map(|i| {
            let t = p.cut_begin + span * i as f32 / steps as f32;
            PathNode {
                scale: Vector2::new(
                    0.5 * p.hole_x * taper_scale(p.taper_x, t),
                    0.5 * p.hole_y * taper_scale(p.taper_y, t),
                ),
                twist: lerp(p.twist_begin, p.twist_end, t),
                offset: Vector2::new(p.shear_x * t, p.shear_y * t),
                embed: Embed::Revolve {
                    angle: TAU * p.revolutions * t,
                    radius,
                    z: p.skew * (t - 0.5),
                },
            }
        })
        .collect())
}

/// The profile placed at one path station.
struct Ring {
    outer: Vec<Vector3<f32>>,
    hollow: Vec<Vector3<f32>>,
    center: Vector3<f32>,
}

fn make_ring(profile: &Profile, node: &PathNode) -> Ring {
    Ring {
        outer: profile.outer.iter().map(|p| node.place(*p)).collect(),
        hollow: profile.hollow.iter().map(|p| node.place(*p)).collect(),
        center: node.place(profile.center),
    }
}

fn stitch_sides(rings: &[Ring], profile: &Profile, p: &Params, out: &mut Vec<MeshFace>) {
    let outer_edges = profile.outer_edges();
    let hollow_edges = profile.hollow_edges();
    let n_outer = profile.outer.len();
    let n_hollow = profile.hollow.len();

    for s in 0..rings.len().saturating_sub(1) {
        let (r0, r1) = (&rings[s], &rings[s + 1]);

        for e in 0..outer_edges {
            let e1 = (e + 1) % n_outer;
            let face = profile.outer_faces[e];
            out.push(MeshFace::new(r0.outer[e], r1.outer[e], r1.outer[e1], face));
            out.push(MeshFace::new(r0.outer[e], r1.outer[e1], r0.outer[e1], face));
        }

        // Hollow surface faces inward: reversed winding.
        for e in 0..hollow_edges {
            let e1 = (e + 1) % n_hollow;
            out.push(MeshFace::new(
                r0.hollow[e],
                r1.hollow[e1],
                r1.hollow[e],
                p.face_hollow,
            ));
            out.push(MeshFace::new(
                r0.hollow[e],
                r0.hollow[e1],
                r1.hollow[e1],
                p.face_hollow,
            ));
        }

        // An open profile arc exposes two flat cut walls along the path.
        if !profile.closed {
            let inner0 = |r: &Ring| r.hollow.first().copied().unwrap_or(r.center);
            let inner1 = |r: &Ring| r.hollow.last().copied().unwrap_or(r.center);

            out.push(MeshFace::new(
                r0.outer[0],
                r1.outer[0],
                inner0(r1),
                p.face_cut0,
            ));
            out.push(MeshFace::new(r0.outer[0], inner0(r1), inner0(r0), p.face_cut0));

            let last = n_outer - 1;
            out.push(MeshFace::new(
                r0.outer[last],
                inner1(r1),
                r1.outer[last],
                p.face_cut1,
            ));
            out.push(MeshFace::new(
                r0.outer[last],
                inner1(r0),
                inner1(r1),
                p.face_cut1,
            ));
        }
    }
}

fn cap(ring: &Ring, profile: &Profile, face: u32, flip: bool, out: &mut Vec<MeshFace>) {
    if profile.hollow.is_empty() {
        let n = ring.outer.len();
        for e in 0..profile.outer_edges() {
            let e1 = (e + 1) % n;
            push_tri(out, ring.center, ring.outer[e], ring.outer[e1], face, flip);
        }
    } else {
        // Annular cap between the outer and hollow rings. For closed
        // profiles, close the chains by repeating the first point.
        let mut a = ring.outer.clone();
        let mut b = ring.hollow.clone();
        if profile.closed {
            a.push(a[0]);
            b.push(b[0]);
        }
        bridge(&a, &b, face, flip, out);
    }
}

/// Triangulate between two chains of differing point counts by always
/// advancing the chain that has made the least fractional progress.
fn bridge(a: &[Vector3<f32>], b: &[Vector3<f32>], face: u32, flip: bool, out: &mut Vec<MeshFace>) {
    let (m, n) = (a.len(), b.len());
    if m < 2 || n < 2 {
        return;
    }
    let (mut i, mut j) = (0usize, 0usize);
    while i < m - 1 || j < n - 1 {
        let advance_a = if j >= n - 1 {
            true
        } else if i >= m - 1 {
            false
        } else {
            (i + 1) * (n - 1) <= (j + 1) * (m - 1)
        };
        if advance_a {
            push_tri(out, a[i], a[i + 1], b[j], face, flip);
            i += 1;
        } else {
            push_tri(out, a[i], b[j + 1], b[j], face, flip);
            j += 1;
        }
    }
}

fn push_tri(
    out: &mut Vec<MeshFace>,
    v1: Vector3<f32>,
    v2: Vector3<f32>,
    v3: Vector3<f32>,
    face: u32,
    flip: bool,
) {
    if flip {
        out.push(MeshFace::new(v1, v3, v2, face));
    } else {
        out.push(MeshFace::new(v1, v2, v3, face));
    }
}
