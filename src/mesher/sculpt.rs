//! Height-field meshing for sculpted shapes.
//!
//! A sculpt texture encodes vertex positions in its pixels: red, green
//! and blue map to X, Y and Z, each normalized from 0..255 into
//! [-0.5, 0.5). The pixel grid becomes a vertex grid, stitched into a
//! surface according to the sculpt's topology (a plane, or wrapped into
//! a cylinder, sphere or torus). The whole surface is one face group.

use cgmath::Vector3;

use super::{MeshError, MeshFace};
use crate::descriptor::SculptKind;

const PIX_SCALE: f32 = 1.0 / 256.0;

/// Build the raw triangle list for a sculpted surface from the asset's
/// compressed image bytes.
pub fn generate(
    data: &[u8],
    kind: SculptKind,
    mirror: bool,
    invert: bool,
) -> Result<Vec<MeshFace>, MeshError> {
    let img = image::load_from_memory(data)?;
    if img.color().channel_count() < 3 {
        return Err(MeshError::Channels);
    }

    let rgb = img.to_rgb8();
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);
    if w < 2 || h < 2 {
        return Err(MeshError::GridTooSmall);
    }

    // Row order is flipped so the image's top row becomes the grid's
    // last row, matching the ingestion handedness conversion.
    let mut rows = vec![Vec::with_capacity(w); h];
    for (i, row) in rgb.rows().enumerate() {
        let out = &mut rows[h - 1 - i];
        for px in row {
            let mut c = Vector3::new(
                px.0[0] as f32 * PIX_SCALE - 0.5,
                px.0[1] as f32 * PIX_SCALE - 0.5,
                px.0[2] as f32 * PIX_SCALE - 0.5,
            );
            if mirror {
                c.x = -c.x;
            }
            out.push(c);
        }
    }

    let wrap_cols = matches!(
        kind,
        SculptKind::Sphere | SculptKind::Cylinder | SculptKind::Torus
    );
    let wrap_rows = matches!(kind, SculptKind::Torus);

    let row_pairs = if wrap_rows { h } else { h - 1 };
    let col_pairs = if wrap_cols { w } else { w - 1 };

    let mut faces = Vec::with_capacity(row_pairs * col_pairs * 2);
    for r in 0..row_pairs {
        let r1 = (r + 1) % h;
        for c in 0..col_pairs {
            let c1 = (c + 1) % w;
            let (p00, p01) = (rows[r][c], rows[r][c1]);
            let (p10, p11) = (rows[r1][c], rows[r1][c1]);
            if invert {
                faces.push(MeshFace::new(p00, p11, p10, 0));
                faces.push(MeshFace::new(p00, p01, p11, 0));
            } else {
                faces.push(MeshFace::new(p00, p10, p11, 0));
                faces.push(MeshFace::new(p00, p11, p01, 0));
            }
        }
    }

    Ok(faces)
}
