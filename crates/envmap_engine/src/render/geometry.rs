//! Procedural geometry

use std::f32::consts::TAU;

use super::mesh::{Mesh, Vertex};
use crate::foundation::math::Vec3;

/// Torus knot parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusKnotParams {
    /// Radius of the knot
    pub radius: f32,
    /// Radius of the tube
    pub tube: f32,
    /// Segments along the knot curve
    pub tubular_segments: u32,
    /// Segments around the tube
    pub radial_segments: u32,
    /// Winds around the axis of rotational symmetry
    pub p: u32,
    /// Winds around the interior circle
    pub q: u32,
}

impl Default for TorusKnotParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            tube: 0.4,
            tubular_segments: 64,
            radial_segments: 8,
            p: 2,
            q: 3,
        }
    }
}

/// Build a (p, q) torus knot tube.
///
/// Produces `(tubular + 1) * (radial + 1)` vertices, with the seam duplicated
/// so UVs wrap cleanly, and `6 * tubular * radial` indices.
pub fn torus_knot(params: &TorusKnotParams) -> Mesh {
    let tubular = params.tubular_segments.max(3);
    let radial = params.radial_segments.max(3);
    let p = params.p.max(1) as f32;
    let q = params.q.max(1) as f32;

    let mut vertices = Vec::with_capacity(((tubular + 1) * (radial + 1)) as usize);
    let mut indices = Vec::with_capacity((tubular * radial * 6) as usize);

    for i in 0..=tubular {
        let u = i as f32 / tubular as f32 * p * TAU;

        // Current point on the curve and one slightly ahead of it
        let p1 = curve_point(u, p, q, params.radius);
        let p2 = curve_point(u + 0.01, p, q, params.radius);

        let tangent = p2 - p1;
        let mut normal = p2 + p1;
        let binormal = tangent.cross(&normal).normalize();
        normal = binormal.cross(&tangent).normalize();

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            let cx = -params.tube * v.cos();
            let cy = params.tube * v.sin();

            let position = p1 + normal * cx + binormal * cy;
            let surface_normal = (position - p1).normalize();

            vertices.push(Vertex::new(
                position.into(),
                surface_normal.into(),
                [i as f32 / tubular as f32, j as f32 / radial as f32],
            ));
        }
    }

    for j in 1..=tubular {
        for i in 1..=radial {
            let a = (radial + 1) * (j - 1) + (i - 1);
            let b = (radial + 1) * j + (i - 1);
            let c = (radial + 1) * j + i;
            let d = (radial + 1) * (j - 1) + i;

            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    Mesh::new(vertices, indices)
}

fn curve_point(u: f32, p: f32, q: f32, radius: f32) -> Vec3 {
    let cu = u.cos();
    let su = u.sin();
    let qu_over_p = q / p * u;
    let cs = qu_over_p.cos();

    Vec3::new(
        radius * (2.0 + cs) * 0.5 * cu,
        radius * (2.0 + cs) * su * 0.5,
        radius * qu_over_p.sin() * 0.5,
    )
}
