use crate::geom::{BBox3, ProfilePoint, Vec3};
use crate::spec::BuildSpec;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("invalid feature `{feature}`: {reason}")]
    InvalidFeature {
        feature: &'static str,
        reason: String,
    },
}

const MAX_FEET_PER_AXIS: u32 = 64;
/// Slack for the fit check, in meters.
const FIT_EPS: f64 = 1e-9;

fn invalid(feature: &'static str, reason: impl Into<String>) -> MeshError {
    MeshError::InvalidFeature {
        feature,
        reason: reason.into(),
    }
}

/// Flat-shaded triangle mesh; every face owns its vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct TriMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl TriMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bbox(&self) -> BBox3 {
        let mut bbox = BBox3::empty();
        for p in &self.positions {
            bbox.include_point(Vec3::new(p[0] as f64, p[1] as f64, p[2] as f64));
        }
        bbox
    }

    /// Adds a convex planar face, wound counter-clockwise as seen from `outward`.
    fn push_face(&mut self, points: &[Vec3], outward: Vec3) {
        if points.len() < 3 {
            return;
        }
        let mut normal = newell_normal(points);
        let mut ordered: Vec<Vec3> = points.to_vec();
        if dot(normal, outward) < 0.0 {
            ordered.reverse();
            normal = normal.scale(-1.0);
        }

        let base = self.positions.len() as u32;
        let n = normal.to_f32();
        for p in &ordered {
            self.positions.push(p.to_f32());
            self.normals.push(n);
        }
        for i in 1..(ordered.len() as u32 - 1) {
            self.indices.extend_from_slice(&[base, base + i, base + i + 1]);
        }
    }
}

/// Everything the GLB writer needs: the parts plus a record of the features.
#[derive(Debug, Clone)]
pub struct Model {
    pub parts: Vec<TriMesh>,
    pub annotations: Value,
}

impl Model {
    pub fn bbox(&self) -> BBox3 {
        self.parts
            .iter()
            .fold(BBox3::empty(), |acc, part| acc.union(&part.bbox()))
    }
}

/// Axis-aligned box centered on `center`.
pub fn box_mesh(name: impl Into<String>, center: Vec3, size: Vec3) -> TriMesh {
    let (hx, hy) = (size.x * 0.5, size.y * 0.5);
    let profile = [
        ProfilePoint::new(-hy, -size.z * 0.5),
        ProfilePoint::new(hy, -size.z * 0.5),
        ProfilePoint::new(hy, size.z * 0.5),
        ProfilePoint::new(-hy, size.z * 0.5),
    ];
    let mut mesh = TriMesh::new(name);
    extrude_profile(&mut mesh, &profile, center, hx);
    mesh
}

/// Extrudes a convex Y/Z profile along X, `half_width` to either side of `center`.
fn extrude_profile(mesh: &mut TriMesh, profile: &[ProfilePoint], center: Vec3, half_width: f64) {
    let at = |x: f64, p: &ProfilePoint| center.add(&Vec3::new(x, p.y, p.z));

    let left: Vec<Vec3> = profile.iter().map(|p| at(-half_width, p)).collect();
    let right: Vec<Vec3> = profile.iter().map(|p| at(half_width, p)).collect();
    mesh.push_face(&left, Vec3::new(-1.0, 0.0, 0.0));
    mesh.push_face(&right, Vec3::new(1.0, 0.0, 0.0));

    let n = profile.len() as f64;
    let cy = profile.iter().map(|p| p.y).sum::<f64>() / n;
    let cz = profile.iter().map(|p| p.z).sum::<f64>() / n;

    for i in 0..profile.len() {
        let a = &profile[i];
        let b = &profile[(i + 1) % profile.len()];
        let outward = Vec3::new(0.0, (a.y + b.y) * 0.5 - cy, (a.z + b.z) * 0.5 - cz);
        mesh.push_face(
            &[
                at(-half_width, a),
                at(half_width, a),
                at(half_width, b),
                at(-half_width, b),
            ],
            outward,
        );
    }
}

/// Builds the body and any additive parts for `spec`.
///
/// The overall extents always equal the requested dims: feet take their
/// height from the bottom of the body. Cutouts and fillets are only
/// recorded in the annotations.
pub fn build_model(spec: &BuildSpec) -> Result<Model, MeshError> {
    let scale = spec.scale();
    let size = spec.size_m();
    let features = &spec.features;
    let mut notes = Vec::new();
    let mut parts = Vec::new();

    let (hx, hy, hz) = (size.x * 0.5, size.y * 0.5, size.z * 0.5);
    let mut body_bottom = -hz;

    if let Some(feet) = &features.feet {
        if feet.count_x == 0 || feet.count_y == 0 {
            return Err(invalid("feet", "counts must be at least 1"));
        }
        if feet.count_x > MAX_FEET_PER_AXIS || feet.count_y > MAX_FEET_PER_AXIS {
            return Err(invalid(
                "feet",
                format!("at most {MAX_FEET_PER_AXIS} feet per axis"),
            ));
        }
        if !feet.pad.iter().all(|p| p.is_finite() && *p >= 0.0) {
            return Err(invalid("feet", "pad must be finite and >= 0"));
        }
        let foot = Vec3::new(feet.size[0], feet.size[1], feet.size[2]).scale(scale);
        if !(foot.x > 0.0 && foot.y > 0.0 && foot.z > 0.0) {
            return Err(invalid("feet", "size must be positive"));
        }
        if foot.z >= size.z {
            return Err(invalid("feet", "feet are as tall as the whole model"));
        }
        let pad_x = feet.pad[0] * scale;
        let pad_y = feet.pad[1] * scale;
        if feet.count_x as f64 * foot.x + 2.0 * pad_x > size.x + FIT_EPS {
            return Err(invalid("feet", "feet do not fit across the width"));
        }
        if feet.count_y as f64 * foot.y + 2.0 * pad_y > size.y + FIT_EPS {
            return Err(invalid("feet", "feet do not fit across the depth"));
        }
        let xs = spread(feet.count_x, -hx + pad_x + foot.x * 0.5, hx - pad_x - foot.x * 0.5)
            .ok_or_else(|| invalid("feet", "feet do not fit across the width"))?;
        let ys = spread(feet.count_y, -hy + pad_y + foot.y * 0.5, hy - pad_y - foot.y * 0.5)
            .ok_or_else(|| invalid("feet", "feet do not fit across the depth"))?;

        body_bottom += foot.z;
        let z = -hz + foot.z * 0.5;
        for (i, x) in xs.iter().enumerate() {
            for (j, y) in ys.iter().enumerate() {
                parts.push(box_mesh(format!("foot_{i}_{j}"), Vec3::new(*x, *y, z), foot));
            }
        }
        notes.push(json!({
            "kind": "feet",
            "count": [feet.count_x, feet.count_y],
            "size": feet.size,
            "pad": feet.pad,
            "realised": "geometry",
        }));
        if feet.fillet > 0.0 {
            notes.push(json!({
                "kind": "feetFillet",
                "radius": feet.fillet,
                "realised": "annotation",
            }));
        }
    }

    let body_height = hz - body_bottom;
    let mut front_top = hz;

    if let Some(slope) = &features.panel_slope {
        if !(slope.run.is_finite() && slope.run > 0.0) || !(slope.rise.is_finite() && slope.rise >= 0.0) {
            return Err(invalid("panelSlope", "rise must be >= 0 and run > 0"));
        }
        let drop = (size.y * slope.rise / slope.run).min(body_height * 0.9);
        front_top -= drop;
        notes.push(json!({
            "kind": "panelSlope",
            "axis": slope.axis,
            "rise": slope.rise,
            "run": slope.run,
            "frontDrop": drop / scale,
            "realised": "geometry",
        }));
    }

    let top_at = |y: f64| front_top + (hz - front_top) * (y + hy) / size.y;

    let mut profile = vec![
        ProfilePoint::new(-hy, body_bottom),
        ProfilePoint::new(hy, body_bottom),
        ProfilePoint::new(hy, hz),
    ];

    match features.front_chamfer {
        Some(c) if c > 0.0 && c.is_finite() => {
            let front_height = front_top - body_bottom;
            let c_m = (c * scale).min(front_height * 0.9).min(size.y * 0.9);
            profile.push(ProfilePoint::new(-hy + c_m, top_at(-hy + c_m)));
            profile.push(ProfilePoint::new(-hy, front_top - c_m));
            notes.push(json!({
                "kind": "frontChamfer",
                "size": c,
                "applied": c_m / scale,
                "realised": "geometry",
            }));
        }
        Some(c) if c != 0.0 => return Err(invalid("frontChamfer", format!("bad size {c}"))),
        _ => profile.push(ProfilePoint::new(-hy, front_top)),
    }

    let mut body = TriMesh::new("body");
    extrude_profile(&mut body, &profile, Vec3::new(0.0, 0.0, 0.0), hx);
    parts.insert(0, body);

    for cutout in &features.cutouts {
        notes.push(json!({
            "kind": "cutout",
            "at": cutout.at,
            "size": cutout.size,
            "realised": "annotation",
        }));
    }
    if let Some(r) = features.global_fillet {
        notes.push(json!({
            "kind": "globalFillet",
            "radius": r,
            "realised": "annotation",
        }));
    }

    tracing::debug!(parts = parts.len(), features = notes.len(), "built model");

    Ok(Model {
        parts,
        annotations: json!({
            "units": spec.units,
            "requested": spec.dims,
            "features": notes,
        }),
    })
}

/// `count` evenly spaced centers in `[lo, hi]`; a single item sits midway.
fn spread(count: u32, lo: f64, hi: f64) -> Option<Vec<f64>> {
    if hi < lo - 1e-12 {
        return None;
    }
    if count == 1 {
        return Some(vec![(lo + hi) * 0.5]);
    }
    let step = (hi - lo) / (count - 1) as f64;
    Some((0..count).map(|i| lo + step * i as f64).collect())
}

fn newell_normal(points: &[Vec3]) -> Vec3 {
    let mut n = Vec3::new(0.0, 0.0, 0.0);
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    let len = dot(n, n).sqrt();
    if !len.is_finite() || len < 1e-18 {
        return Vec3::new(0.0, 0.0, 0.0);
    }
    n.scale(1.0 / len)
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}
