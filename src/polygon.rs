//! Planar convex polygons and plane splitting.
//!
//! A [`Plane`] is `normal·x = w` with a unit normal. Points with
//! `normal·x > w` are on the front side.

use crate::geometry::{add, dot, is_finite, lerp, normalize, scale, sub};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: [f64; 3],
    pub w: f64,
}

impl Plane {
    /// Best-fit plane through a vertex loop (Newell's method). The normal
    /// follows the counter-clockwise winding. `None` for a loop with no area.
    pub fn from_points(points: &[[f64; 3]]) -> Option<Plane> {
        if points.len() < 3 {
            return None;
        }
        let mut n = [0.0; 3];
        let mut center = [0.0; 3];
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            let d = sub(&a, &b);
            n[0] += d[1] * (a[2] + b[2]);
            n[1] += d[2] * (a[0] + b[0]);
            n[2] += d[0] * (a[1] + b[1]);
            center = add(&center, &a);
        }
        let normal = normalize(&n)?;
        let center = scale(&center, 1.0 / points.len() as f64);
        Some(Plane {
            normal,
            w: dot(&normal, &center),
        })
    }

    #[inline]
    pub fn signed_distance(&self, p: &[f64; 3]) -> f64 {
        dot(&self.normal, p) - self.w
    }

    pub fn flipped(&self) -> Plane {
        Plane {
            normal: scale(&self.normal, -1.0),
            w: -self.w,
        }
    }
}

/// Position of a polygon relative to a plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Coplanar,
    Front,
    Back,
    Spanning,
}

/// A convex polygon with its supporting plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<[f64; 3]>,
    pub plane: Plane,
}

impl Polygon {
    /// `None` when the vertices do not span a plane.
    pub fn new(vertices: Vec<[f64; 3]>) -> Option<Polygon> {
        let plane = Plane::from_points(&vertices)?;
        Some(Polygon { vertices, plane })
    }

    pub fn with_plane(vertices: Vec<[f64; 3]>, plane: Plane) -> Polygon {
        Polygon { vertices, plane }
    }

    /// Vertex average.
    pub fn centroid(&self) -> [f64; 3] {
        let sum = self.vertices.iter().fold([0.0; 3], |acc, v| add(&acc, v));
        scale(&sum, 1.0 / self.vertices.len() as f64)
    }

    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane = self.plane.flipped();
    }

    pub fn is_finite(&self) -> bool {
        self.vertices.iter().all(is_finite)
    }
}

/// Classifies `poly` against `plane` and splits it when it spans.
///
/// Vertices within `eps` of the plane count as on it and go to both halves.
/// Only a spanning polygon yields parts; the others are returned whole by
/// the caller based on the [`Side`].
pub fn split_polygon(poly: &Polygon, plane: &Plane, eps: f64) -> (Side, Option<Polygon>, Option<Polygon>) {
    let mut front_count = 0;
    let mut back_count = 0;
    let mut dists = Vec::with_capacity(poly.vertices.len());
    let mut sides = Vec::with_capacity(poly.vertices.len());

    for v in &poly.vertices {
        let d = plane.signed_distance(v);
        let side = if d < -eps {
            back_count += 1;
            -1
        } else if d > eps {
            front_count += 1;
            1
        } else {
            0
        };
        dists.push(d);
        sides.push(side);
    }

    if front_count == 0 && back_count == 0 {
        return (Side::Coplanar, None, None);
    }
    if back_count == 0 {
        return (Side::Front, None, None);
    }
    if front_count == 0 {
        return (Side::Back, None, None);
    }

    let n = poly.vertices.len();
    let mut front = Vec::with_capacity(n + 1);
    let mut back = Vec::with_capacity(n + 1);
    for i in 0..n {
        let j = (i + 1) % n;
        let (si, sj) = (sides[i], sides[j]);
        let vi = poly.vertices[i];

        if si != -1 {
            front.push(vi);
        }
        if si != 1 {
            back.push(vi);
        }
        if si * sj < 0 {
            let t = dists[i] / (dists[i] - dists[j]);
            let p = lerp(&vi, &poly.vertices[j], t);
            front.push(p);
            back.push(p);
        }
    }

    let front = (front.len() >= 3).then(|| Polygon::with_plane(front, poly.plane));
    let back = (back.len() >= 3).then(|| Polygon::with_plane(back, poly.plane));
    (Side::Spanning, front, back)
}

/// Keeps the part of `poly` behind `plane`.
///
/// A coplanar polygon survives only when it faces the same way as the
/// plane, so a surface lying on a shared boundary is emitted once.
pub fn clip_behind(poly: Polygon, plane: &Plane, eps: f64) -> Option<Polygon> {
    match split_polygon(&poly, plane, eps) {
        (Side::Back, _, _) => Some(poly),
        (Side::Front, _, _) => None,
        (Side::Coplanar, _, _) => (dot(&poly.plane.normal, &plane.normal) > 0.0).then_some(poly),
        (Side::Spanning, _, back) => back,
    }
}
