//! Small vector helpers shared by the mesh, cell and clipping code.

#[inline]
pub fn add(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn scale(a: &[f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn length(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: &[f64; 3], b: &[f64; 3], t: f64) -> [f64; 3] {
    [
        a[0] + t * (b[0] - a[0]),
        a[1] + t * (b[1] - a[1]),
        a[2] + t * (b[2] - a[2]),
    ]
}

/// Unit vector in the direction of `a`, or `None` for a zero or non-finite vector.
#[inline]
pub fn normalize(a: &[f64; 3]) -> Option<[f64; 3]> {
    let len = length(a);
    if len > 0.0 && len.is_finite() {
        Some(scale(a, 1.0 / len))
    } else {
        None
    }
}

#[inline]
pub fn is_finite(a: &[f64; 3]) -> bool {
    a[0].is_finite() && a[1].is_finite() && a[2].is_finite()
}

/// Möller–Trumbore ray/triangle test. Only hits with a strictly positive ray
/// parameter count.
pub fn ray_hits_triangle(origin: &[f64; 3], dir: &[f64; 3], tri: &[[f64; 3]; 3]) -> bool {
    let edge1 = sub(&tri[1], &tri[0]);
    let edge2 = sub(&tri[2], &tri[0]);
    let h = cross(dir, &edge2);
    let a = dot(&edge1, &h);

    // Parallel, or a zero-area triangle.
    if a.abs() < 1e-300 {
        return false;
    }

    let f = 1.0 / a;
    let s = sub(origin, &tri[0]);
    let u = f * dot(&s, &h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = cross(&s, &edge1);
    let v = f * dot(dir, &q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    f * dot(&edge2, &q) > 0.0
}
