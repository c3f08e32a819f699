use nalgebra::{Matrix3, Vector3};
use rand::Rng;
use std::f32::consts::PI;
use std::ops::Mul;

/// Homogeneous w-coordinates at or below this magnitude are treated as a
/// degenerate projection rather than divided through.
pub const PROJECTIVE_EPS: f32 = 1e-8;

/// A 2D projective transform in homogeneous coordinates.
///
/// Wraps a 3x3 matrix so the composition order and the projective divide are
/// explicit. Composition is ordinary matrix multiplication: `a * b` applies
/// `b` first, then `a`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    m: Matrix3<f32>,
}

impl Transform2D {
    pub fn identity() -> Self {
        Transform2D {
            m: Matrix3::identity(),
        }
    }

    pub fn from_matrix(m: Matrix3<f32>) -> Self {
        Transform2D { m }
    }

    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.m
    }

    /// True if every entry is a finite number.
    pub fn is_finite(&self) -> bool {
        self.m.iter().all(|v| v.is_finite())
    }

    /// Inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Transform2D> {
        self.m.try_inverse().map(Transform2D::from_matrix)
    }

    /// Map a point through the transform and perform the projective divide.
    ///
    /// Returns `None` when the homogeneous w-coordinate is non-finite or
    /// within [`PROJECTIVE_EPS`] of zero, or when a divided coordinate is
    /// non-finite.
    pub fn transform_point(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let v = self.m * Vector3::new(x, y, 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= PROJECTIVE_EPS {
            return None;
        }
        let (px, py) = (v[0] / w, v[1] / w);
        if !px.is_finite() || !py.is_finite() {
            return None;
        }
        Some((px, py))
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Transform2D::identity()
    }
}

impl Mul for Transform2D {
    type Output = Transform2D;

    fn mul(self, rhs: Transform2D) -> Transform2D {
        Transform2D { m: self.m * rhs.m }
    }
}

/// Translation that moves the image center `(width/2, height/2)` to the origin.
///
/// The randomized primitives below act about the origin, so each composite
/// starts from this matrix.
pub fn centering_matrix(width: f32, height: f32) -> Transform2D {
    let mut m = Matrix3::identity();
    m[(0, 2)] = -width / 2.0;
    m[(1, 2)] = -height / 2.0;
    Transform2D::from_matrix(m)
}

/// Horizontal flip about the local origin with the given probability.
pub fn flip_matrix<R: Rng>(prob: f32, rng: &mut R) -> Transform2D {
    let mut m = Matrix3::identity();
    if rng.gen::<f32>() < prob {
        m[(0, 0)] = -1.0;
    }
    Transform2D::from_matrix(m)
}

/// Perspective with both projective coefficients drawn independently from
/// `U(-magnitude, magnitude)`.
pub fn perspective_matrix<R: Rng>(magnitude: f32, rng: &mut R) -> Transform2D {
    let mut m = Matrix3::identity();
    m[(2, 0)] = rng.gen_range(-magnitude..=magnitude);
    m[(2, 1)] = rng.gen_range(-magnitude..=magnitude);
    Transform2D::from_matrix(m)
}

/// Rotation about the origin by an angle drawn from `U(-degree, degree)`.
///
/// Uses the y-down image convention: positive angles turn counter-clockwise
/// on screen.
pub fn rotation_matrix<R: Rng>(degree: f32, rng: &mut R) -> Transform2D {
    let angle = rng.gen_range(-degree..=degree) * PI / 180.0;
    let (sin, cos) = angle.sin_cos();
    let mut m = Matrix3::identity();
    m[(0, 0)] = cos;
    m[(0, 1)] = sin;
    m[(1, 0)] = -sin;
    m[(1, 1)] = cos;
    Transform2D::from_matrix(m)
}

/// Uniform scale with one factor drawn from `U(ratio.0, ratio.1)` applied to
/// both axes.
pub fn scale_matrix<R: Rng>(ratio: (f32, f32), rng: &mut R) -> Transform2D {
    let scale = rng.gen_range(ratio.0..=ratio.1);
    let mut m = Matrix3::identity();
    m[(0, 0)] = scale;
    m[(1, 1)] = scale;
    Transform2D::from_matrix(m)
}

/// Anisotropic scale with independent factors per axis.
pub fn stretch_matrix<R: Rng>(
    width_ratio: (f32, f32),
    height_ratio: (f32, f32),
    rng: &mut R,
) -> Transform2D {
    let mut m = Matrix3::identity();
    m[(0, 0)] = rng.gen_range(width_ratio.0..=width_ratio.1);
    m[(1, 1)] = rng.gen_range(height_ratio.0..=height_ratio.1);
    Transform2D::from_matrix(m)
}

/// Shear with independent x and y angles drawn from `U(-degree, degree)`;
/// the shear coefficients are the tangents of the sampled angles.
pub fn shear_matrix<R: Rng>(degree: f32, rng: &mut R) -> Transform2D {
    let mut m = Matrix3::identity();
    m[(0, 1)] = (rng.gen_range(-degree..=degree) * PI / 180.0).tan();
    m[(1, 0)] = (rng.gen_range(-degree..=degree) * PI / 180.0).tan();
    Transform2D::from_matrix(m)
}

/// Centered translation jitter: each axis is drawn from
/// `U(0.5 - ratio, 0.5 + ratio)` times the image dimension.
///
/// The 0.5 term moves the centered image back into the frame, so with
/// `ratio == 0` this exactly undoes [`centering_matrix`].
pub fn translate_matrix<R: Rng>(ratio: f32, width: f32, height: f32, rng: &mut R) -> Transform2D {
    let mut m = Matrix3::identity();
    m[(0, 2)] = rng.gen_range((0.5 - ratio)..=(0.5 + ratio)) * width;
    m[(1, 2)] = rng.gen_range((0.5 - ratio)..=(0.5 + ratio)) * height;
    Transform2D::from_matrix(m)
}

/// Deterministic resize from `src_shape` to `dst_shape`, both `(width, height)`.
///
/// Without `keep_ratio` this is an independent anisotropic scale that exactly
/// fills the destination. With `keep_ratio` the source is centered at the
/// origin, scaled uniformly by the binding-axis fit ratio, then translated so
/// the result is centered in the destination.
pub fn resize_matrix(src_shape: (u32, u32), dst_shape: (u32, u32), keep_ratio: bool) -> Transform2D {
    let (src_w, src_h) = (src_shape.0 as f32, src_shape.1 as f32);
    let (dst_w, dst_h) = (dst_shape.0 as f32, dst_shape.1 as f32);
    if keep_ratio {
        let ratio = if src_w / src_h < dst_w / dst_h {
            dst_h / src_h
        } else {
            dst_w / src_w
        };
        let mut scale = Matrix3::identity();
        scale[(0, 0)] = ratio;
        scale[(1, 1)] = ratio;

        let mut center = Matrix3::identity();
        center[(0, 2)] = -src_w / 2.0;
        center[(1, 2)] = -src_h / 2.0;

        let mut translate = Matrix3::identity();
        translate[(0, 2)] = 0.5 * dst_w;
        translate[(1, 2)] = 0.5 * dst_h;

        Transform2D::from_matrix(translate * scale * center)
    } else {
        let mut m = Matrix3::identity();
        m[(0, 0)] = dst_w / src_w;
        m[(1, 1)] = dst_h / src_h;
        Transform2D::from_matrix(m)
    }
}
