// SPDX-License-Identifier: Apache-2.0
//! Minimal float32 vector/quaternion/matrix types for node transforms.
//!
//! Only what the scene-graph transform pipeline needs: a 4-component
//! vector (doubles as a typed property value), a unit quaternion, and a
//! column-major 4x4 affine matrix with the composition `T * R * S`.

use std::ops::Mul;

/// A 4-component float vector; also the storage shape for every typed
/// node property (`position`, `color`, `slice9`, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec4 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// W component.
    pub w: f32,
}

impl Vec4 {
    /// The zero vector.
    pub const ZERO: Self = Self::splat(0.0);
    /// A vector of ones, the identity scale value.
    pub const ONE: Self = Self::splat(1.0);

    /// Builds a vector from four components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Builds a vector with all components equal to `v`.
    #[must_use]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    /// Linear interpolation between `self` and `other` at `t`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
            self.w + (other.w - self.w) * t,
        )
    }
}

/// A unit quaternion, `(x, y, z, w)` with `w` the scalar part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    x: f32,
    y: f32,
    z: f32,
    w: f32,
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Builds a quaternion from raw components; does not normalize.
    #[must_use]
    pub const fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Builds a quaternion from Euler angles (radians, XYZ intrinsic
    /// order), matching `rotate(quat_from_euler)` in the local-transform
    /// composition.
    #[must_use]
    pub fn from_euler_radians(x: f32, y: f32, z: f32) -> Self {
        let (sx, cx) = (x * 0.5).sin_cos();
        let (sy, cy) = (y * 0.5).sin_cos();
        let (sz, cz) = (z * 0.5).sin_cos();
        Self {
            x: sx * cy * cz - cx * sy * sz,
            y: cx * sy * cz + sx * cy * sz,
            z: cx * cy * sz - sx * sy * cz,
            w: cx * cy * cz + sx * sy * sz,
        }
    }

    /// Returns the quaternion as a 3x3 rotation matrix stored row-major
    /// in a flat 9-element array.
    #[must_use]
    pub fn to_mat3(self) -> [f32; 9] {
        let Self { x, y, z, w } = self;
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, xy, xz) = (x * x2, x * y2, x * z2);
        let (yy, yz, zz) = (y * y2, y * z2, z * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);
        [
            1.0 - (yy + zz),
            xy - wz,
            xz + wy,
            xy + wz,
            1.0 - (xx + zz),
            yz - wx,
            xz - wy,
            yz + wx,
            1.0 - (xx + yy),
        ]
    }
}

/// A column-major 4x4 affine matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    /// 16 elements, column-major: `cols[c * 4 + r]`.
    pub cols: [f32; 16],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Builds a pure translation matrix.
    #[must_use]
    pub fn from_translation(t: Vec4) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[12] = t.x;
        m.cols[13] = t.y;
        m.cols[14] = t.z;
        m
    }

    /// Builds a pure rotation matrix from a quaternion.
    #[must_use]
    pub fn from_rotation(q: Quat) -> Self {
        let r = q.to_mat3();
        let mut m = Self::IDENTITY;
        m.cols[0] = r[0];
        m.cols[1] = r[3];
        m.cols[2] = r[6];
        m.cols[4] = r[1];
        m.cols[5] = r[4];
        m.cols[6] = r[7];
        m.cols[8] = r[2];
        m.cols[9] = r[5];
        m.cols[10] = r[8];
        m
    }

    /// Builds a non-uniform scale matrix.
    #[must_use]
    pub fn from_scale(s: Vec4) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0] = s.x;
        m.cols[5] = s.y;
        m.cols[10] = s.z;
        m
    }

    /// Composes `translate(t) * rotate(r) * scale(s)`, the local-
    /// transform formula.
    #[must_use]
    pub fn trs(t: Vec4, r: Quat, s: Vec4) -> Self {
        Self::from_translation(t) * Self::from_rotation(r) * Self::from_scale(s)
    }

    /// Transforms a point (`w = 1` homogeneous) by this matrix.
    #[must_use]
    pub fn transform_point(self, p: Vec4) -> Vec4 {
        let c = self.cols;
        Vec4::new(
            c[0] * p.x + c[4] * p.y + c[8] * p.z + c[12] * p.w,
            c[1] * p.x + c[5] * p.y + c[9] * p.z + c[13] * p.w,
            c[2] * p.x + c[6] * p.y + c[10] * p.z + c[14] * p.w,
            c[3] * p.x + c[7] * p.y + c[11] * p.z + c[15] * p.w,
        )
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let a = self.cols;
        let b = rhs.cols;
        let mut out = [0.0_f32; 16];
        for c in 0..4 {
            for r in 0..4 {
                let mut sum = 0.0_f32;
                for k in 0..4 {
                    sum += a[k * 4 + r] * b[c * 4 + k];
                }
                out[c * 4 + r] = sum;
            }
        }
        Self { cols: out }
    }
}
