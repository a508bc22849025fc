//! Linear-algebra kernel for rigid-body dynamics.
//!
//! Right-handed coordinates, Y up. Everything here is a plain `Copy` value;
//! states copy these around freely and never share them.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Vec3 - 3D Vector
// =============================================================================

/// A 3D vector used for positions, velocities, momenta and forces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Vector with all three components set to `value`.
    pub const fn splat(value: f64) -> Self {
        Self::new(value, value, value)
    }

    /// Squared magnitude (avoids sqrt for comparisons)
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Magnitude (length) of the vector
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Returns a unit vector in the same direction, or zero if magnitude is zero
    pub fn normalized(&self) -> Self {
        let mag = self.magnitude();
        if mag < 1e-10 {
            Self::ZERO
        } else {
            *self / mag
        }
    }

    /// Dot product
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Component-wise multiplication
    pub fn component_mul(&self, other: &Self) -> Self {
        Self {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z,
        }
    }

    /// Component-wise minimum
    pub fn min(&self, other: &Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum
    pub fn max(&self, other: &Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Component of this vector lying in the plane orthogonal to `normal`.
    ///
    /// `normal` is expected to be unit length.
    pub fn reject_from(&self, normal: &Self) -> Self {
        *self - *normal * self.dot(normal)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// Operator overloads for Vec3
impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
        self.z -= other.z;
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

// =============================================================================
// Quat - Rotation Quaternion
// =============================================================================

/// Quaternion `w + xi + yj + zk`. Orientations are kept unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Pure quaternion `(0, v)`, used to lift an angular velocity.
    pub const fn pure(v: Vec3) -> Self {
        Self::new(0.0, v.x, v.y, v.z)
    }

    /// Rotation of `angle` radians around `axis` (need not be normalized).
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let axis = axis.normalized();
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    pub fn magnitude(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit quaternion in the same direction, or identity for a zero quaternion.
    pub fn normalized(&self) -> Self {
        let mag = self.magnitude();
        if mag < 1e-10 {
            Self::IDENTITY
        } else {
            *self * (1.0 / mag)
        }
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Vector part `(x, y, z)`.
    pub fn vector(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Rotate a vector by this (unit) quaternion: `q v q*`.
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        (*self * Quat::pure(v) * self.conjugate()).vector()
    }

    pub fn to_rotation_matrix(&self) -> Mat3 {
        Mat3::from_quaternion(self)
    }
}

/// Hamilton product
impl Mul for Quat {
    type Output = Self;
    fn mul(self, o: Self) -> Self {
        Self {
            w: self.w * o.w - self.x * o.x - self.y * o.y - self.z * o.z,
            x: self.w * o.x + self.x * o.w + self.y * o.z - self.z * o.y,
            y: self.w * o.y - self.x * o.z + self.y * o.w + self.z * o.x,
            z: self.w * o.z + self.x * o.y - self.y * o.x + self.z * o.w,
        }
    }
}

impl Mul<f64> for Quat {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self::new(
            self.w * scalar,
            self.x * scalar,
            self.y * scalar,
            self.z * scalar,
        )
    }
}

impl Add for Quat {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self::new(self.w + o.w, self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// =============================================================================
// Mat3 - 3x3 Matrix
// =============================================================================

/// Row-major 3x3 matrix: `m[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    pub m: [[f64; 3]; 3],
}

impl Mat3 {
    pub const ZERO: Mat3 = Mat3 { m: [[0.0; 3]; 3] };

    pub const IDENTITY: Mat3 = Mat3 {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const fn from_rows(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    pub const fn diagonal(d: Vec3) -> Self {
        Self {
            m: [[d.x, 0.0, 0.0], [0.0, d.y, 0.0], [0.0, 0.0, d.z]],
        }
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse via the adjugate, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let m = &self.m;
        let inv_det = 1.0 / det;
        Some(Self {
            m: [
                [
                    (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
                    (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                    (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
                ],
                [
                    (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                    (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                    (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
                ],
                [
                    (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
                    (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
                    (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
                ],
            ],
        })
    }

    pub fn transpose(&self) -> Self {
        let m = &self.m;
        Self {
            m: [
                [m[0][0], m[1][0], m[2][0]],
                [m[0][1], m[1][1], m[2][1]],
                [m[0][2], m[1][2], m[2][2]],
            ],
        }
    }

    pub fn trace(&self) -> f64 {
        self.m[0][0] + self.m[1][1] + self.m[2][2]
    }

    /// Rotation matrix of a unit quaternion.
    pub fn from_quaternion(q: &Quat) -> Self {
        let (w, x, y, z) = (q.w, q.x, q.y, q.z);
        Self {
            m: [
                [
                    1.0 - 2.0 * (y * y + z * z),
                    2.0 * (x * y - w * z),
                    2.0 * (x * z + w * y),
                ],
                [
                    2.0 * (x * y + w * z),
                    1.0 - 2.0 * (x * x + z * z),
                    2.0 * (y * z - w * x),
                ],
                [
                    2.0 * (x * z - w * y),
                    2.0 * (y * z + w * x),
                    1.0 - 2.0 * (x * x + y * y),
                ],
            ],
        }
    }

    /// Quaternion of a pure rotation matrix (Shepperd's method, branching
    /// on the largest diagonal term for stability).
    pub fn to_quaternion(&self) -> Quat {
        let m = &self.m;
        let trace = self.trace();
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Quat::new(
                0.25 * s,
                (m[2][1] - m[1][2]) / s,
                (m[0][2] - m[2][0]) / s,
                (m[1][0] - m[0][1]) / s,
            )
        } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
            let s = (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt() * 2.0;
            Quat::new(
                (m[2][1] - m[1][2]) / s,
                0.25 * s,
                (m[0][1] + m[1][0]) / s,
                (m[0][2] + m[2][0]) / s,
            )
        } else if m[1][1] > m[2][2] {
            let s = (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt() * 2.0;
            Quat::new(
                (m[0][2] - m[2][0]) / s,
                (m[0][1] + m[1][0]) / s,
                0.25 * s,
                (m[1][2] + m[2][1]) / s,
            )
        } else {
            let s = (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt() * 2.0;
            Quat::new(
                (m[1][0] - m[0][1]) / s,
                (m[0][2] + m[2][0]) / s,
                (m[1][2] + m[2][1]) / s,
                0.25 * s,
            )
        };
        q.normalized()
    }

    /// Largest absolute component-wise difference to `other`.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        let mut diff: f64 = 0.0;
        for r in 0..3 {
            for c in 0..3 {
                diff = diff.max((self.m[r][c] - other.m[r][c]).abs());
            }
        }
        diff
    }
}

impl Mul for Mat3 {
    type Output = Self;
    fn mul(self, o: Self) -> Self {
        let mut out = [[0.0; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.m[r][k] * o.m[k][c]).sum();
            }
        }
        Self { m: out }
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }
}

impl Mul<f64> for Mat3 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        let mut out = self;
        for row in out.m.iter_mut() {
            for cell in row.iter_mut() {
                *cell *= scalar;
            }
        }
        out
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// =============================================================================
// WorldMatrix - rigid transform
// =============================================================================

/// Body-to-world transform: `p_world = rotation * p_local + translation`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldMatrix {
    pub rotation: Mat3,
    pub translation: Vec3,
}

impl WorldMatrix {
    pub const IDENTITY: WorldMatrix = WorldMatrix {
        rotation: Mat3::IDENTITY,
        translation: Vec3::ZERO,
    };

    pub const fn new(rotation: Mat3, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation * p + self.translation
    }

    /// Rotate a direction; translation does not apply.
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.rotation * v
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_vec3_cross_is_right_handed() {
        let z = Vec3::new(1.0, 0.0, 0.0).cross(&Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(z, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_vec3_reject_from_removes_normal_component() {
        let v = Vec3::new(3.0, -2.0, 1.0);
        let t = v.reject_from(&Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(t, Vec3::new(3.0, 0.0, 1.0));
    }

    #[test]
    fn test_determinant_and_trace() {
        let m = Mat3::from_rows([[2.0, 0.0, 1.0], [1.0, 3.0, 2.0], [1.0, 1.0, 2.0]]);
        assert_relative_eq!(m.determinant(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(m.trace(), 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_times_matrix_is_identity() {
        let m = Mat3::from_rows([[4.0, 7.0, 2.0], [3.0, 6.0, 1.0], [2.0, 5.0, 3.0]]);
        let inv = m.inverse().expect("matrix is invertible");
        assert!(
            (m * inv).max_abs_diff(&Mat3::IDENTITY) < 1e-12,
            "M * M^-1 should be identity, got {:?}",
            m * inv
        );
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        assert!(Mat3::ZERO.inverse().is_none());
        let rank_two = Mat3::from_rows([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]]);
        assert!(rank_two.inverse().is_none());
    }

    #[test]
    fn test_transpose_of_product() {
        let a = Mat3::from_rows([[1.0, 2.0, 0.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]]);
        let b = Mat3::from_rows([[0.0, 1.0, 1.0], [2.0, 0.0, 3.0], [1.0, 1.0, 1.0]]);
        let lhs = (a * b).transpose();
        let rhs = b.transpose() * a.transpose();
        assert!(lhs.max_abs_diff(&rhs) < 1e-12);
    }

    #[test]
    fn test_quaternion_matrix_round_trip() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, -0.5), 2.5);
        let back = Mat3::from_quaternion(&q).to_quaternion();
        // q and -q encode the same rotation
        let same = (back.w - q.w).abs() < 1e-9 && (back.x - q.x).abs() < 1e-9;
        let flipped = (back.w + q.w).abs() < 1e-9 && (back.x + q.x).abs() < 1e-9;
        assert!(same || flipped, "Expected {:?}, got {:?}", q, back);
    }

    #[test]
    fn test_quaternion_rotation_matches_matrix() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let v = Vec3::new(1.0, 0.0, 0.0);
        let by_quat = q.rotate(v);
        let by_matrix = q.to_rotation_matrix() * v;
        assert_relative_eq!(by_quat.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(by_matrix.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(by_matrix.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_matrix_is_orthonormal() {
        let r = Quat::from_axis_angle(Vec3::new(0.3, -1.0, 0.7), 0.9).to_rotation_matrix();
        assert!((r * r.transpose()).max_abs_diff(&Mat3::IDENTITY) < 1e-12);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_world_matrix_transforms_points_not_vectors() {
        let world = WorldMatrix::new(
            Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), FRAC_PI_2).to_rotation_matrix(),
            Vec3::new(0.0, 10.0, 0.0),
        );
        let p = world.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.y, 10.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, -1.0, epsilon = 1e-12);
        let v = world.transform_vector(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-12);
    }
}
