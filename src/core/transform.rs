//! 4×4 matrix transformations, quaternion rotations, and the
//! translate/rotate/scale transform used to place cameras and shapes.

// std
use std::ops;
// lumen
use crate::core::geometry::{vec3_cross_vec3, vec3_dot_vec3f, Normal3f, Point3f, Ray, Vector3f};
use crate::core::lumen::{radians, Float};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix4x4 {
    pub m: [[Float; 4]; 4],
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Matrix4x4 {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

impl Matrix4x4 {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        t00: Float,
        t01: Float,
        t02: Float,
        t03: Float,
        t10: Float,
        t11: Float,
        t12: Float,
        t13: Float,
        t20: Float,
        t21: Float,
        t22: Float,
        t23: Float,
        t30: Float,
        t31: Float,
        t32: Float,
        t33: Float,
    ) -> Self {
        Matrix4x4 {
            m: [
                [t00, t01, t02, t03],
                [t10, t11, t12, t13],
                [t20, t21, t22, t23],
                [t30, t31, t32, t33],
            ],
        }
    }
    pub fn transpose(&self) -> Matrix4x4 {
        let m = &self.m;
        Matrix4x4::new(
            m[0][0], m[1][0], m[2][0], m[3][0], m[0][1], m[1][1], m[2][1], m[3][1], m[0][2],
            m[1][2], m[2][2], m[3][2], m[0][3], m[1][3], m[2][3], m[3][3],
        )
    }
    pub fn mul(&self, other: &Matrix4x4) -> Matrix4x4 {
        let mut r: Matrix4x4 = Matrix4x4::default();
        for i in 0..4 {
            for j in 0..4 {
                r.m[i][j] = self.m[i][0] * other.m[0][j]
                    + self.m[i][1] * other.m[1][j]
                    + self.m[i][2] * other.m[2][j]
                    + self.m[i][3] * other.m[3][j];
            }
        }
        r
    }
    /// Gauss-Jordan elimination with partial pivoting.
    pub fn inverse(&self) -> Matrix4x4 {
        let mut indxc: [usize; 4] = [0; 4];
        let mut indxr: [usize; 4] = [0; 4];
        let mut ipiv: [usize; 4] = [0; 4];
        let mut minv: [[Float; 4]; 4] = self.m;
        for i in 0..4 {
            let mut irow: usize = 0;
            let mut icol: usize = 0;
            let mut big: Float = 0.0;
            // choose pivot
            for (j, ipiv_j) in ipiv.iter().enumerate() {
                if *ipiv_j != 1 {
                    for (k, ipiv_k) in ipiv.iter().enumerate() {
                        if *ipiv_k == 0 && minv[j][k].abs() >= big {
                            big = minv[j][k].abs();
                            irow = j;
                            icol = k;
                        }
                    }
                }
            }
            ipiv[icol] += 1;
            if irow != icol {
                for k in 0..4 {
                    let tmp: Float = minv[irow][k];
                    minv[irow][k] = minv[icol][k];
                    minv[icol][k] = tmp;
                }
            }
            indxr[i] = irow;
            indxc[i] = icol;
            assert!(minv[icol][icol] != 0.0, "singular matrix");
            let pivinv: Float = 1.0 / minv[icol][icol];
            minv[icol][icol] = 1.0;
            for j in 0..4 {
                minv[icol][j] *= pivinv;
            }
            // subtract this row from the others to zero out their columns
            for j in 0..4 {
                if j != icol {
                    let save: Float = minv[j][icol];
                    minv[j][icol] = 0.0;
                    for k in 0..4 {
                        minv[j][k] -= minv[icol][k] * save;
                    }
                }
            }
        }
        // swap columns to reflect permutation
        for j in (0..4).rev() {
            if indxr[j] != indxc[j] {
                for row in minv.iter_mut() {
                    row.swap(indxr[j], indxc[j]);
                }
            }
        }
        Matrix4x4 { m: minv }
    }
}

/// Unit quaternion rotation.
#[derive(Debug, Copy, Clone)]
pub struct Quaternion {
    pub v: Vector3f,
    pub w: Float,
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion {
            v: Vector3f::default(),
            w: 1.0,
        }
    }
}

impl Quaternion {
    pub fn new(v: Vector3f, w: Float) -> Self {
        Quaternion { v, w }
    }
    pub fn from_axis_angle(axis: &Vector3f, angle_deg: Float) -> Self {
        let half: Float = radians(angle_deg) / 2.0;
        Quaternion {
            v: axis.normalize() * half.sin(),
            w: half.cos(),
        }
    }
    pub fn rotate(&self, v: &Vector3f) -> Vector3f {
        // v' = v + 2 q.v x (q.v x v + q.w v)
        let t: Vector3f = vec3_cross_vec3(&self.v, v) * 2.0;
        *v + t * self.w + vec3_cross_vec3(&self.v, &t)
    }
    pub fn to_matrix(&self) -> Matrix4x4 {
        let x: Float = self.v.x;
        let y: Float = self.v.y;
        let z: Float = self.v.z;
        let w: Float = self.w;
        Matrix4x4::new(
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - z * w),
            2.0 * (x * z + y * w),
            0.0,
            2.0 * (x * y + z * w),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - x * w),
            0.0,
            2.0 * (x * z - y * w),
            2.0 * (y * z + x * w),
            1.0 - 2.0 * (x * x + y * y),
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        )
    }
}

/// An invertible affine transformation; keeps the inverse alongside so
/// normals and reverse transforms stay cheap.
#[derive(Debug, Default, Copy, Clone)]
pub struct Transform {
    pub m: Matrix4x4,
    pub m_inv: Matrix4x4,
}

impl Transform {
    pub fn new(m: Matrix4x4) -> Self {
        Transform {
            m_inv: m.inverse(),
            m,
        }
    }
    pub fn identity() -> Self {
        Transform::default()
    }
    pub fn inverse(&self) -> Transform {
        Transform {
            m: self.m_inv,
            m_inv: self.m,
        }
    }
    pub fn translate(delta: &Vector3f) -> Self {
        Transform {
            m: Matrix4x4::new(
                1.0, 0.0, 0.0, delta.x, 0.0, 1.0, 0.0, delta.y, 0.0, 0.0, 1.0, delta.z, 0.0, 0.0,
                0.0, 1.0,
            ),
            m_inv: Matrix4x4::new(
                1.0, 0.0, 0.0, -delta.x, 0.0, 1.0, 0.0, -delta.y, 0.0, 0.0, 1.0, -delta.z, 0.0,
                0.0, 0.0, 1.0,
            ),
        }
    }
    pub fn scale(x: Float, y: Float, z: Float) -> Self {
        Transform {
            m: Matrix4x4::new(
                x, 0.0, 0.0, 0.0, 0.0, y, 0.0, 0.0, 0.0, 0.0, z, 0.0, 0.0, 0.0, 0.0, 1.0,
            ),
            m_inv: Matrix4x4::new(
                1.0 / x,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0 / y,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0 / z,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
            ),
        }
    }
    pub fn rotate(q: &Quaternion) -> Self {
        let m: Matrix4x4 = q.to_matrix();
        Transform {
            m_inv: m.transpose(),
            m,
        }
    }
    /// Compose a transform from translation, rotation, and scale, applied
    /// scale-first.
    pub fn compose(p: &Vector3f, q: &Quaternion, s: &Vector3f) -> Self {
        let t: Transform = Transform::translate(p);
        let r: Transform = Transform::rotate(q);
        let sc: Transform = Transform::scale(s.x, s.y, s.z);
        t * r * sc
    }
    pub fn transform_point(&self, p: &Point3f) -> Point3f {
        let m = &self.m.m;
        let x: Float = m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3];
        let y: Float = m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3];
        let z: Float = m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3];
        let w: Float = m[3][0] * p.x + m[3][1] * p.y + m[3][2] * p.z + m[3][3];
        if w == 1.0 {
            Point3f { x, y, z }
        } else {
            Point3f { x, y, z } / w
        }
    }
    pub fn transform_vector(&self, v: &Vector3f) -> Vector3f {
        let m = &self.m.m;
        Vector3f {
            x: m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            y: m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            z: m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        }
    }
    /// Transform a vector by the transpose of the inverse, which is what
    /// the environment lights use to rotate directions back into texture
    /// space.
    pub fn transform_vector_inverse(&self, v: &Vector3f) -> Vector3f {
        let m = &self.m_inv.m;
        Vector3f {
            x: m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            y: m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            z: m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        }
    }
    pub fn transform_normal(&self, n: &Normal3f) -> Normal3f {
        let m = &self.m_inv.m;
        Normal3f {
            x: m[0][0] * n.x + m[1][0] * n.y + m[2][0] * n.z,
            y: m[0][1] * n.x + m[1][1] * n.y + m[2][1] * n.z,
            z: m[0][2] * n.x + m[1][2] * n.y + m[2][2] * n.z,
        }
    }
    pub fn transform_ray(&self, r: &Ray) -> Ray {
        Ray {
            o: self.transform_point(&r.o),
            d: self.transform_vector(&r.d),
            medium: r.medium.clone(),
        }
    }
    pub fn look_at(eye: &Point3f, target: &Point3f, up: &Vector3f) -> Transform {
        let dir: Vector3f = (*target - *eye).normalize();
        let right: Vector3f = vec3_cross_vec3(&up.normalize(), &dir).normalize();
        let new_up: Vector3f = vec3_cross_vec3(&dir, &right);
        let camera_to_world = Matrix4x4::new(
            right.x, new_up.x, dir.x, eye.x, right.y, new_up.y, dir.y, eye.y, right.z, new_up.z,
            dir.z, eye.z, 0.0, 0.0, 0.0, 1.0,
        );
        Transform {
            m_inv: camera_to_world.inverse(),
            m: camera_to_world,
        }
    }
}

impl_op_ex!(*|a: &Transform, b: &Transform| -> Transform {
    Transform {
        m: a.m.mul(&b.m),
        m_inv: b.m_inv.mul(&a.m_inv),
    }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform::compose(
            &Vector3f::new(1.0, 2.0, 3.0),
            &Quaternion::from_axis_angle(&Vector3f::new(0.0, 1.0, 0.0), 30.0),
            &Vector3f::new(2.0, 2.0, 2.0),
        );
        let p = Point3f::new(0.5, -1.0, 4.0);
        let q = t.inverse().transform_point(&t.transform_point(&p));
        assert!((q - p).length() < 1e-4);
    }

    #[test]
    fn test_quaternion_rotation_preserves_length() {
        let q = Quaternion::from_axis_angle(&Vector3f::new(1.0, 1.0, 0.0), 72.0);
        let v = Vector3f::new(0.3, -0.4, 0.5);
        let r = q.rotate(&v);
        assert!((r.length() - v.length()).abs() < 1e-5);
        assert!(vec3_dot_vec3f(&v, &v) > 0.0);
    }

    #[test]
    fn test_look_at_maps_origin_to_eye() {
        let eye = Point3f::new(0.0, 0.0, 3.0);
        let t = Transform::look_at(
            &eye,
            &Point3f::default(),
            &Vector3f::new(0.0, 1.0, 0.0),
        );
        let p = t.transform_point(&Point3f::default());
        assert!((p - eye).length() < 1e-5);
    }
}
