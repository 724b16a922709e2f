//! Triangle meshes; individual triangles reference shared vertex data.

// std
use std::sync::Arc;
// lumen
use crate::core::geometry::{
    bnd3_union_pnt3f, nrm_dot_vec3f, vec3_cross_vec3, vec3_dot_vec3f, Bounds3f, Normal3f, Point2f,
    Point3f, Ray, Vector3f,
};
use crate::core::lumen::Float;
use crate::core::sampling::uniform_sample_triangle;
use crate::core::shape::{Shape, ShapeHit, ShapeSample};

pub struct TriangleMesh {
    pub positions: Vec<Point3f>,
    pub normals: Vec<Normal3f>,
    pub uvs: Vec<Point2f>,
    pub indices: Vec<[usize; 3]>,
}

impl TriangleMesh {
    pub fn new(
        positions: Vec<Point3f>,
        normals: Vec<Normal3f>,
        uvs: Vec<Point2f>,
        indices: Vec<[usize; 3]>,
    ) -> Self {
        TriangleMesh {
            positions,
            normals,
            uvs,
            indices,
        }
    }
    /// Build one `Triangle` shape per face.
    pub fn create_triangles(mesh: Arc<TriangleMesh>) -> Vec<Arc<dyn Shape>> {
        (0..mesh.indices.len())
            .map(|i| Arc::new(Triangle::new(mesh.clone(), i)) as Arc<dyn Shape>)
            .collect()
    }
}

pub struct Triangle {
    pub mesh: Arc<TriangleMesh>,
    pub index: usize,
}

impl Triangle {
    pub fn new(mesh: Arc<TriangleMesh>, index: usize) -> Self {
        Triangle { mesh, index }
    }
    fn vertices(&self) -> (Point3f, Point3f, Point3f) {
        let idx: [usize; 3] = self.mesh.indices[self.index];
        (
            self.mesh.positions[idx[0]],
            self.mesh.positions[idx[1]],
            self.mesh.positions[idx[2]],
        )
    }
    fn geometric_normal(&self) -> Normal3f {
        let (p0, p1, p2) = self.vertices();
        Normal3f::from(vec3_cross_vec3(&(p1 - p0), &(p2 - p0)).normalize())
    }
    fn interpolate(&self, b0: Float, b1: Float, b2: Float) -> (Normal3f, Point2f) {
        let idx: [usize; 3] = self.mesh.indices[self.index];
        let n: Normal3f = if self.mesh.normals.is_empty() {
            self.geometric_normal()
        } else {
            (self.mesh.normals[idx[0]] * b0
                + self.mesh.normals[idx[1]] * b1
                + self.mesh.normals[idx[2]] * b2)
                .normalize()
        };
        let uv: Point2f = if self.mesh.uvs.is_empty() {
            Point2f { x: b1, y: b2 }
        } else {
            self.mesh.uvs[idx[0]] * b0 + self.mesh.uvs[idx[1]] * b1 + self.mesh.uvs[idx[2]] * b2
        };
        (n, uv)
    }
}

impl Shape for Triangle {
    fn intersect(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<ShapeHit> {
        let (p0, p1, p2) = self.vertices();
        let e1: Vector3f = p1 - p0;
        let e2: Vector3f = p2 - p0;
        let pvec: Vector3f = vec3_cross_vec3(&ray.d, &e2);
        let det: Float = vec3_dot_vec3f(&e1, &pvec);
        if det.abs() < 1e-10 {
            return None;
        }
        let inv_det: Float = 1.0 as Float / det;
        let tvec: Vector3f = ray.o - p0;
        let b1: Float = vec3_dot_vec3f(&tvec, &pvec) * inv_det;
        if b1 < 0.0 as Float || b1 > 1.0 as Float {
            return None;
        }
        let qvec: Vector3f = vec3_cross_vec3(&tvec, &e1);
        let b2: Float = vec3_dot_vec3f(&ray.d, &qvec) * inv_det;
        if b2 < 0.0 as Float || b1 + b2 > 1.0 as Float {
            return None;
        }
        let t: Float = vec3_dot_vec3f(&e2, &qvec) * inv_det;
        if t < t_min || t > t_max {
            return None;
        }
        let b0: Float = 1.0 as Float - b1 - b2;
        let n: Normal3f = self.geometric_normal();
        let (shading_n, uv) = self.interpolate(b0, b1, b2);
        // keep the geometric normal on the same side as the shading
        // normal from the mesh
        let n: Normal3f = if nrm_dot_vec3f(&n, &Vector3f::from(shading_n)) < 0.0 as Float {
            -n
        } else {
            n
        };
        let mut tangent: Vector3f = e1 - Vector3f::from(shading_n)
            * vec3_dot_vec3f(&e1, &Vector3f::from(shading_n));
        if tangent.length_squared() < 1e-12 {
            tangent = e2;
        }
        Some(ShapeHit {
            t,
            point: ray.position(t),
            n,
            shading_n,
            tangent: tangent.normalize(),
            uv,
        })
    }
    fn world_bound(&self) -> Bounds3f {
        let (p0, p1, p2) = self.vertices();
        bnd3_union_pnt3f(&Bounds3f::new(p0, p1), &p2)
    }
    fn area(&self) -> Float {
        let (p0, p1, p2) = self.vertices();
        0.5 as Float * vec3_cross_vec3(&(p1 - p0), &(p2 - p0)).length()
    }
    fn sample(&self, u: &Point2f) -> ShapeSample {
        let (p0, p1, p2) = self.vertices();
        let b: Point2f = uniform_sample_triangle(u);
        let b2: Float = 1.0 as Float - b.x - b.y;
        let point: Point3f = p0 * b.x + Vector3f::from(p1) * b.y + Vector3f::from(p2) * b2;
        let (normal, uv) = self.interpolate(b.x, b.y, b2);
        ShapeSample {
            point,
            normal,
            uv,
            pdf: 1.0 as Float / self.area(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> Arc<TriangleMesh> {
        Arc::new(TriangleMesh::new(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![],
            vec![],
            vec![[0, 1, 2], [0, 2, 3]],
        ))
    }

    #[test]
    fn test_intersect_quad() {
        let mesh = quad_mesh();
        let t0 = Triangle::new(mesh.clone(), 0);
        let ray = Ray::new(Point3f::new(0.6, 0.3, 1.0), Vector3f::new(0.0, 0.0, -1.0));
        let hit = t0.intersect(&ray, 1e-4, 1e6).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!(hit.n.z.abs() > 0.999);
        // a ray off the triangle misses
        let miss = Ray::new(Point3f::new(0.1, 0.9, 1.0), Vector3f::new(0.0, 0.0, -1.0));
        assert!(t0.intersect(&miss, 1e-4, 1e6).is_none());
    }

    #[test]
    fn test_area_and_sampling() {
        let mesh = quad_mesh();
        let t0 = Triangle::new(mesh, 0);
        assert!((t0.area() - 0.5).abs() < 1e-6);
        let ss = t0.sample(&Point2f::new(0.3, 0.8));
        assert!((ss.pdf - 2.0).abs() < 1e-5);
        // sampled point lies in the triangle's plane
        assert!(ss.point.z.abs() < 1e-6);
    }
}
