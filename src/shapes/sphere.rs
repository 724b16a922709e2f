//! Spheres, given by a world-space center and radius.

// lumen
use crate::core::frame::Frame;
use crate::core::geometry::{
    pnt3_distance_squaredf, spherical_phi, spherical_theta, vec3_dot_vec3f, Bounds3f, Normal3f,
    Point2f, Point3f, Ray, Vector3f,
};
use crate::core::lumen::{Float, FOUR_PI, INV_2_PI, INV_PI, PI, TWO_PI};
use crate::core::sampling::{uniform_cone_pdf, uniform_sample_sphere, uniform_sphere_pdf};
use crate::core::shape::{Shape, ShapeHit, ShapeSample};

pub struct Sphere {
    pub center: Point3f,
    pub radius: Float,
}

impl Sphere {
    pub fn new(center: Point3f, radius: Float) -> Self {
        Sphere { center, radius }
    }
    fn hit_record(&self, ray: &Ray, t: Float) -> ShapeHit {
        let point: Point3f = ray.position(t);
        let n_vec: Vector3f = (point - self.center) / self.radius;
        let n: Normal3f = Normal3f::from(n_vec);
        let theta: Float = spherical_theta(&n_vec);
        let phi: Float = spherical_phi(&n_vec);
        let uv: Point2f = Point2f {
            x: phi * INV_2_PI,
            y: 1.0 as Float - theta * INV_PI,
        };
        // tangent along increasing phi; degenerate at the poles
        let mut tangent: Vector3f = Vector3f::new(-n_vec.y, n_vec.x, 0.0);
        if tangent.length_squared() < 1e-12 {
            tangent = Vector3f::new(1.0, 0.0, 0.0);
        } else {
            tangent = tangent.normalize();
        }
        ShapeHit {
            t,
            point,
            n,
            shading_n: n,
            tangent,
            uv,
        }
    }
}

impl Shape for Sphere {
    fn intersect(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<ShapeHit> {
        let oc: Vector3f = ray.o - self.center;
        let a: Float = ray.d.length_squared();
        let half_b: Float = vec3_dot_vec3f(&oc, &ray.d);
        let c: Float = oc.length_squared() - self.radius * self.radius;
        let discriminant: Float = half_b * half_b - a * c;
        if discriminant < 0.0 as Float {
            return None;
        }
        let sqrt_d: Float = discriminant.sqrt();
        let mut root: Float = (-half_b - sqrt_d) / a;
        if root < t_min || root > t_max {
            root = (-half_b + sqrt_d) / a;
            if root < t_min || root > t_max {
                return None;
            }
        }
        Some(self.hit_record(ray, root))
    }
    fn intersect_p(&self, ray: &Ray, t_min: Float, t_max: Float) -> bool {
        let oc: Vector3f = ray.o - self.center;
        let a: Float = ray.d.length_squared();
        let half_b: Float = vec3_dot_vec3f(&oc, &ray.d);
        let c: Float = oc.length_squared() - self.radius * self.radius;
        let discriminant: Float = half_b * half_b - a * c;
        if discriminant < 0.0 as Float {
            return false;
        }
        let sqrt_d: Float = discriminant.sqrt();
        let t0: Float = (-half_b - sqrt_d) / a;
        let t1: Float = (-half_b + sqrt_d) / a;
        (t0 >= t_min && t0 <= t_max) || (t1 >= t_min && t1 <= t_max)
    }
    fn world_bound(&self) -> Bounds3f {
        let r: Vector3f = Vector3f::new(self.radius, self.radius, self.radius);
        Bounds3f::new(self.center - r, self.center + r)
    }
    fn area(&self) -> Float {
        FOUR_PI * self.radius * self.radius
    }
    fn sample(&self, u: &Point2f) -> ShapeSample {
        let n_vec: Vector3f = uniform_sample_sphere(*u);
        let point: Point3f = self.center + n_vec * self.radius;
        let theta: Float = spherical_theta(&n_vec);
        let phi: Float = spherical_phi(&n_vec);
        ShapeSample {
            point,
            normal: Normal3f::from(n_vec),
            uv: Point2f {
                x: phi * INV_2_PI,
                y: 1.0 as Float - theta * INV_PI,
            },
            pdf: 1.0 as Float / self.area(),
        }
    }
    fn sample_from(&self, ref_point: &Point3f, u: &Point2f) -> Option<ShapeSample> {
        let dc2: Float = pnt3_distance_squaredf(ref_point, &self.center);
        if dc2 <= self.radius * self.radius {
            // reference is inside the sphere; fall back to area
            // sampling with the solid-angle conversion
            let mut ss: ShapeSample = self.sample(u);
            let mut wi: Vector3f = ss.point - *ref_point;
            let dist2: Float = wi.length_squared();
            if dist2 == 0.0 as Float {
                return None;
            }
            wi = wi / dist2.sqrt();
            let cos_theta: Float = vec3_dot_vec3f(&Vector3f::from(ss.normal), &-wi).abs();
            if cos_theta < 1e-8 {
                return None;
            }
            ss.pdf *= dist2 / cos_theta;
            return Some(ss);
        }
        // sample within the cone the sphere subtends
        let dc: Float = dc2.sqrt();
        let wc: Vector3f = (self.center - *ref_point) / dc;
        let frame: Frame = Frame::from_z(&wc);
        let sin_theta_max2: Float = self.radius * self.radius / dc2;
        let cos_theta_max: Float = (1.0 as Float - sin_theta_max2).max(0.0).sqrt();
        let cos_theta: Float = (1.0 as Float - u.x) + u.x * cos_theta_max;
        let sin_theta2: Float = 1.0 as Float - cos_theta * cos_theta;
        let phi: Float = u.y * TWO_PI;
        // project onto the sphere
        let ds: Float = dc * cos_theta
            - (self.radius * self.radius - dc2 * sin_theta2).max(0.0).sqrt();
        let cos_alpha: Float =
            (dc2 + self.radius * self.radius - ds * ds) / (2.0 as Float * dc * self.radius);
        let sin_alpha: Float = (1.0 as Float - cos_alpha * cos_alpha).max(0.0).sqrt();
        // the sampled normal points back toward the reference
        let n_world: Vector3f =
            frame.x * (sin_alpha * phi.cos()) + frame.y * (sin_alpha * phi.sin()) - wc * cos_alpha;
        let point: Point3f = self.center + n_world * self.radius;
        let theta_sph: Float = spherical_theta(&n_world);
        let phi_sph: Float = spherical_phi(&n_world);
        Some(ShapeSample {
            point,
            normal: Normal3f::from(n_world),
            uv: Point2f {
                x: phi_sph * INV_2_PI,
                y: 1.0 as Float - theta_sph * INV_PI,
            },
            pdf: uniform_cone_pdf(cos_theta_max),
        })
    }
    fn pdf_from(&self, ray: &Ray) -> Float {
        let dc2: Float = pnt3_distance_squaredf(&ray.o, &self.center);
        if dc2 <= self.radius * self.radius {
            // inside: solid-angle pdf of the visible area sample
            if let Some(hit) = self.intersect(ray, 1e-4, std::f32::INFINITY) {
                let dist2: Float = pnt3_distance_squaredf(&ray.o, &hit.point);
                let cos_theta: Float =
                    vec3_dot_vec3f(&Vector3f::from(hit.n), &ray.d).abs();
                if cos_theta < 1e-8 {
                    return 0.0;
                }
                return dist2 / (cos_theta * self.area());
            }
            return uniform_sphere_pdf();
        }
        if !self.intersect_p(ray, 1e-4, std::f32::INFINITY) {
            return 0.0;
        }
        let sin_theta_max2: Float = self.radius * self.radius / dc2;
        let cos_theta_max: Float = (1.0 as Float - sin_theta_max2).max(0.0).sqrt();
        uniform_cone_pdf(cos_theta_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_unit_sphere() {
        let s = Sphere::new(Point3f::default(), 1.0);
        let ray = Ray::new(Point3f::new(0.0, 0.0, 3.0), Vector3f::new(0.0, 0.0, -1.0));
        let hit = s.intersect(&ray, 1e-4, 1e6).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.n.z - 1.0).abs() < 1e-5);
        assert!(s.intersect_p(&ray, 1e-4, 1e6));
    }

    #[test]
    fn test_area() {
        let s = Sphere::new(Point3f::default(), 2.0);
        assert!((s.area() - FOUR_PI * 4.0).abs() < 1e-4);
        assert!(PI > 3.0);
    }

    #[test]
    fn test_cone_sampling_faces_reference() {
        let s = Sphere::new(Point3f::default(), 1.0);
        let ref_point = Point3f::new(0.0, 0.0, 5.0);
        for i in 0..16 {
            let u = Point2f::new((i as Float + 0.5) / 16.0, ((i * 5 % 16) as Float + 0.5) / 16.0);
            let ss = s.sample_from(&ref_point, &u).unwrap();
            // the sampled point must be on the visible hemisphere
            let wi = (ss.point - ref_point).normalize();
            assert!(vec3_dot_vec3f(&Vector3f::from(ss.normal), &wi) < 1e-3);
            assert!(ss.pdf > 0.0);
            // on the sphere surface
            assert!(((ss.point - Point3f::default()).length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_pdf_from_matches_cone() {
        let s = Sphere::new(Point3f::default(), 1.0);
        let o = Point3f::new(0.0, 0.0, 4.0);
        let ray = Ray::new(o, Vector3f::new(0.0, 0.0, -1.0));
        let pdf: Float = s.pdf_from(&ray);
        let cos_theta_max: Float = (1.0 as Float - 1.0 / 16.0).sqrt();
        assert!((pdf - uniform_cone_pdf(cos_theta_max)).abs() / pdf < 1e-4);
    }
}
