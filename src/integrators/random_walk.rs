//! The simplest possible reference integrator: uniform-sphere
//! direction sampling, no roulette.

// others
use bumpalo::Bump;
// lumen
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::{nrm_abs_dot_vec3f, Ray, Vector3f};
use crate::core::integrator::{escaped_radiance, RayIntegrator};
use crate::core::lumen::{Spectrum, INFINITY, RAY_EPSILON};
use crate::core::material::TransportDirection;
use crate::core::reflection::Bsdf;
use crate::core::sampler::Sampler;
use crate::core::sampling::{uniform_sample_sphere, uniform_sphere_pdf};
use crate::core::scene::Scene;

pub struct RandomWalkIntegrator {
    pub max_bounces: i32,
}

impl RandomWalkIntegrator {
    pub fn new(max_bounces: i32) -> Self {
        RandomWalkIntegrator { max_bounces }
    }
    fn walk(
        &self,
        ray: &Ray,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        depth: i32,
    ) -> Spectrum {
        let isect = match scene.intersect(ray, RAY_EPSILON, INFINITY) {
            Some(isect) => isect,
            None => return escaped_radiance(scene, ray),
        };
        let wo: Vector3f = -ray.d;
        let mut l: Spectrum = isect.le(&wo);
        if depth >= self.max_bounces {
            return l;
        }
        let bsdf: Bsdf = match isect.get_bsdf(&wo, arena) {
            Some(bsdf) => bsdf,
            None => {
                let next: Ray = isect.spawn_ray(&ray.d);
                return l + self.walk(&next, scene, sampler, arena, depth);
            }
        };
        let wi: Vector3f = uniform_sample_sphere(sampler.get_2d());
        let f: Spectrum = bsdf.f(&wo, &wi, TransportDirection::ToLight);
        if f.is_black() {
            return l;
        }
        let next: Ray = isect.spawn_ray(&wi);
        l += f
            * nrm_abs_dot_vec3f(&isect.shading.n, &wi)
            * self.walk(&next, scene, sampler, arena, depth + 1)
            / uniform_sphere_pdf();
        l
    }
}

impl RayIntegrator for RandomWalkIntegrator {
    fn li(
        &self,
        ray: &Ray,
        scene: &Scene,
        _camera: &dyn Camera,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        _film: &Film,
    ) -> Spectrum {
        self.walk(ray, scene, sampler, arena, 0)
    }
}
