//! The scene owns the aggregate and all lights for the duration of a
//! render.

// std
use std::sync::Arc;
// lumen
use crate::accelerators::bvh::Bvh;
use crate::core::geometry::{bnd3_expand, Bounds3f, Ray};
use crate::core::interaction::Intersection;
use crate::core::light::Light;
use crate::core::lumen::Float;
use crate::core::primitive::Intersectable;

pub struct Scene {
    pub aggregate: Bvh,
    pub lights: Vec<Arc<dyn Light>>,
    pub infinite_lights: Vec<Arc<dyn Light>>,
    world_bound: Bounds3f,
}

impl Scene {
    pub fn new(aggregate: Bvh, mut lights: Vec<Arc<dyn Light>>) -> Self {
        let world_bound: Bounds3f = bnd3_expand(&aggregate.world_bound(), 1e-3);
        // lights not shared with primitives (the infinite ones) cache
        // scene-wide state here
        for light in lights.iter_mut() {
            if let Some(light) = Arc::get_mut(light) {
                light.preprocess(&world_bound);
            }
        }
        let infinite_lights: Vec<Arc<dyn Light>> = lights
            .iter()
            .filter(|light| light.is_infinite())
            .cloned()
            .collect();
        Scene {
            aggregate,
            lights,
            infinite_lights,
            world_bound,
        }
    }
    pub fn world_bound(&self) -> Bounds3f {
        self.world_bound
    }
    pub fn intersect<'a>(&'a self, ray: &Ray, t_min: Float, t_max: Float) -> Option<Intersection<'a>> {
        self.aggregate.intersect(ray, t_min, t_max)
    }
    pub fn intersect_p(&self, ray: &Ray, t_min: Float, t_max: Float) -> bool {
        self.aggregate.intersect_p(ray, t_min, t_max)
    }
}

impl Intersectable for Scene {
    fn intersect<'a>(&'a self, ray: &Ray, t_min: Float, t_max: Float) -> Option<Intersection<'a>> {
        self.aggregate.intersect(ray, t_min, t_max)
    }
    fn intersect_p(&self, ray: &Ray, t_min: Float, t_max: Float) -> bool {
        self.aggregate.intersect_p(ray, t_min, t_max)
    }
    fn world_bound(&self) -> Bounds3f {
        self.world_bound
    }
}
