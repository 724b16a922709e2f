//! Primitives bind geometry to appearance; `Intersectable` is the
//! contract the accelerator satisfies.

// std
use std::sync::Arc;
// lumen
use crate::core::geometry::{nrm_dot_vec3f, Bounds3f, Ray};
use crate::core::interaction::{Intersection, Shading};
use crate::core::light::Light;
use crate::core::lumen::{float_word, hash_float, Float, RAY_EPSILON};
use crate::core::material::Material;
use crate::core::medium::MediumInterface;
use crate::core::shape::{Shape, ShapeHit};

pub struct Primitive {
    pub shape: Arc<dyn Shape>,
    /// None marks a boundary-only primitive used for medium
    /// transitions.
    pub material: Option<Arc<dyn Material>>,
    pub medium_interface: MediumInterface,
    pub area_light: Option<Arc<dyn Light>>,
}

impl Primitive {
    pub fn new(shape: Arc<dyn Shape>, material: Arc<dyn Material>) -> Self {
        Primitive {
            shape,
            material: Some(material),
            medium_interface: MediumInterface::default(),
            area_light: None,
        }
    }
    pub fn with_area_light(
        shape: Arc<dyn Shape>,
        material: Arc<dyn Material>,
        area_light: Arc<dyn Light>,
    ) -> Self {
        Primitive {
            shape,
            material: Some(material),
            medium_interface: MediumInterface::default(),
            area_light: Some(area_light),
        }
    }
    pub fn with_medium_interface(
        shape: Arc<dyn Shape>,
        material: Option<Arc<dyn Material>>,
        medium_interface: MediumInterface,
    ) -> Self {
        Primitive {
            shape,
            material,
            medium_interface,
            area_light: None,
        }
    }
    pub fn world_bound(&self) -> Bounds3f {
        self.shape.world_bound()
    }
    pub fn intersect<'a>(&'a self, ray: &Ray, t_min: Float, t_max: Float) -> Option<Intersection<'a>> {
        let hit: ShapeHit = self.shape.intersect(ray, t_min, t_max)?;
        let front_face: bool = nrm_dot_vec3f(&hit.n, &ray.d) < 0.0 as Float;
        let isect: Intersection = Intersection {
            point: hit.point,
            n: hit.n,
            shading: Shading {
                n: hit.shading_n,
                tangent: hit.tangent,
            },
            uv: hit.uv,
            t: hit.t,
            front_face,
            primitive: Some(self),
        };
        // stochastic cutout: the decision hashes the hit point so it
        // is stable across repeated queries
        if let Some(ref material) = self.material {
            let alpha: Float = material.alpha(&isect);
            if alpha < 1.0 as Float {
                let u: Float = hash_float(&[
                    float_word(hit.point.x),
                    float_word(hit.point.y),
                    float_word(hit.point.z),
                ]);
                if u >= alpha {
                    // transparent here; retry past the surface
                    return self.intersect(ray, hit.t + RAY_EPSILON, t_max);
                }
            }
        }
        Some(isect)
    }
    pub fn intersect_p(&self, ray: &Ray, t_min: Float, t_max: Float) -> bool {
        self.shape.intersect_p(ray, t_min, t_max)
    }
}

/// Ray-scene intersection contract; the accelerator is used only
/// through this trait.
pub trait Intersectable: Send + Sync {
    fn intersect<'a>(&'a self, ray: &Ray, t_min: Float, t_max: Float) -> Option<Intersection<'a>>;
    fn intersect_p(&self, ray: &Ray, t_min: Float, t_max: Float) -> bool;
    fn world_bound(&self) -> Bounds3f;
}
