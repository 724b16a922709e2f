//! Surface intersections and the helpers integrators use at them.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::bssrdf::Bssrdf;
use crate::core::geometry::{nrm_dot_vec3f, vec3_cross_vec3, Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::light::Light;
use crate::core::lumen::{Float, Spectrum};
use crate::core::medium::Medium;
use crate::core::primitive::Primitive;
use crate::core::reflection::Bsdf;

#[derive(Debug, Default, Copy, Clone)]
pub struct Shading {
    pub n: Normal3f,
    pub tangent: Vector3f,
}

/// Everything the integrators need to know about a ray-surface hit.
/// The intersection borrows the primitive; it owns no allocations.
#[derive(Default, Clone)]
pub struct Intersection<'a> {
    pub point: Point3f,
    /// Outward geometric normal.
    pub n: Normal3f,
    pub shading: Shading,
    pub uv: Point2f,
    pub t: Float,
    /// True when the ray arrived from the outside (wo . n > 0).
    pub front_face: bool,
    pub primitive: Option<&'a Primitive>,
}

impl<'a> Intersection<'a> {
    /// Emitted radiance toward wo, non-black only when the primitive's
    /// material is emissive.
    pub fn le(&self, wo: &Vector3f) -> Spectrum {
        if let Some(prim) = self.primitive {
            if let Some(ref material) = prim.material {
                return material.le(self, wo);
            }
        }
        Spectrum::default()
    }
    pub fn area_light(&self) -> Option<&Arc<dyn Light>> {
        self.primitive.and_then(|prim| prim.area_light.as_ref())
    }
    /// Build the BSDF in the given arena, resolving the normal map
    /// first. Returns None for boundary-only primitives (pure medium
    /// transitions).
    pub fn get_bsdf<'b>(&self, wo: &Vector3f, arena: &'b Bump) -> Option<Bsdf<'b>> {
        let prim: &Primitive = self.primitive?;
        let material = prim.material.as_ref()?;
        if let Some(normal_map) = material.normal_map() {
            let texel: Spectrum = normal_map.evaluate(&self.uv);
            let n_local: Vector3f = Vector3f {
                x: 2.0 as Float * texel.c[0] - 1.0,
                y: 2.0 as Float * texel.c[1] - 1.0,
                z: 2.0 as Float * texel.c[2] - 1.0,
            }
            .normalize();
            let n: Vector3f = Vector3f::from(self.shading.n);
            let t: Vector3f = self.shading.tangent;
            let b: Vector3f = vec3_cross_vec3(&n, &t);
            let perturbed: Vector3f = (t * n_local.x + b * n_local.y + n * n_local.z).normalize();
            let mut mapped: Intersection = self.clone();
            mapped.shading.n = Normal3f::from(perturbed);
            return material.get_bsdf(&mapped, wo, arena);
        }
        material.get_bsdf(self, wo, arena)
    }
    pub fn get_bssrdf(&self, wo: &Vector3f) -> Option<Bssrdf> {
        let prim: &Primitive = self.primitive?;
        let material = prim.material.as_ref()?;
        material.get_bssrdf(self, wo)
    }
    /// Select the medium on the side of the surface the direction
    /// points into.
    pub fn get_medium(&self, w: &Vector3f) -> Option<Arc<Medium>> {
        let prim: &Primitive = self.primitive?;
        if nrm_dot_vec3f(&self.n, w) > 0.0 as Float {
            prim.medium_interface.outside.clone()
        } else {
            prim.medium_interface.inside.clone()
        }
    }
    /// Continue a path from this intersection; the new ray carries the
    /// medium on its side of the boundary.
    pub fn spawn_ray(&self, d: &Vector3f) -> Ray {
        Ray {
            o: self.point,
            d: *d,
            medium: self.get_medium(d),
        }
    }
}
