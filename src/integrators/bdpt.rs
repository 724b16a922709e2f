//! Bidirectional path tracing: subpaths are traced from both the
//! camera and a light, every endpoint pairing becomes a connection
//! strategy, and the strategies are combined with the balance
//! heuristic over vertex-area densities.

// std
use std::sync::Arc;
// others
use bumpalo::Bump;
// lumen
use crate::core::camera::Camera;
use crate::core::film::Film;
use crate::core::geometry::{nrm_abs_dot_vec3f, Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::integrator::{transmittance, RayIntegrator};
use crate::core::interaction::Intersection;
use crate::core::light::Light;
use crate::core::lightdistrib::LightSampler;
use crate::core::lumen::{
    clamp_t, float_word, hash_u64, Float, Spectrum, INFINITY, PI, RAY_EPSILON,
};
use crate::core::material::TransportDirection;
use crate::core::medium::{HenyeyGreenstein, Medium};
use crate::core::reflection::{Bsdf, BsdfSample, SAMPLE_ALL};
use crate::core::rng::Rng;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;

pub struct BdptIntegrator {
    pub max_bounces: i32,
    pub light_sampler: Box<dyn LightSampler>,
    pub volumetric: bool,
}

enum VertexPayload<'v> {
    Camera,
    /// None marks the aggregate of infinite lights reached by an
    /// escaped camera ray.
    Light(Option<Arc<dyn Light>>),
    Surface {
        bsdf: Bsdf<'v>,
        isect: Intersection<'v>,
    },
    Medium(HenyeyGreenstein),
}

struct Vertex<'v> {
    payload: VertexPayload<'v>,
    point: Point3f,
    ng: Normal3f,
    ns: Normal3f,
    /// Toward the previous vertex (unset at subpath origins).
    wo: Vector3f,
    beta: Spectrum,
    pdf_fwd: Float,
    pdf_rev: Float,
    delta: bool,
    medium: Option<Arc<Medium>>,
}

impl<'v> Vertex<'v> {
    fn is_on_surface(&self) -> bool {
        self.ng != Normal3f::default()
    }
    fn is_light(&self) -> bool {
        match &self.payload {
            VertexPayload::Light(_) => true,
            VertexPayload::Surface { isect, .. } => isect.area_light().is_some(),
            _ => false,
        }
    }
    fn is_infinite_light(&self) -> bool {
        matches!(&self.payload, VertexPayload::Light(None))
    }
    fn is_delta_light(&self) -> bool {
        match &self.payload {
            VertexPayload::Light(Some(light)) => light.is_delta(),
            _ => false,
        }
    }
    fn area_light(&self) -> Option<Arc<dyn Light>> {
        match &self.payload {
            VertexPayload::Light(Some(light)) => Some(light.clone()),
            VertexPayload::Surface { isect, .. } => isect.area_light().cloned(),
            _ => None,
        }
    }
    fn is_connectible(&self) -> bool {
        match &self.payload {
            VertexPayload::Camera => true,
            VertexPayload::Light(light) => light.is_some(),
            VertexPayload::Surface { bsdf, .. } => !bsdf.is_specular(),
            VertexPayload::Medium(_) => true,
        }
    }
    /// Emitted radiance toward another vertex.
    fn le(&self, scene: &Scene, toward: &Vertex) -> Spectrum {
        if self.is_infinite_light() {
            // wo points back along the escaped ray
            let ray: Ray = Ray::new(toward.point, -self.wo);
            let mut le: Spectrum = Spectrum::default();
            for light in &scene.infinite_lights {
                le += light.le(&ray);
            }
            return le;
        }
        if let VertexPayload::Surface { isect, .. } = &self.payload {
            let mut w: Vector3f = toward.point - self.point;
            if w.length_squared() == 0.0 as Float {
                return Spectrum::default();
            }
            w = w.normalize();
            return isect.le(&w);
        }
        Spectrum::default()
    }
    /// Evaluate the scattering term toward another vertex, correcting
    /// shading-normal asymmetry on light paths.
    fn f(&self, next: &Vertex, direction: TransportDirection) -> Spectrum {
        let mut wi: Vector3f = next.point - self.point;
        if wi.length_squared() == 0.0 as Float {
            return Spectrum::default();
        }
        wi = wi.normalize();
        match &self.payload {
            VertexPayload::Surface { bsdf, isect } => {
                bsdf.f(&self.wo, &wi, direction)
                    * correct_shading_normal(isect, &self.wo, &wi, direction)
            }
            VertexPayload::Medium(phase) => Spectrum::new(phase.p(&self.wo, &wi)),
            _ => Spectrum::default(),
        }
    }
    /// Convert a solid-angle density at this vertex to an area density
    /// at `next`.
    fn convert_density(&self, pdf: Float, next: &Vertex) -> Float {
        if next.is_infinite_light() {
            return pdf;
        }
        let w: Vector3f = next.point - self.point;
        let dist2: Float = w.length_squared();
        if dist2 == 0.0 as Float {
            return 0.0;
        }
        let mut pdf: Float = pdf / dist2;
        if next.is_on_surface() {
            pdf *= nrm_abs_dot_vec3f(&next.ng, &(w / dist2.sqrt()));
        }
        pdf
    }
    /// Area density of generating `next` from this vertex when the
    /// previous vertex along the new path is `prev`.
    fn pdf(
        &self,
        scene: &Scene,
        camera: &dyn Camera,
        prev: Option<&Vertex>,
        next: &Vertex,
    ) -> Float {
        if let VertexPayload::Light(_) = self.payload {
            return self.pdf_light_dir(scene, next);
        }
        let mut wn: Vector3f = next.point - self.point;
        if wn.length_squared() == 0.0 as Float {
            return 0.0;
        }
        wn = wn.normalize();
        let wo: Vector3f = match prev {
            Some(prev) => {
                let mut w: Vector3f = prev.point - self.point;
                if w.length_squared() == 0.0 as Float {
                    return 0.0;
                }
                w = w.normalize();
                w
            }
            None => self.wo,
        };
        let pdf_solid: Float = match &self.payload {
            VertexPayload::Surface { bsdf, .. } => {
                bsdf.pdf(&wo, &wn, TransportDirection::ToLight, SAMPLE_ALL)
            }
            VertexPayload::Medium(phase) => phase.pdf(&wo, &wn),
            VertexPayload::Camera => camera.pdf_we(&Ray::new(self.point, wn)).1,
            VertexPayload::Light(_) => unreachable!(),
        };
        self.convert_density(pdf_solid, next)
    }
    /// Directional emission density when this vertex is the source of
    /// the light subpath.
    fn pdf_light_dir(&self, scene: &Scene, next: &Vertex) -> Float {
        let mut w: Vector3f = next.point - self.point;
        let dist2: Float = w.length_squared();
        if dist2 == 0.0 as Float {
            return 0.0;
        }
        w = w / dist2.sqrt();
        let mut pdf: Float;
        if self.is_infinite_light() {
            let (_c, radius) = scene.world_bound().bounding_sphere();
            pdf = 1.0 as Float / (PI * radius * radius);
        } else {
            let light: Arc<dyn Light> = match self.area_light() {
                Some(light) => light,
                None => return 0.0,
            };
            let (_pdf_p, pdf_w) = if light.is_area() {
                light.pdf_le_at(&self.ns, &w)
            } else {
                light.pdf_le(&Ray::new(self.point, w))
            };
            pdf = pdf_w / dist2;
        }
        if next.is_on_surface() {
            pdf *= nrm_abs_dot_vec3f(&next.ng, &w);
        }
        pdf
    }
    /// Density of choosing this vertex as the origin of a light
    /// subpath.
    fn pdf_light_origin(
        &self,
        scene: &Scene,
        next: &Vertex,
        light_sampler: &dyn LightSampler,
    ) -> Float {
        let mut w: Vector3f = next.point - self.point;
        if w.length_squared() == 0.0 as Float {
            return 0.0;
        }
        w = w.normalize();
        if self.is_infinite_light() {
            let mut pdf: Float = 0.0;
            for light in &scene.infinite_lights {
                pdf += light_sampler.pmf(light) * light.pdf_li(&Ray::new(next.point, -w));
            }
            return pdf;
        }
        let light: Arc<dyn Light> = match self.area_light() {
            Some(light) => light,
            None => return 0.0,
        };
        let pdf_p: Float = if light.is_area() {
            light.pdf_le_at(&self.ns, &w).0
        } else {
            1.0
        };
        light_sampler.pmf(&light) * pdf_p
    }
}

/// Adjoint BSDF correction for shading normals when radiance flows
/// from the lights.
fn correct_shading_normal(
    isect: &Intersection,
    wo: &Vector3f,
    wi: &Vector3f,
    direction: TransportDirection,
) -> Float {
    if direction == TransportDirection::ToCamera {
        let num: Float = nrm_abs_dot_vec3f(&isect.shading.n, wo) * nrm_abs_dot_vec3f(&isect.n, wi);
        let denom: Float =
            nrm_abs_dot_vec3f(&isect.n, wo) * nrm_abs_dot_vec3f(&isect.shading.n, wi);
        if denom == 0.0 as Float {
            return 0.0;
        }
        num / denom
    } else {
        1.0
    }
}

impl BdptIntegrator {
    pub fn new(max_bounces: i32, light_sampler: Box<dyn LightSampler>, volumetric: bool) -> Self {
        BdptIntegrator {
            max_bounces,
            light_sampler,
            volumetric,
        }
    }
    /// Extend a subpath by sampling the scattering function at each
    /// vertex; shared by both subpath generators.
    #[allow(clippy::too_many_arguments)]
    fn random_walk<'v>(
        &self,
        scene: &'v Scene,
        sampler: &mut dyn Sampler,
        arena: &'v Bump,
        mut ray: Ray,
        mut beta: Spectrum,
        mut pdf_dir: Float,
        max_depth: i32,
        direction: TransportDirection,
        path: &mut Vec<Vertex<'v>>,
    ) {
        if max_depth == 0 {
            return;
        }
        loop {
            if beta.is_black() {
                break;
            }
            let isect: Option<Intersection> = scene.intersect(&ray, RAY_EPSILON, INFINITY);
            // medium interaction between the vertices
            if self.volumetric {
                if let Some(medium) = ray.medium.clone() {
                    let t_max: Float = isect
                        .as_ref()
                        .map(|i| i.t)
                        .unwrap_or_else(|| 4.0 * scene.world_bound().diagonal().length().max(1.0));
                    let (event, weight) =
                        medium.sample_distance(&ray, t_max, sampler.get_1d(), sampler.get_1d());
                    beta *= weight;
                    if let Some((t, ms)) = event {
                        let p: Point3f = ray.position(t);
                        let prev_index: usize = path.len() - 1;
                        let pdf_fwd: Float = path[prev_index].convert_density(
                            pdf_dir,
                            &medium_proxy(p),
                        );
                        path.push(Vertex {
                            payload: VertexPayload::Medium(ms.phase),
                            point: p,
                            ng: Normal3f::default(),
                            ns: Normal3f::default(),
                            wo: -ray.d,
                            beta,
                            pdf_fwd,
                            pdf_rev: 0.0,
                            delta: false,
                            medium: ray.medium.clone(),
                        });
                        if path.len() as i32 >= max_depth + 1 {
                            break;
                        }
                        let wo: Vector3f = -ray.d;
                        let ps = match ms.phase.sample_p(&wo, &sampler.get_2d()) {
                            Some(ps) => ps,
                            None => break,
                        };
                        beta *= ps.p / ps.pdf;
                        pdf_dir = ps.pdf;
                        // reverse density back toward the previous
                        // vertex
                        let pdf_rev_solid: Float = ms.phase.pdf(&ps.wi, &wo);
                        let vertex_index: usize = path.len() - 1;
                        let pdf_rev: Float = {
                            let (left, right) = path.split_at(vertex_index);
                            right[0].convert_density(pdf_rev_solid, &left[prev_index])
                        };
                        path[prev_index].pdf_rev = pdf_rev;
                        ray = Ray {
                            o: p,
                            d: ps.wi,
                            medium: ray.medium.clone(),
                        };
                        continue;
                    }
                }
            }
            let isect: Intersection = match isect {
                Some(isect) => isect,
                None => {
                    // escaped camera rays become pseudo light vertices
                    // so the s=0 strategy can see the environment
                    if direction == TransportDirection::ToLight
                        && !scene.infinite_lights.is_empty()
                    {
                        let (_c, radius) = scene.world_bound().bounding_sphere();
                        path.push(Vertex {
                            payload: VertexPayload::Light(None),
                            point: ray.o + ray.d * (2.0 as Float * radius),
                            ng: Normal3f::default(),
                            ns: Normal3f::default(),
                            wo: -ray.d,
                            beta,
                            pdf_fwd: pdf_dir,
                            pdf_rev: 0.0,
                            delta: false,
                            medium: None,
                        });
                    }
                    break;
                }
            };
            let wo: Vector3f = -ray.d.normalize();
            let bsdf: Bsdf = match isect.get_bsdf(&wo, arena) {
                Some(bsdf) => bsdf,
                None => {
                    ray = isect.spawn_ray(&ray.d);
                    continue;
                }
            };
            let prev_index: usize = path.len() - 1;
            let medium_here: Option<Arc<Medium>> = isect.get_medium(&wo);
            let vertex: Vertex = Vertex {
                point: isect.point,
                ng: isect.n,
                ns: isect.shading.n,
                wo,
                beta,
                pdf_fwd: 0.0,
                pdf_rev: 0.0,
                delta: false,
                medium: medium_here,
                payload: VertexPayload::Surface {
                    bsdf,
                    isect: isect.clone(),
                },
            };
            let pdf_fwd: Float = path[prev_index].convert_density(pdf_dir, &vertex);
            path.push(vertex);
            let vertex_index: usize = path.len() - 1;
            path[vertex_index].pdf_fwd = pdf_fwd;
            if path.len() as i32 >= max_depth + 1 {
                break;
            }
            // sample the next direction
            let bs: BsdfSample = {
                let bsdf: &Bsdf = match &path[vertex_index].payload {
                    VertexPayload::Surface { bsdf, .. } => bsdf,
                    _ => unreachable!(),
                };
                match bsdf.sample_f(
                    &wo,
                    sampler.get_1d(),
                    &sampler.get_2d(),
                    direction,
                    SAMPLE_ALL,
                ) {
                    Some(bs) => bs,
                    None => break,
                }
            };
            pdf_dir = bs.pdf;
            let mut pdf_rev_solid: Float;
            {
                let bsdf: &Bsdf = match &path[vertex_index].payload {
                    VertexPayload::Surface { bsdf, .. } => bsdf,
                    _ => unreachable!(),
                };
                if bs.pdf_is_proportional {
                    pdf_dir = bsdf.pdf(&wo, &bs.wi, direction, SAMPLE_ALL);
                }
                pdf_rev_solid = bsdf.pdf(&bs.wi, &wo, direction, SAMPLE_ALL);
            }
            beta *= bs.f * nrm_abs_dot_vec3f(&isect.shading.n, &bs.wi) / bs.pdf;
            beta *= correct_shading_normal(&isect, &wo, &bs.wi, direction);
            if bs.is_specular() {
                path[vertex_index].delta = true;
                pdf_dir = 0.0;
                pdf_rev_solid = 0.0;
            }
            let pdf_rev: Float = {
                let (left, right) = path.split_at(vertex_index);
                right[0].convert_density(pdf_rev_solid, &left[prev_index])
            };
            path[prev_index].pdf_rev = pdf_rev;
            ray = isect.spawn_ray(&bs.wi);
        }
    }
    fn generate_camera_subpath<'v>(
        &self,
        scene: &'v Scene,
        camera: &dyn Camera,
        sampler: &mut dyn Sampler,
        arena: &'v Bump,
        ray: &Ray,
        path: &mut Vec<Vertex<'v>>,
    ) {
        let beta: Spectrum = Spectrum::new(1.0);
        path.push(Vertex {
            payload: VertexPayload::Camera,
            point: ray.o,
            ng: Normal3f::default(),
            ns: Normal3f::default(),
            wo: Vector3f::default(),
            beta,
            pdf_fwd: 1.0,
            pdf_rev: 0.0,
            delta: false,
            medium: ray.medium.clone(),
        });
        let (_pdf_p, pdf_w) = camera.pdf_we(ray);
        self.random_walk(
            scene,
            sampler,
            arena,
            ray.clone(),
            beta,
            pdf_w.max(1e-9),
            self.max_bounces + 1,
            TransportDirection::ToLight,
            path,
        );
    }
    fn generate_light_subpath<'v>(
        &self,
        scene: &'v Scene,
        sampler: &mut dyn Sampler,
        arena: &'v Bump,
        path: &mut Vec<Vertex<'v>>,
    ) {
        let sl = match self.light_sampler.sample(sampler.get_1d()) {
            Some(sl) => sl,
            None => return,
        };
        let le_sample = match sl.light.sample_le(sampler.get_2d(), sampler.get_2d()) {
            Some(le_sample) => le_sample,
            None => return,
        };
        if le_sample.pdf_p == 0.0 as Float || le_sample.pdf_w == 0.0 as Float {
            return;
        }
        path.push(Vertex {
            payload: VertexPayload::Light(Some(sl.light.clone())),
            point: le_sample.ray.o,
            ng: le_sample.normal,
            ns: le_sample.normal,
            wo: Vector3f::default(),
            beta: le_sample.le,
            pdf_fwd: le_sample.pdf_p * sl.pmf,
            pdf_rev: 0.0,
            delta: sl.light.is_delta(),
            medium: le_sample.medium.clone(),
        });
        let cos_term: Float = if le_sample.normal == Normal3f::default() {
            1.0
        } else {
            nrm_abs_dot_vec3f(&le_sample.normal, &le_sample.ray.d)
        };
        let beta: Spectrum =
            le_sample.le * (cos_term / (sl.pmf * le_sample.pdf_p * le_sample.pdf_w));
        let mut ray: Ray = le_sample.ray.clone();
        ray.medium = le_sample.medium.clone();
        self.random_walk(
            scene,
            sampler,
            arena,
            ray,
            beta,
            le_sample.pdf_w,
            self.max_bounces,
            TransportDirection::ToCamera,
            path,
        );
    }
    /// Geometry term of a connection, including transmittance.
    fn g(&self, scene: &Scene, a: &Vertex, b: &Vertex, wavelength: usize) -> Spectrum {
        let mut d: Vector3f = b.point - a.point;
        let dist2: Float = d.length_squared();
        if dist2 == 0.0 as Float {
            return Spectrum::default();
        }
        d = d / dist2.sqrt();
        let mut g: Float = 1.0 as Float / dist2;
        if a.is_on_surface() {
            g *= nrm_abs_dot_vec3f(&a.ns, &d);
        }
        if b.is_on_surface() {
            g *= nrm_abs_dot_vec3f(&b.ns, &d);
        }
        if g == 0.0 as Float {
            return Spectrum::default();
        }
        self.visibility(scene, a, b, wavelength) * g
    }
    /// Binary visibility or ratio-tracked transmittance.
    fn visibility(&self, scene: &Scene, a: &Vertex, b: &Vertex, wavelength: usize) -> Spectrum {
        if self.volumetric {
            let mut rng: Rng = Rng::new(
                hash_u64(&[
                    float_word(a.point.x),
                    float_word(a.point.y),
                    float_word(a.point.z),
                ]),
                hash_u64(&[
                    float_word(b.point.x),
                    float_word(b.point.y),
                    float_word(b.point.z),
                ]),
            );
            transmittance(scene, &a.point, &b.point, a.medium.clone(), wavelength, &mut rng)
        } else {
            let mut d: Vector3f = b.point - a.point;
            let dist: Float = d.length();
            if dist == 0.0 as Float {
                return Spectrum::default();
            }
            d = d / dist;
            let mut ray: Ray = Ray::new(a.point, d);
            let mut remaining: Float = dist;
            while remaining > 1e-3 {
                match scene.intersect(&ray, RAY_EPSILON, remaining - 1e-3) {
                    Some(isect) => {
                        if let Some(prim) = isect.primitive {
                            if prim.material.is_some() {
                                return Spectrum::default();
                            }
                        }
                        remaining -= isect.t;
                        ray.o = isect.point;
                    }
                    None => break,
                }
            }
            Spectrum::new(1.0)
        }
    }
    /// Balance-heuristic weight of strategy (s, t) against all other
    /// strategies with the same path length.
    #[allow(clippy::too_many_arguments)]
    fn mis_weight(
        &self,
        scene: &Scene,
        camera: &dyn Camera,
        light_vertices: &[Vertex],
        camera_vertices: &[Vertex],
        sampled: Option<&Vertex>,
        s: usize,
        t: usize,
    ) -> Float {
        if s + t == 2 {
            return 1.0;
        }
        // treat delta densities as one
        let remap0 = |f: Float| if f != 0.0 as Float { f } else { 1.0 };
        // effective vertex lookup with the sampled endpoint patched in
        fn effective<'e, 'w>(
            vertices: &'e [Vertex<'w>],
            sampled: Option<&'e Vertex<'w>>,
            replaced: Option<usize>,
            i: usize,
        ) -> &'e Vertex<'w> {
            if let (Some(sampled), Some(replaced)) = (sampled, replaced) {
                if i == replaced {
                    return sampled;
                }
            }
            &vertices[i]
        }
        let lv_replaced: Option<usize> = if s == 1 { Some(0) } else { None };
        let cv_replaced: Option<usize> = if t == 1 { Some(t - 1) } else { None };
        let lv = |i: usize| effective(light_vertices, sampled, lv_replaced, i);
        let cv = |i: usize| effective(camera_vertices, sampled, cv_replaced, i);
        // updated reverse densities at the connection
        let pt_pdf_rev: Float = if t > 0 {
            if s > 0 {
                let prev = if s > 1 { Some(lv(s - 2)) } else { None };
                lv(s - 1).pdf(scene, camera, prev, cv(t - 1))
            } else {
                cv(t - 1).pdf_light_origin(scene, cv(t - 2), self.light_sampler.as_ref())
            }
        } else {
            0.0
        };
        let pt_minus_pdf_rev: Float = if t > 1 {
            if s > 0 {
                cv(t - 1).pdf(scene, camera, Some(lv(s - 1)), cv(t - 2))
            } else {
                cv(t - 1).pdf_light_dir(scene, cv(t - 2))
            }
        } else {
            0.0
        };
        let qs_pdf_rev: Float = if s > 0 {
            let prev = if t > 1 { Some(cv(t - 2)) } else { None };
            cv(t - 1).pdf(scene, camera, prev, lv(s - 1))
        } else {
            0.0
        };
        let qs_minus_pdf_rev: Float = if s > 1 {
            lv(s - 1).pdf(scene, camera, Some(cv(t - 1)), lv(s - 2))
        } else {
            0.0
        };
        let cv_pdf_rev = |i: usize| -> Float {
            if i == t - 1 {
                pt_pdf_rev
            } else if t >= 2 && i == t - 2 {
                pt_minus_pdf_rev
            } else {
                cv(i).pdf_rev
            }
        };
        let lv_pdf_rev = |i: usize| -> Float {
            if i == s - 1 {
                qs_pdf_rev
            } else if s >= 2 && i == s - 2 {
                qs_minus_pdf_rev
            } else {
                lv(i).pdf_rev
            }
        };
        let mut sum_ri: Float = 0.0;
        // strategies that shorten the camera subpath
        let mut ri: Float = 1.0;
        let mut i: isize = t as isize - 1;
        while i > 0 {
            let iu: usize = i as usize;
            ri *= remap0(cv_pdf_rev(iu)) / remap0(cv(iu).pdf_fwd);
            let prev_delta: bool = if iu >= 1 { cv(iu - 1).delta } else { false };
            if !cv(iu).delta && !prev_delta {
                sum_ri += ri;
            }
            i -= 1;
        }
        // strategies that shorten the light subpath
        let mut ri: Float = 1.0;
        let mut i: isize = s as isize - 1;
        while i >= 0 {
            let iu: usize = i as usize;
            ri *= remap0(lv_pdf_rev(iu)) / remap0(lv(iu).pdf_fwd);
            let prev_delta: bool = if iu > 0 {
                lv(iu - 1).delta
            } else {
                lv(0).is_delta_light()
            };
            if !lv(iu).delta && !prev_delta {
                sum_ri += ri;
            }
            i -= 1;
        }
        1.0 as Float / (1.0 as Float + sum_ri)
    }
    /// Evaluate a single (s, t) connection strategy.
    #[allow(clippy::too_many_arguments)]
    fn connect(
        &self,
        scene: &Scene,
        camera: &dyn Camera,
        light_vertices: &[Vertex],
        camera_vertices: &[Vertex],
        s: usize,
        t: usize,
        sampler: &mut dyn Sampler,
        wavelength: usize,
        p_raster: &mut Option<Point2f>,
    ) -> Spectrum {
        // reject invalid pairings of a light endpoint with extra light
        // vertices
        if s > 0 && t > 1 && camera_vertices[t - 1].is_light() {
            return Spectrum::default();
        }
        let mut sampled: Option<Vertex> = None;
        let mut l: Spectrum = Spectrum::default();
        if s == 0 {
            // the camera subpath already carries the full path
            let pt: &Vertex = &camera_vertices[t - 1];
            if pt.is_light() {
                l = pt.le(scene, &camera_vertices[t - 2]) * pt.beta;
            }
        } else if t == 1 {
            // connect the light subpath to the camera
            let qs: &Vertex = &light_vertices[s - 1];
            if qs.is_connectible() {
                if let Some(cs) = camera.sample_wi(&qs.point, &sampler.get_2d()) {
                    if cs.pdf > 0.0 as Float && !cs.we.is_black() {
                        let new_vertex: Vertex = Vertex {
                            payload: VertexPayload::Camera,
                            point: cs.p_aperture,
                            ng: Normal3f::default(),
                            ns: Normal3f::default(),
                            wo: Vector3f::default(),
                            beta: cs.we / cs.pdf,
                            pdf_fwd: 0.0,
                            pdf_rev: 0.0,
                            delta: false,
                            medium: camera.medium(),
                        };
                        l = qs.beta
                            * qs.f(&new_vertex, TransportDirection::ToCamera)
                            * new_vertex.beta;
                        if qs.is_on_surface() {
                            l *= nrm_abs_dot_vec3f(&qs.ns, &cs.wi);
                        }
                        if !l.is_black() {
                            l *= self.visibility(scene, qs, &new_vertex, wavelength);
                        }
                        *p_raster = Some(cs.p_raster);
                        sampled = Some(new_vertex);
                    }
                }
            }
        } else if s == 1 {
            // sample a light vertex for the camera subpath's endpoint
            let pt: &Vertex = &camera_vertices[t - 1];
            if pt.is_connectible() {
                if let Some(sl) = self.light_sampler.sample(sampler.get_1d()) {
                    if let Some(ls) = sl.light.sample_li(&pt.point, sampler.get_2d()) {
                        if ls.pdf > 0.0 as Float && !ls.li.is_black() {
                            let mut new_vertex: Vertex = Vertex {
                                payload: VertexPayload::Light(Some(sl.light.clone())),
                                point: ls.point,
                                ng: ls.normal,
                                ns: ls.normal,
                                wo: Vector3f::default(),
                                beta: ls.li / (ls.pdf * sl.pmf),
                                pdf_fwd: 0.0,
                                pdf_rev: 0.0,
                                delta: sl.light.is_delta(),
                                medium: None,
                            };
                            new_vertex.pdf_fwd =
                                new_vertex.pdf_light_origin(scene, pt, self.light_sampler.as_ref());
                            l = pt.beta
                                * pt.f(&new_vertex, TransportDirection::ToLight)
                                * new_vertex.beta;
                            if pt.is_on_surface() {
                                l *= nrm_abs_dot_vec3f(&pt.ns, &ls.wi);
                            }
                            if !l.is_black() {
                                l *= self.visibility(scene, pt, &new_vertex, wavelength);
                            }
                            sampled = Some(new_vertex);
                        }
                    }
                }
            }
        } else {
            // join the two subpath endpoints
            let qs: &Vertex = &light_vertices[s - 1];
            let pt: &Vertex = &camera_vertices[t - 1];
            if qs.is_connectible() && pt.is_connectible() {
                l = qs.beta
                    * qs.f(pt, TransportDirection::ToCamera)
                    * pt.f(qs, TransportDirection::ToLight)
                    * pt.beta;
                if !l.is_black() {
                    l *= self.g(scene, qs, pt, wavelength);
                }
            }
        }
        if l.is_black() {
            return l;
        }
        let weight: Float = self.mis_weight(
            scene,
            camera,
            light_vertices,
            camera_vertices,
            sampled.as_ref(),
            s,
            t,
        );
        l * weight
    }
}

fn medium_proxy<'v>(p: Point3f) -> Vertex<'v> {
    Vertex {
        payload: VertexPayload::Medium(HenyeyGreenstein::new(0.0)),
        point: p,
        ng: Normal3f::default(),
        ns: Normal3f::default(),
        wo: Vector3f::default(),
        beta: Spectrum::default(),
        pdf_fwd: 0.0,
        pdf_rev: 0.0,
        delta: false,
        medium: None,
    }
}

impl RayIntegrator for BdptIntegrator {
    fn li(
        &self,
        primary_ray: &Ray,
        scene: &Scene,
        camera: &dyn Camera,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        film: &Film,
    ) -> Spectrum {
        let wavelength: usize = if self.volumetric {
            clamp_t((sampler.get_1d() * 3.0) as usize, 0, 2)
        } else {
            0
        };
        let mut camera_vertices: Vec<Vertex> = Vec::with_capacity(self.max_bounces as usize + 2);
        let mut light_vertices: Vec<Vertex> = Vec::with_capacity(self.max_bounces as usize + 1);
        self.generate_camera_subpath(
            scene,
            camera,
            sampler,
            arena,
            primary_ray,
            &mut camera_vertices,
        );
        self.generate_light_subpath(scene, sampler, arena, &mut light_vertices);
        let n_camera: usize = camera_vertices.len();
        let n_light: usize = light_vertices.len();
        let mut l: Spectrum = Spectrum::default();
        for t in 1..=n_camera {
            for s in 0..=n_light {
                let depth: i32 = s as i32 + t as i32 - 2;
                if (s == 1 && t == 1) || depth < 0 || depth > self.max_bounces {
                    continue;
                }
                let mut p_raster: Option<Point2f> = None;
                let l_path: Spectrum = self.connect(
                    scene,
                    camera,
                    &light_vertices,
                    &camera_vertices,
                    s,
                    t,
                    sampler,
                    wavelength,
                    &mut p_raster,
                );
                if t == 1 {
                    if let Some(p_raster) = p_raster {
                        if !l_path.is_black() {
                            film.add_splat(&p_raster, l_path);
                        }
                    }
                } else {
                    l += l_path;
                }
            }
        }
        l
    }
}
