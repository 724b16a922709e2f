//! A bounding volume hierarchy over primitives, built by recursive
//! midpoint splits and flattened for iterative traversal.

// lumen
use crate::core::geometry::{bnd3_union_bnd3f, Bounds3f, Point3f, Ray, XYZEnum};
use crate::core::interaction::Intersection;
use crate::core::lumen::Float;
use crate::core::primitive::{Intersectable, Primitive};

struct BvhNode {
    bounds: Bounds3f,
    /// Offset of the first primitive for leaves; of the second child
    /// for interior nodes.
    offset: usize,
    n_primitives: usize,
    axis: XYZEnum,
}

pub struct Bvh {
    pub primitives: Vec<Primitive>,
    nodes: Vec<BvhNode>,
    /// Indirection from tree order into `primitives`.
    ordered: Vec<usize>,
}

const MAX_PRIMS_IN_NODE: usize = 4;

impl Bvh {
    pub fn new(primitives: Vec<Primitive>) -> Self {
        let mut indices: Vec<usize> = (0..primitives.len()).collect();
        let centroids: Vec<Point3f> = primitives
            .iter()
            .map(|p| p.world_bound().centroid())
            .collect();
        let bounds: Vec<Bounds3f> = primitives.iter().map(|p| p.world_bound()).collect();
        let mut nodes: Vec<BvhNode> = Vec::new();
        let mut ordered: Vec<usize> = Vec::with_capacity(primitives.len());
        if !primitives.is_empty() {
            build(
                &mut nodes,
                &mut ordered,
                &mut indices,
                &centroids,
                &bounds,
            );
        }
        Bvh {
            primitives,
            nodes,
            ordered,
        }
    }
}

fn build(
    nodes: &mut Vec<BvhNode>,
    ordered: &mut Vec<usize>,
    indices: &mut [usize],
    centroids: &[Point3f],
    bounds: &[Bounds3f],
) -> usize {
    let mut node_bounds: Bounds3f = Bounds3f::default();
    for i in indices.iter() {
        node_bounds = bnd3_union_bnd3f(&node_bounds, &bounds[*i]);
    }
    let node_index: usize = nodes.len();
    if indices.len() <= MAX_PRIMS_IN_NODE {
        // leaf
        nodes.push(BvhNode {
            bounds: node_bounds,
            offset: ordered.len(),
            n_primitives: indices.len(),
            axis: XYZEnum::X,
        });
        ordered.extend_from_slice(indices);
        return node_index;
    }
    // split on the widest centroid axis at the median
    let mut centroid_bounds: Bounds3f = Bounds3f::default();
    for i in indices.iter() {
        centroid_bounds = bnd3_union_bnd3f(
            &centroid_bounds,
            &Bounds3f::new(centroids[*i], centroids[*i]),
        );
    }
    let axis: XYZEnum = centroid_bounds.maximum_extent();
    let mid: usize = indices.len() / 2;
    indices.sort_unstable_by(|a, b| {
        centroids[*a][axis]
            .partial_cmp(&centroids[*b][axis])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    nodes.push(BvhNode {
        bounds: node_bounds,
        offset: 0,
        n_primitives: 0,
        axis,
    });
    let (left, right) = indices.split_at_mut(mid);
    build(nodes, ordered, left, centroids, bounds);
    let second: usize = build(nodes, ordered, right, centroids, bounds);
    nodes[node_index].offset = second;
    node_index
}

impl Intersectable for Bvh {
    fn intersect<'a>(&'a self, ray: &Ray, t_min: Float, t_max: Float) -> Option<Intersection<'a>> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best: Option<Intersection<'a>> = None;
        let mut t_far: Float = t_max;
        let inv_dir_neg: [bool; 3] = [ray.d.x < 0.0, ray.d.y < 0.0, ray.d.z < 0.0];
        let mut to_visit: [usize; 64] = [0; 64];
        let mut to_visit_offset: usize = 0;
        let mut current: usize = 0;
        loop {
            let node: &BvhNode = &self.nodes[current];
            if node.bounds.intersect_b(ray, t_min, t_far) {
                if node.n_primitives > 0 {
                    for i in 0..node.n_primitives {
                        let prim: &Primitive = &self.primitives[self.ordered[node.offset + i]];
                        if let Some(isect) = prim.intersect(ray, t_min, t_far) {
                            t_far = isect.t;
                            best = Some(isect);
                        }
                    }
                    if to_visit_offset == 0 {
                        break;
                    }
                    to_visit_offset -= 1;
                    current = to_visit[to_visit_offset];
                } else {
                    // visit the near child first
                    let axis: usize = node.axis as usize;
                    let near: usize;
                    let far: usize;
                    if inv_dir_neg[axis] {
                        near = node.offset;
                        far = current + 1;
                    } else {
                        near = current + 1;
                        far = node.offset;
                    }
                    to_visit[to_visit_offset] = far;
                    to_visit_offset += 1;
                    current = near;
                }
            } else {
                if to_visit_offset == 0 {
                    break;
                }
                to_visit_offset -= 1;
                current = to_visit[to_visit_offset];
            }
        }
        best
    }
    fn intersect_p(&self, ray: &Ray, t_min: Float, t_max: Float) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let mut to_visit: [usize; 64] = [0; 64];
        let mut to_visit_offset: usize = 0;
        let mut current: usize = 0;
        loop {
            let node: &BvhNode = &self.nodes[current];
            if node.bounds.intersect_b(ray, t_min, t_max) {
                if node.n_primitives > 0 {
                    for i in 0..node.n_primitives {
                        let prim: &Primitive = &self.primitives[self.ordered[node.offset + i]];
                        if prim.intersect_p(ray, t_min, t_max) {
                            return true;
                        }
                    }
                    if to_visit_offset == 0 {
                        break;
                    }
                    to_visit_offset -= 1;
                    current = to_visit[to_visit_offset];
                } else {
                    to_visit[to_visit_offset] = node.offset;
                    to_visit_offset += 1;
                    current += 1;
                }
            } else {
                if to_visit_offset == 0 {
                    break;
                }
                to_visit_offset -= 1;
                current = to_visit[to_visit_offset];
            }
        }
        false
    }
    fn world_bound(&self) -> Bounds3f {
        if self.nodes.is_empty() {
            Bounds3f::default()
        } else {
            self.nodes[0].bounds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vector3f;
    use crate::core::lumen::Spectrum;
    use crate::materials::diffuse::DiffuseMaterial;
    use crate::shapes::sphere::Sphere;
    use std::sync::Arc;

    fn sphere_grid() -> Bvh {
        let material = Arc::new(DiffuseMaterial::from_color(Spectrum::new(0.5)));
        let mut prims: Vec<Primitive> = Vec::new();
        for x in -2..3 {
            for y in -2..3 {
                let shape = Arc::new(Sphere::new(
                    Point3f::new(x as Float * 2.0, y as Float * 2.0, 0.0),
                    0.5,
                ));
                prims.push(Primitive::new(shape, material.clone()));
            }
        }
        Bvh::new(prims)
    }

    #[test]
    fn test_bvh_finds_nearest() {
        let bvh = sphere_grid();
        let ray = Ray::new(Point3f::new(0.0, 0.0, 10.0), Vector3f::new(0.0, 0.0, -1.0));
        let isect = bvh.intersect(&ray, 1e-4, 1e6).unwrap();
        assert!((isect.t - 9.5).abs() < 1e-4);
        assert!(bvh.intersect_p(&ray, 1e-4, 1e6));
        // shadow query with a cut-off before the sphere sees nothing
        assert!(!bvh.intersect_p(&ray, 1e-4, 9.0));
    }

    #[test]
    fn test_bvh_miss() {
        let bvh = sphere_grid();
        let ray = Ray::new(Point3f::new(20.0, 20.0, 10.0), Vector3f::new(0.0, 0.0, -1.0));
        assert!(bvh.intersect(&ray, 1e-4, 1e6).is_none());
    }

    #[test]
    fn test_world_bound_covers_all() {
        let bvh = sphere_grid();
        let b = bvh.world_bound();
        assert!(b.inside(&Point3f::new(4.5, 4.5, 0.0)));
        assert!(b.inside(&Point3f::new(-4.5, -4.5, 0.0)));
    }
}
