//! Built-in demo scenes for the command line and the test fixtures.

// std
use std::sync::Arc;
// lumen
use crate::accelerators::bvh::Bvh;
use crate::core::geometry::{Point2f, Point2i, Point3f, Vector3f};
use crate::core::light::Light;
use crate::core::lumen::{Float, Spectrum};
use crate::core::material::Material;
use crate::core::medium::{Medium, MediumInterface};
use crate::core::primitive::Primitive;
use crate::core::renderer::{
    CameraInfo, CameraType, FilmInfo, FilterInfo, FilterType, IntegratorInfo, IntegratorType,
    RendererInfo, SamplerInfo, SamplerType,
};
use crate::core::scene::Scene;
use crate::core::shape::Shape;
use crate::lights::diffuse::DiffuseAreaLight;
use crate::lights::infinite::UniformInfiniteLight;
use crate::lights::point::PointLight;
use crate::materials::arealight::DiffuseLightMaterial;
use crate::materials::conductor::ConductorMaterial;
use crate::materials::dielectric::DielectricMaterial;
use crate::materials::diffuse::DiffuseMaterial;
use crate::materials::metallic_roughness::MetallicRoughnessMaterial;
use crate::materials::subsurface::SubsurfaceRandomWalkMaterial;
use crate::media::homogeneous::HomogeneousMedium;
use crate::shapes::sphere::Sphere;
use crate::shapes::triangle::{Triangle, TriangleMesh};
use crate::textures::ConstantSpectrumTexture;

pub const BUILTIN_SCENES: [&str; 6] = [
    "cornell-box",
    "cornell-box-fog",
    "furnace",
    "mis-test",
    "sss-test",
    "pinhole-light",
];

/// Two triangles spanning the parallelogram at `origin` with edges
/// `eu` and `ev`.
fn quad(origin: Point3f, eu: Vector3f, ev: Vector3f) -> Vec<Arc<dyn Shape>> {
    let positions: Vec<Point3f> = vec![
        origin,
        origin + eu,
        origin + eu + ev,
        origin + ev,
    ];
    let mesh: Arc<TriangleMesh> = Arc::new(TriangleMesh::new(
        positions,
        vec![],
        vec![
            Point2f::new(0.0, 0.0),
            Point2f::new(1.0, 0.0),
            Point2f::new(1.0, 1.0),
            Point2f::new(0.0, 1.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    ));
    vec![
        Arc::new(Triangle::new(mesh.clone(), 0)),
        Arc::new(Triangle::new(mesh, 1)),
    ]
}

fn add_quad(prims: &mut Vec<Primitive>, origin: Point3f, eu: Vector3f, ev: Vector3f, material: Arc<dyn Material>) {
    for shape in quad(origin, eu, ev) {
        prims.push(Primitive::new(shape, material.clone()));
    }
}

fn add_area_light(
    prims: &mut Vec<Primitive>,
    lights: &mut Vec<Arc<dyn Light>>,
    shape: Arc<dyn Shape>,
    emission: Spectrum,
    two_sided: bool,
) {
    let material: Arc<dyn Material> = Arc::new(DiffuseLightMaterial::from_color(emission, two_sided));
    let light: Arc<dyn Light> = Arc::new(DiffuseAreaLight::new(
        shape.clone(),
        ConstantSpectrumTexture::shared(emission),
        two_sided,
    ));
    lights.push(light.clone());
    prims.push(Primitive::with_area_light(shape, material, light));
}

fn default_film(name: &str, resolution: Point2i, spp: i32) -> (FilmInfo, SamplerInfo) {
    (
        FilmInfo {
            filename: format!("{}.png", name),
            resolution,
            filter_info: FilterInfo {
                filter_type: FilterType::Gaussian,
                extent: 3.0,
                gaussian_stddev: 0.5,
            },
        },
        SamplerInfo {
            sampler_type: SamplerType::Independent,
            spp,
        },
    )
}

fn cornell_box_scene(fog: bool) -> RendererInfo {
    let white: Arc<dyn Material> =
        Arc::new(DiffuseMaterial::from_color(Spectrum::rgb(0.73, 0.73, 0.73)));
    let red: Arc<dyn Material> =
        Arc::new(DiffuseMaterial::from_color(Spectrum::rgb(0.63, 0.065, 0.05)));
    let green: Arc<dyn Material> =
        Arc::new(DiffuseMaterial::from_color(Spectrum::rgb(0.14, 0.45, 0.091)));
    let mut prims: Vec<Primitive> = Vec::new();
    let mut lights: Vec<Arc<dyn Light>> = Vec::new();
    // floor, ceiling, back wall
    add_quad(
        &mut prims,
        Point3f::new(0.0, 0.0, 0.0),
        Vector3f::new(1.0, 0.0, 0.0),
        Vector3f::new(0.0, 0.0, 1.0),
        white.clone(),
    );
    add_quad(
        &mut prims,
        Point3f::new(0.0, 1.0, 0.0),
        Vector3f::new(0.0, 0.0, 1.0),
        Vector3f::new(1.0, 0.0, 0.0),
        white.clone(),
    );
    add_quad(
        &mut prims,
        Point3f::new(0.0, 0.0, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
        Vector3f::new(1.0, 0.0, 0.0),
        white.clone(),
    );
    // colored side walls
    add_quad(
        &mut prims,
        Point3f::new(0.0, 0.0, 0.0),
        Vector3f::new(0.0, 0.0, 1.0),
        Vector3f::new(0.0, 1.0, 0.0),
        red,
    );
    add_quad(
        &mut prims,
        Point3f::new(1.0, 0.0, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
        Vector3f::new(0.0, 0.0, 1.0),
        green,
    );
    // two boxes stand in for the classic occluders
    prims.push(Primitive::new(
        Arc::new(Sphere::new(Point3f::new(0.32, 0.2, 0.35), 0.2)),
        Arc::new(MetallicRoughnessMaterial::from_values(
            Spectrum::rgb(0.9, 0.9, 0.9),
            1.0,
            0.2,
        )),
    ));
    prims.push(Primitive::new(
        Arc::new(Sphere::new(Point3f::new(0.7, 0.15, 0.6), 0.15)),
        Arc::new(DielectricMaterial::new(1.5, 0.0)),
    ));
    // ceiling emitter
    for shape in quad(
        Point3f::new(0.35, 0.999, 0.35),
        Vector3f::new(0.0, 0.0, 0.3),
        Vector3f::new(0.3, 0.0, 0.0),
    ) {
        add_area_light(&mut prims, &mut lights, shape, Spectrum::new(15.0), false);
    }
    if fog {
        // a thin absorbing/scattering fog filling the box
        let fog_medium: Arc<Medium> = Arc::new(Medium::Homogeneous(HomogeneousMedium::new(
            Spectrum::new(0.05),
            Spectrum::new(0.45),
            Spectrum::default(),
            0.0,
        )));
        let boundary: Arc<dyn Shape> = Arc::new(Sphere::new(Point3f::new(0.5, 0.5, 0.5), 0.87));
        prims.push(Primitive::with_medium_interface(
            boundary,
            None,
            MediumInterface::new(Some(fog_medium), None),
        ));
    }
    let (film_info, sampler_info) = default_film("cornell-box", Point2i::new(512, 512), 256);
    RendererInfo {
        scene: Scene::new(Bvh::new(prims), lights),
        camera_info: CameraInfo {
            camera_type: CameraType::Perspective,
            look_at: Some((
                Point3f::new(0.5, 0.5, 1.9),
                Point3f::new(0.5, 0.5, 0.0),
                Vector3f::new(0.0, 1.0, 0.0),
            )),
            fov: 35.0,
            focus_distance: 1.9,
            film_info,
            sampler_info,
            ..CameraInfo::default()
        },
        integrator_info: IntegratorInfo {
            integrator_type: if fog {
                IntegratorType::VolPath
            } else {
                IntegratorType::Path
            },
            ..IntegratorInfo::default()
        },
    }
}

fn furnace_scene() -> RendererInfo {
    let mut prims: Vec<Primitive> = Vec::new();
    // three test spheres: diffuse, compensated conductor, dielectric
    prims.push(Primitive::new(
        Arc::new(Sphere::new(Point3f::new(-2.2, 0.0, 0.0), 1.0)),
        Arc::new(DiffuseMaterial::from_color(Spectrum::new(1.0))),
    ));
    prims.push(Primitive::new(
        Arc::new(Sphere::new(Point3f::new(0.0, 0.0, 0.0), 1.0)),
        Arc::new(ConductorMaterial::from_reflectance(
            Spectrum::new(1.0),
            0.5,
            true,
        )),
    ));
    prims.push(Primitive::new(
        Arc::new(Sphere::new(Point3f::new(2.2, 0.0, 0.0), 1.0)),
        Arc::new(DielectricMaterial::with_compensation(1.0001, 0.4)),
    ));
    let lights: Vec<Arc<dyn Light>> =
        vec![Arc::new(UniformInfiniteLight::new(Spectrum::new(1.0), 1.0)) as Arc<dyn Light>];
    let (film_info, sampler_info) = default_film("furnace", Point2i::new(600, 200), 256);
    RendererInfo {
        scene: Scene::new(Bvh::new(prims), lights),
        camera_info: CameraInfo {
            camera_type: CameraType::Perspective,
            look_at: Some((
                Point3f::new(0.0, 0.0, 8.0),
                Point3f::new(0.0, 0.0, 0.0),
                Vector3f::new(0.0, 1.0, 0.0),
            )),
            fov: 30.0,
            focus_distance: 8.0,
            film_info,
            sampler_info,
            ..CameraInfo::default()
        },
        integrator_info: IntegratorInfo::default(),
    }
}

fn mis_test_scene() -> RendererInfo {
    let mut prims: Vec<Primitive> = Vec::new();
    let mut lights: Vec<Arc<dyn Light>> = Vec::new();
    // floor
    add_quad(
        &mut prims,
        Point3f::new(-6.0, -2.0, -4.0),
        Vector3f::new(12.0, 0.0, 0.0),
        Vector3f::new(0.0, 0.0, 8.0),
        Arc::new(DiffuseMaterial::from_color(Spectrum::new(0.4))),
    );
    // four plates of increasing roughness, tilted toward the camera
    let roughness: [Float; 4] = [0.005, 0.02, 0.05, 0.1];
    for (i, r) in roughness.iter().enumerate() {
        let y: Float = -1.0 + i as Float * 0.6;
        let z: Float = -1.0 - i as Float * 0.8;
        add_quad(
            &mut prims,
            Point3f::new(-4.0, y, z),
            Vector3f::new(8.0, 0.0, 0.0),
            Vector3f::new(0.0, 0.25, 0.6),
            Arc::new(MetallicRoughnessMaterial::from_values(
                Spectrum::rgb(0.95, 0.93, 0.88),
                1.0,
                *r,
            )),
        );
    }
    // spherical emitters of decreasing size, increasing intensity
    let radii: [Float; 4] = [0.45, 0.25, 0.12, 0.04];
    let powers: [Float; 4] = [2.0, 6.0, 27.0, 250.0];
    for i in 0..4 {
        let x: Float = -3.0 + i as Float * 2.0;
        add_area_light(
            &mut prims,
            &mut lights,
            Arc::new(Sphere::new(Point3f::new(x, 1.6, -2.5), radii[i])),
            Spectrum::new(powers[i]),
            false,
        );
    }
    let (film_info, sampler_info) = default_film("mis-test", Point2i::new(768, 384), 128);
    RendererInfo {
        scene: Scene::new(Bvh::new(prims), lights),
        camera_info: CameraInfo {
            camera_type: CameraType::Perspective,
            look_at: Some((
                Point3f::new(0.0, 1.2, 6.0),
                Point3f::new(0.0, 0.0, -2.0),
                Vector3f::new(0.0, 1.0, 0.0),
            )),
            fov: 40.0,
            focus_distance: 8.0,
            film_info,
            sampler_info,
            ..CameraInfo::default()
        },
        integrator_info: IntegratorInfo {
            integrator_type: IntegratorType::Bdpt,
            ..IntegratorInfo::default()
        },
    }
}

fn sss_test_scene() -> RendererInfo {
    let mut prims: Vec<Primitive> = Vec::new();
    let mut lights: Vec<Arc<dyn Light>> = Vec::new();
    add_quad(
        &mut prims,
        Point3f::new(-4.0, -1.0, -4.0),
        Vector3f::new(8.0, 0.0, 0.0),
        Vector3f::new(0.0, 0.0, 8.0),
        Arc::new(DiffuseMaterial::from_color(Spectrum::new(0.5))),
    );
    prims.push(Primitive::new(
        Arc::new(Sphere::new(Point3f::new(0.0, 0.0, 0.0), 1.0)),
        Arc::new(SubsurfaceRandomWalkMaterial::new(
            Spectrum::rgb(0.85, 0.5, 0.35),
            Spectrum::rgb(0.5, 0.25, 0.125),
            1.5,
            0.1,
            0.0,
        )),
    ));
    lights.push(Arc::new(UniformInfiniteLight::new(Spectrum::new(0.6), 1.0)));
    lights.push(Arc::new(PointLight::new(
        Point3f::new(2.0, 3.0, 2.0),
        Spectrum::new(30.0),
    )));
    let (film_info, sampler_info) = default_film("sss-test", Point2i::new(400, 400), 128);
    RendererInfo {
        scene: Scene::new(Bvh::new(prims), lights),
        camera_info: CameraInfo {
            camera_type: CameraType::Perspective,
            look_at: Some((
                Point3f::new(0.0, 0.8, 4.0),
                Point3f::new(0.0, 0.0, 0.0),
                Vector3f::new(0.0, 1.0, 0.0),
            )),
            fov: 35.0,
            focus_distance: 4.0,
            film_info,
            sampler_info,
            ..CameraInfo::default()
        },
        integrator_info: IntegratorInfo::default(),
    }
}

fn pinhole_light_scene() -> RendererInfo {
    let mut prims: Vec<Primitive> = Vec::new();
    add_quad(
        &mut prims,
        Point3f::new(-3.0, 0.0, -3.0),
        Vector3f::new(6.0, 0.0, 0.0),
        Vector3f::new(0.0, 0.0, 6.0),
        Arc::new(DiffuseMaterial::from_color(Spectrum::new(0.7))),
    );
    let lights: Vec<Arc<dyn Light>> = vec![Arc::new(PointLight::new(
        Point3f::new(0.0, 2.0, 0.0),
        Spectrum::new(10.0),
    )) as Arc<dyn Light>];
    let (film_info, sampler_info) = default_film("pinhole-light", Point2i::new(256, 256), 256);
    RendererInfo {
        scene: Scene::new(Bvh::new(prims), lights),
        camera_info: CameraInfo {
            camera_type: CameraType::Perspective,
            look_at: Some((
                Point3f::new(0.0, 2.0, 4.0),
                Point3f::new(0.0, 0.0, 0.0),
                Vector3f::new(0.0, 1.0, 0.0),
            )),
            fov: 40.0,
            focus_distance: 4.5,
            film_info,
            sampler_info,
            ..CameraInfo::default()
        },
        integrator_info: IntegratorInfo::default(),
    }
}

/// Look up a built-in scene description by name.
pub fn create_scene(name: &str) -> Option<RendererInfo> {
    match name {
        "cornell-box" => Some(cornell_box_scene(false)),
        "cornell-box-fog" => Some(cornell_box_scene(true)),
        "furnace" => Some(furnace_scene()),
        "mis-test" => Some(mis_test_scene()),
        "sss-test" => Some(sss_test_scene()),
        "pinhole-light" => Some(pinhole_light_scene()),
        _ => None,
    }
}

/// The single-sphere fixture used by the tests: a unit diffuse sphere
/// under a uniform white sky.
pub fn diffuse_sphere_fixture(albedo: Spectrum) -> Scene {
    let prims: Vec<Primitive> = vec![Primitive::new(
        Arc::new(Sphere::new(Point3f::new(0.0, 0.0, 0.0), 1.0)),
        Arc::new(DiffuseMaterial::from_color(albedo)),
    )];
    let lights: Vec<Arc<dyn Light>> =
        vec![Arc::new(UniformInfiniteLight::new(Spectrum::new(1.0), 1.0)) as Arc<dyn Light>];
    Scene::new(Bvh::new(prims), lights)
}
