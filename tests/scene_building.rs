use std::path::{Path, PathBuf};

use glam::Vec3;

use gpu_scene_tracer::define_scene::define_render_scene;
use gpu_scene_tracer::kernel::KernelParams;
use gpu_scene_tracer::math::Mat3;
use gpu_scene_tracer::{SceneMode, TracerError};

fn assets() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets")
}

#[test]
fn every_scene_builds_from_the_bundled_assets() {
    // (spheres, triangles) per scene
    let expected = [(2, 0), (1, 12), (0, 24), (1, 1_536 + 12), (3, 36)];

    for (mode, (spheres, triangles)) in SceneMode::ALL.into_iter().zip(expected) {
        let scene = define_render_scene(mode, [0.0, 0.0], &assets()).unwrap();

        assert_eq!(scene.sphere_count() as usize, spheres, "{}", mode.title());
        assert_eq!(scene.triangle_count() as usize, triangles, "{}", mode.title());
        assert_eq!(scene.light_count(), 1);

        assert_eq!(scene.sphere_count() as usize, scene.spheres.len());
        assert_eq!(scene.triangle_count() as usize, scene.triangles.len());
        assert_eq!(scene.light_count() as usize, scene.lights.len());
    }
}

#[test]
fn triangle_normals_are_unit_length() {
    for mode in SceneMode::ALL {
        let scene = define_render_scene(mode, [0.0, 0.0], &assets()).unwrap();
        for tri in &scene.triangles {
            let length = Vec3::from(tri.normal).length();
            assert!((length - 1.0).abs() < 1e-4, "{} {length}", mode.title());
        }
    }
}

#[test]
fn cube_is_placed_by_its_transform() {
    let scene = define_render_scene(SceneMode::SphereAndCube, [0.0, 0.0], &assets()).unwrap();

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for tri in &scene.triangles {
        for vertex in [tri.a, tri.b, tri.c] {
            min = min.min(Vec3::from(vertex));
            max = max.max(Vec3::from(vertex));
        }
    }

    // unit cube scaled by 80 around (80, -150, -40)
    assert!((min - Vec3::new(40.0, -190.0, -80.0)).length() < 1e-3, "{min:?}");
    assert!((max - Vec3::new(120.0, -110.0, 0.0)).length() < 1e-3, "{max:?}");
}

#[test]
fn rebuilding_gives_the_same_scene() {
    let first = define_render_scene(SceneMode::SphereCubeCoil, [10.0, -20.0], &assets()).unwrap();
    let second = define_render_scene(SceneMode::SphereCubeCoil, [10.0, -20.0], &assets()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn sphere_free_scene_reports_zero_spheres_to_the_kernel() {
    let scene = define_render_scene(SceneMode::TwoCubes, [0.0, 0.0], &assets()).unwrap();
    let params = KernelParams::new(&scene, 640, 480, 8, 1.0, Mat3::IDENTITY);

    assert_eq!(params.sphere_count, 0);
    assert_eq!(params.triangle_count, 24);
}

#[test]
fn missing_mesh_names_the_file() {
    let dir = std::env::temp_dir().join(format!("tracer-assets-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::copy(assets().join("cube.obj"), dir.join("cube.obj")).unwrap();

    let with_cube = define_render_scene(SceneMode::SphereAndCube, [0.0, 0.0], &dir);
    let without_coil = define_render_scene(SceneMode::SphereCubeCoil, [0.0, 0.0], &dir);
    std::fs::remove_dir_all(&dir).unwrap();

    assert_eq!(with_cube.unwrap().triangle_count(), 12);
    match without_coil {
        Err(TracerError::ResourceMissing { path, .. }) => assert!(path.ends_with("coil.obj")),
        other => panic!("expected a missing coil, got {other:?}"),
    }
}
