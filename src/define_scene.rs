use std::path::Path;

use glam::vec3;

use super::error::TracerResult;
use super::math::Transform;
use super::scene::{Light, Material, Scene, Sphere};
use super::triangle_object::{load_objects, ObjectCreation};

// ############################## materials ###################################

pub const CYAN: Material = Material::new(0.0, 1.0, 1.0, 0.5);
pub const YELLOW: Material = Material::new(1.0, 1.0, 0.0, 0.5);
pub const MAGENTA: Material = Material::new(1.0, 0.0, 1.0, 0.5);
pub const RED_GLASS: Material = Material::new(0.96, 0.5, 0.5, 0.5);
pub const GREEN_GLASS: Material = Material::new(0.5, 0.96, 0.5, 0.5);
pub const BLUE_GLASS: Material = Material::new(0.5, 0.5, 0.96, 0.5);

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

// ############################################################################

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneMode {
    TwoSpheres,
    SphereAndCube,
    TwoCubes,
    SphereCubeCoil,
    HowManySpheres,
}

impl SceneMode {
    pub const ALL: [SceneMode; 5] = [
        SceneMode::TwoSpheres,
        SceneMode::SphereAndCube,
        SceneMode::TwoCubes,
        SceneMode::SphereCubeCoil,
        SceneMode::HowManySpheres,
    ];

    pub fn from_index(index: usize) -> SceneMode {
        SceneMode::ALL[index % SceneMode::ALL.len()]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> SceneMode {
        SceneMode::from_index(self.index() + 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            SceneMode::TwoSpheres => "Scene with two spheres",
            SceneMode::SphereAndCube => "Scene with a sphere and a cube",
            SceneMode::TwoCubes => "Scene with two cubes",
            SceneMode::SphereCubeCoil => "Scene with a sphere, cube and coil (OBJ file)",
            SceneMode::HowManySpheres => "How many spheres in the scene?",
        }
    }

    fn spheres(self) -> Vec<Sphere> {
        match self {
            SceneMode::TwoSpheres => vec![
                Sphere::new([80.0, 120.0, -40.0], 40.0, MAGENTA),
                Sphere::new([80.0, 0.0, -40.0], 80.0, CYAN),
            ],
            SceneMode::SphereAndCube | SceneMode::SphereCubeCoil => {
                vec![Sphere::new([80.0, 40.0, -40.0], 80.0, CYAN)]
            }
            SceneMode::TwoCubes => vec![],
            SceneMode::HowManySpheres => vec![
                Sphere::new([0.0, 0.0, 0.0], 20.0, CYAN),
                Sphere::new([30.0, 0.0, -30.0], 20.0, MAGENTA),
                Sphere::new([-40.0, -30.0, 100.0], 20.0, BLUE_GLASS),
            ],
        }
    }

    fn objects(self) -> Vec<ObjectCreation> {
        let cube = |material, translate, size: f32| ObjectCreation {
            file_name: "cube.obj",
            material,
            transform: Transform::new(translate, [0.0; 3], [size; 3]),
        };
        let puzzle_box = |file_name, material| ObjectCreation {
            file_name,
            material,
            transform: Transform::new([0.0; 3], [0.0; 3], [150.0; 3]),
        };

        match self {
            SceneMode::TwoSpheres => vec![],
            SceneMode::SphereAndCube => vec![cube(YELLOW, [80.0, -150.0, -40.0], 80.0)],
            SceneMode::TwoCubes => vec![
                cube(RED_GLASS, [80.0, 0.0, -40.0], 40.0),
                cube(GREEN_GLASS, [-100.0, 40.0, -40.0], 80.0),
            ],
            SceneMode::SphereCubeCoil => vec![
                ObjectCreation {
                    file_name: "coil.obj",
                    material: RED_GLASS,
                    transform: Transform::new([-100.0, -230.0, -40.0], [0.0; 3], [20.0; 3]),
                },
                cube(GREEN_GLASS, [-100.0, 40.0, -40.0], 40.0),
            ],
            SceneMode::HowManySpheres => vec![
                puzzle_box("box1.obj", RED_GLASS),
                puzzle_box("box2.obj", GREEN_GLASS),
                puzzle_box("box3.obj", YELLOW),
            ],
        }
    }

    fn light_base(self) -> [f32; 3] {
        match self {
            SceneMode::HowManySpheres => [650.0, -390.0, -1000.0],
            _ => [0.0, 320.0, -1000.0],
        }
    }

    /// World-space light position with the user offset applied.
    pub fn light_position(self, light_offset: [f32; 2]) -> [f32; 3] {
        let [x, y, z] = self.light_base();
        [x + light_offset[0], y + light_offset[1], z]
    }
}

/// Builds the scene for `mode` from scratch. Meshes are read from
/// `assets_dir`; a missing one is fatal.
pub fn define_render_scene(
    mode: SceneMode,
    light_offset: [f32; 2],
    assets_dir: &Path,
) -> TracerResult<Scene> {
    let spheres = mode.spheres();
    let triangles = load_objects(assets_dir, &mode.objects())?;

    let lights = vec![Light::new(
        mode.light_position(light_offset).into(),
        vec3(WHITE[0], WHITE[1], WHITE[2]),
    )];

    Ok(Scene {
        triangles,
        spheres,
        lights,
    })
}
