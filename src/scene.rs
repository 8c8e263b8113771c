use glam::Vec3;

use crate::math::face_normal;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Material {
    pub color: [f32; 3], // vec3, components in [0, 1]
    pub reflection: f32, // f32, fills the vec3 tail
}

impl Material {
    pub const fn new(r: f32, g: f32, b: f32, reflection: f32) -> Material {
        Material {
            color: [r, g, b],
            reflection,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Light {
    pub position: [f32; 3], // vec3, aligned to 16 bytes
    _padding: [u8; 4],
    pub color: [f32; 3], // vec3, aligned to 16 bytes
    _padding2: [u8; 4],
}

impl Light {
    pub fn new(position: Vec3, color: Vec3) -> Light {
        Light {
            position: position.into(),
            _padding: [0; 4],
            color: color.into(),
            _padding2: [0; 4],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Sphere {
    pub position: [f32; 3], // vec3, aligned to 16 bytes
    _padding: [u8; 4],
    pub material: Material, // struct, aligned to 16 bytes
    pub radius: f32,
    _padding2: [u8; 12], // padding to ensure 16-byte stride
}

impl Sphere {
    pub fn new(position: [f32; 3], radius: f32, material: Material) -> Sphere {
        assert!(radius > 0.0, "sphere radius has to be over 0.0");

        Sphere {
            position,
            _padding: [0; 4],
            material,
            radius,
            _padding2: [0; 12],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Triangle {
    pub a: [f32; 3],
    _padding: [u8; 4],
    pub b: [f32; 3],
    _padding2: [u8; 4],
    pub c: [f32; 3],
    _padding3: [u8; 4],
    pub normal: [f32; 3],
    // barycentric coefficients, zero until the kernel computes a hit
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
    _padding4: [u8; 8], // material starts on a 16-byte boundary
    pub material: Material,
}

impl Triangle {
    /// Builds a triangle from world-space vertices. The normal is computed
    /// here, once, from exactly these vertices.
    pub fn new(a: Vec3, b: Vec3, c: Vec3, material: Material) -> Triangle {
        let normal = face_normal(a, b, c);

        Triangle {
            a: a.into(),
            _padding: [0; 4],
            b: b.into(),
            _padding2: [0; 4],
            c: c.into(),
            _padding3: [0; 4],
            normal: normal.into(),
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
            _padding4: [0; 8],
            material,
        }
    }
}

const _: () = assert!(std::mem::size_of::<Material>() == 16);
const _: () = assert!(std::mem::size_of::<Light>() == 32);
const _: () = assert!(std::mem::size_of::<Sphere>() == 48);
const _: () = assert!(std::mem::size_of::<Triangle>() == 96);

/// Everything the kernel sees for one frame. Rebuilt from scratch every frame.
///
/// The counts handed to the device are always the list lengths, so there is no
/// separate count field that could drift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub triangles: Vec<Triangle>,
    pub spheres: Vec<Sphere>,
    pub lights: Vec<Light>,
}

impl Scene {
    pub fn triangle_count(&self) -> u32 {
        self.triangles.len() as u32
    }

    pub fn sphere_count(&self) -> u32 {
        self.spheres.len() as u32
    }

    pub fn light_count(&self) -> u32 {
        self.lights.len() as u32
    }
}
