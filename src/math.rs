use glam::{Mat4, Vec3};

/// Unit vector along `v`. A zero vector has no direction and maps to +X
/// instead of NaN.
pub fn normalize(v: Vec3) -> Vec3 {
    let length = v.dot(v).sqrt();
    if length == 0.0 {
        Vec3::X
    } else {
        v * (1.0 / length)
    }
}

/// Face normal of the triangle `a, b, c`: `(b - a) x (c - a)`, normalized.
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    normalize((b - a).cross(c - a))
}

/// Row-major 3x3 matrix as the kernel reads it. Each row is a vec3 padded to
/// 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Mat3 {
    pub x: [f32; 3],
    _padding: [u8; 4],
    pub y: [f32; 3],
    _padding2: [u8; 4],
    pub z: [f32; 3],
    _padding3: [u8; 4],
}

const _: () = assert!(std::mem::size_of::<Mat3>() == 48);

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3::from_rows([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);

    pub const fn from_rows(x: [f32; 3], y: [f32; 3], z: [f32; 3]) -> Mat3 {
        Mat3 {
            x,
            _padding: [0; 4],
            y,
            _padding2: [0; 4],
            z,
            _padding3: [0; 4],
        }
    }

    /// Rotation of `angle` degrees about the axis `(x, y, z)`.
    ///
    /// The axis does not need to be unit length but must not be zero.
    pub fn rotation(angle: f32, x: f32, y: f32, z: f32) -> Mat3 {
        let axis = Vec3::new(x, y, z) / (x * x + y * y + z * z).sqrt();
        let (s, c) = angle.to_radians().sin_cos();
        let t = 1.0 - c;

        Mat3::from_rows(
            [
                t * axis.x * axis.x + c,
                t * axis.x * axis.y + axis.z * s,
                t * axis.z * axis.x - axis.y * s,
            ],
            [
                t * axis.x * axis.y - axis.z * s,
                t * axis.y * axis.y + c,
                t * axis.y * axis.z + axis.x * s,
            ],
            [
                t * axis.z * axis.x + axis.y * s,
                t * axis.y * axis.z - axis.x * s,
                t * axis.z * axis.z + c,
            ],
        )
    }

    /// Upper-left 3x3 block of a homogeneous matrix, row by row.
    pub fn from_upper_left(m: &Mat4) -> Mat3 {
        Mat3::from_rows(
            m.row(0).truncate().into(),
            m.row(1).truncate().into(),
            m.row(2).truncate().into(),
        )
    }

    #[cfg(test)]
    pub fn approx_eq(&self, other: &Mat3, epsilon: f32) -> bool {
        let lhs = [self.x, self.y, self.z];
        let rhs = [other.x, other.y, other.z];
        lhs.iter()
            .flatten()
            .zip(rhs.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Mat3::IDENTITY
    }
}

/// Placement of a mesh in world space. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate: Vec3,
    pub rotate: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            translate: Vec3::ZERO,
            rotate: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(translate: [f32; 3], rotate: [f32; 3], scale: [f32; 3]) -> Transform {
        Transform {
            translate: translate.into(),
            rotate: rotate.into(),
            scale: scale.into(),
        }
    }

    /// Composed homogeneous matrix: translate, rotate about X, then Y, then Z,
    /// then scale. Points are transformed as `M * p`, so scale acts first.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translate)
            * Mat4::from_rotation_x(self.rotate.x.to_radians())
            * Mat4::from_rotation_y(self.rotate.y.to_radians())
            * Mat4::from_rotation_z(self.rotate.z.to_radians())
            * Mat4::from_scale(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn zero_vector_normalizes_to_x_axis() {
        assert_eq!(normalize(Vec3::ZERO), Vec3::X);
    }

    #[test]
    fn normalize_gives_unit_length() {
        let n = normalize(Vec3::new(3.0, -4.0, 12.0));
        assert!((n.length() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn zero_angle_rotation_is_identity() {
        for axis in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.3, -2.0, 5.0]] {
            let rot = Mat3::rotation(0.0, axis[0], axis[1], axis[2]);
            assert!(rot.approx_eq(&Mat3::IDENTITY, EPSILON), "{rot:?}");
        }
    }

    #[test]
    fn quarter_turn_about_z() {
        let rot = Mat3::rotation(90.0, 0.0, 0.0, 1.0);
        let expected = Mat3::from_rows([0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
        assert!(rot.approx_eq(&expected, EPSILON), "{rot:?}");
    }

    #[test]
    fn transform_applies_scale_before_translation() {
        let transform = Transform::new([10.0, 0.0, 0.0], [0.0, 0.0, 0.0], [2.0, 3.0, 4.0]);
        let p = transform.matrix().transform_point3(Vec3::ONE);
        assert!((p - Vec3::new(12.0, 3.0, 4.0)).length() < EPSILON);
    }

    #[test]
    fn transform_rotates_x_before_z_in_matrix_order() {
        // M = Rx * Rz: the point is rotated about Z first, then about X.
        let transform = Transform::new([0.0; 3], [90.0, 0.0, 90.0], [1.0; 3]);
        let p = transform.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::Z).length() < EPSILON, "{p:?}");
    }

    #[test]
    fn face_normal_follows_winding() {
        let n = face_normal(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!((n - Vec3::Z).length() < EPSILON);
    }
}
