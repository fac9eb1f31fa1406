//! Math utilities and types
//!
//! Provides the matrix and vector types used by the tutorial scenes. All
//! matrices follow the OpenGL conventions the shaders expect: column vectors,
//! right-handed camera space looking down -Z, and clip-space depth in [-1, 1].

pub use nalgebra::{Matrix3, Matrix4, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = std::f32::consts::TAU;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4};

    /// Convert degrees to radians
    #[must_use]
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    #[must_use]
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    #[must_use]
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        (b - a).mul_add(t, a)
    }

    /// Frustum scale for a full vertical field of view given in degrees.
    ///
    /// This is the `frustumScale` uniform of the perspective shaders:
    /// `1 / tan(fov / 2)`.
    #[must_use]
    pub fn calc_frustum_scale(fov_degrees: f32) -> f32 {
        (deg_to_rad(fov_degrees) * 0.5).tan().recip()
    }

    /// Build the hand-written perspective matrix used by the early tutorials.
    ///
    /// Only five entries are non-zero: the two frustum scale terms, the two
    /// depth mapping terms and the `-1` that copies `-z` into `w`.
    #[must_use]
    pub fn manual_perspective(frustum_scale: f32, aspect: f32, z_near: f32, z_far: f32) -> Mat4 {
        let mut matrix = Mat4::zeros();
        matrix[(0, 0)] = frustum_scale / aspect;
        matrix[(1, 1)] = frustum_scale;
        matrix[(2, 2)] = (z_far + z_near) / (z_near - z_far);
        matrix[(2, 3)] = (2.0 * z_far * z_near) / (z_near - z_far);
        matrix[(3, 2)] = -1.0;
        matrix
    }

    /// Column-major copy of a matrix, the layout GLSL `mat4` uniforms use.
    #[must_use]
    pub fn to_columns(matrix: &Mat4) -> [[f32; 4]; 4] {
        (*matrix).into()
    }

    /// Rebuild a matrix from column-major arrays.
    #[must_use]
    pub fn from_columns(columns: &[[f32; 4]; 4]) -> Mat4 {
        Mat4::from(*columns)
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Rotation around the X axis, angle in degrees
    fn rotation_x_deg(angle: f32) -> Mat4;

    /// Rotation around the Y axis, angle in degrees
    fn rotation_y_deg(angle: f32) -> Mat4;

    /// Rotation around the Z axis, angle in degrees
    fn rotation_z_deg(angle: f32) -> Mat4;

    /// OpenGL perspective projection; `fov_y` in degrees
    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x_deg(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(angle))
    }

    fn rotation_y_deg(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(angle))
    }

    fn rotation_z_deg(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(angle))
    }

    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        utils::manual_perspective(utils::calc_frustum_scale(fov_y), aspect, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frustum_scale_of_ninety_degrees_is_one() {
        assert_relative_eq!(utils::calc_frustum_scale(90.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(utils::calc_frustum_scale(45.0), 2.414_213_5, epsilon = 1e-5);
    }

    #[test]
    fn test_manual_perspective_entries() {
        let m = utils::manual_perspective(1.0, 2.0, 1.0, 3.0);
        assert_relative_eq!(m[(0, 0)], 0.5);
        assert_relative_eq!(m[(1, 1)], 1.0);
        assert_relative_eq!(m[(2, 2)], -2.0);
        assert_relative_eq!(m[(2, 3)], -3.0);
        assert_relative_eq!(m[(3, 2)], -1.0);
        assert_relative_eq!(m[(3, 3)], 0.0);

        // Column-major layout matches the flat array of the tutorial.
        let columns = utils::to_columns(&m);
        assert_relative_eq!(columns[2][3], -1.0);
        assert_relative_eq!(columns[3][2], -3.0);
    }

    #[test]
    fn test_perspective_maps_near_and_far_planes() {
        let m = Mat4::perspective_gl(60.0, 1.5, 0.5, 50.0);
        let near = m * Vec4::new(0.0, 0.0, -0.5, 1.0);
        let far = m * Vec4::new(0.0, 0.0, -50.0, 1.0);
        assert_relative_eq!(near.z / near.w, -1.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rotation_helpers_use_degrees() {
        let r = Mat4::rotation_z_deg(90.0);
        let v = r.transform_vector(&Vec3::x());
        assert_relative_eq!(v, Vec3::y(), epsilon = 1e-6);
    }

    #[test]
    fn test_columns_round_trip() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let columns = utils::to_columns(&m);
        assert_eq!(columns[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(utils::from_columns(&columns), m);
    }
}
