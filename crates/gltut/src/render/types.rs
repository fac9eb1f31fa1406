//! Render state vocabulary shared by backends and scenes

use bitflags::bitflags;

use crate::foundation::math::{utils, Mat4, Vec2, Vec3, Vec4};
use crate::render::shader::GlslType;

/// Fixed-function state toggled with enable/disable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Face culling
    CullFace,
    /// Depth testing
    DepthTest,
    /// Depth clamping instead of near/far clipping
    DepthClamp,
    /// Primitive restart on a reserved index
    PrimitiveRestart,
}

/// Faces removed by culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// Front faces
    Front,
    /// Back faces
    #[default]
    Back,
    /// Both
    FrontAndBack,
}

/// Winding that marks a front face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Clockwise
    Cw,
    /// Counter-clockwise
    #[default]
    Ccw,
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthFunc {
    /// Never passes
    Never,
    /// Passes if closer
    #[default]
    Less,
    /// Passes if equal
    Equal,
    /// Passes if closer or equal
    LessEqual,
    /// Passes if farther
    Greater,
    /// Passes if different
    NotEqual,
    /// Passes if farther or equal
    GreaterEqual,
    /// Always passes
    Always,
}

bitflags! {
    /// Buffers cleared by `clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Color buffer
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

/// Binding point of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attributes
    Array,
    /// Indices
    ElementArray,
    /// Uniform block storage
    Uniform,
}

/// Expected update frequency of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once
    StaticDraw,
    /// Written occasionally
    DynamicDraw,
    /// Written every frame
    StreamDraw,
}

/// Value passed to a plain uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `vec2`
    Vec2([f32; 2]),
    /// `vec3`
    Vec3([f32; 3]),
    /// `vec4`
    Vec4([f32; 4]),
    /// `int`
    Int(i32),
    /// `uint`
    Uint(u32),
    /// `mat4`, column-major
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    /// GLSL type this value sets
    #[must_use]
    pub const fn glsl_type(&self) -> GlslType {
        match self {
            Self::Float(_) => GlslType::Float,
            Self::Vec2(_) => GlslType::Vec2,
            Self::Vec3(_) => GlslType::Vec3,
            Self::Vec4(_) => GlslType::Vec4,
            Self::Int(_) => GlslType::Int,
            Self::Uint(_) => GlslType::Uint,
            Self::Mat4(_) => GlslType::Mat4,
        }
    }

    /// Matrix value, if this is a `mat4`
    #[must_use]
    pub fn as_mat4(&self) -> Option<Mat4> {
        match self {
            Self::Mat4(columns) => Some(utils::from_columns(columns)),
            _ => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for UniformValue {
    fn from(value: u32) -> Self {
        Self::Uint(value)
    }
}

impl From<(f32, f32)> for UniformValue {
    fn from((x, y): (f32, f32)) -> Self {
        Self::Vec2([x, y])
    }
}

impl From<(f32, f32, f32)> for UniformValue {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Self::Vec3([x, y, z])
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        Self::Vec4(value)
    }
}

impl From<Vec2> for UniformValue {
    fn from(value: Vec2) -> Self {
        Self::Vec2(value.into())
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value.into())
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        Self::Vec4(value.into())
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        Self::Mat4(utils::to_columns(&value))
    }
}

impl From<&Mat4> for UniformValue {
    fn from(value: &Mat4) -> Self {
        Self::Mat4(utils::to_columns(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_value_types() {
        assert_eq!(UniformValue::from(1.0).glsl_type(), GlslType::Float);
        assert_eq!(UniformValue::from((0.5, 0.5)).glsl_type(), GlslType::Vec2);
        assert_eq!(UniformValue::from(Vec3::new(0.0, 0.0, 0.5)), UniformValue::Vec3([0.0, 0.0, 0.5]));
        assert_eq!(UniformValue::from(Mat4::identity()).glsl_type(), GlslType::Mat4);
    }

    #[test]
    fn test_matrix_value_is_column_major() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let UniformValue::Mat4(columns) = UniformValue::from(&m) else {
            panic!("expected a matrix");
        };
        assert_eq!(columns[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(UniformValue::Mat4(columns).as_mat4(), Some(m));
    }

    #[test]
    fn test_clear_flags_combine() {
        let flags = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert!(flags.contains(ClearFlags::DEPTH));
        assert!(!flags.contains(ClearFlags::STENCIL));
    }
}
