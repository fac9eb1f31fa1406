//! Uniform buffer blocks
//!
//! [`GlobalMatrices`] is the CPU mirror of the `GlobalMatrices` std140 block
//! shared by the world-space shaders. [`UniformBlockBuffer`] owns the
//! backing buffer and keeps it bound to one binding point.

use std::marker::PhantomData;
use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{utils, Mat4};
use crate::render::backend::{BackendResult, BufferHandle, RenderBackend};
use crate::render::program::Program;
use crate::render::shader::{GlslType, LinkedBlock};
use crate::render::types::{BufferTarget, BufferUsage};
use crate::render::RenderError;

/// Binding point the world scenes attach `GlobalMatrices` to
pub const GLOBAL_MATRICES_BINDING: u32 = 0;

/// Camera matrices shared by every world-space program
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlobalMatrices {
    /// Projection, column-major
    pub camera_to_clip: [[f32; 4]; 4],
    /// View, column-major
    pub world_to_camera: [[f32; 4]; 4],
}

impl Default for GlobalMatrices {
    fn default() -> Self {
        Self::new(&Mat4::identity(), &Mat4::identity())
    }
}

/// Host-side layout of a std140 block
pub trait Std140Block: Pod {
    /// Block name in GLSL
    const NAME: &'static str;

    /// `(name, type, byte offset)` of each member
    fn members() -> Vec<(&'static str, GlslType, usize)>;

    /// Check that the reflected block has exactly this layout
    ///
    /// # Errors
    /// [`RenderError::InvalidUniform`] describing the first difference.
    fn check_layout(block: &LinkedBlock) -> BackendResult<()> {
        let mismatch = |message: String| RenderError::InvalidUniform(format!("block '{}': {message}", Self::NAME));
        if block.name != Self::NAME {
            return Err(mismatch(format!("found block '{}'", block.name)));
        }
        let expected = Self::members();
        if block.members.len() != expected.len() {
            return Err(mismatch(format!(
                "{} members in the shader, {} on the host",
                block.members.len(),
                expected.len()
            )));
        }
        for (member, (name, ty, offset)) in block.members.iter().zip(expected) {
            if member.name != name || member.ty != ty || member.offset != offset || member.array_len.is_some() {
                return Err(mismatch(format!(
                    "shader has {} {} at {}, host has {ty} {name} at {offset}",
                    member.ty, member.name, member.offset
                )));
            }
        }
        if block.size != size_of::<Self>() {
            return Err(mismatch(format!(
                "{} bytes in the shader, {} on the host",
                block.size,
                size_of::<Self>()
            )));
        }
        Ok(())
    }
}

impl Std140Block for GlobalMatrices {
    const NAME: &'static str = "GlobalMatrices";

    fn members() -> Vec<(&'static str, GlslType, usize)> {
        vec![
            ("cameraToClip", GlslType::Mat4, offset_of!(Self, camera_to_clip)),
            ("worldToCamera", GlslType::Mat4, offset_of!(Self, world_to_camera)),
        ]
    }
}

impl GlobalMatrices {
    /// Pack both matrices
    #[must_use]
    pub fn new(camera_to_clip: &Mat4, world_to_camera: &Mat4) -> Self {
        Self {
            camera_to_clip: utils::to_columns(camera_to_clip),
            world_to_camera: utils::to_columns(world_to_camera),
        }
    }
}

/// Uniform buffer holding one block, bound to a fixed binding point
#[derive(Debug, Clone, Copy)]
pub struct UniformBlockBuffer<T: Std140Block> {
    buffer: BufferHandle,
    binding: u32,
    _block: PhantomData<T>,
}

impl<T: Std140Block> UniformBlockBuffer<T> {
    /// Create a zeroed buffer and bind its whole range to `binding`
    ///
    /// # Errors
    /// Whatever the backend reports.
    pub fn new(backend: &mut dyn RenderBackend, binding: u32) -> BackendResult<Self> {
        let initial = T::zeroed();
        let buffer = backend.create_buffer(BufferTarget::Uniform, bytemuck::bytes_of(&initial), BufferUsage::StreamDraw)?;
        backend.bind_buffer_range(binding, buffer, 0, size_of::<T>())?;
        log::debug!("Uniform block {} bound at {binding}", T::NAME);
        Ok(Self {
            buffer,
            binding,
            _block: PhantomData,
        })
    }

    /// Backend buffer
    #[must_use]
    pub const fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    /// Binding point
    #[must_use]
    pub const fn binding(&self) -> u32 {
        self.binding
    }

    /// Verify `program`'s block layout and attach it to this binding point
    ///
    /// # Errors
    /// [`RenderError::InvalidUniform`] if the program lacks the block or its
    /// layout differs from `T`.
    pub fn attach(&self, backend: &mut dyn RenderBackend, program: &Program) -> BackendResult<()> {
        let block = program.interface().block(T::NAME).ok_or_else(|| {
            RenderError::InvalidUniform(format!(
                "'{}' is not a uniform block of {}",
                T::NAME,
                program.interface().vertex_shader
            ))
        })?;
        T::check_layout(block)?;
        backend.bind_uniform_block(program.handle(), block.index, self.binding)
    }

    /// Replace the whole block
    ///
    /// # Errors
    /// Whatever the backend reports.
    pub fn update(&self, backend: &mut dyn RenderBackend, value: &T) -> BackendResult<()> {
        backend.update_buffer(self.buffer, 0, bytemuck::bytes_of(value))
    }
}

impl UniformBlockBuffer<GlobalMatrices> {
    /// Write only the projection matrix
    ///
    /// # Errors
    /// Whatever the backend reports.
    pub fn set_camera_to_clip(&self, backend: &mut dyn RenderBackend, matrix: &Mat4) -> BackendResult<()> {
        let columns = utils::to_columns(matrix);
        backend.update_buffer(
            self.buffer,
            offset_of!(GlobalMatrices, camera_to_clip),
            bytemuck::bytes_of(&columns),
        )
    }

    /// Write only the view matrix
    ///
    /// # Errors
    /// Whatever the backend reports.
    pub fn set_world_to_camera(&self, backend: &mut dyn RenderBackend, matrix: &Mat4) -> BackendResult<()> {
        let columns = utils::to_columns(matrix);
        backend.update_buffer(
            self.buffer,
            offset_of!(GlobalMatrices, world_to_camera),
            bytemuck::bytes_of(&columns),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::shader::ShaderLibrary;
    use crate::render::RecordingBackend;

    fn ubo_program(backend: &mut RecordingBackend) -> Program {
        Program::load(
            backend,
            &ShaderLibrary::builtin(),
            "pos_only_world_transform_ubo.vert",
            "base_color.frag",
        )
        .unwrap()
    }

    #[test]
    fn test_host_layout_matches_shader_block() {
        let mut backend = RecordingBackend::new();
        let program = ubo_program(&mut backend);
        let block = program.interface().block("GlobalMatrices").unwrap();
        GlobalMatrices::check_layout(block).unwrap();
        assert_eq!(size_of::<GlobalMatrices>(), 128);
    }

    #[test]
    fn test_layout_mismatch_is_reported() {
        let mut backend = RecordingBackend::new();
        let program = ubo_program(&mut backend);
        let mut block = program.interface().block("GlobalMatrices").unwrap().clone();
        block.members.swap(0, 1);
        assert!(matches!(
            GlobalMatrices::check_layout(&block),
            Err(RenderError::InvalidUniform(_))
        ));
    }

    #[test]
    fn test_buffer_is_bound_and_attached() {
        let mut backend = RecordingBackend::new();
        let program = ubo_program(&mut backend);
        let ubo = UniformBlockBuffer::<GlobalMatrices>::new(&mut backend, GLOBAL_MATRICES_BINDING).unwrap();
        ubo.attach(&mut backend, &program).unwrap();

        assert_eq!(backend.buffer_binding(0), Some((ubo.buffer(), 0, 128)));
        let index = program.uniform_block_index("GlobalMatrices").unwrap();
        assert_eq!(backend.block_binding(program.handle(), index), Some(0));
    }

    #[test]
    fn test_partial_updates_write_their_own_matrix() {
        let mut backend = RecordingBackend::new();
        let ubo = UniformBlockBuffer::<GlobalMatrices>::new(&mut backend, GLOBAL_MATRICES_BINDING).unwrap();
        let view = Mat4::new_translation(&Vec3::new(0.0, 0.0, -5.0));
        ubo.set_world_to_camera(&mut backend, &view).unwrap();

        let data = backend.buffer_data(ubo.buffer()).unwrap();
        let stored: GlobalMatrices = bytemuck::pod_read_unaligned(data);
        assert_eq!(stored.camera_to_clip, [[0.0; 4]; 4]);
        assert_eq!(stored.world_to_camera, utils::to_columns(&view));
    }

    #[test]
    fn test_attach_requires_the_block() {
        let mut backend = RecordingBackend::new();
        let program = Program::load(
            &mut backend,
            &ShaderLibrary::builtin(),
            "pos_only_world_transform.vert",
            "base_color.frag",
        )
        .unwrap();
        let ubo = UniformBlockBuffer::<GlobalMatrices>::new(&mut backend, GLOBAL_MATRICES_BINDING).unwrap();
        assert!(ubo.attach(&mut backend, &program).is_err());
    }
}
