//! Perspective projection of a hollow box
//!
//! Two ways to project the same 36 vertices: a `perspectiveMatrix` uniform
//! rebuilt on every reshape, or the scalar `frustumScale`/`zNear`/`zFar`
//! uniforms the vertex shader combines by hand.

use crate::application::{AppError, FrameInfo, Tutorial};
use crate::assets::mesh::{PrimitiveType, RenderCommand};
use crate::assets::Resources;
use crate::foundation::math::{utils, Mat4};
use crate::render::{BufferUsage, ClearFlags, Mesh, Program, RenderBackend, UniformLocation};

use super::{aspect_ratio, enable_culling, not_initialized, position_color_mesh, GRAY};

const FRUSTUM_SCALE: f32 = 1.0;
const Z_NEAR: f32 = 1.0;
const Z_FAR: f32 = 3.0;
const OFFSET: (f32, f32) = (0.5, 0.5);

const FRONT: f32 = -1.25;
const BACK: f32 = -2.75;

#[rustfmt::skip]
const POSITIONS: [[f32; 3]; 36] = [
    [ 0.25,  0.25, FRONT], [ 0.25, -0.25, FRONT], [-0.25,  0.25, FRONT],
    [ 0.25, -0.25, FRONT], [-0.25, -0.25, FRONT], [-0.25,  0.25, FRONT],

    [ 0.25,  0.25, BACK], [-0.25,  0.25, BACK], [ 0.25, -0.25, BACK],
    [ 0.25, -0.25, BACK], [-0.25,  0.25, BACK], [-0.25, -0.25, BACK],

    [-0.25,  0.25, FRONT], [-0.25, -0.25, FRONT], [-0.25, -0.25, BACK],
    [-0.25,  0.25, FRONT], [-0.25, -0.25, BACK],  [-0.25,  0.25, BACK],

    [ 0.25,  0.25, FRONT], [ 0.25, -0.25, BACK],  [ 0.25, -0.25, FRONT],
    [ 0.25,  0.25, FRONT], [ 0.25,  0.25, BACK],  [ 0.25, -0.25, BACK],

    [ 0.25,  0.25, BACK],  [ 0.25,  0.25, FRONT], [-0.25,  0.25, FRONT],
    [ 0.25,  0.25, BACK],  [-0.25,  0.25, FRONT], [-0.25,  0.25, BACK],

    [ 0.25, -0.25, BACK],  [-0.25, -0.25, FRONT], [ 0.25, -0.25, FRONT],
    [ 0.25, -0.25, BACK],  [-0.25, -0.25, BACK],  [-0.25, -0.25, FRONT],
];

/// One color per face, six vertices each
const FACE_COLORS: [[f32; 4]; 6] = [
    [0.0, 0.0, 1.0, 1.0],
    [0.8, 0.8, 0.8, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.5, 0.5, 0.0, 1.0],
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 1.0, 1.0],
];

/// How the projection reaches the vertex shader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// `matrix_perspective.vert`: one `mat4` uniform
    Matrix,
    /// `manual_perspective.vert`: scalar uniforms
    Manual,
}

struct Scene {
    program: Program,
    mesh: Mesh,
    offset: UniformLocation,
    perspective_matrix: Option<UniformLocation>,
}

/// Box scene
pub struct Cube {
    projection: Projection,
    scene: Option<Scene>,
}

impl Cube {
    /// Box projected the given way
    #[must_use]
    pub const fn new(projection: Projection) -> Self {
        Self {
            projection,
            scene: None,
        }
    }

    /// Projection through a matrix uniform
    #[must_use]
    pub const fn matrix() -> Self {
        Self::new(Projection::Matrix)
    }

    /// Projection computed in the shader
    #[must_use]
    pub const fn manual() -> Self {
        Self::new(Projection::Manual)
    }

    fn vertex_data() -> (Vec<f32>, Vec<f32>) {
        let positions = POSITIONS.iter().flat_map(|&[x, y, z]| [x, y, z, 1.0]).collect();
        let colors = FACE_COLORS
            .iter()
            .flat_map(|color| std::iter::repeat(color).take(6))
            .flatten()
            .copied()
            .collect();
        (positions, colors)
    }
}

impl Tutorial for Cube {
    fn name(&self) -> &'static str {
        match self.projection {
            Projection::Matrix => "cube",
            Projection::Manual => "cube-manual",
        }
    }

    fn init(&mut self, backend: &mut dyn RenderBackend, resources: &mut Resources) -> Result<(), AppError> {
        let program = match self.projection {
            Projection::Matrix => {
                let program = resources.program(backend, "matrix_perspective.vert", "vertex_colors.frag")?;
                program.bind(backend)?;
                let matrix = utils::manual_perspective(FRUSTUM_SCALE, 1.0, Z_NEAR, Z_FAR);
                program.set_named_uniform(backend, "perspectiveMatrix", matrix)?;
                program
            }
            Projection::Manual => {
                let program = resources.program(backend, "manual_perspective.vert", "vertex_colors.frag")?;
                program.bind(backend)?;
                program.set_named_uniform(backend, "frustumScale", FRUSTUM_SCALE)?;
                program.set_named_uniform(backend, "zNear", Z_NEAR)?;
                program.set_named_uniform(backend, "zFar", Z_FAR)?;
                program
            }
        };
        backend.use_program(None)?;

        let (positions, colors) = Self::vertex_data();
        let data = position_color_mesh(
            4,
            &positions,
            &colors,
            RenderCommand::Arrays {
                primitive: PrimitiveType::Triangles,
                start: 0,
                count: 36,
            },
        );
        let mesh = Mesh::upload_with_usage(&data, backend, BufferUsage::StreamDraw)?;
        enable_culling(backend);

        self.scene = Some(Scene {
            offset: program.uniform_location("offset")?,
            perspective_matrix: program.optional_uniform_location("perspectiveMatrix"),
            program,
            mesh,
        });
        Ok(())
    }

    fn display(&mut self, backend: &mut dyn RenderBackend, _frame: &FrameInfo) -> Result<(), AppError> {
        let scene = self.scene.as_ref().ok_or_else(|| not_initialized(self.name()))?;
        backend.clear_color(GRAY);
        backend.clear(ClearFlags::COLOR);

        scene.program.bind(backend)?;
        scene.program.set_uniform(backend, scene.offset, OFFSET)?;
        scene.mesh.render(backend)?;
        backend.use_program(None)?;
        Ok(())
    }

    fn reshape(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<(), AppError> {
        let scene = self.scene.as_ref().ok_or_else(|| not_initialized(self.name()))?;
        if let Some(location) = scene.perspective_matrix {
            let matrix: Mat4 = utils::manual_perspective(FRUSTUM_SCALE, aspect_ratio(width, height), Z_NEAR, Z_FAR);
            scene.program.bind(backend)?;
            scene.program.set_uniform(backend, location, matrix)?;
            backend.use_program(None)?;
        }
        backend.viewport(0, 0, width, height);
        Ok(())
    }
}
