//! A single colored triangle

use crate::application::{AppError, FrameInfo, Tutorial};
use crate::assets::mesh::{PrimitiveType, RenderCommand};
use crate::assets::Resources;
use crate::render::{ClearFlags, Mesh, Program, RenderBackend};

use super::{not_initialized, position_color_mesh, GRAY};

#[rustfmt::skip]
const POSITIONS: [f32; 12] = [
     0.0,    0.5,   0.0, 1.0,
     0.5,   -0.366, 0.0, 1.0,
    -0.5,   -0.366, 0.0, 1.0,
];

#[rustfmt::skip]
const COLORS: [f32; 12] = [
    1.0, 0.0, 0.0, 1.0,
    0.0, 1.0, 0.0, 1.0,
    0.0, 0.0, 1.0, 1.0,
];

struct Scene {
    program: Program,
    mesh: Mesh,
}

/// Three vertices with per-vertex colors, drawn with `draw_arrays`
#[derive(Default)]
pub struct Triangle {
    scene: Option<Scene>,
}

impl Triangle {
    /// Scene before `init`
    #[must_use]
    pub const fn new() -> Self {
        Self { scene: None }
    }
}

impl Tutorial for Triangle {
    fn name(&self) -> &'static str {
        "triangle"
    }

    fn init(&mut self, backend: &mut dyn RenderBackend, resources: &mut Resources) -> Result<(), AppError> {
        let program = resources.program(backend, "vertex_colors.vert", "vertex_colors.frag")?;
        let data = position_color_mesh(
            4,
            &POSITIONS,
            &COLORS,
            RenderCommand::Arrays {
                primitive: PrimitiveType::Triangles,
                start: 0,
                count: 3,
            },
        );
        let mesh = Mesh::upload(&data, backend)?;
        self.scene = Some(Scene { program, mesh });
        Ok(())
    }

    fn display(&mut self, backend: &mut dyn RenderBackend, _frame: &FrameInfo) -> Result<(), AppError> {
        let scene = self.scene.as_ref().ok_or_else(|| not_initialized(self.name()))?;
        backend.clear_color(GRAY);
        backend.clear(ClearFlags::COLOR);

        scene.program.bind(backend)?;
        scene.mesh.render(backend)?;
        backend.use_program(None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BackendCall;
    use crate::tutorials::testing;

    #[test]
    fn test_draws_three_vertices() {
        let mut engine = testing::engine(Triangle::new());
        engine.run_frames(1).unwrap();
        let calls = testing::last_frame(&mut engine);

        assert_eq!(calls.first(), Some(&BackendCall::ClearColor(GRAY)));
        assert!(calls.contains(&BackendCall::DrawArrays {
            primitive: PrimitiveType::Triangles,
            first: 0,
            count: 3
        }));
        assert_eq!(calls.last(), Some(&BackendCall::UseProgram(None)));
    }

    #[test]
    fn test_display_before_init_fails() {
        let mut triangle = Triangle::new();
        let mut backend = crate::render::RecordingBackend::new();
        assert!(matches!(
            triangle.display(&mut backend, &FrameInfo::default()),
            Err(AppError::Custom(_))
        ));
    }
}
