//! A triangle moving in a circle
//!
//! The shader variant lets the vertex shader compute the offset from a
//! `time` uniform and fades the color in the fragment shader. The CPU variant
//! computes the offset on the host and rewrites the positions in the vertex
//! buffer every frame.

use crate::application::{AppError, FrameInfo, Tutorial};
use crate::assets::mesh::{PrimitiveType, RenderCommand};
use crate::assets::Resources;
use crate::foundation::math::constants::TAU;
use crate::render::{BufferUsage, ClearFlags, Mesh, Program, RenderBackend, UniformLocation};

use super::{not_initialized, position_color_mesh, GRAY};

/// Seconds for one trip around the circle
pub const LOOP_DURATION: f32 = 5.0;

/// Seconds for one color fade cycle
pub const FRAG_LOOP_DURATION: f32 = 10.0;

#[rustfmt::skip]
const POSITIONS: [f32; 12] = [
     0.25,  0.25, 0.0, 1.0,
     0.25, -0.25, 0.0, 1.0,
    -0.25, -0.25, 0.0, 1.0,
];

#[rustfmt::skip]
const COLORS: [f32; 12] = [
    1.0, 0.0, 0.0, 1.0,
    0.0, 1.0, 0.0, 1.0,
    0.0, 0.0, 1.0, 1.0,
];

/// Where the offset is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetMode {
    /// `calc_offset.vert` + `calc_color.frag`
    Shader,
    /// Host-side offsets written into the vertex buffer
    Cpu,
}

/// Offset of the triangle at `elapsed` seconds
///
/// `(sin, cos)` of the angle through the loop, scaled to a radius of 0.5.
#[must_use]
pub fn position_offset(elapsed: f32, loop_duration: f32) -> (f32, f32) {
    let scale = TAU / loop_duration;
    let (x, y) = (elapsed.rem_euclid(loop_duration) * scale).sin_cos();
    (x * 0.5, y * 0.5)
}

/// Base positions moved by `(x, y)`
#[must_use]
pub fn offset_positions(x: f32, y: f32) -> [f32; 12] {
    let mut positions = POSITIONS;
    for vertex in positions.chunks_exact_mut(4) {
        vertex[0] += x;
        vertex[1] += y;
    }
    positions
}

struct Scene {
    program: Program,
    mesh: Mesh,
    time: Option<UniformLocation>,
}

/// Moving triangle scene
pub struct MovingTriangle {
    mode: OffsetMode,
    scene: Option<Scene>,
}

impl MovingTriangle {
    /// Scene animated in the given mode
    #[must_use]
    pub const fn new(mode: OffsetMode) -> Self {
        Self { mode, scene: None }
    }

    /// Animation done by the shaders
    #[must_use]
    pub const fn shader() -> Self {
        Self::new(OffsetMode::Shader)
    }

    /// Animation done on the host
    #[must_use]
    pub const fn cpu() -> Self {
        Self::new(OffsetMode::Cpu)
    }

    /// Where the offset is computed
    #[must_use]
    pub const fn mode(&self) -> OffsetMode {
        self.mode
    }
}

impl Tutorial for MovingTriangle {
    fn name(&self) -> &'static str {
        match self.mode {
            OffsetMode::Shader => "moving-triangle",
            OffsetMode::Cpu => "moving-triangle-cpu",
        }
    }

    fn init(&mut self, backend: &mut dyn RenderBackend, resources: &mut Resources) -> Result<(), AppError> {
        let (program, time) = match self.mode {
            OffsetMode::Shader => {
                let program = resources.program(backend, "calc_offset.vert", "calc_color.frag")?;
                program.bind(backend)?;
                program.set_named_uniform(backend, "loopDuration", LOOP_DURATION)?;
                program.set_named_uniform(backend, "fragLoopDuration", FRAG_LOOP_DURATION)?;
                backend.use_program(None)?;
                let time = program.uniform_location("time")?;
                (program, Some(time))
            }
            OffsetMode::Cpu => (resources.program(backend, "vertex_colors.vert", "vertex_colors.frag")?, None),
        };

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
        let mesh = Mesh::upload_with_usage(&data, backend, BufferUsage::StreamDraw)?;
        self.scene = Some(Scene { program, mesh, time });
        Ok(())
    }

    fn display(&mut self, backend: &mut dyn RenderBackend, frame: &FrameInfo) -> Result<(), AppError> {
        let scene = self.scene.as_ref().ok_or_else(|| not_initialized(self.name()))?;
        if self.mode == OffsetMode::Cpu {
            let (x, y) = position_offset(frame.elapsed, LOOP_DURATION);
            let positions = offset_positions(x, y);
            // Positions are the first attribute, at the start of the buffer.
            backend.update_buffer(scene.mesh.vertex_buffer(), 0, bytemuck::cast_slice(&positions))?;
        }

        backend.clear_color(GRAY);
        backend.clear(ClearFlags::COLOR);

        scene.program.bind(backend)?;
        if let Some(time) = scene.time {
            scene.program.set_uniform(backend, time, frame.elapsed)?;
        }
        scene.mesh.render(backend)?;
        backend.use_program(None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{BackendCall, UniformValue};
    use crate::tutorials::testing;
    use approx::assert_relative_eq;

    #[test]
    fn test_offset_follows_the_loop() {
        let (x, y) = position_offset(0.0, LOOP_DURATION);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.5);

        let (x, y) = position_offset(LOOP_DURATION * 0.25, LOOP_DURATION);
        assert_relative_eq!(x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);

        // One full loop later the offset repeats.
        let (a, b) = position_offset(1.3, LOOP_DURATION);
        let (c, d) = position_offset(1.3 + LOOP_DURATION, LOOP_DURATION);
        assert_relative_eq!(a, c, epsilon = 1e-5);
        assert_relative_eq!(b, d, epsilon = 1e-5);
    }

    #[test]
    fn test_only_xy_are_offset() {
        let positions = offset_positions(1.0, -1.0);
        assert_relative_eq!(positions[0], 1.25);
        assert_relative_eq!(positions[1], -0.75);
        assert_relative_eq!(positions[2], 0.0);
        assert_relative_eq!(positions[3], 1.0);
    }

    #[test]
    fn test_shader_mode_sets_time() {
        let mut engine = testing::engine(MovingTriangle::shader());
        engine.run_frames(30).unwrap();
        let calls = testing::last_frame(&mut engine);

        let time = calls.iter().find_map(|c| match c {
            BackendCall::SetUniform {
                value: UniformValue::Float(t),
                ..
            } => Some(*t),
            _ => None,
        });
        assert_relative_eq!(time.unwrap(), 0.5, epsilon = 1e-4);
        assert!(!calls.iter().any(|c| matches!(c, BackendCall::UpdateBuffer { .. })));

        let program = engine.backend().current_program();
        assert!(program.is_none());
    }

    #[test]
    fn test_shader_mode_loop_durations() {
        let mut engine = testing::engine(MovingTriangle::shader());
        engine.run_frames(1).unwrap();
        let backend = engine.backend();
        let program = crate::render::ProgramHandle(1);
        assert_eq!(backend.uniform_value(program, "loopDuration"), Some(UniformValue::Float(5.0)));
        assert_eq!(backend.uniform_value(program, "fragLoopDuration"), Some(UniformValue::Float(10.0)));
    }

    #[test]
    fn test_cpu_mode_rewrites_positions() {
        let mut engine = testing::engine(MovingTriangle::cpu());
        engine.run_frames(1).unwrap();
        let calls = testing::last_frame(&mut engine);
        assert!(calls.contains(&BackendCall::UpdateBuffer {
            buffer: crate::render::BufferHandle(1),
            offset: 0,
            size: 48,
        }));

        let data = engine.backend().buffer_data(crate::render::BufferHandle(1)).unwrap();
        let float_at = |i: usize| f32::from_le_bytes(data[i * 4..i * 4 + 4].try_into().unwrap());
        let (x, y) = position_offset(1.0 / 60.0, LOOP_DURATION);
        assert_relative_eq!(float_at(0), 0.25 + x, epsilon = 1e-6);
        assert_relative_eq!(float_at(1), 0.25 + y, epsilon = 1e-6);
    }
}
