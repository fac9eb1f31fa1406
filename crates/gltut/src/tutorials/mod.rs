//! Tutorial scenes
//!
//! Each scene sets up its programs and meshes in `init`, then issues the
//! same backend calls every frame as the windowed tutorial it mirrors. The
//! [`registry`] maps command-line names to scenes.

pub mod cube;
pub mod moving_triangle;
pub mod multiple_objects;
pub mod oriented;
pub mod registry;
pub mod transform;
pub mod triangle;
pub mod world;

pub use cube::Cube;
pub use moving_triangle::MovingTriangle;
pub use multiple_objects::MultipleObjects;
pub use oriented::Oriented;
pub use registry::{create, TutorialEntry, TUTORIALS};
pub use transform::Transform;
pub use triangle::Triangle;
pub use world::World;

use crate::application::AppError;
use crate::assets::mesh::{Attribute, MeshData, RenderCommand};
use crate::render::{Capability, ClearFlags, CullMode, DepthFunc, FrontFace, RenderBackend};

/// Clear color shared by the early tutorials
pub(crate) const GRAY: [f32; 4] = [0.5, 0.5, 0.5, 0.0];

/// Positions at attribute 0 and colors at attribute 1
pub(crate) fn position_color_mesh(
    position_size: u32,
    positions: &[f32],
    colors: &[f32],
    command: RenderCommand,
) -> MeshData {
    MeshData::new(
        vec![
            Attribute::float(0, position_size, positions.to_vec()),
            Attribute::float(1, 4, colors.to_vec()),
        ],
        Vec::new(),
        vec![command],
    )
}

/// Back-face culling with clockwise front faces
pub(crate) fn enable_culling(backend: &mut dyn RenderBackend) {
    backend.enable(Capability::CullFace);
    backend.cull_face(CullMode::Back);
    backend.front_face(FrontFace::Cw);
}

/// Culling plus a `LessEqual` depth test over the full depth range
pub(crate) fn enable_culling_and_depth(backend: &mut dyn RenderBackend) {
    enable_culling(backend);
    backend.enable(Capability::DepthTest);
    backend.depth_mask(true);
    backend.depth_func(DepthFunc::LessEqual);
    backend.depth_range(0.0, 1.0);
}

/// Clear color and depth
pub(crate) fn clear_color_depth(backend: &mut dyn RenderBackend, color: [f32; 4]) {
    backend.clear_color(color);
    backend.clear_depth(1.0);
    backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
}

/// Width over height; a zero dimension counts as one pixel
pub(crate) fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

pub(crate) fn not_initialized(name: &str) -> AppError {
    AppError::Custom(format!("'{name}' used before init"))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for driving scenes against a recording backend

    use crate::application::Tutorial;
    use crate::core::TutorialConfig;
    use crate::engine::Engine;
    use crate::render::recorder::BackendCall;
    use crate::render::RecordingBackend;

    pub fn engine(tutorial: impl Tutorial + 'static) -> Engine<RecordingBackend> {
        engine_boxed(Box::new(tutorial))
    }

    pub fn engine_boxed(tutorial: Box<dyn Tutorial>) -> Engine<RecordingBackend> {
        let config = TutorialConfig::default().with_window_size(500, 500);
        Engine::new(config, RecordingBackend::new(), tutorial).unwrap()
    }

    /// Calls issued while drawing one more frame
    pub fn last_frame(engine: &mut Engine<RecordingBackend>) -> Vec<BackendCall> {
        engine.backend_mut().take_calls();
        engine.run_frames(1).unwrap();
        engine.backend_mut().take_calls()
    }

    pub fn draw_count(calls: &[BackendCall]) -> usize {
        calls.iter().filter(|c| c.is_draw()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_guards_zero_dimensions() {
        assert!((aspect_ratio(800, 400) - 2.0).abs() < f32::EPSILON);
        assert!((aspect_ratio(10, 0) - 10.0).abs() < f32::EPSILON);
        assert!((aspect_ratio(0, 400) - 0.0025).abs() < f32::EPSILON);
        assert!((aspect_ratio(0, 0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_every_registered_tutorial_runs() {
        for entry in TUTORIALS {
            let mut engine = testing::engine_boxed((entry.build)());
            assert_eq!(engine.run_frames(3).unwrap(), 3, "{}", entry.name);
            assert!(engine.backend().summary().draws > 0, "{}", entry.name);
        }
    }
}
