//! Gimbal lock
//!
//! Three nested gimbals rotate about X, then Y, then Z; the ship sits inside
//! the innermost one. Turning the middle gimbal by 90 degrees lines the outer
//! and inner axes up and one degree of freedom is lost.
//!
//! Keys: `w`/`s` outer (X), `a`/`d` middle (Y), `q`/`e` inner (Z), space hides
//! or shows the gimbals.

use crate::application::{AppError, FrameInfo, Tutorial};
use crate::assets::mesh::generator::MeshKind;
use crate::assets::Resources;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::input::{KeyAction, KeyCode, Modifiers};
use crate::render::{Mesh, Program, RenderBackend, UniformLocation};
use crate::scene::{MatrixStack, PushStack};

use super::{aspect_ratio, clear_color_depth, enable_culling_and_depth, not_initialized};

/// Gimbal angle step, degrees
pub const ANGLE_INCREMENT: f32 = 9.0;

const FOV_DEGREES: f32 = 20.0;
const Z_NEAR: f32 = 1.0;
const Z_FAR: f32 = 1500.0;
const CAMERA_DISTANCE: f32 = 200.0;
const SHIP_SCALE: f32 = 3.0;
const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 0.0];

/// Rotation axis of a gimbal ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GimbalAxis {
    /// Outer ring
    X,
    /// Middle ring
    Y,
    /// Inner ring
    Z,
}

impl GimbalAxis {
    const fn color(self) -> [f32; 4] {
        match self {
            Self::X => [0.4, 0.4, 1.0, 1.0],
            Self::Y => [0.0, 1.0, 0.0, 1.0],
            Self::Z => [1.0, 0.3, 0.3, 1.0],
        }
    }

    const fn mesh(self) -> MeshKind {
        match self {
            Self::X => MeshKind::LargeGimbal,
            Self::Y => MeshKind::MediumGimbal,
            Self::Z => MeshKind::SmallGimbal,
        }
    }

    /// Turn the ring model, which lies in the XY plane, onto its axis
    fn orient(self, stack: &mut MatrixStack) {
        match self {
            Self::X => {}
            Self::Y => {
                stack.rotate_z(90.0);
                stack.rotate_x(90.0);
            }
            Self::Z => {
                stack.rotate_y(90.0);
                stack.rotate_x(90.0);
            }
        }
    }
}

struct Scene {
    program: Program,
    gimbals: [Mesh; 3],
    ship: Mesh,
    model_to_camera: UniformLocation,
    camera_to_clip: UniformLocation,
    base_color: UniformLocation,
}

impl Scene {
    fn draw(
        &self,
        backend: &mut dyn RenderBackend,
        mesh: &Mesh,
        model_to_camera: &Mat4,
        color: [f32; 4],
    ) -> Result<(), AppError> {
        self.program.set_uniform(backend, self.base_color, color)?;
        self.program.set_uniform(backend, self.model_to_camera, model_to_camera)?;
        mesh.render(backend)?;
        Ok(())
    }
}

/// Gimbal scene
pub struct Oriented {
    /// Degrees about X, Y and Z
    angles: Vec3,
    draw_gimbals: bool,
    scene: Option<Scene>,
}

impl Default for Oriented {
    fn default() -> Self {
        Self::new()
    }
}

impl Oriented {
    /// Gimbals at rest, visible
    #[must_use]
    pub fn new() -> Self {
        Self {
            angles: Vec3::zeros(),
            draw_gimbals: true,
            scene: None,
        }
    }

    /// Current gimbal angles in degrees
    #[must_use]
    pub const fn angles(&self) -> &Vec3 {
        &self.angles
    }

    /// Whether the rings are drawn
    #[must_use]
    pub const fn draws_gimbals(&self) -> bool {
        self.draw_gimbals
    }

    /// Ship model matrix for the current angles
    #[must_use]
    pub fn ship_matrix(&self) -> Mat4 {
        let mut stack = MatrixStack::new();
        stack.translate(Vec3::new(0.0, 0.0, -CAMERA_DISTANCE));
        stack.rotate_x(self.angles.x);
        stack.rotate_y(self.angles.y);
        stack.rotate_z(self.angles.z);
        stack.uniform_scale(SHIP_SCALE);
        stack.rotate_x(-90.0);
        stack.top()
    }

    fn draw_gimbal(
        &self,
        scene: &Scene,
        backend: &mut dyn RenderBackend,
        stack: &mut MatrixStack,
        axis: GimbalAxis,
    ) -> Result<(), AppError> {
        if !self.draw_gimbals {
            return Ok(());
        }
        let mut ring = PushStack::new(stack);
        axis.orient(&mut ring);
        let mesh = &scene.gimbals[axis as usize];
        scene.draw(backend, mesh, &ring.top(), axis.color())
    }
}

impl Tutorial for Oriented {
    fn name(&self) -> &'static str {
        "oriented"
    }

    fn init(&mut self, backend: &mut dyn RenderBackend, resources: &mut Resources) -> Result<(), AppError> {
        let program = resources.program(backend, "pos_color_local_transform.vert", "color_mult_uniform.frag")?;
        enable_culling_and_depth(backend);

        let gimbals = [
            resources.load_mesh(backend, &GimbalAxis::X.mesh().file_name())?,
            resources.load_mesh(backend, &GimbalAxis::Y.mesh().file_name())?,
            resources.load_mesh(backend, &GimbalAxis::Z.mesh().file_name())?,
        ];
        let ship = resources.load_mesh(backend, &MeshKind::Ship.file_name())?;

        self.scene = Some(Scene {
            model_to_camera: program.uniform_location("modelToCamera")?,
            camera_to_clip: program.uniform_location("cameraToClip")?,
            base_color: program.uniform_location("baseColor")?,
            program,
            gimbals,
            ship,
        });
        Ok(())
    }

    fn display(&mut self, backend: &mut dyn RenderBackend, _frame: &FrameInfo) -> Result<(), AppError> {
        let scene = self.scene.as_ref().ok_or_else(|| not_initialized("oriented"))?;
        clear_color_depth(backend, CLEAR_COLOR);
        scene.program.bind(backend)?;

        let mut stack = MatrixStack::new();
        stack.translate(Vec3::new(0.0, 0.0, -CAMERA_DISTANCE));
        stack.rotate_x(self.angles.x);
        self.draw_gimbal(scene, backend, &mut stack, GimbalAxis::X)?;
        stack.rotate_y(self.angles.y);
        self.draw_gimbal(scene, backend, &mut stack, GimbalAxis::Y)?;
        stack.rotate_z(self.angles.z);
        self.draw_gimbal(scene, backend, &mut stack, GimbalAxis::Z)?;

        stack.uniform_scale(SHIP_SCALE);
        stack.rotate_x(-90.0);
        scene.draw(backend, &scene.ship, &stack.top(), [1.0; 4])?;

        backend.use_program(None)?;
        Ok(())
    }

    fn keyboard(&mut self, key: KeyCode, action: KeyAction, _mods: Modifiers) {
        if !action.is_down() {
            return;
        }
        match key {
            KeyCode::W => self.angles.x += ANGLE_INCREMENT,
            KeyCode::S => self.angles.x -= ANGLE_INCREMENT,
            KeyCode::A => self.angles.y += ANGLE_INCREMENT,
            KeyCode::D => self.angles.y -= ANGLE_INCREMENT,
            KeyCode::Q => self.angles.z += ANGLE_INCREMENT,
            KeyCode::E => self.angles.z -= ANGLE_INCREMENT,
            KeyCode::Space if action == KeyAction::Press => {
                self.draw_gimbals = !self.draw_gimbals;
                log::info!("Gimbals {}", if self.draw_gimbals { "shown" } else { "hidden" });
            }
            _ => {}
        }
    }

    fn reshape(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<(), AppError> {
        let scene = self.scene.as_ref().ok_or_else(|| not_initialized("oriented"))?;
        let camera_to_clip = Mat4::perspective_gl(FOV_DEGREES, aspect_ratio(width, height), Z_NEAR, Z_FAR);
        scene.program.bind(backend)?;
        scene.program.set_uniform(backend, scene.camera_to_clip, camera_to_clip)?;
        backend.use_program(None)?;
        backend.viewport(0, 0, width, height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AppEvent;
    use crate::input::KeyEvent;
    use crate::render::{BackendCall, Capability, UniformValue};
    use crate::tutorials::testing;
    use approx::assert_relative_eq;

    #[test]
    fn test_keys_change_angles_by_nine_degrees() {
        let mut oriented = Oriented::new();
        for key in [KeyCode::W, KeyCode::W, KeyCode::D, KeyCode::Q] {
            oriented.keyboard(key, KeyAction::Press, Modifiers::empty());
        }
        oriented.keyboard(KeyCode::E, KeyAction::Repeat, Modifiers::empty());
        oriented.keyboard(KeyCode::E, KeyAction::Release, Modifiers::empty());
        assert_relative_eq!(*oriented.angles(), Vec3::new(18.0, -9.0, -0.0));
    }

    #[test]
    fn test_space_toggles_gimbals() {
        let mut oriented = Oriented::new();
        oriented.keyboard(KeyCode::Space, KeyAction::Press, Modifiers::empty());
        assert!(!oriented.draws_gimbals());
        oriented.keyboard(KeyCode::Space, KeyAction::Repeat, Modifiers::empty());
        assert!(!oriented.draws_gimbals());
        oriented.keyboard(KeyCode::Space, KeyAction::Press, Modifiers::empty());
        assert!(oriented.draws_gimbals());
    }

    #[test]
    fn test_gimbal_draws_use_primitive_restart() {
        let mut engine = testing::engine(Oriented::new());
        engine.run_frames(1).unwrap();
        let calls = testing::last_frame(&mut engine);

        let restarts = calls
            .iter()
            .filter(|c| matches!(c, BackendCall::DrawElements { primitive_restart: Some(_), .. }))
            .count();
        assert_eq!(restarts, 3);
        assert_eq!(testing::draw_count(&calls), 4);
        assert!(!engine.backend().is_enabled(Capability::PrimitiveRestart));
    }

    #[test]
    fn test_hidden_gimbals_leave_the_ship() {
        let mut engine = testing::engine(Oriented::new());
        engine.schedule(0, AppEvent::Key(KeyEvent::press(KeyCode::Space)));
        engine.run_frames(1).unwrap();
        let calls = testing::last_frame(&mut engine);
        assert_eq!(testing::draw_count(&calls), 1);

        // The ship is drawn untinted.
        assert!(calls.iter().any(|c| matches!(
            c,
            BackendCall::SetUniform {
                value: UniformValue::Vec4([1.0, 1.0, 1.0, 1.0]),
                ..
            }
        )));
    }

    #[test]
    fn test_ship_sits_in_front_of_the_camera() {
        let oriented = Oriented::new();
        let matrix = oriented.ship_matrix();
        assert_relative_eq!(matrix[(2, 3)], -CAMERA_DISTANCE);
        // Scaled by 3 and pitched down 90 degrees: model +Y points to camera -Z.
        assert_relative_eq!(matrix[(2, 1)], -SHIP_SCALE, epsilon = 1e-5);
    }
}
