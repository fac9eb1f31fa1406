//! Robot arm hierarchy
//!
//! The arm is a tree of [`Joint`]s rebuilt from the current [`ArmPose`] each
//! frame and walked with a [`MatrixStack`]; every piece of geometry is the
//! same colored cube drawn with its own `modelToCamera` matrix.
//!
//! Keys: `a`/`d` base, `w`/`s` upper arm, `r`/`f` lower arm, `t`/`g` wrist
//! pitch, `z`/`c` wrist roll, `q`/`e` fingers, space logs the pose.

use crate::application::{AppError, FrameInfo, Tutorial};
use crate::assets::mesh::{Attribute, IndexType, MeshData, PrimitiveType, RenderCommand};
use crate::assets::Resources;
use crate::foundation::math::{utils, Vec3};
use crate::input::{KeyAction, KeyCode, Modifiers};
use crate::render::{Mesh, Program, RenderBackend, RenderError, UniformLocation};
use crate::scene::{Geometry, Joint, MatrixStack, Node};

use super::{aspect_ratio, clear_color_depth, enable_culling_and_depth, not_initialized};

/// Angle step of most controls, degrees
pub const STANDARD_ANGLE_INCREMENT: f32 = 11.25;

/// Angle step of the fingers, degrees
pub const SMALL_ANGLE_INCREMENT: f32 = 9.0;

const FOV_DEGREES: f32 = 45.0;
const Z_NEAR: f32 = 1.0;
const Z_FAR: f32 = 45.0;
const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 0.0];

const BASE_POSITION: Vec3 = Vec3::new(3.0, -5.0, -40.0);
const BASE_LEFT: Vec3 = Vec3::new(2.0, 0.0, 0.0);
const BASE_RIGHT: Vec3 = Vec3::new(-2.0, 0.0, 0.0);
const BASE_SCALE_Z: f32 = 3.0;

const UPPER_ARM_SIZE: f32 = 9.0;

const LOWER_ARM_POSITION: Vec3 = Vec3::new(0.0, 0.0, 8.0);
const LOWER_ARM_LENGTH: f32 = 5.0;
const LOWER_ARM_WIDTH: f32 = 1.5;

const WRIST_POSITION: Vec3 = Vec3::new(0.0, 0.0, 5.0);
const WRIST_LENGTH: f32 = 2.0;
const WRIST_WIDTH: f32 = 2.0;

const LEFT_FINGER_POSITION: Vec3 = Vec3::new(1.0, 0.0, 1.0);
const RIGHT_FINGER_POSITION: Vec3 = Vec3::new(-1.0, 0.0, 1.0);
const FINGER_LENGTH: f32 = 2.0;
const FINGER_WIDTH: f32 = 0.5;
const LOWER_FINGER_ANGLE: f32 = 45.0;

const GREEN: [f32; 4] = [0.75, 0.75, 1.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.5, 0.0, 1.0];
const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const YELLOW: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
const CYAN: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
const MAGENTA: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

/// Corners of each face of the cube from -1 to 1: front, top, left, back,
/// bottom, right
#[rustfmt::skip]
const CUBE_FACES: [[[f32; 3]; 4]; 6] = [
    [[ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0]],
    [[ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0]],
    [[ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0]],
    [[ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0]],
    [[ 1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0]],
    [[-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0]],
];

/// The cube every arm segment is drawn with, 4 vertices and 2 triangles per face
#[must_use]
pub fn arm_cube() -> MeshData {
    let positions = CUBE_FACES.iter().flatten().flatten().copied().collect();
    let colors = [GREEN, BLUE, RED, YELLOW, CYAN, MAGENTA]
        .iter()
        .flat_map(|color| std::iter::repeat(*color).take(4))
        .flatten()
        .collect();
    let indices = (0..6u32)
        .flat_map(|face| [0, 1, 2, 2, 3, 0].map(|i| face * 4 + i))
        .collect();
    MeshData::new(
        vec![Attribute::float(0, 3, positions), Attribute::float(1, 4, colors)],
        Vec::new(),
        vec![RenderCommand::Indexed {
            primitive: PrimitiveType::Triangles,
            index_type: IndexType::Uint,
            primitive_restart: None,
            indices,
        }],
    )
}

/// Joint angles of the arm, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmPose {
    /// Base rotation about Y, wraps at 360
    pub base: f32,
    /// Upper arm pitch, within [-90, 0]
    pub upper_arm: f32,
    /// Lower arm pitch, within [0, 146.25]
    pub lower_arm: f32,
    /// Wrist pitch, within [0, 90]
    pub wrist_pitch: f32,
    /// Wrist roll, wraps at 360
    pub wrist_roll: f32,
    /// Finger spread, within [9, 180]
    pub finger_open: f32,
}

impl Default for ArmPose {
    fn default() -> Self {
        Self {
            base: -45.0,
            upper_arm: -33.75,
            lower_arm: 146.25,
            wrist_pitch: 67.5,
            wrist_roll: 0.0,
            finger_open: 180.0,
        }
    }
}

impl ArmPose {
    /// Adjust the joint bound to `key`; returns false for other keys
    pub fn apply_key(&mut self, key: KeyCode) -> bool {
        const STEP: f32 = STANDARD_ANGLE_INCREMENT;
        match key {
            KeyCode::A => self.base = (self.base + STEP) % 360.0,
            KeyCode::D => self.base = (self.base - STEP) % 360.0,
            KeyCode::W => self.upper_arm = (self.upper_arm - STEP).clamp(-90.0, 0.0),
            KeyCode::S => self.upper_arm = (self.upper_arm + STEP).clamp(-90.0, 0.0),
            KeyCode::R => self.lower_arm = (self.lower_arm - STEP).clamp(0.0, 146.25),
            KeyCode::F => self.lower_arm = (self.lower_arm + STEP).clamp(0.0, 146.25),
            KeyCode::T => self.wrist_pitch = (self.wrist_pitch - STEP).clamp(0.0, 90.0),
            KeyCode::G => self.wrist_pitch = (self.wrist_pitch + STEP).clamp(0.0, 90.0),
            KeyCode::Z => self.wrist_roll = (self.wrist_roll + STEP) % 360.0,
            KeyCode::C => self.wrist_roll = (self.wrist_roll - STEP) % 360.0,
            KeyCode::Q => self.finger_open = (self.finger_open + SMALL_ANGLE_INCREMENT).clamp(9.0, 180.0),
            KeyCode::E => self.finger_open = (self.finger_open - SMALL_ANGLE_INCREMENT).clamp(9.0, 180.0),
            _ => return false,
        }
        true
    }

    /// Joint tree for this pose; geometry is sized for the cube from -1 to 1
    #[must_use]
    pub fn hierarchy(&self) -> Node<Joint> {
        let finger = Geometry::new(
            Vec3::new(0.0, 0.0, FINGER_LENGTH / 2.0),
            Vec3::new(FINGER_WIDTH / 2.0, FINGER_WIDTH / 2.0, FINGER_LENGTH / 2.0),
        );
        let base_side = Vec3::new(1.0, 1.0, BASE_SCALE_Z);

        let left_finger = Node::new(
            Joint::new("left_finger", LEFT_FINGER_POSITION)
                .yaw(self.finger_open)
                .with_geometry(finger),
        )
        .leaf(
            Joint::new("left_finger_lower", Vec3::new(0.0, 0.0, FINGER_LENGTH))
                .yaw(-LOWER_FINGER_ANGLE)
                .with_geometry(finger),
        );
        let right_finger = Node::new(
            Joint::new("right_finger", RIGHT_FINGER_POSITION)
                .yaw(-self.finger_open)
                .with_geometry(finger),
        )
        .leaf(
            Joint::new("right_finger_lower", Vec3::new(0.0, 0.0, FINGER_LENGTH))
                .yaw(LOWER_FINGER_ANGLE)
                .with_geometry(finger),
        );

        let wrist = Node::new(
            Joint::new("wrist", WRIST_POSITION)
                .roll(self.wrist_roll)
                .pitch(self.wrist_pitch)
                .with_geometry(Geometry::new(
                    Vec3::zeros(),
                    Vec3::new(WRIST_WIDTH / 2.0, WRIST_WIDTH / 2.0, WRIST_LENGTH / 2.0),
                )),
        )
        .nodes([left_finger, right_finger]);

        let lower_arm = Node::new(
            Joint::new("lower_arm", LOWER_ARM_POSITION)
                .pitch(self.lower_arm)
                .with_geometry(Geometry::new(
                    Vec3::new(0.0, 0.0, LOWER_ARM_LENGTH / 2.0),
                    Vec3::new(LOWER_ARM_WIDTH / 2.0, LOWER_ARM_WIDTH / 2.0, LOWER_ARM_LENGTH / 2.0),
                )),
        )
        .node(wrist);

        let upper_arm = Node::new(
            Joint::new("upper_arm", Vec3::zeros())
                .pitch(self.upper_arm)
                .with_geometry(Geometry::new(
                    Vec3::new(0.0, 0.0, UPPER_ARM_SIZE / 2.0 - 1.0),
                    Vec3::new(1.0, 1.0, UPPER_ARM_SIZE / 2.0),
                )),
        )
        .node(lower_arm);

        let mut arm = Node::new(Joint::new("base", BASE_POSITION).yaw(self.base))
            .leaves([
                Joint::new("base_left", Vec3::zeros()).with_geometry(Geometry::new(BASE_LEFT, base_side)),
                Joint::new("base_right", Vec3::zeros()).with_geometry(Geometry::new(BASE_RIGHT, base_side)),
            ])
            .node(upper_arm);
        arm.rebuild_indices();
        arm
    }
}

struct Scene {
    program: Program,
    mesh: Mesh,
    model_to_camera: UniformLocation,
    camera_to_clip: UniformLocation,
}

/// Robot arm scene
#[derive(Default)]
pub struct Transform {
    pose: ArmPose,
    scene: Option<Scene>,
}

impl Transform {
    /// Arm in its starting pose
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pose
    #[must_use]
    pub const fn pose(&self) -> &ArmPose {
        &self.pose
    }
}

impl Tutorial for Transform {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn init(&mut self, backend: &mut dyn RenderBackend, resources: &mut Resources) -> Result<(), AppError> {
        let program = resources.program(backend, "pos_color_model_to_camera.vert", "vertex_colors.frag")?;
        let model_to_camera = program.uniform_location("modelToCamera")?;
        let camera_to_clip = program.uniform_location("cameraToClip")?;
        let mesh = Mesh::upload(&arm_cube(), backend)?;
        enable_culling_and_depth(backend);

        self.scene = Some(Scene {
            program,
            mesh,
            model_to_camera,
            camera_to_clip,
        });
        Ok(())
    }

    fn display(&mut self, backend: &mut dyn RenderBackend, _frame: &FrameInfo) -> Result<(), AppError> {
        let scene = self.scene.as_ref().ok_or_else(|| not_initialized("transform"))?;
        clear_color_depth(backend, CLEAR_COLOR);

        scene.program.bind(backend)?;
        let mut stack = MatrixStack::new();
        self.pose.hierarchy().walk(&mut stack, &mut |_, model_to_camera| {
            scene.program.set_uniform(backend, scene.model_to_camera, model_to_camera)?;
            scene.mesh.render(backend)?;
            Ok::<(), RenderError>(())
        })?;
        backend.use_program(None)?;
        Ok(())
    }

    fn keyboard(&mut self, key: KeyCode, action: KeyAction, _mods: Modifiers) {
        if !action.is_down() {
            return;
        }
        if key == KeyCode::Space {
            log::info!("Arm pose: {:?}", self.pose);
        } else if self.pose.apply_key(key) {
            log::debug!("Arm pose after '{key}': {:?}", self.pose);
        }
    }

    fn reshape(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<(), AppError> {
        let scene = self.scene.as_ref().ok_or_else(|| not_initialized("transform"))?;
        let camera_to_clip = utils::manual_perspective(
            utils::calc_frustum_scale(FOV_DEGREES),
            aspect_ratio(width, height),
            Z_NEAR,
            Z_FAR,
        );
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
    use crate::tutorials::testing;
    use approx::assert_relative_eq;

    #[test]
    fn test_arm_has_nine_pieces() {
        let arm = ArmPose::default().hierarchy();
        assert_eq!(arm.len(), 10);
        let pieces = arm.model_matrices(&mut MatrixStack::new());
        let names: Vec<_> = pieces.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            [
                "base_left",
                "base_right",
                "upper_arm",
                "lower_arm",
                "wrist",
                "left_finger",
                "left_finger_lower",
                "right_finger",
                "right_finger_lower",
            ]
        );
    }

    #[test]
    fn test_base_pieces_follow_base_rotation() {
        let pieces = ArmPose::default().hierarchy().model_matrices(&mut MatrixStack::new());
        let (_, left) = pieces[0];
        let half = std::f32::consts::SQRT_2;
        assert_relative_eq!(left[(0, 3)], 3.0 + half, epsilon = 1e-4);
        assert_relative_eq!(left[(1, 3)], -5.0, epsilon = 1e-4);
        assert_relative_eq!(left[(2, 3)], -40.0 + half, epsilon = 1e-4);
    }

    #[test]
    fn test_keys_are_clamped() {
        let mut pose = ArmPose::default();
        for _ in 0..20 {
            pose.apply_key(KeyCode::W);
            pose.apply_key(KeyCode::F);
            pose.apply_key(KeyCode::G);
            pose.apply_key(KeyCode::Q);
        }
        assert_relative_eq!(pose.upper_arm, -90.0);
        assert_relative_eq!(pose.lower_arm, 146.25);
        assert_relative_eq!(pose.wrist_pitch, 90.0);
        assert_relative_eq!(pose.finger_open, 180.0);

        for _ in 0..40 {
            pose.apply_key(KeyCode::E);
            pose.apply_key(KeyCode::S);
        }
        assert_relative_eq!(pose.finger_open, 9.0);
        assert_relative_eq!(pose.upper_arm, 0.0);
        assert!(!pose.apply_key(KeyCode::X));
    }

    #[test]
    fn test_base_wraps() {
        let mut pose = ArmPose::default();
        for _ in 0..36 {
            pose.apply_key(KeyCode::A);
        }
        assert_relative_eq!(pose.base, 0.0);
    }

    #[test]
    fn test_frame_draws_every_piece() {
        let mut engine = testing::engine(Transform::new());
        engine.run_frames(1).unwrap();
        let calls = testing::last_frame(&mut engine);
        assert_eq!(testing::draw_count(&calls), 9);
    }

    #[test]
    fn test_keys_reach_the_pose() {
        let mut transform = Transform::new();
        transform.keyboard(KeyCode::R, KeyAction::Press, Modifiers::empty());
        transform.keyboard(KeyCode::R, KeyAction::Release, Modifiers::empty());
        assert_relative_eq!(transform.pose().lower_arm, 146.25 - STANDARD_ANGLE_INCREMENT);

        transform.keyboard(KeyCode::Space, KeyAction::Press, Modifiers::empty());
        assert_relative_eq!(transform.pose().lower_arm, 146.25 - STANDARD_ANGLE_INCREMENT);
    }
}
