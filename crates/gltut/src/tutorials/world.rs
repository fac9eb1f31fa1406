//! World space with a spherical camera
//!
//! A ground plane, a forest and a Parthenon placed with a matrix stack in
//! world space. The camera orbits a target point; its matrices reach the
//! shaders either through the `GlobalMatrices` uniform block or as plain
//! uniforms set on each program.
//!
//! Keys: `w`/`a`/`s`/`d`/`q`/`e` move the target, `i`/`j`/`k`/`l` orbit,
//! `u`/`o` zoom, shift for fine steps, space shows the target point.

use crate::application::{AppError, FrameInfo, Tutorial};
use crate::assets::mesh::generator::MeshKind;
use crate::assets::Resources;
use crate::core::ProjectionConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::input::{KeyAction, KeyCode, Modifiers};
use crate::render::{
    Capability, GlobalMatrices, Mesh, Program, RenderBackend, UniformBlockBuffer, UniformLocation,
    GLOBAL_MATRICES_BINDING,
};
use crate::scene::{MatrixStack, PushStack};

use super::{aspect_ratio, clear_color_depth, enable_culling_and_depth, not_initialized};

const TARGET_STEP: f32 = 4.0;
const ANGLE_STEP: f32 = 11.0;
const RADIUS_STEP: f32 = 5.0;
const FINE_FACTOR: f32 = 0.1;

/// Polar angle limits, degrees
pub const THETA_RANGE: (f32, f32) = (-78.75, -1.0);

/// Closest the camera gets to its target
pub const MIN_RADIUS: f32 = 5.0;

const GROUND_COLOR: [f32; 4] = [0.302, 0.416, 0.0589, 1.0];
const TRUNK_COLOR: [f32; 4] = [0.694, 0.4, 0.106, 1.0];
const TREETOP_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const STONE_COLOR: [f32; 4] = [0.9, 0.9, 0.9, 0.9];
const COLUMN_BASE_COLOR: [f32; 4] = [1.0; 4];

const PARTHENON_POSITION: Vec3 = Vec3::new(20.0, 0.0, -10.0);
const PARTHENON_WIDTH: f32 = 14.0;
const PARTHENON_LENGTH: f32 = 20.0;
const PARTHENON_BASE_HEIGHT: f32 = 1.0;
const PARTHENON_TOP_HEIGHT: f32 = 2.0;
const PARTHENON_COLUMN_HEIGHT: f32 = 5.0;
const COLUMN_BASE_HEIGHT: f32 = 0.25;

/// Trees as `[x, z, trunk height, cone height]`
#[rustfmt::skip]
pub const FOREST: [[f32; 4]; 98] = [
    [-45.0, -40.0, 2.0, 3.0], [-42.0, -35.0, 2.0, 3.0], [-39.0, -29.0, 2.0, 4.0], [-44.0, -26.0, 3.0, 3.0],
    [-40.0, -22.0, 2.0, 4.0], [-36.0, -15.0, 3.0, 3.0], [-41.0, -11.0, 2.0, 3.0], [-37.0, -6.0, 3.0, 3.0],
    [-45.0, 0.0, 2.0, 3.0],   [-39.0, 4.0, 3.0, 4.0],   [-36.0, 8.0, 2.0, 3.0],   [-44.0, 13.0, 3.0, 3.0],
    [-42.0, 17.0, 2.0, 3.0],  [-38.0, 23.0, 3.0, 4.0],  [-41.0, 27.0, 2.0, 3.0],  [-39.0, 32.0, 3.0, 3.0],
    [-44.0, 37.0, 3.0, 4.0],  [-36.0, 42.0, 2.0, 3.0],  [-32.0, -45.0, 2.0, 3.0], [-30.0, -42.0, 2.0, 4.0],
    [-34.0, -38.0, 3.0, 5.0], [-33.0, -35.0, 3.0, 4.0], [-29.0, -28.0, 2.0, 3.0], [-26.0, -25.0, 3.0, 5.0],
    [-35.0, -21.0, 3.0, 4.0], [-31.0, -17.0, 3.0, 3.0], [-28.0, -12.0, 2.0, 4.0], [-29.0, -7.0, 3.0, 3.0],
    [-26.0, -1.0, 2.0, 4.0],  [-32.0, 6.0, 2.0, 3.0],   [-30.0, 10.0, 3.0, 5.0],  [-33.0, 14.0, 2.0, 4.0],
    [-35.0, 19.0, 3.0, 4.0],  [-28.0, 22.0, 2.0, 3.0],  [-33.0, 26.0, 3.0, 3.0],  [-29.0, 31.0, 3.0, 4.0],
    [-32.0, 38.0, 2.0, 3.0],  [-27.0, 41.0, 3.0, 4.0],  [-31.0, 45.0, 2.0, 4.0],  [-28.0, 48.0, 3.0, 5.0],
    [-25.0, -48.0, 2.0, 3.0], [-20.0, -42.0, 3.0, 4.0], [-22.0, -39.0, 2.0, 3.0], [-19.0, -34.0, 2.0, 3.0],
    [-23.0, -30.0, 3.0, 4.0], [-24.0, -24.0, 2.0, 3.0], [-16.0, -21.0, 2.0, 3.0], [-17.0, -17.0, 3.0, 3.0],
    [-25.0, -13.0, 2.0, 4.0], [-23.0, -8.0, 2.0, 3.0],  [-17.0, -2.0, 3.0, 3.0],  [-16.0, 1.0, 2.0, 3.0],
    [-19.0, 4.0, 3.0, 3.0],   [-22.0, 8.0, 2.0, 4.0],   [-21.0, 14.0, 2.0, 3.0],  [-16.0, 19.0, 2.0, 3.0],
    [-23.0, 24.0, 3.0, 3.0],  [-18.0, 28.0, 2.0, 4.0],  [-24.0, 31.0, 2.0, 3.0],  [-20.0, 36.0, 2.0, 3.0],
    [-22.0, 41.0, 3.0, 3.0],  [-21.0, 45.0, 2.0, 3.0],  [-12.0, -40.0, 2.0, 4.0], [-11.0, -35.0, 3.0, 3.0],
    [-10.0, -29.0, 1.0, 3.0], [-9.0, -26.0, 2.0, 2.0],  [-6.0, -22.0, 2.0, 3.0],  [-15.0, -15.0, 1.0, 3.0],
    [-8.0, -11.0, 2.0, 3.0],  [-14.0, -6.0, 2.0, 4.0],  [-12.0, 0.0, 2.0, 3.0],   [-7.0, 4.0, 2.0, 2.0],
    [-13.0, 8.0, 2.0, 2.0],   [-9.0, 13.0, 1.0, 3.0],   [-13.0, 17.0, 3.0, 4.0],  [-6.0, 23.0, 2.0, 3.0],
    [-12.0, 27.0, 1.0, 2.0],  [-8.0, 32.0, 2.0, 3.0],   [-10.0, 37.0, 3.0, 3.0],  [-11.0, 42.0, 2.0, 2.0],
    [15.0, 5.0, 2.0, 3.0],    [15.0, 10.0, 2.0, 3.0],   [15.0, 15.0, 2.0, 3.0],   [15.0, 20.0, 2.0, 3.0],
    [15.0, 25.0, 2.0, 3.0],   [15.0, 30.0, 2.0, 3.0],   [15.0, 35.0, 2.0, 3.0],   [15.0, 40.0, 2.0, 3.0],
    [15.0, 45.0, 2.0, 3.0],   [25.0, 5.0, 2.0, 3.0],    [25.0, 10.0, 2.0, 3.0],   [25.0, 15.0, 2.0, 3.0],
    [25.0, 20.0, 2.0, 3.0],   [25.0, 25.0, 2.0, 3.0],   [25.0, 30.0, 2.0, 3.0],   [25.0, 35.0, 2.0, 3.0],
    [25.0, 40.0, 2.0, 3.0],   [25.0, 45.0, 2.0, 3.0],
];

/// Camera orbiting a target point
///
/// `spherical` holds the azimuth φ and polar angle θ in degrees, then the
/// radius. θ = 0 would look straight down; it is kept in [`THETA_RANGE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCamera {
    /// Point the camera looks at
    pub target: Vec3,
    /// `(φ, θ, r)`
    pub spherical: Vec3,
}

impl Default for SphereCamera {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 0.4, 0.0),
            spherical: Vec3::new(67.5, -46.0, 150.0),
        }
    }
}

impl SphereCamera {
    /// World-space camera position
    #[must_use]
    pub fn position(&self) -> Vec3 {
        let phi = utils::deg_to_rad(self.spherical.x);
        let theta = utils::deg_to_rad(self.spherical.y + 90.0);
        let (sin_phi, cos_phi) = phi.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();
        Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi) * self.spherical.z + self.target
    }

    /// View matrix, Y up
    #[must_use]
    pub fn world_to_camera(&self) -> Mat4 {
        Mat4::look_at(self.position(), self.target, Vec3::y())
    }

    /// Move the camera for a key; returns whether the key is a camera key
    pub fn apply_key(&mut self, key: KeyCode, mods: Modifiers) -> bool {
        let scale = if mods.contains(Modifiers::SHIFT) { FINE_FACTOR } else { 1.0 };
        let target = TARGET_STEP * scale;
        let angle = ANGLE_STEP * scale;
        let radius = RADIUS_STEP * scale;
        match key {
            KeyCode::E => self.target.y -= target,
            KeyCode::Q => self.target.y += target,
            KeyCode::A => self.target.x -= target,
            KeyCode::D => self.target.x += target,
            KeyCode::W => self.target.z -= target,
            KeyCode::S => self.target.z += target,
            KeyCode::J => self.spherical.x -= angle,
            KeyCode::L => self.spherical.x += angle,
            KeyCode::I => self.spherical.y -= angle,
            KeyCode::K => self.spherical.y += angle,
            KeyCode::O => self.spherical.z -= radius,
            KeyCode::U => self.spherical.z += radius,
            _ => return false,
        }
        self.clamp();
        true
    }

    fn clamp(&mut self) {
        self.spherical.y = self.spherical.y.clamp(THETA_RANGE.0, THETA_RANGE.1);
        self.spherical.z = self.spherical.z.max(MIN_RADIUS);
        self.target.y = self.target.y.max(0.0);
    }
}

/// How the camera matrices reach the shaders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSource {
    /// One `GlobalMatrices` uniform buffer shared by every program
    UniformBlock,
    /// `cameraToClip` and `worldToCamera` set on each program
    Uniforms,
}

impl MatrixSource {
    fn vertex_shaders(self) -> (&'static str, &'static str) {
        match self {
            Self::UniformBlock => ("pos_only_world_transform_ubo.vert", "pos_color_world_transform_ubo.vert"),
            Self::Uniforms => ("pos_only_world_transform.vert", "pos_color_world_transform.vert"),
        }
    }
}

struct ProgramData {
    program: Program,
    model_to_world: UniformLocation,
    base_color: Option<UniformLocation>,
    camera_to_clip: Option<UniformLocation>,
    world_to_camera: Option<UniformLocation>,
}

impl ProgramData {
    fn load(resources: &Resources, backend: &mut dyn RenderBackend, vertex: &str, fragment: &str) -> Result<Self, AppError> {
        let program = resources.program(backend, vertex, fragment)?;
        Ok(Self {
            model_to_world: program.uniform_location("modelToWorld")?,
            base_color: program.optional_uniform_location("baseColor"),
            camera_to_clip: program.optional_uniform_location("cameraToClip"),
            world_to_camera: program.optional_uniform_location("worldToCamera"),
            program,
        })
    }

    fn set_matrix(
        &self,
        backend: &mut dyn RenderBackend,
        location: Option<UniformLocation>,
        matrix: &Mat4,
    ) -> Result<(), AppError> {
        if let Some(location) = location {
            self.program.bind(backend)?;
            self.program.set_uniform(backend, location, matrix)?;
            backend.use_program(None)?;
        }
        Ok(())
    }
}

struct Scene {
    uniform_color: ProgramData,
    object_color: ProgramData,
    uniform_color_tint: ProgramData,
    globals: Option<UniformBlockBuffer<GlobalMatrices>>,
    plane: Mesh,
    cone: Mesh,
    cylinder: Mesh,
    cube_color: Mesh,
    cube_tint: Mesh,
}

impl Scene {
    fn programs(&self) -> [&ProgramData; 3] {
        [&self.uniform_color, &self.object_color, &self.uniform_color_tint]
    }

    fn draw(
        backend: &mut dyn RenderBackend,
        data: &ProgramData,
        mesh: &Mesh,
        model_to_world: &Mat4,
        color: Option<[f32; 4]>,
    ) -> Result<(), AppError> {
        data.program.bind(backend)?;
        data.program.set_uniform(backend, data.model_to_world, model_to_world)?;
        if let (Some(location), Some(color)) = (data.base_color, color) {
            data.program.set_uniform(backend, location, color)?;
        }
        mesh.render(backend)?;
        backend.use_program(None)?;
        Ok(())
    }

    fn tinted(
        &self,
        backend: &mut dyn RenderBackend,
        mesh: &Mesh,
        stack: &MatrixStack,
        color: [f32; 4],
    ) -> Result<(), AppError> {
        Self::draw(backend, &self.uniform_color_tint, mesh, &stack.top(), Some(color))
    }

    fn ground(&self, backend: &mut dyn RenderBackend, stack: &mut MatrixStack) -> Result<(), AppError> {
        let mut ground = PushStack::new(stack);
        ground.scale(Vec3::new(1000.0, 1.0, 1000.0));
        Self::draw(backend, &self.uniform_color, &self.plane, &ground.top(), Some(GROUND_COLOR))
    }

    fn forest(&self, backend: &mut dyn RenderBackend, stack: &mut MatrixStack) -> Result<(), AppError> {
        for [x, z, trunk_height, cone_height] in FOREST {
            let mut tree = PushStack::new(stack);
            tree.translate(Vec3::new(x, 0.0, z));
            self.tree(backend, &mut tree, trunk_height, cone_height)?;
        }
        Ok(())
    }

    fn tree(
        &self,
        backend: &mut dyn RenderBackend,
        stack: &mut MatrixStack,
        trunk_height: f32,
        cone_height: f32,
    ) -> Result<(), AppError> {
        {
            let mut trunk = PushStack::new(stack);
            trunk.scale(Vec3::new(1.0, trunk_height, 1.0));
            trunk.translate(Vec3::new(0.0, 0.5, 0.0));
            self.tinted(backend, &self.cylinder, &trunk, TRUNK_COLOR)?;
        }
        let mut top = PushStack::new(stack);
        top.translate(Vec3::new(0.0, trunk_height, 0.0));
        top.scale(Vec3::new(3.0, cone_height, 3.0));
        self.tinted(backend, &self.cone, &top, TREETOP_COLOR)
    }

    fn column(&self, backend: &mut dyn RenderBackend, stack: &mut MatrixStack, height: f32) -> Result<(), AppError> {
        {
            let mut bottom = PushStack::new(stack);
            bottom.scale(Vec3::new(1.0, COLUMN_BASE_HEIGHT, 1.0));
            bottom.translate(Vec3::new(0.0, 0.5, 0.0));
            self.tinted(backend, &self.cube_tint, &bottom, COLUMN_BASE_COLOR)?;
        }
        {
            let mut top = PushStack::new(stack);
            top.translate(Vec3::new(0.0, height - COLUMN_BASE_HEIGHT, 0.0));
            top.scale(Vec3::new(1.0, COLUMN_BASE_HEIGHT, 1.0));
            top.translate(Vec3::new(0.0, 0.5, 0.0));
            self.tinted(backend, &self.cube_tint, &top, STONE_COLOR)?;
        }
        let mut shaft = PushStack::new(stack);
        shaft.translate(Vec3::new(0.0, COLUMN_BASE_HEIGHT, 0.0));
        shaft.scale(Vec3::new(0.8, COLUMN_BASE_HEIGHT.mul_add(-2.0, height), 0.8));
        shaft.translate(Vec3::new(0.0, 0.5, 0.0));
        self.tinted(backend, &self.cylinder, &shaft, STONE_COLOR)
    }

    fn parthenon(&self, backend: &mut dyn RenderBackend, stack: &mut MatrixStack) -> Result<(), AppError> {
        const FRONT_Z: f32 = PARTHENON_LENGTH * 0.5 - 1.0;
        const RIGHT_X: f32 = PARTHENON_WIDTH * 0.5 - 1.0;
        const FRONT_COLUMNS: usize = (PARTHENON_WIDTH / 2.0) as usize;
        const SIDE_COLUMNS: usize = ((PARTHENON_LENGTH - 2.0) / 2.0) as usize;

        {
            let mut base = PushStack::new(stack);
            base.scale(Vec3::new(PARTHENON_WIDTH, PARTHENON_BASE_HEIGHT, PARTHENON_LENGTH));
            base.translate(Vec3::new(0.0, 0.5, 0.0));
            self.tinted(backend, &self.cube_tint, &base, STONE_COLOR)?;
        }
        {
            let mut top = PushStack::new(stack);
            top.translate(Vec3::new(0.0, PARTHENON_COLUMN_HEIGHT + PARTHENON_BASE_HEIGHT, 0.0));
            top.scale(Vec3::new(PARTHENON_WIDTH, PARTHENON_TOP_HEIGHT, PARTHENON_LENGTH));
            top.translate(Vec3::new(0.0, 0.5, 0.0));
            self.tinted(backend, &self.cube_tint, &top, STONE_COLOR)?;
        }

        let mut column_positions = Vec::with_capacity(2 * (FRONT_COLUMNS + SIDE_COLUMNS));
        for i in 0..FRONT_COLUMNS {
            let x = 2.0f32.mul_add(i as f32, -PARTHENON_WIDTH / 2.0) + 1.0;
            column_positions.push(Vec3::new(x, PARTHENON_BASE_HEIGHT, FRONT_Z));
            column_positions.push(Vec3::new(x, PARTHENON_BASE_HEIGHT, -FRONT_Z));
        }
        for i in 1..SIDE_COLUMNS {
            let z = 2.0f32.mul_add(i as f32, -PARTHENON_LENGTH / 2.0) + 1.0;
            column_positions.push(Vec3::new(RIGHT_X, PARTHENON_BASE_HEIGHT, z));
            column_positions.push(Vec3::new(-RIGHT_X, PARTHENON_BASE_HEIGHT, z));
        }
        for position in column_positions {
            let mut column = PushStack::new(stack);
            column.translate(position);
            self.column(backend, &mut column, PARTHENON_COLUMN_HEIGHT)?;
        }

        {
            let mut interior = PushStack::new(stack);
            interior.translate(Vec3::y());
            interior.scale(Vec3::new(
                PARTHENON_WIDTH - 6.0,
                PARTHENON_COLUMN_HEIGHT,
                PARTHENON_LENGTH - 6.0,
            ));
            interior.translate(Vec3::new(0.0, 0.5, 0.0));
            Self::draw(backend, &self.object_color, &self.cube_color, &interior.top(), None)?;
        }

        let mut headpiece = PushStack::new(stack);
        headpiece.translate(Vec3::new(
            0.0,
            PARTHENON_TOP_HEIGHT.mul_add(0.5, PARTHENON_COLUMN_HEIGHT + PARTHENON_BASE_HEIGHT),
            PARTHENON_LENGTH * 0.5,
        ));
        headpiece.rotate_x(-135.0);
        headpiece.rotate_y(45.0);
        Self::draw(backend, &self.object_color, &self.cube_color, &headpiece.top(), None)
    }
}

/// World scene
pub struct World {
    source: MatrixSource,
    camera: SphereCamera,
    projection: ProjectionConfig,
    look_at_point: bool,
    scene: Option<Scene>,
}

impl World {
    /// Scene feeding the camera through the given path
    #[must_use]
    pub fn new(source: MatrixSource) -> Self {
        Self {
            source,
            camera: SphereCamera::default(),
            projection: ProjectionConfig::default(),
            look_at_point: false,
            scene: None,
        }
    }

    /// Camera matrices in a uniform block
    #[must_use]
    pub fn ubo() -> Self {
        Self::new(MatrixSource::UniformBlock)
    }

    /// Camera matrices as per-program uniforms
    #[must_use]
    pub fn uniforms() -> Self {
        Self::new(MatrixSource::Uniforms)
    }

    /// Current camera
    #[must_use]
    pub const fn camera(&self) -> &SphereCamera {
        &self.camera
    }

    /// Whether the target point is drawn
    #[must_use]
    pub const fn shows_look_at_point(&self) -> bool {
        self.look_at_point
    }

    fn scene(&self) -> Result<&Scene, AppError> {
        self.scene.as_ref().ok_or_else(|| not_initialized(self.name()))
    }
}

impl Tutorial for World {
    fn name(&self) -> &'static str {
        match self.source {
            MatrixSource::UniformBlock => "world",
            MatrixSource::Uniforms => "world-uniforms",
        }
    }

    fn init(&mut self, backend: &mut dyn RenderBackend, resources: &mut Resources) -> Result<(), AppError> {
        self.projection = resources.projection().clone();
        let (position_only, position_color) = self.source.vertex_shaders();
        let uniform_color = ProgramData::load(resources, backend, position_only, "base_color.frag")?;
        let object_color = ProgramData::load(resources, backend, position_color, "passthrough_color.frag")?;
        let uniform_color_tint = ProgramData::load(resources, backend, position_color, "base_vertex_color.frag")?;

        let globals = match self.source {
            MatrixSource::UniformBlock => {
                let globals = UniformBlockBuffer::<GlobalMatrices>::new(backend, GLOBAL_MATRICES_BINDING)?;
                for data in [&uniform_color, &object_color, &uniform_color_tint] {
                    globals.attach(backend, &data.program)?;
                }
                Some(globals)
            }
            MatrixSource::Uniforms => None,
        };

        enable_culling_and_depth(backend);

        self.scene = Some(Scene {
            uniform_color,
            object_color,
            uniform_color_tint,
            globals,
            plane: resources.load_mesh(backend, &MeshKind::UnitPlane.file_name())?,
            cone: resources.load_mesh(backend, &MeshKind::UnitConeTint.file_name())?,
            cylinder: resources.load_mesh(backend, &MeshKind::UnitCylinderTint.file_name())?,
            cube_color: resources.load_mesh(backend, &MeshKind::UnitCubeColor.file_name())?,
            cube_tint: resources.load_mesh(backend, &MeshKind::UnitCubeTint.file_name())?,
        });
        log::info!("World ready, camera at {:?}", self.camera.position());
        Ok(())
    }

    fn display(&mut self, backend: &mut dyn RenderBackend, _frame: &FrameInfo) -> Result<(), AppError> {
        let scene = self.scene()?;
        clear_color_depth(backend, [0.0; 4]);

        let world_to_camera = self.camera.world_to_camera();
        match &scene.globals {
            Some(globals) => globals.set_world_to_camera(backend, &world_to_camera)?,
            None => {
                for data in scene.programs() {
                    data.set_matrix(backend, data.world_to_camera, &world_to_camera)?;
                }
            }
        }

        let mut stack = MatrixStack::new();
        scene.ground(backend, &mut stack)?;
        scene.forest(backend, &mut stack)?;
        {
            let mut building = PushStack::new(&mut stack);
            building.translate(PARTHENON_POSITION);
            scene.parthenon(backend, &mut building)?;
        }

        if self.look_at_point {
            backend.disable(Capability::DepthTest);
            let mut point = PushStack::new(&mut stack);
            point.translate(self.camera.target);
            Scene::draw(backend, &scene.object_color, &scene.cube_color, &point.top(), None)?;
            backend.enable(Capability::DepthTest);
        }
        Ok(())
    }

    fn keyboard(&mut self, key: KeyCode, action: KeyAction, mods: Modifiers) {
        if !action.is_down() {
            return;
        }
        if key == KeyCode::Space {
            self.look_at_point = !self.look_at_point;
            log::info!("Look-at point {}", if self.look_at_point { "shown" } else { "hidden" });
        } else if !self.camera.apply_key(key, mods) {
            return;
        }
        let position = self.camera.position();
        log::debug!(
            "Target {:?}, position {:?}, distance {}, spherical {:?}",
            self.camera.target,
            position,
            (position - self.camera.target).norm(),
            self.camera.spherical
        );
    }

    fn reshape(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<(), AppError> {
        let scene = self.scene()?;
        let camera_to_clip = Mat4::perspective_gl(
            self.projection.fov_degrees,
            aspect_ratio(width, height),
            self.projection.z_near,
            self.projection.z_far,
        );
        match &scene.globals {
            Some(globals) => globals.set_camera_to_clip(backend, &camera_to_clip)?,
            None => {
                for data in scene.programs() {
                    data.set_matrix(backend, data.camera_to_clip, &camera_to_clip)?;
                }
            }
        }
        backend.viewport(0, 0, width, height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AppEvent;
    use crate::input::KeyEvent;
    use crate::render::{ProgramHandle, UniformValue};
    use crate::tutorials::testing;
    use approx::assert_relative_eq;

    /// Ground, trees (cylinder 3 + cone 2), then the Parthenon: four cubes and
    /// 30 columns of two cubes and a cylinder
    const DRAWS_PER_FRAME: usize = 1 + 5 * FOREST.len() + 4 + 5 * 30;

    #[test]
    fn test_camera_starts_at_its_radius() {
        let camera = SphereCamera::default();
        let offset = camera.position() - camera.target;
        assert_relative_eq!(offset.norm(), 150.0, epsilon = 1e-3);
        assert!(offset.y > 0.0);
    }

    #[test]
    fn test_camera_clamps() {
        let mut camera = SphereCamera::default();
        for _ in 0..50 {
            camera.apply_key(KeyCode::O, Modifiers::empty());
            camera.apply_key(KeyCode::I, Modifiers::empty());
            camera.apply_key(KeyCode::E, Modifiers::empty());
        }
        assert_relative_eq!(camera.spherical.z, MIN_RADIUS);
        assert_relative_eq!(camera.spherical.y, THETA_RANGE.0);
        assert_relative_eq!(camera.target.y, 0.0);

        for _ in 0..50 {
            camera.apply_key(KeyCode::K, Modifiers::empty());
        }
        assert_relative_eq!(camera.spherical.y, THETA_RANGE.1);
    }

    #[test]
    fn test_shift_makes_fine_steps() {
        let mut camera = SphereCamera::default();
        assert!(camera.apply_key(KeyCode::L, Modifiers::SHIFT));
        assert!(camera.apply_key(KeyCode::D, Modifiers::SHIFT));
        assert_relative_eq!(camera.spherical.x, 68.6, epsilon = 1e-4);
        assert_relative_eq!(camera.target.x, 0.4, epsilon = 1e-6);
        assert!(!camera.apply_key(KeyCode::Z, Modifiers::empty()));
    }

    #[test]
    fn test_frame_draw_count() {
        let mut engine = testing::engine(World::ubo());
        engine.run_frames(1).unwrap();
        let calls = testing::last_frame(&mut engine);
        assert_eq!(testing::draw_count(&calls), DRAWS_PER_FRAME);
        assert!(engine.backend().is_enabled(Capability::DepthTest));
    }

    #[test]
    fn test_look_at_point_adds_a_draw() {
        let mut engine = testing::engine(World::ubo());
        engine.schedule(0, AppEvent::Key(KeyEvent::press(KeyCode::Space)));
        engine.run_frames(1).unwrap();
        let calls = testing::last_frame(&mut engine);
        assert_eq!(testing::draw_count(&calls), DRAWS_PER_FRAME + 1);
        assert!(engine.backend().is_enabled(Capability::DepthTest));
    }

    #[test]
    fn test_block_holds_the_view_matrix() {
        let mut engine = testing::engine(World::ubo());
        engine.run_frames(1).unwrap();
        let backend = engine.backend();

        let (buffer, offset, size) = backend.buffer_binding(GLOBAL_MATRICES_BINDING).unwrap();
        assert_eq!((offset, size), (0, 128));
        let data = backend.buffer_data(buffer).unwrap();
        let float_at = |i: usize| f32::from_le_bytes(data[i * 4..i * 4 + 4].try_into().unwrap());

        let view = utils::to_columns(&SphereCamera::default().world_to_camera());
        for (i, value) in view.iter().flatten().enumerate() {
            assert_relative_eq!(float_at(16 + i), *value, epsilon = 1e-4);
        }
        // Projection column 2, row 3 is -1.
        assert_relative_eq!(float_at(11), -1.0);
    }

    #[test]
    fn test_block_holds_a_wide_projection() {
        let mut engine = testing::engine(World::ubo());
        engine.run_frames(1).unwrap();
        let backend = engine.backend();

        let (buffer, _, _) = backend.buffer_binding(GLOBAL_MATRICES_BINDING).unwrap();
        let data = backend.buffer_data(buffer).unwrap();
        let float_at = |i: usize| f32::from_le_bytes(data[i * 4..i * 4 + 4].try_into().unwrap());

        // 500x500 window: both diagonal terms are the 100 degree frustum scale.
        let scale = utils::calc_frustum_scale(100.0);
        assert_relative_eq!(scale, 0.839_1, epsilon = 1e-4);
        assert_relative_eq!(float_at(0), scale, epsilon = 1e-5);
        assert_relative_eq!(float_at(5), scale, epsilon = 1e-5);
        assert_relative_eq!(float_at(10), 1000.1 / -999.9, epsilon = 1e-5);
        assert_relative_eq!(float_at(14), 200.0 / -999.9, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_width_keeps_projection_finite() {
        let mut engine = testing::engine(World::ubo());
        engine.push_event(AppEvent::Resized { width: 0, height: 300 });
        engine.run_frames(1).unwrap();
        let backend = engine.backend();

        let (buffer, _, _) = backend.buffer_binding(GLOBAL_MATRICES_BINDING).unwrap();
        let data = backend.buffer_data(buffer).unwrap();
        let projection: Vec<f32> = data[..64]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes(b.try_into().unwrap()))
            .collect();
        assert!(projection.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_uniform_variant_sets_program_matrices() {
        let mut engine = testing::engine(World::uniforms());
        engine.run_frames(1).unwrap();
        let backend = engine.backend();
        assert!(backend.buffer_binding(GLOBAL_MATRICES_BINDING).is_none());

        let expected = SphereCamera::default().world_to_camera();
        for program in 1..=3 {
            let view = backend
                .uniform_value(ProgramHandle(program), "worldToCamera")
                .and_then(|v| v.as_mat4())
                .unwrap();
            assert_relative_eq!(view, expected, epsilon = 1e-4);
            assert!(matches!(
                backend.uniform_value(ProgramHandle(program), "cameraToClip"),
                Some(UniformValue::Mat4(_))
            ));
        }
        assert_eq!(engine.tutorial().name(), "world-uniforms");
    }
}
