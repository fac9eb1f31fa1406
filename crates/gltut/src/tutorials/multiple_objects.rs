//! Two wedges from one vertex buffer
//!
//! Both objects share the index list; the second draw adds a base vertex of
//! 18 to pick its half of the buffer. Space toggles depth clamping so the
//! nearer wedge is no longer cut by the near plane.

use crate::application::{AppError, FrameInfo, Tutorial};
use crate::assets::mesh::{Attribute, IndexType, MeshData, PrimitiveType, RenderCommand};
use crate::assets::Resources;
use crate::foundation::math::utils;
use crate::input::{KeyAction, KeyCode, Modifiers};
use crate::render::{Capability, Mesh, Program, RenderBackend, UniformLocation};

use super::{aspect_ratio, clear_color_depth, enable_culling_and_depth, not_initialized, GRAY};

const FRUSTUM_SCALE: f32 = 1.0;
const Z_NEAR: f32 = 1.0;
const Z_FAR: f32 = 3.0;

const RIGHT: f32 = 0.8;
const LEFT: f32 = -RIGHT;
const TOP: f32 = 0.2;
const MIDDLE: f32 = 0.0;
const BOTTOM: f32 = -TOP;
const FRONT: f32 = -1.25;
const REAR: f32 = -1.75;

const GREEN: [f32; 4] = [0.75, 0.75, 1.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.5, 0.0, 1.0];
const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const GREY: [f32; 4] = [0.8, 0.8, 0.8, 1.0];
const BROWN: [f32; 4] = [0.5, 0.5, 0.0, 1.0];

/// Vertices of one wedge
pub const VERTICES_PER_OBJECT: usize = 18;

/// Offsets of the two draws
pub const OBJECT_OFFSETS: [(f32, f32, f32); 2] = [(0.0, 0.0, 0.5), (0.0, 0.0, 0.3)];

#[rustfmt::skip]
const HORIZONTAL: [[f32; 3]; VERTICES_PER_OBJECT] = [
    [LEFT,  TOP,    REAR], [LEFT,  MIDDLE, FRONT], [RIGHT, MIDDLE, FRONT], [RIGHT, TOP,    REAR],
    [LEFT,  BOTTOM, REAR], [LEFT,  MIDDLE, FRONT], [RIGHT, MIDDLE, FRONT], [RIGHT, BOTTOM, REAR],
    [LEFT,  TOP,    REAR], [LEFT,  MIDDLE, FRONT], [LEFT,  BOTTOM, REAR],
    [RIGHT, TOP,    REAR], [RIGHT, MIDDLE, FRONT], [RIGHT, BOTTOM, REAR],
    [LEFT,  BOTTOM, REAR], [LEFT,  TOP,    REAR], [RIGHT, TOP,    REAR], [RIGHT, BOTTOM, REAR],
];

#[rustfmt::skip]
const VERTICAL: [[f32; 3]; VERTICES_PER_OBJECT] = [
    [TOP,    RIGHT, REAR], [MIDDLE, RIGHT, FRONT], [MIDDLE, LEFT, FRONT], [TOP,    LEFT, REAR],
    [BOTTOM, RIGHT, REAR], [MIDDLE, RIGHT, FRONT], [MIDDLE, LEFT, FRONT], [BOTTOM, LEFT, REAR],
    [TOP,    RIGHT, REAR], [MIDDLE, RIGHT, FRONT], [BOTTOM, RIGHT, REAR],
    [TOP,    LEFT,  REAR], [MIDDLE, LEFT,  FRONT], [BOTTOM, LEFT,  REAR],
    [BOTTOM, RIGHT, REAR], [TOP,    RIGHT, REAR], [TOP,    LEFT, REAR], [BOTTOM, LEFT, REAR],
];

/// Vertices per face of a wedge: top, bottom, two sides, back
const FACE_SIZES: [usize; 5] = [4, 4, 3, 3, 4];

#[rustfmt::skip]
const INDICES: [u32; 24] = [
    0, 2, 1,    3, 2, 0,
    4, 5, 6,    6, 7, 4,
    8, 9, 10,   11, 13, 12,
    14, 16, 15, 17, 16, 14,
];

/// Both wedges: 36 positions followed by 36 colors, indexed for one wedge
#[must_use]
pub fn wedge_mesh() -> MeshData {
    let positions = HORIZONTAL.iter().chain(&VERTICAL).flatten().copied().collect();
    let colors = face_colors(&[GREEN, BLUE, RED, GREY, BROWN])
        .chain(face_colors(&[RED, BROWN, BLUE, GREEN, GREY]))
        .flatten()
        .collect();
    MeshData::new(
        vec![Attribute::float(0, 3, positions), Attribute::float(1, 4, colors)],
        Vec::new(),
        vec![RenderCommand::Indexed {
            primitive: PrimitiveType::Triangles,
            index_type: IndexType::Uint,
            primitive_restart: None,
            indices: INDICES.to_vec(),
        }],
    )
}

fn face_colors(colors: &[[f32; 4]; 5]) -> impl Iterator<Item = [f32; 4]> + '_ {
    colors
        .iter()
        .zip(FACE_SIZES)
        .flat_map(|(color, count)| std::iter::repeat(*color).take(count))
}

struct Scene {
    program: Program,
    mesh: Mesh,
    offset: UniformLocation,
    perspective_matrix: UniformLocation,
}

/// Two overlapping wedges with depth testing
#[derive(Default)]
pub struct MultipleObjects {
    scene: Option<Scene>,
    depth_clamping: bool,
    clamp_changed: bool,
}

impl MultipleObjects {
    /// Scene before `init`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scene: None,
            depth_clamping: false,
            clamp_changed: false,
        }
    }

    /// Whether depth clamping is on
    #[must_use]
    pub const fn depth_clamping(&self) -> bool {
        self.depth_clamping
    }
}

impl Tutorial for MultipleObjects {
    fn name(&self) -> &'static str {
        "multiple-objects"
    }

    fn init(&mut self, backend: &mut dyn RenderBackend, resources: &mut Resources) -> Result<(), AppError> {
        let program = resources.program(backend, "standard.vert", "vertex_colors.frag")?;
        let offset = program.uniform_location("offset")?;
        let perspective_matrix = program.uniform_location("perspectiveMatrix")?;
        program.bind(backend)?;
        program.set_uniform(
            backend,
            perspective_matrix,
            utils::manual_perspective(FRUSTUM_SCALE, 1.0, Z_NEAR, Z_FAR),
        )?;
        backend.use_program(None)?;

        let mesh = Mesh::upload(&wedge_mesh(), backend)?;
        enable_culling_and_depth(backend);

        self.scene = Some(Scene {
            program,
            mesh,
            offset,
            perspective_matrix,
        });
        Ok(())
    }

    fn display(&mut self, backend: &mut dyn RenderBackend, _frame: &FrameInfo) -> Result<(), AppError> {
        let scene = self.scene.as_ref().ok_or_else(|| not_initialized("multiple-objects"))?;
        if self.clamp_changed {
            if self.depth_clamping {
                backend.enable(Capability::DepthClamp);
            } else {
                backend.disable(Capability::DepthClamp);
            }
            self.clamp_changed = false;
        }
        clear_color_depth(backend, GRAY);

        scene.program.bind(backend)?;
        for (object, offset) in OBJECT_OFFSETS.into_iter().enumerate() {
            scene.program.set_uniform(backend, scene.offset, offset)?;
            let base_vertex = (object * VERTICES_PER_OBJECT) as i32;
            scene.mesh.render_base_vertex(backend, base_vertex)?;
        }
        backend.use_program(None)?;
        Ok(())
    }

    fn keyboard(&mut self, key: KeyCode, action: KeyAction, _mods: Modifiers) {
        if (key, action) == (KeyCode::Space, KeyAction::Press) {
            self.depth_clamping = !self.depth_clamping;
            self.clamp_changed = true;
            log::info!("Depth clamping {}", if self.depth_clamping { "on" } else { "off" });
        }
    }

    fn reshape(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<(), AppError> {
        let scene = self.scene.as_ref().ok_or_else(|| not_initialized("multiple-objects"))?;
        let matrix = utils::manual_perspective(FRUSTUM_SCALE, aspect_ratio(width, height), Z_NEAR, Z_FAR);
        scene.program.bind(backend)?;
        scene.program.set_uniform(backend, scene.perspective_matrix, matrix)?;
        backend.use_program(None)?;
        backend.viewport(0, 0, width, height);
        Ok(())
    }
}
