//! Procedural meshes and XML output
//!
//! Generates the unit shapes and gimbal models the tutorial scenes load, and
//! serializes any [`MeshData`] back into the mesh XML vocabulary. The files
//! shipped in `resources/meshes` hold the same data as [`MeshKind::generate`];
//! kinds without a file are generated when loaded.

use std::fmt::Write as _;

use crate::foundation::math::{constants::TAU, Vec3};

use super::format::{Attribute, IndexType, MeshData, NamedVao, PrimitiveType, RenderCommand};
use super::schema::MESH_NAMESPACE;

type Color = [f32; 4];

/// Face colors of the colored unit cube: +Y, -Y, +X, -X, +Z, -Z
const CUBE_FACE_COLORS: [Color; 6] = [
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
    [1.0, 0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0, 1.0],
    [1.0, 0.0, 1.0, 1.0],
];

/// Per-face gray levels of the tinted unit cube, same face order
const CUBE_FACE_TINTS: [f32; 6] = [1.0, 0.5, 0.75, 0.75, 0.875, 0.625];

/// Outward normal and the "up" direction a viewer facing that side sees
const CUBE_FACES: [([f32; 3], [f32; 3]); 6] = [
    ([0.0, 1.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [0.0, 0.0, 1.0]),
    ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
];

/// Round shapes use this many segments
pub const DEFAULT_SEGMENTS: u32 = 30;

/// Shipped procedural meshes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    /// Double-sided 1x1 plane in XZ
    UnitPlane,
    /// Unit cube with a distinct color per face
    UnitCubeColor,
    /// Unit cube with a gray tint per face
    UnitCubeTint,
    /// Unit cylinder along Y, centered on the origin
    UnitCylinderTint,
    /// Unit cone, base at y = 0 and apex at y = 1
    UnitConeTint,
    /// Outer gimbal ring
    LargeGimbal,
    /// Middle gimbal ring
    MediumGimbal,
    /// Inner gimbal ring
    SmallGimbal,
    /// Small ship model
    Ship,
}

impl MeshKind {
    /// Every shipped mesh
    pub const ALL: [Self; 9] = [
        Self::UnitPlane,
        Self::UnitCubeColor,
        Self::UnitCubeTint,
        Self::UnitCylinderTint,
        Self::UnitConeTint,
        Self::LargeGimbal,
        Self::MediumGimbal,
        Self::SmallGimbal,
        Self::Ship,
    ];

    /// Mesh name, also the file stem under `resources/meshes`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnitPlane => "UnitPlane",
            Self::UnitCubeColor => "UnitCubeColor",
            Self::UnitCubeTint => "UnitCubeTint",
            Self::UnitCylinderTint => "UnitCylinderTint",
            Self::UnitConeTint => "UnitConeTint",
            Self::LargeGimbal => "LargeGimbal",
            Self::MediumGimbal => "MediumGimbal",
            Self::SmallGimbal => "SmallGimbal",
            Self::Ship => "Ship",
        }
    }

    /// File name under `resources/meshes`
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.xml", self.name())
    }

    /// Look up a kind by name, ignoring case
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// Build the mesh
    #[must_use]
    pub fn generate(self) -> MeshData {
        match self {
            Self::UnitPlane => unit_plane(),
            Self::UnitCubeColor => unit_cube(&CUBE_FACE_COLORS),
            Self::UnitCubeTint => unit_cube(&CUBE_FACE_TINTS.map(gray)),
            Self::UnitCylinderTint => unit_cylinder(DEFAULT_SEGMENTS),
            Self::UnitConeTint => unit_cone(DEFAULT_SEGMENTS),
            Self::LargeGimbal => gimbal(30.0, 1.5, 48, 8),
            Self::MediumGimbal => gimbal(26.0, 1.5, 48, 8),
            Self::SmallGimbal => gimbal(22.0, 1.5, 48, 8),
            Self::Ship => ship(),
        }
    }
}

const fn gray(level: f32) -> Color {
    [level, level, level, 1.0]
}

/// Attribute 0 (positions, size 3) plus attribute 1 (colors, size 4)
fn position_color(positions: &[Vec3], colors: &[Color]) -> Vec<Attribute> {
    vec![
        Attribute::float(0, 3, positions.iter().flat_map(|p| [p.x, p.y, p.z]).collect()),
        Attribute::float(1, 4, colors.iter().flatten().copied().collect()),
    ]
}

fn ushort_indices(primitive: PrimitiveType, indices: Vec<u32>) -> RenderCommand {
    RenderCommand::Indexed {
        primitive,
        index_type: IndexType::Ushort,
        primitive_restart: None,
        indices,
    }
}

/// Flat 1x1 plane in XZ at y = 0, visible from both sides
#[must_use]
pub fn unit_plane() -> MeshData {
    MeshData::new(
        vec![Attribute::float(
            0,
            3,
            vec![0.5, 0.0, -0.5, 0.5, 0.0, 0.5, -0.5, 0.0, 0.5, -0.5, 0.0, -0.5],
        )],
        Vec::new(),
        vec![ushort_indices(
            PrimitiveType::Triangles,
            vec![0, 1, 2, 0, 2, 1, 2, 3, 0, 2, 0, 3],
        )],
    )
}

/// Cube from -0.5 to 0.5 with 4 vertices per face, clockwise when seen from
/// outside
#[must_use]
pub fn unit_cube(face_colors: &[Color; 6]) -> MeshData {
    let mut positions = Vec::with_capacity(24);
    let mut colors = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for ((normal, up), color) in CUBE_FACES.iter().zip(face_colors) {
        let normal = Vec3::from(*normal);
        let up = Vec3::from(*up);
        let right = (-normal).cross(&up);
        let base = positions.len() as u32;

        for (r, u) in [(-1.0, 1.0), (1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
            positions.push((normal + right * r + up * u) * 0.5);
            colors.push(*color);
        }
        indices.extend([0, 1, 2, 2, 3, 0].map(|i| base + i));
    }

    MeshData::new(
        position_color(&positions, &colors),
        vec![NamedVao::new("flat", vec![0])],
        vec![ushort_indices(PrimitiveType::Triangles, indices)],
    )
}

fn ring_point(angle: f32, radius: f32, y: f32) -> Vec3 {
    Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
}

/// Cylinder of radius 0.5 from y = -0.5 to 0.5
///
/// Two triangle fans close the caps; one triangle strip wraps the side.
#[must_use]
pub fn unit_cylinder(segments: u32) -> MeshData {
    let mut positions = Vec::new();
    let mut colors = Vec::new();
    let angles: Vec<f32> = (0..segments).map(|i| TAU * i as f32 / segments as f32).collect();

    // Caps: center followed by the ring
    for y in [0.5, -0.5] {
        positions.push(Vec3::new(0.0, y, 0.0));
        colors.push(gray(1.0));
        for &angle in &angles {
            positions.push(ring_point(angle, 0.5, y));
            colors.push(gray(0.9));
        }
    }

    // Side: top and bottom vertex for every angle, shaded by angle
    let side_base = positions.len() as u32;
    for &angle in &angles {
        let shade = 0.75 + 0.25 * angle.cos();
        positions.push(ring_point(angle, 0.5, 0.5));
        positions.push(ring_point(angle, 0.5, -0.5));
        colors.push(gray(shade));
        colors.push(gray(shade));
    }

    let top: Vec<u32> = std::iter::once(0).chain(1..=segments).chain([1]).collect();
    let bottom_center = segments + 1;
    let bottom: Vec<u32> = std::iter::once(bottom_center)
        .chain((1..=segments).rev().map(|i| bottom_center + i))
        .chain([bottom_center + segments])
        .collect();
    let side: Vec<u32> = (0..segments * 2).chain([0, 1]).map(|i| side_base + i).collect();

    MeshData::new(
        position_color(&positions, &colors),
        vec![NamedVao::new("flat", vec![0])],
        vec![
            ushort_indices(PrimitiveType::TriangleFan, top),
            ushort_indices(PrimitiveType::TriangleFan, bottom),
            ushort_indices(PrimitiveType::TriangleStrip, side),
        ],
    )
}

/// Cone with a base of radius 0.5 at y = 0 and the apex at y = 1
#[must_use]
pub fn unit_cone(segments: u32) -> MeshData {
    let mut positions = vec![Vec3::new(0.0, 1.0, 0.0)];
    let mut colors = vec![gray(1.0)];
    for i in 0..segments {
        let angle = TAU * i as f32 / segments as f32;
        positions.push(ring_point(angle, 0.5, 0.0));
        colors.push(gray(0.75 + 0.2 * angle.sin()));
    }
    positions.push(Vec3::zeros());
    colors.push(gray(0.5));
    let base_center = segments + 1;

    let side: Vec<u32> = std::iter::once(0).chain(1..=segments).chain([1]).collect();
    let base: Vec<u32> = std::iter::once(base_center)
        .chain((1..=segments).rev())
        .chain([segments])
        .collect();

    MeshData::new(
        position_color(&positions, &colors),
        Vec::new(),
        vec![
            ushort_indices(PrimitiveType::TriangleFan, side),
            ushort_indices(PrimitiveType::TriangleFan, base),
        ],
    )
}

/// Torus in the XY plane around the Z axis
///
/// Each of the `segments` tube sections is one triangle strip; strips are
/// separated by the primitive restart index.
///
/// # Arguments
/// * `radius` - Distance from the center to the middle of the tube
/// * `thickness` - Tube radius
/// * `segments` - Sections around the ring
/// * `sides` - Vertices around the tube
#[must_use]
pub fn gimbal(radius: f32, thickness: f32, segments: u32, sides: u32) -> MeshData {
    const RESTART: u32 = u16::MAX as u32;
    let mut positions = Vec::with_capacity((segments * sides) as usize);
    let mut colors = Vec::with_capacity((segments * sides) as usize);

    for i in 0..segments {
        let ring_angle = TAU * i as f32 / segments as f32;
        let (sin_r, cos_r) = ring_angle.sin_cos();
        for j in 0..sides {
            let tube_angle = TAU * j as f32 / sides as f32;
            let (sin_t, cos_t) = tube_angle.sin_cos();
            let distance = thickness.mul_add(cos_t, radius);
            positions.push(Vec3::new(cos_r * distance, sin_r * distance, thickness * sin_t));
            colors.push(gray(0.7 + 0.3 * cos_t));
        }
    }

    let mut indices = Vec::new();
    for i in 0..segments {
        if i > 0 {
            indices.push(RESTART);
        }
        let current = i * sides;
        let next = ((i + 1) % segments) * sides;
        for j in 0..=sides {
            let j = j % sides;
            indices.push(current + j);
            indices.push(next + j);
        }
    }

    MeshData::new(
        position_color(&positions, &colors),
        Vec::new(),
        vec![RenderCommand::Indexed {
            primitive: PrimitiveType::TriangleStrip,
            index_type: IndexType::Ushort,
            primitive_restart: Some(RESTART),
            indices,
        }],
    )
}

/// Small arrow-shaped ship pointing down -Z, roughly 10 units long
#[must_use]
pub fn ship() -> MeshData {
    let positions = [
        // hull
        Vec3::new(0.0, 0.0, -6.0),
        Vec3::new(-1.5, 0.0, 4.0),
        Vec3::new(1.5, 0.0, 4.0),
        Vec3::new(0.0, 1.5, 3.0),
        Vec3::new(0.0, -1.0, 3.0),
        // wings
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(-6.0, 0.0, 4.0),
        Vec3::new(-1.2, 0.0, 3.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(6.0, 0.0, 4.0),
        Vec3::new(1.2, 0.0, 3.0),
    ];
    let hull = [0.85, 0.85, 0.9, 1.0];
    let belly = [0.45, 0.45, 0.5, 1.0];
    let wing = [0.8, 0.2, 0.2, 1.0];
    let colors = [hull, hull, hull, hull, belly, wing, wing, wing, wing, wing, wing];

    let indices = vec![
        // upper hull
        0, 3, 1, 0, 2, 3, 1, 3, 2, //
        // lower hull
        0, 1, 4, 0, 4, 2, 1, 2, 4, //
        // wings, both faces
        5, 6, 7, 5, 7, 6, 8, 10, 9, 8, 9, 10,
    ];

    MeshData::new(
        position_color(&positions, &colors),
        Vec::new(),
        vec![ushort_indices(PrimitiveType::Triangles, indices)],
    )
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn write_rows(out: &mut String, values: &[String], per_row: usize) {
    for row in values.chunks(per_row.max(1)) {
        let _ = writeln!(out, "\t\t{}", row.join(" "));
    }
}

impl MeshData {
    /// Serialize the mesh as a gltut mesh document
    ///
    /// Attribute data is written one vertex per line; triangle index lists
    /// three indices per line.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(out, "<mesh xmlns=\"{MESH_NAMESPACE}\">");

        for attribute in &self.attributes {
            let integral = if attribute.integral { " integral=\"true\"" } else { "" };
            let _ = writeln!(
                out,
                "\t<attribute index=\"{}\" type=\"{}\" size=\"{}\"{integral}>",
                attribute.index, attribute.attr_type, attribute.size
            );
            write_rows(&mut out, &attribute.data.to_strings(), attribute.size as usize);
            out.push_str("\t</attribute>\n");
        }

        for vao in &self.vaos {
            let _ = writeln!(out, "\t<vao name=\"{}\">", escape_attribute(&vao.name));
            for source in &vao.sources {
                let _ = writeln!(out, "\t\t<source attrib=\"{source}\"/>");
            }
            out.push_str("\t</vao>\n");
        }

        for command in &self.commands {
            match command {
                RenderCommand::Indexed {
                    primitive,
                    index_type,
                    primitive_restart,
                    indices,
                } => {
                    let restart = primitive_restart.map_or_else(String::new, |r| format!(" prim-restart=\"{r}\""));
                    let _ = writeln!(out, "\t<indices cmd=\"{primitive}\" type=\"{index_type}\"{restart}>");
                    let per_row = if *primitive == PrimitiveType::Triangles { 3 } else { 16 };
                    let values: Vec<String> = indices.iter().map(ToString::to_string).collect();
                    write_rows(&mut out, &values, per_row);
                    out.push_str("\t</indices>\n");
                }
                RenderCommand::Arrays {
                    primitive,
                    start,
                    count,
                } => {
                    let _ = writeln!(out, "\t<arrays cmd=\"{primitive}\" start=\"{start}\" count=\"{count}\"/>");
                }
            }
        }

        out.push_str("</mesh>\n");
        out
    }
}
