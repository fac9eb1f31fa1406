//! GPU-facing byte layout of a mesh
//!
//! All attribute arrays share one vertex buffer and all index lists share one
//! index buffer. Each array starts on a [`BUFFER_ALIGNMENT`] boundary. Values
//! are cast to bytes with `bytemuck` and so are little-endian; `half`
//! attributes are converted to IEEE binary16 here.

use bytemuck::Pod;
use half::f16;

use super::format::{Attribute, AttributeData, AttributeType, IndexType, MeshData, PrimitiveType, RenderCommand};

#[cfg(target_endian = "big")]
compile_error!("mesh layouts are packed in host byte order and must be little-endian");

/// Alignment of every array start inside the shared buffers
pub const BUFFER_ALIGNMENT: usize = 16;

/// Where one attribute lives inside the vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    /// Attribute slot
    pub index: u32,
    /// Components per vertex
    pub size: u32,
    /// Component type
    pub attr_type: AttributeType,
    /// Integer pass-through
    pub integral: bool,
    /// Byte offset of the first component
    pub offset: usize,
}

impl AttributeBinding {
    /// Whether the host should normalize integer components
    #[must_use]
    pub const fn normalized(&self) -> bool {
        self.attr_type.is_normalized()
    }

    /// Bytes between consecutive vertices (tightly packed)
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.size as usize * self.attr_type.byte_width()
    }
}

/// A draw call ready to be issued against the mesh buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    /// Indexed draw reading `count` indices from `offset` in the index buffer
    Elements {
        /// Primitive mode
        primitive: PrimitiveType,
        /// Index element type
        index_type: IndexType,
        /// Number of indices
        count: usize,
        /// Byte offset into the index buffer
        offset: usize,
        /// Primitive restart index
        primitive_restart: Option<u32>,
    },
    /// Non-indexed draw
    Arrays {
        /// Primitive mode
        primitive: PrimitiveType,
        /// First vertex
        first: u32,
        /// Vertex count
        count: u32,
    },
}

/// Attribute bindings of one named VAO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaoLayout {
    /// VAO name
    pub name: String,
    /// Bindings enabled in this VAO, in `source` order
    pub bindings: Vec<AttributeBinding>,
}

/// Packed buffers and draw list for a mesh
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeshLayout {
    /// Contents of the array buffer
    pub vertex_data: Vec<u8>,
    /// Contents of the element buffer; empty for array-only meshes
    pub index_data: Vec<u8>,
    /// Bindings of every attribute, in document order
    pub bindings: Vec<AttributeBinding>,
    /// Named VAOs
    pub vaos: Vec<VaoLayout>,
    /// One draw per rendering command
    pub draws: Vec<DrawCommand>,
}

impl MeshLayout {
    /// Pack a mesh into buffers
    ///
    /// The mesh is expected to have passed [`MeshData::validate`]; VAO
    /// sources that name no attribute are skipped.
    #[must_use]
    pub fn build(mesh: &MeshData) -> Self {
        let mut layout = Self::default();

        for attribute in &mesh.attributes {
            pad_to_alignment(&mut layout.vertex_data);
            layout.bindings.push(AttributeBinding {
                index: attribute.index,
                size: attribute.size,
                attr_type: attribute.attr_type,
                integral: attribute.integral,
                offset: layout.vertex_data.len(),
            });
            encode_attribute(attribute, &mut layout.vertex_data);
        }

        for vao in &mesh.vaos {
            let bindings = vao
                .sources
                .iter()
                .filter_map(|&source| layout.bindings.iter().find(|b| b.index == source).copied())
                .collect();
            layout.vaos.push(VaoLayout {
                name: vao.name.clone(),
                bindings,
            });
        }

        for command in &mesh.commands {
            let draw = match command {
                RenderCommand::Indexed {
                    primitive,
                    index_type,
                    primitive_restart,
                    indices,
                } => {
                    pad_to_alignment(&mut layout.index_data);
                    let offset = layout.index_data.len();
                    encode_indices(*index_type, indices, &mut layout.index_data);
                    DrawCommand::Elements {
                        primitive: *primitive,
                        index_type: *index_type,
                        count: indices.len(),
                        offset,
                        primitive_restart: *primitive_restart,
                    }
                }
                RenderCommand::Arrays {
                    primitive,
                    start,
                    count,
                } => DrawCommand::Arrays {
                    primitive: *primitive,
                    first: *start,
                    count: *count,
                },
            };
            layout.draws.push(draw);
        }

        log::trace!(
            "Mesh layout: {} vertex bytes, {} index bytes",
            layout.vertex_data.len(),
            layout.index_data.len()
        );
        layout
    }

    /// Bindings of a named VAO
    #[must_use]
    pub fn vao(&self, name: &str) -> Option<&VaoLayout> {
        self.vaos.iter().find(|v| v.name == name)
    }

    /// Whether the mesh needs an element buffer
    #[must_use]
    pub fn has_indices(&self) -> bool {
        !self.index_data.is_empty()
    }
}

/// Round `len` up to the next multiple of `align`
#[must_use]
pub const fn align_to(len: usize, align: usize) -> usize {
    len.div_ceil(align) * align
}

fn pad_to_alignment(buffer: &mut Vec<u8>) {
    buffer.resize(align_to(buffer.len(), BUFFER_ALIGNMENT), 0);
}

fn extend<T: Pod>(out: &mut Vec<u8>, values: &[T]) {
    out.extend_from_slice(bytemuck::cast_slice(values));
}

fn encode_attribute(attribute: &Attribute, out: &mut Vec<u8>) {
    match (&attribute.data, attribute.attr_type) {
        (AttributeData::Float(values), AttributeType::Half) => {
            let bits: Vec<u16> = values.iter().map(|&v| f16::from_f32(v).to_bits()).collect();
            extend(out, &bits);
        }
        (AttributeData::Float(values), _) => extend(out, values),
        (AttributeData::Int(values), _) => extend(out, values),
        (AttributeData::Uint(values), _) => extend(out, values),
        (AttributeData::Short(values), _) => extend(out, values),
        (AttributeData::Ushort(values), _) => extend(out, values),
        (AttributeData::Byte(values), _) => extend(out, values),
        (AttributeData::Ubyte(values), _) => out.extend_from_slice(values),
    }
}

fn encode_indices(index_type: IndexType, indices: &[u32], out: &mut Vec<u8>) {
    // Indices were range-checked against the index type during validation.
    match index_type {
        IndexType::Uint => extend(out, indices),
        IndexType::Ushort => {
            let narrow: Vec<u16> = indices.iter().map(|&v| v as u16).collect();
            extend(out, &narrow);
        }
        IndexType::Ubyte => out.extend(indices.iter().map(|&v| v as u8)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::mesh::format::NamedVao;

    fn mesh() -> MeshData {
        MeshData::new(
            vec![
                Attribute::float(0, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]),
                Attribute::new(1, AttributeType::NormUbyte, 3, AttributeData::Ubyte(vec![1, 2, 3, 4, 5, 6, 7, 8, 9])),
                Attribute::new(2, AttributeType::Half, 1, AttributeData::Float(vec![1.0, -2.0, 0.5])),
            ],
            vec![NamedVao::new("colored", vec![0, 1])],
            vec![
                RenderCommand::Indexed {
                    primitive: PrimitiveType::Triangles,
                    index_type: IndexType::Ushort,
                    primitive_restart: None,
                    indices: vec![0, 1, 2],
                },
                RenderCommand::Indexed {
                    primitive: PrimitiveType::TriangleFan,
                    index_type: IndexType::Ubyte,
                    primitive_restart: Some(255),
                    indices: vec![2, 1, 0],
                },
            ],
        )
    }

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(0, 16), 0);
        assert_eq!(align_to(1, 16), 16);
        assert_eq!(align_to(36, 16), 48);
        assert_eq!(align_to(48, 16), 48);
    }

    #[test]
    fn test_attribute_offsets_are_aligned() {
        let layout = MeshLayout::build(&mesh());
        let offsets: Vec<usize> = layout.bindings.iter().map(|b| b.offset).collect();
        // 36 bytes of float, 9 bytes of ubyte, 6 bytes of half
        assert_eq!(offsets, vec![0, 48, 64]);
        assert_eq!(layout.vertex_data.len(), 70);
        assert_eq!(&layout.vertex_data[36..48], &[0; 12]);
        assert!(layout.bindings[1].normalized());
        assert_eq!(layout.bindings[0].stride(), 12);
    }

    #[test]
    fn test_values_are_little_endian() {
        let layout = MeshLayout::build(&mesh());
        assert_eq!(&layout.vertex_data[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&layout.vertex_data[48..51], &[1, 2, 3]);
        // binary16: 1.0 = 0x3C00, -2.0 = 0xC000, 0.5 = 0x3800
        assert_eq!(&layout.vertex_data[64..70], &[0x00, 0x3C, 0x00, 0xC0, 0x00, 0x38]);
    }

    #[test]
    fn test_index_buffer_layout() {
        let layout = MeshLayout::build(&mesh());
        assert!(layout.has_indices());
        assert_eq!(&layout.index_data[0..6], &[0, 0, 1, 0, 2, 0]);
        assert_eq!(&layout.index_data[16..19], &[2, 1, 0]);
        assert_eq!(
            layout.draws[1],
            DrawCommand::Elements {
                primitive: PrimitiveType::TriangleFan,
                index_type: IndexType::Ubyte,
                count: 3,
                offset: 16,
                primitive_restart: Some(255),
            }
        );
    }

    #[test]
    fn test_vao_bindings_follow_sources() {
        let layout = MeshLayout::build(&mesh());
        let vao = layout.vao("colored").unwrap();
        let indices: Vec<u32> = vao.bindings.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(vao.bindings[1].offset, 48);
        assert!(layout.vao("missing").is_none());
    }

    #[test]
    fn test_array_meshes_have_no_index_data() {
        let mut data = mesh();
        data.commands = vec![RenderCommand::Arrays {
            primitive: PrimitiveType::Points,
            start: 1,
            count: 2,
        }];
        let layout = MeshLayout::build(&data);
        assert!(!layout.has_indices());
        assert_eq!(
            layout.draws,
            vec![DrawCommand::Arrays {
                primitive: PrimitiveType::Points,
                first: 1,
                count: 2,
            }]
        );
    }
}
