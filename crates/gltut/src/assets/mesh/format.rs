//! Typed model of a mesh document
//!
//! These types mirror the XML vocabulary one to one. A [`MeshData`] can come
//! from the parser or be assembled in code (see the generator); either way
//! [`MeshData::validate`] enforces the same rules.

use std::collections::HashSet;
use std::fmt;

use super::{Location, MeshError};

/// Number of generic vertex attribute slots a mesh may use
pub const MAX_ATTRIBUTES: u32 = 16;

/// Largest number of components per attribute
pub const MAX_COMPONENTS: u32 = 4;

/// Component type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// 32-bit float
    Float,
    /// 16-bit float, written from 32-bit values
    Half,
    /// 32-bit signed integer
    Int,
    /// 32-bit unsigned integer
    Uint,
    /// 32-bit signed integer normalized to [-1, 1]
    NormInt,
    /// 32-bit unsigned integer normalized to [0, 1]
    NormUint,
    /// 16-bit signed integer
    Short,
    /// 16-bit unsigned integer
    Ushort,
    /// 16-bit signed integer normalized to [-1, 1]
    NormShort,
    /// 16-bit unsigned integer normalized to [0, 1]
    NormUshort,
    /// 8-bit signed integer
    Byte,
    /// 8-bit unsigned integer
    Ubyte,
    /// 8-bit signed integer normalized to [-1, 1]
    NormByte,
    /// 8-bit unsigned integer normalized to [0, 1]
    NormUbyte,
}

impl AttributeType {
    /// Every attribute type, in schema order
    pub const ALL: [Self; 14] = [
        Self::Float,
        Self::Half,
        Self::Int,
        Self::Uint,
        Self::NormInt,
        Self::NormUint,
        Self::Short,
        Self::Ushort,
        Self::NormShort,
        Self::NormUshort,
        Self::Byte,
        Self::Ubyte,
        Self::NormByte,
        Self::NormUbyte,
    ];

    /// Name used by the `type` attribute
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Half => "half",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::NormInt => "norm-int",
            Self::NormUint => "norm-uint",
            Self::Short => "short",
            Self::Ushort => "ushort",
            Self::NormShort => "norm-short",
            Self::NormUshort => "norm-ushort",
            Self::Byte => "byte",
            Self::Ubyte => "ubyte",
            Self::NormByte => "norm-byte",
            Self::NormUbyte => "norm-ubyte",
        }
    }

    /// Look up a type by its XML name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Size of one component in bytes
    #[must_use]
    pub const fn byte_width(self) -> usize {
        match self {
            Self::Float | Self::Int | Self::Uint | Self::NormInt | Self::NormUint => 4,
            Self::Half | Self::Short | Self::Ushort | Self::NormShort | Self::NormUshort => 2,
            Self::Byte | Self::Ubyte | Self::NormByte | Self::NormUbyte => 1,
        }
    }

    /// Whether integer values are normalized when read by the shader
    #[must_use]
    pub const fn is_normalized(self) -> bool {
        matches!(
            self,
            Self::NormInt | Self::NormUint | Self::NormShort | Self::NormUshort | Self::NormByte | Self::NormUbyte
        )
    }

    /// Whether the type stores floating point values
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Half)
    }

    /// Whether `integral="true"` is allowed for this type
    #[must_use]
    pub const fn allows_integral(self) -> bool {
        !self.is_float() && !self.is_normalized()
    }

    /// Inclusive value range for integer types, `None` for float types
    #[must_use]
    pub const fn integer_range(self) -> Option<(i64, i64)> {
        match self {
            Self::Float | Self::Half => None,
            Self::Int | Self::NormInt => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::Uint | Self::NormUint => Some((0, u32::MAX as i64)),
            Self::Short | Self::NormShort => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::Ushort | Self::NormUshort => Some((0, u16::MAX as i64)),
            Self::Byte | Self::NormByte => Some((i8::MIN as i64, i8::MAX as i64)),
            Self::Ubyte | Self::NormUbyte => Some((0, u8::MAX as i64)),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primitive assembly mode of a rendering command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Independent triangles
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Triangle fan
    TriangleFan,
    /// Independent lines
    Lines,
    /// Line strip
    LineStrip,
    /// Closed line loop
    LineLoop,
    /// Points
    Points,
}

impl PrimitiveType {
    /// Every primitive type, in schema order
    pub const ALL: [Self; 7] = [
        Self::Triangles,
        Self::TriangleStrip,
        Self::TriangleFan,
        Self::Lines,
        Self::LineStrip,
        Self::LineLoop,
        Self::Points,
    ];

    /// Name used by the `cmd` attribute
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Triangles => "triangles",
            Self::TriangleStrip => "tri-strip",
            Self::TriangleFan => "tri-fan",
            Self::Lines => "lines",
            Self::LineStrip => "line-strip",
            Self::LineLoop => "line-loop",
            Self::Points => "points",
        }
    }

    /// Look up a primitive type by its XML name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element type of an index list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// 32-bit indices
    Uint,
    /// 16-bit indices
    Ushort,
    /// 8-bit indices
    Ubyte,
}

impl IndexType {
    /// Name used by the `type` attribute of `indices`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uint => "uint",
            Self::Ushort => "ushort",
            Self::Ubyte => "ubyte",
        }
    }

    /// Look up an index type by its XML name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Uint, Self::Ushort, Self::Ubyte].into_iter().find(|t| t.name() == name)
    }

    /// Size of one index in bytes
    #[must_use]
    pub const fn byte_width(self) -> usize {
        match self {
            Self::Uint => 4,
            Self::Ushort => 2,
            Self::Ubyte => 1,
        }
    }

    /// Largest representable index
    #[must_use]
    pub const fn max_value(self) -> u32 {
        match self {
            Self::Uint => u32::MAX,
            Self::Ushort => u16::MAX as u32,
            Self::Ubyte => u8::MAX as u32,
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute values, stored in the narrowest type that holds them.
///
/// Normalized types share storage with their plain counterparts and `half`
/// values are kept as `f32` until layout.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    /// `float` and `half`
    Float(Vec<f32>),
    /// `int` and `norm-int`
    Int(Vec<i32>),
    /// `uint` and `norm-uint`
    Uint(Vec<u32>),
    /// `short` and `norm-short`
    Short(Vec<i16>),
    /// `ushort` and `norm-ushort`
    Ushort(Vec<u16>),
    /// `byte` and `norm-byte`
    Byte(Vec<i8>),
    /// `ubyte` and `norm-ubyte`
    Ubyte(Vec<u8>),
}

impl AttributeData {
    /// Number of stored components
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Uint(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Ushort(v) => v.len(),
            Self::Byte(v) => v.len(),
            Self::Ubyte(v) => v.len(),
        }
    }

    /// Whether no components are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this storage is the one used for `attr_type`
    #[must_use]
    pub const fn matches(&self, attr_type: AttributeType) -> bool {
        use AttributeType as T;
        matches!(
            (self, attr_type),
            (Self::Float(_), T::Float | T::Half)
                | (Self::Int(_), T::Int | T::NormInt)
                | (Self::Uint(_), T::Uint | T::NormUint)
                | (Self::Short(_), T::Short | T::NormShort)
                | (Self::Ushort(_), T::Ushort | T::NormUshort)
                | (Self::Byte(_), T::Byte | T::NormByte)
                | (Self::Ubyte(_), T::Ubyte | T::NormUbyte)
        )
    }

    /// Text form of every component, as written in a mesh document
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        fn strings<T: ToString>(values: &[T]) -> Vec<String> {
            values.iter().map(ToString::to_string).collect()
        }
        match self {
            Self::Float(v) => strings(v),
            Self::Int(v) => strings(v),
            Self::Uint(v) => strings(v),
            Self::Short(v) => strings(v),
            Self::Ushort(v) => strings(v),
            Self::Byte(v) => strings(v),
            Self::Ubyte(v) => strings(v),
        }
    }
}

/// One vertex attribute array
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute slot, `0..16`
    pub index: u32,
    /// Component type
    pub attr_type: AttributeType,
    /// Components per vertex, `1..=4`
    pub size: u32,
    /// Feed the shader integers instead of converting to float
    pub integral: bool,
    /// Component values
    pub data: AttributeData,
}

impl Attribute {
    /// Create a non-integral attribute
    #[must_use]
    pub const fn new(index: u32, attr_type: AttributeType, size: u32, data: AttributeData) -> Self {
        Self {
            index,
            attr_type,
            size,
            integral: false,
            data,
        }
    }

    /// Create a `float` attribute
    #[must_use]
    pub const fn float(index: u32, size: u32, values: Vec<f32>) -> Self {
        Self::new(index, AttributeType::Float, size, AttributeData::Float(values))
    }

    /// Set the integral flag
    #[must_use]
    pub const fn with_integral(mut self, integral: bool) -> Self {
        self.integral = integral;
        self
    }

    /// Number of vertices in this attribute
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.data.len() / self.size as usize
        }
    }

    /// Bytes used by the packed data
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.data.len() * self.attr_type.byte_width()
    }
}

/// Named subset of attributes bound together as a vertex array object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedVao {
    /// Name used by `render_vao`
    pub name: String,
    /// Attribute indices enabled in this VAO
    pub sources: Vec<u32>,
}

impl NamedVao {
    /// Create a named VAO
    #[must_use]
    pub fn new(name: impl Into<String>, sources: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            sources,
        }
    }
}

/// One rendering command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCommand {
    /// Indexed draw (`<indices>`)
    Indexed {
        /// Primitive mode
        primitive: PrimitiveType,
        /// Index element type
        index_type: IndexType,
        /// Primitive restart index, if any
        primitive_restart: Option<u32>,
        /// Index values
        indices: Vec<u32>,
    },
    /// Non-indexed draw (`<arrays>`)
    Arrays {
        /// Primitive mode
        primitive: PrimitiveType,
        /// First vertex
        start: u32,
        /// Number of vertices
        count: u32,
    },
}

impl RenderCommand {
    /// Primitive mode of the command
    #[must_use]
    pub const fn primitive(&self) -> PrimitiveType {
        match self {
            Self::Indexed { primitive, .. } | Self::Arrays { primitive, .. } => *primitive,
        }
    }

    /// Whether this is an indexed draw
    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed { .. })
    }

    /// XML element name of the command
    #[must_use]
    pub const fn element_name(&self) -> &'static str {
        match self {
            Self::Indexed { .. } => "indices",
            Self::Arrays { .. } => "arrays",
        }
    }
}

/// Part of a mesh, used to look up source positions while validating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshElement {
    /// N-th `attribute`
    Attribute(usize),
    /// N-th `vao`
    Vao(usize),
    /// `source` M of `vao` N
    Source(usize, usize),
    /// N-th rendering command
    Command(usize),
}

/// A complete mesh document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// Vertex attributes in document order
    pub attributes: Vec<Attribute>,
    /// Named VAOs in document order
    pub vaos: Vec<NamedVao>,
    /// Rendering commands in document order
    pub commands: Vec<RenderCommand>,
}

impl MeshData {
    /// Assemble a mesh; call [`validate`](Self::validate) before use
    #[must_use]
    pub const fn new(attributes: Vec<Attribute>, vaos: Vec<NamedVao>, commands: Vec<RenderCommand>) -> Self {
        Self {
            attributes,
            vaos,
            commands,
        }
    }

    /// Vertices per attribute, taken from the first attribute
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.attributes.first().map_or(0, Attribute::vertex_count)
    }

    /// Attribute with the given slot index
    #[must_use]
    pub fn attribute(&self, index: u32) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.index == index)
    }

    /// Named VAO
    #[must_use]
    pub fn vao(&self, name: &str) -> Option<&NamedVao> {
        self.vaos.iter().find(|v| v.name == name)
    }

    /// Whether the commands are indexed draws
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.commands.first().is_some_and(RenderCommand::is_indexed)
    }

    /// Check every structural rule of the mesh format
    ///
    /// # Errors
    /// Returns the first [`MeshError`] found, with unknown locations.
    pub fn validate(&self) -> Result<(), MeshError> {
        self.validate_with(|_| Location::unknown())
    }

    /// Check every structural rule, locating errors with `locate`
    ///
    /// # Arguments
    /// * `locate` - Maps a mesh element to its position in the source text
    ///
    /// # Errors
    /// Returns the first [`MeshError`] found.
    pub fn validate_with(&self, locate: impl Fn(MeshElement) -> Location) -> Result<(), MeshError> {
        self.validate_attributes(&locate)?;
        self.validate_vaos(&locate)?;
        self.validate_commands(&locate)
    }

    fn validate_attributes(&self, locate: &impl Fn(MeshElement) -> Location) -> Result<(), MeshError> {
        if self.attributes.is_empty() {
            return Err(MeshError::NoAttributes);
        }

        let mut seen = HashSet::new();
        let expected = self.vertex_count();
        for (i, attribute) in self.attributes.iter().enumerate() {
            let at = locate(MeshElement::Attribute(i));
            if attribute.index >= MAX_ATTRIBUTES {
                return Err(MeshError::OutOfRange {
                    element: "attribute",
                    attribute: "index",
                    value: attribute.index.to_string(),
                    expected: format!("0..{MAX_ATTRIBUTES}"),
                    at,
                });
            }
            if attribute.size == 0 || attribute.size > MAX_COMPONENTS {
                return Err(MeshError::OutOfRange {
                    element: "attribute",
                    attribute: "size",
                    value: attribute.size.to_string(),
                    expected: format!("1..={MAX_COMPONENTS}"),
                    at,
                });
            }
            if attribute.integral && !attribute.attr_type.allows_integral() {
                return Err(MeshError::IntegralNotAllowed {
                    attr_type: attribute.attr_type,
                    at,
                });
            }
            if !attribute.data.matches(attribute.attr_type) {
                return Err(MeshError::InvalidValue {
                    element: "attribute",
                    attribute: "data",
                    value: format!("values stored for a type other than '{}'", attribute.attr_type),
                    at,
                });
            }
            let len = attribute.data.len();
            if len == 0 || len % attribute.size as usize != 0 {
                return Err(MeshError::InvalidValue {
                    element: "attribute",
                    attribute: "data",
                    value: format!("{len} values is not a non-zero multiple of size {}", attribute.size),
                    at,
                });
            }
            if !seen.insert(attribute.index) {
                return Err(MeshError::DuplicateAttribute {
                    index: attribute.index,
                    at,
                });
            }
            if attribute.vertex_count() != expected {
                return Err(MeshError::VertexCountMismatch {
                    index: attribute.index,
                    found: attribute.vertex_count(),
                    expected,
                    at,
                });
            }
        }
        Ok(())
    }

    fn validate_vaos(&self, locate: &impl Fn(MeshElement) -> Location) -> Result<(), MeshError> {
        let mut names = HashSet::new();
        for (i, vao) in self.vaos.iter().enumerate() {
            if !names.insert(vao.name.as_str()) {
                return Err(MeshError::DuplicateVao {
                    name: vao.name.clone(),
                    at: locate(MeshElement::Vao(i)),
                });
            }
            if vao.sources.is_empty() {
                return Err(MeshError::MissingAttribute {
                    element: "vao",
                    attribute: "source",
                    at: locate(MeshElement::Vao(i)),
                });
            }
            for (j, &attrib) in vao.sources.iter().enumerate() {
                if self.attribute(attrib).is_none() {
                    return Err(MeshError::UnknownSource {
                        vao: vao.name.clone(),
                        attrib,
                        at: locate(MeshElement::Source(i, j)),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_commands(&self, locate: &impl Fn(MeshElement) -> Location) -> Result<(), MeshError> {
        let first = self.commands.first().ok_or(MeshError::NoCommands)?;
        let vertex_count = self.vertex_count();

        for (i, command) in self.commands.iter().enumerate() {
            let at = locate(MeshElement::Command(i));
            if command.is_indexed() != first.is_indexed() {
                return Err(MeshError::MixedCommands { at });
            }

            match command {
                RenderCommand::Indexed {
                    index_type,
                    primitive_restart,
                    indices,
                    ..
                } => {
                    if indices.is_empty() {
                        return Err(MeshError::InvalidValue {
                            element: "indices",
                            attribute: "data",
                            value: String::new(),
                            at,
                        });
                    }
                    let max = index_type.max_value();
                    if let Some(restart) = primitive_restart.filter(|&r| r > max) {
                        return Err(MeshError::OutOfRange {
                            element: "indices",
                            attribute: "prim-restart",
                            value: restart.to_string(),
                            expected: format!("0..={max}"),
                            at,
                        });
                    }
                    for &index in indices {
                        if index > max {
                            return Err(MeshError::OutOfRange {
                                element: "indices",
                                attribute: "data",
                                value: index.to_string(),
                                expected: format!("0..={max}"),
                                at,
                            });
                        }
                        if Some(index) != *primitive_restart && index as usize >= vertex_count {
                            return Err(MeshError::IndexOutOfBounds {
                                element: "indices",
                                value: u64::from(index),
                                vertex_count,
                                at,
                            });
                        }
                    }
                }
                RenderCommand::Arrays { start, count, .. } => {
                    if *count == 0 {
                        return Err(MeshError::OutOfRange {
                            element: "arrays",
                            attribute: "count",
                            value: count.to_string(),
                            expected: "at least 1".to_string(),
                            at,
                        });
                    }
                    let end = u64::from(*start) + u64::from(*count);
                    if end > vertex_count as u64 {
                        return Err(MeshError::IndexOutOfBounds {
                            element: "arrays",
                            value: end - 1,
                            vertex_count,
                            at,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData::new(
            vec![
                Attribute::float(0, 3, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
                Attribute::new(1, AttributeType::NormUbyte, 4, AttributeData::Ubyte(vec![255; 12])),
            ],
            vec![NamedVao::new("flat", vec![0])],
            vec![RenderCommand::Indexed {
                primitive: PrimitiveType::Triangles,
                index_type: IndexType::Ushort,
                primitive_restart: None,
                indices: vec![0, 1, 2],
            }],
        )
    }

    #[test]
    fn test_type_names_round_trip() {
        for t in AttributeType::ALL {
            assert_eq!(AttributeType::from_name(t.name()), Some(t));
        }
        for p in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_name(p.name()), Some(p));
        }
        assert_eq!(IndexType::from_name("ushort"), Some(IndexType::Ushort));
        assert_eq!(AttributeType::from_name("double"), None);
    }

    #[test]
    fn test_attribute_type_properties() {
        assert_eq!(AttributeType::Half.byte_width(), 2);
        assert!(AttributeType::NormByte.is_normalized());
        assert!(!AttributeType::Half.allows_integral());
        assert!(!AttributeType::NormUint.allows_integral());
        assert!(AttributeType::Ushort.allows_integral());
        assert_eq!(AttributeType::Ubyte.integer_range(), Some((0, 255)));
        assert_eq!(AttributeType::Float.integer_range(), None);
    }

    #[test]
    fn test_valid_mesh_passes() {
        let mesh = triangle();
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.is_indexed());
        assert!(mesh.vao("flat").is_some());
    }

    #[test]
    fn test_no_attributes_or_commands() {
        let mut mesh = triangle();
        mesh.commands.clear();
        assert!(matches!(mesh.validate(), Err(MeshError::NoCommands)));

        mesh.attributes.clear();
        assert!(matches!(mesh.validate(), Err(MeshError::NoAttributes)));
    }

    #[test]
    fn test_attribute_index_and_size_bounds() {
        let mut mesh = triangle();
        mesh.attributes[0].index = 16;
        assert!(matches!(mesh.validate(), Err(MeshError::OutOfRange { attribute: "index", .. })));

        let mut mesh = triangle();
        mesh.attributes[0].size = 5;
        assert!(matches!(mesh.validate(), Err(MeshError::OutOfRange { attribute: "size", .. })));
    }

    #[test]
    fn test_duplicate_attribute_and_vertex_mismatch() {
        let mut mesh = triangle();
        mesh.attributes[1] = Attribute::float(0, 3, vec![0.0; 9]);
        assert!(matches!(mesh.validate(), Err(MeshError::DuplicateAttribute { index: 0, .. })));

        let mut mesh = triangle();
        mesh.attributes[1].data = AttributeData::Ubyte(vec![0; 8]);
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::VertexCountMismatch { found: 2, expected: 3, .. })
        ));
    }

    #[test]
    fn test_integral_on_normalized_type_rejected() {
        let mut mesh = triangle();
        mesh.attributes[1].integral = true;
        assert!(matches!(mesh.validate(), Err(MeshError::IntegralNotAllowed { .. })));
    }

    #[test]
    fn test_vao_rules() {
        let mut mesh = triangle();
        mesh.vaos.push(NamedVao::new("flat", vec![1]));
        assert!(matches!(mesh.validate(), Err(MeshError::DuplicateVao { .. })));

        let mut mesh = triangle();
        mesh.vaos[0].sources.push(7);
        assert!(matches!(mesh.validate(), Err(MeshError::UnknownSource { attrib: 7, .. })));
    }

    #[test]
    fn test_mixed_commands_rejected() {
        let mut mesh = triangle();
        mesh.commands.push(RenderCommand::Arrays {
            primitive: PrimitiveType::Points,
            start: 0,
            count: 3,
        });
        assert!(matches!(mesh.validate(), Err(MeshError::MixedCommands { .. })));
    }

    #[test]
    fn test_index_bounds_respect_primitive_restart() {
        let mut mesh = triangle();
        mesh.commands[0] = RenderCommand::Indexed {
            primitive: PrimitiveType::TriangleStrip,
            index_type: IndexType::Ushort,
            primitive_restart: Some(65535),
            indices: vec![0, 1, 2, 65535, 2, 1, 0],
        };
        assert!(mesh.validate().is_ok());

        if let RenderCommand::Indexed { indices, .. } = &mut mesh.commands[0] {
            indices.push(3);
        }
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::IndexOutOfBounds { value: 3, vertex_count: 3, .. })
        ));
    }

    #[test]
    fn test_index_must_fit_index_type() {
        let mut mesh = triangle();
        mesh.commands[0] = RenderCommand::Indexed {
            primitive: PrimitiveType::Points,
            index_type: IndexType::Ubyte,
            primitive_restart: Some(300),
            indices: vec![0],
        };
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::OutOfRange { attribute: "prim-restart", .. })
        ));
    }

    #[test]
    fn test_arrays_range() {
        let mut mesh = triangle();
        mesh.commands = vec![RenderCommand::Arrays {
            primitive: PrimitiveType::Triangles,
            start: 1,
            count: 3,
        }];
        assert!(matches!(mesh.validate(), Err(MeshError::IndexOutOfBounds { value: 3, .. })));

        mesh.commands = vec![RenderCommand::Arrays {
            primitive: PrimitiveType::Triangles,
            start: 0,
            count: 0,
        }];
        assert!(matches!(mesh.validate(), Err(MeshError::OutOfRange { attribute: "count", .. })));
    }

    #[test]
    fn test_locator_is_used() {
        let mut mesh = triangle();
        mesh.vaos[0].sources = vec![0, 9];
        let err = mesh
            .validate_with(|element| match element {
                MeshElement::Source(0, 1) => Location::at(12, 9),
                _ => Location::unknown(),
            })
            .unwrap_err();
        assert_eq!(err.location(), Some(Location::at(12, 9)));
    }
}
