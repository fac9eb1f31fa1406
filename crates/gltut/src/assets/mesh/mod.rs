//! # Mesh Documents
//!
//! Loading, validation, binary layout and generation of gltut mesh files.
//!
//! A mesh document is an XML file in the `http://www.arcsynthesis.com/gltut/mesh`
//! namespace. It declares one or more vertex attributes, optional named
//! vertex array subsets and a list of rendering commands that are either all
//! indexed draws or all array draws.
//!
//! ```text
//! <mesh xmlns="http://www.arcsynthesis.com/gltut/mesh">
//!     <attribute index="0" type="float" size="3"> 0 0 0  1 0 0  0 1 0 </attribute>
//!     <vao name="flat"><source attrib="0"/></vao>
//!     <indices cmd="triangles" type="ushort">0 1 2</indices>
//! </mesh>
//! ```
//!
//! The pipeline is [`MeshData::from_xml`] → [`MeshData::validate`] (run by the
//! parser) → [`MeshLayout::build`] for the GPU-facing byte buffers.

pub mod format;
pub mod generator;
pub mod layout;
pub mod parser;
pub mod schema;

pub use format::{
    Attribute, AttributeData, AttributeType, IndexType, MeshData, NamedVao, PrimitiveType,
    RenderCommand,
};
pub use layout::{AttributeBinding, DrawCommand, MeshLayout, VaoLayout};

use std::fmt;
use thiserror::Error;

/// Position of an element inside a mesh document.
///
/// Meshes built in code have no source text, so their location is unknown
/// and prints as nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pos: Option<(u32, u32)>,
}

impl Location {
    /// A location with no source position
    #[must_use]
    pub const fn unknown() -> Self {
        Self { pos: None }
    }

    /// A 1-based line and column
    #[must_use]
    pub const fn at(line: u32, column: u32) -> Self {
        Self {
            pos: Some((line, column)),
        }
    }

    /// Line number, if known
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.pos.map(|(line, _)| line)
    }

    /// Column number, if known
    #[must_use]
    pub fn column(&self) -> Option<u32> {
        self.pos.map(|(_, column)| column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some((line, column)) => write!(f, " at {line}:{column}"),
            None => Ok(()),
        }
    }
}

/// Mesh loading and validation errors
#[derive(Error, Debug)]
pub enum MeshError {
    /// Malformed XML
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document root is not a gltut `mesh` element
    #[error("root element must be <mesh>, found <{found}>")]
    WrongRoot {
        /// Local name of the root that was found
        found: String,
    },

    /// Element that the mesh vocabulary does not allow at this point
    #[error("unexpected element <{name}> inside <{parent}>{at}")]
    UnexpectedElement {
        /// Unexpected element name
        name: String,
        /// Enclosing element name
        parent: &'static str,
        /// Source position
        at: Location,
    },

    /// Required XML attribute is absent
    #[error("<{element}> is missing required attribute '{attribute}'{at}")]
    MissingAttribute {
        /// Element name
        element: &'static str,
        /// Attribute name
        attribute: &'static str,
        /// Source position
        at: Location,
    },

    /// Value does not parse or is not one of the allowed keywords
    #[error("<{element}> has invalid {attribute} '{value}'{at}")]
    InvalidValue {
        /// Element name
        element: &'static str,
        /// Attribute name, or `data` for element text
        attribute: &'static str,
        /// Offending text
        value: String,
        /// Source position
        at: Location,
    },

    /// Numeric value outside the range its field or type allows
    #[error("<{element}> {attribute} value {value} is out of range, expected {expected}{at}")]
    OutOfRange {
        /// Element name
        element: &'static str,
        /// Attribute name, or `data` for element text
        attribute: &'static str,
        /// Offending value
        value: String,
        /// Allowed range
        expected: String,
        /// Source position
        at: Location,
    },

    /// Two attributes share an index
    #[error("attribute index {index} is declared more than once{at}")]
    DuplicateAttribute {
        /// Repeated attribute index
        index: u32,
        /// Position of the second declaration
        at: Location,
    },

    /// Two VAOs share a name
    #[error("vao '{name}' is declared more than once{at}")]
    DuplicateVao {
        /// Repeated name
        name: String,
        /// Position of the second declaration
        at: Location,
    },

    /// VAO source references an undeclared attribute
    #[error("vao '{vao}' references undeclared attribute {attrib}{at}")]
    UnknownSource {
        /// VAO name
        vao: String,
        /// Referenced attribute index
        attrib: u32,
        /// Source position
        at: Location,
    },

    /// Attribute vertex count differs from the first attribute's
    #[error("attribute {index} has {found} vertices, expected {expected}{at}")]
    VertexCountMismatch {
        /// Attribute index
        index: u32,
        /// Vertices in this attribute
        found: usize,
        /// Vertices in the first attribute
        expected: usize,
        /// Source position
        at: Location,
    },

    /// Index or array range reaches past the last vertex
    #[error("<{element}> references vertex {value} but the mesh has {vertex_count} vertices{at}")]
    IndexOutOfBounds {
        /// `indices` or `arrays`
        element: &'static str,
        /// First offending vertex
        value: u64,
        /// Vertices in the mesh
        vertex_count: usize,
        /// Source position
        at: Location,
    },

    /// Both `indices` and `arrays` commands in one mesh
    #[error("a mesh cannot mix <indices> and <arrays> commands{at}")]
    MixedCommands {
        /// Position of the first command of the other kind
        at: Location,
    },

    /// No `attribute` elements
    #[error("a mesh needs at least one <attribute>")]
    NoAttributes,

    /// No rendering commands
    #[error("a mesh needs at least one <indices> or <arrays> command")]
    NoCommands,

    /// `integral="true"` on a float or normalized type
    #[error("attribute type '{attr_type}' cannot be integral{at}")]
    IntegralNotAllowed {
        /// Attribute type
        attr_type: AttributeType,
        /// Source position
        at: Location,
    },
}

impl MeshError {
    /// Source position carried by the error, if any
    #[must_use]
    pub const fn location(&self) -> Option<Location> {
        match self {
            Self::UnexpectedElement { at, .. }
            | Self::MissingAttribute { at, .. }
            | Self::InvalidValue { at, .. }
            | Self::OutOfRange { at, .. }
            | Self::DuplicateAttribute { at, .. }
            | Self::DuplicateVao { at, .. }
            | Self::UnknownSource { at, .. }
            | Self::VertexCountMismatch { at, .. }
            | Self::IndexOutOfBounds { at, .. }
            | Self::MixedCommands { at }
            | Self::IntegralNotAllowed { at, .. } => Some(*at),
            Self::Xml(_) | Self::Io(_) | Self::WrongRoot { .. } | Self::NoAttributes | Self::NoCommands => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        assert_eq!(Location::at(4, 7).to_string(), " at 4:7");
        assert_eq!(Location::unknown().to_string(), "");
        assert_eq!(Location::at(4, 7).line(), Some(4));
    }

    #[test]
    fn test_error_message_includes_location() {
        let err = MeshError::DuplicateAttribute {
            index: 1,
            at: Location::at(3, 5),
        };
        assert_eq!(err.to_string(), "attribute index 1 is declared more than once at 3:5");
        assert_eq!(err.location(), Some(Location::at(3, 5)));
    }
}
