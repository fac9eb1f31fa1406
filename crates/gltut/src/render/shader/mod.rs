//! # GLSL Shader Sources and Interfaces
//!
//! The tutorial shaders are plain GLSL 330 text. This module keeps them in a
//! [`ShaderLibrary`], reflects the declarations a host needs to know about
//! (vertex inputs, stage outputs, uniforms and `std140` uniform blocks) and
//! links a vertex/fragment pair into a [`ProgramInterface`] with the same
//! checks an OpenGL linker performs on interfaces.
//!
//! Compiling the function bodies is the driver's job; reflection only looks
//! at global declarations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let library = ShaderLibrary::builtin();
//! let program = library.link("pos_color_world_transform_ubo.vert", "base_vertex_color.frag")?;
//! let block = program.block("GlobalMatrices").unwrap();
//! assert_eq!(block.size, 128);
//! ```

pub mod interface;
pub mod library;
pub mod linker;

pub use interface::{
    BlockLayout, BlockMember, GlslType, InterfaceVariable, Interpolation, ScalarKind, ShaderInterface,
    UniformBlock, UniformDecl,
};
pub use library::{ShaderLibrary, BUILTIN_PROGRAMS};
pub use linker::{LinkedBlock, LinkedUniform, ProgramInterface};

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Pipeline stage of a shader source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader (`.vert`)
    Vertex,
    /// Fragment shader (`.frag`)
    Fragment,
}

impl ShaderStage {
    /// Stage for a file extension, without the dot
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "vert" => Some(Self::Vertex),
            "frag" => Some(Self::Fragment),
            _ => None,
        }
    }

    /// Stage for a file name or path
    ///
    /// # Errors
    /// Returns [`ShaderError::UnknownStage`] when the extension is neither
    /// `.vert` nor `.frag`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| ShaderError::UnknownStage(path.display().to_string()))
    }

    /// File extension for the stage
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Vertex => "vert",
            Self::Fragment => "frag",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// GLSL source text with its name and stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    /// File name, e.g. `base_color.frag`
    pub name: String,
    /// Pipeline stage
    pub stage: ShaderStage,
    /// GLSL text
    pub source: String,
}

impl ShaderSource {
    /// Create a source, taking the stage from the name's extension
    ///
    /// # Errors
    /// Returns [`ShaderError::UnknownStage`] for names without a shader extension.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self, ShaderError> {
        let name = name.into();
        let stage = ShaderStage::from_path(&name)?;
        Ok(Self {
            name,
            stage,
            source: source.into(),
        })
    }

    /// Read a source file
    ///
    /// # Errors
    /// Returns [`ShaderError::Io`] if the file cannot be read, or
    /// [`ShaderError::UnknownStage`] for unknown extensions.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let stage = ShaderStage::from_path(path)?;
        let source = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { name, stage, source })
    }

    /// Reflect the global declarations of this source
    ///
    /// # Errors
    /// See [`ShaderInterface::reflect`].
    pub fn reflect(&self) -> Result<ShaderInterface, ShaderError> {
        ShaderInterface::reflect(self)
    }
}

/// Shader reflection and linking errors
#[derive(Error, Debug)]
pub enum ShaderError {
    /// Source file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `#version` directive missing or not 330
    #[error("{shader}: unsupported GLSL version '{version}', expected 330")]
    UnsupportedVersion {
        /// Shader name
        shader: String,
        /// Version text found
        version: String,
    },

    /// Declaration reflection cannot handle
    #[error("{shader}:{line}: {message}")]
    Syntax {
        /// Shader name
        shader: String,
        /// 1-based line
        line: usize,
        /// What went wrong
        message: String,
    },

    /// File name without a `.vert` or `.frag` extension
    #[error("cannot tell the shader stage of '{0}'")]
    UnknownStage(String),

    /// Wrong stage passed to the linker
    #[error("{shader} is a {found} shader, expected a {expected} shader")]
    StageMismatch {
        /// Shader name
        shader: String,
        /// Stage the linker needed
        expected: ShaderStage,
        /// Stage of the source
        found: ShaderStage,
    },

    /// Fragment input without a matching vertex output
    #[error("interface mismatch for '{variable}': {message}")]
    InterfaceMismatch {
        /// Variable name
        variable: String,
        /// What differs
        message: String,
    },

    /// Two variables claim the same location
    #[error("location {location} is used by both '{first}' and '{second}'")]
    DuplicateLocation {
        /// Location number
        location: u32,
        /// First variable
        first: String,
        /// Second variable
        second: String,
    },

    /// Location range past the end of the available slots
    #[error("'{variable}' at location {location} needs {slots} slots, only {limit} are available")]
    LocationOutOfRange {
        /// Variable name
        variable: String,
        /// First location
        location: u32,
        /// Locations the variable occupies
        slots: u32,
        /// Number of locations the stage provides
        limit: u32,
    },

    /// Uniform or block declared differently in the two stages
    #[error("uniform '{name}' conflicts between stages: {message}")]
    UniformConflict {
        /// Uniform or block name
        name: String,
        /// What differs
        message: String,
    },

    /// Shader name not in the library
    #[error("shader '{0}' not found")]
    MissingShader(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_from_path() {
        assert_eq!(ShaderStage::from_path("shaders/a.vert").unwrap(), ShaderStage::Vertex);
        assert_eq!(ShaderStage::from_path("b.frag").unwrap(), ShaderStage::Fragment);
        assert!(matches!(ShaderStage::from_path("c.glsl"), Err(ShaderError::UnknownStage(_))));
    }

    #[test]
    fn test_source_takes_stage_from_name() {
        let source = ShaderSource::new("x.frag", "#version 330\n").unwrap();
        assert_eq!(source.stage, ShaderStage::Fragment);
        assert!(ShaderSource::new("x.txt", "").is_err());
    }
}
