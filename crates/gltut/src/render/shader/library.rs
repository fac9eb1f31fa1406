//! Built-in shader sources and directory overrides

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info};

use super::{ProgramInterface, ShaderError, ShaderSource, ShaderStage};

macro_rules! builtin {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../../../resources/shaders/", $name)))),*]
    };
}

/// Shader files compiled into the crate
const BUILTIN_SOURCES: &[(&str, &str)] = builtin![
    "vertex_colors.vert",
    "vertex_colors.frag",
    "calc_offset.vert",
    "calc_color.frag",
    "manual_perspective.vert",
    "matrix_perspective.vert",
    "standard.vert",
    "pos_color_model_to_camera.vert",
    "pos_color_local_transform.vert",
    "color_mult_uniform.frag",
    "pos_only_world_transform_ubo.vert",
    "pos_color_world_transform_ubo.vert",
    "pos_only_world_transform.vert",
    "pos_color_world_transform.vert",
    "base_color.frag",
    "passthrough_color.frag",
    "base_vertex_color.frag",
];

/// Vertex/fragment pairs the tutorials link
pub const BUILTIN_PROGRAMS: &[(&str, &str)] = &[
    ("vertex_colors.vert", "vertex_colors.frag"),
    ("calc_offset.vert", "calc_color.frag"),
    ("manual_perspective.vert", "vertex_colors.frag"),
    ("matrix_perspective.vert", "vertex_colors.frag"),
    ("standard.vert", "vertex_colors.frag"),
    ("pos_color_model_to_camera.vert", "vertex_colors.frag"),
    ("pos_color_local_transform.vert", "color_mult_uniform.frag"),
    ("pos_only_world_transform_ubo.vert", "base_color.frag"),
    ("pos_color_world_transform_ubo.vert", "passthrough_color.frag"),
    ("pos_color_world_transform_ubo.vert", "base_vertex_color.frag"),
    ("pos_only_world_transform.vert", "base_color.frag"),
    ("pos_color_world_transform.vert", "passthrough_color.frag"),
    ("pos_color_world_transform.vert", "base_vertex_color.frag"),
];

/// Named collection of shader sources
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    sources: BTreeMap<String, ShaderSource>,
}

impl ShaderLibrary {
    /// Empty library
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Library holding every built-in shader
    #[must_use]
    pub fn builtin() -> Self {
        let mut library = Self::new();
        for (name, text) in BUILTIN_SOURCES {
            let stage = if name.ends_with(".vert") {
                ShaderStage::Vertex
            } else {
                ShaderStage::Fragment
            };
            library.insert(ShaderSource {
                name: (*name).to_string(),
                stage,
                source: (*text).to_string(),
            });
        }
        library
    }

    /// Add or replace a source
    pub fn insert(&mut self, source: ShaderSource) -> Option<ShaderSource> {
        self.sources.insert(source.name.clone(), source)
    }

    /// Load every `.vert` and `.frag` file in `dir`, replacing sources with
    /// the same file name
    ///
    /// # Returns
    /// Number of files loaded
    ///
    /// # Errors
    /// Returns [`ShaderError::Io`] if the directory or a file cannot be read.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, ShaderError> {
        let dir = dir.as_ref();
        let mut loaded = 0;

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| ShaderStage::from_path(path).is_ok())
            .collect();
        paths.sort();

        for path in paths {
            let source = ShaderSource::from_file(&path)?;
            if self.insert(source).is_some() {
                debug!("Shader {} overrides the built-in source", path.display());
            }
            loaded += 1;
        }
        info!("Loaded {loaded} shaders from {}", dir.display());
        Ok(loaded)
    }

    /// Source by file name
    ///
    /// # Errors
    /// Returns [`ShaderError::MissingShader`] for unknown names.
    pub fn get(&self, name: &str) -> Result<&ShaderSource, ShaderError> {
        self.sources
            .get(name)
            .ok_or_else(|| ShaderError::MissingShader(name.to_string()))
    }

    /// Whether a source is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Source names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Number of sources
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the library is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Reflect and link two sources from the library
    ///
    /// # Errors
    /// [`ShaderError::MissingShader`] for unknown names, or any reflection or
    /// link error.
    pub fn link(&self, vertex: &str, fragment: &str) -> Result<ProgramInterface, ShaderError> {
        ProgramInterface::from_sources(self.get(vertex)?, self.get(fragment)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sources_reflect() {
        let library = ShaderLibrary::builtin();
        assert_eq!(library.len(), BUILTIN_SOURCES.len());
        for name in library.names() {
            let source = library.get(name).unwrap();
            assert!(source.reflect().is_ok(), "{name} failed to reflect");
        }
    }

    #[test]
    fn test_builtin_programs_link() {
        let library = ShaderLibrary::builtin();
        for (vertex, fragment) in BUILTIN_PROGRAMS {
            let result = library.link(vertex, fragment);
            assert!(result.is_ok(), "{vertex} + {fragment}: {:?}", result.err());
        }
    }

    #[test]
    fn test_missing_shader() {
        let library = ShaderLibrary::builtin();
        assert!(matches!(library.get("nope.vert"), Err(ShaderError::MissingShader(_))));
    }

    #[test]
    fn test_load_dir_overrides_builtin() {
        let dir = std::env::temp_dir().join(format!("gltut-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("base_color.frag"), "#version 330\nout vec4 outputColor;\n").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let mut library = ShaderLibrary::builtin();
        let loaded = library.load_dir(&dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded, 1);
        let interface = library.get("base_color.frag").unwrap().reflect().unwrap();
        assert!(interface.uniforms.is_empty());
    }

    #[test]
    fn test_world_program_has_global_matrices() {
        let program = ShaderLibrary::builtin()
            .link("pos_color_world_transform_ubo.vert", "base_vertex_color.frag")
            .unwrap();
        let block = program.block("GlobalMatrices").unwrap();
        assert_eq!(block.size, 128);
        assert!(program.uniform("modelToWorld").is_some());
        assert!(program.uniform("baseColor").is_some());
        assert!(program.uniform("cameraToClip").is_none());
    }
}
