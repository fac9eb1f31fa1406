//! Asset loading
//!
//! [`Resources`] is what a scene sees while initializing: the shader library
//! (built-in sources, optionally overridden from a directory), mesh documents
//! loaded from the mesh directory and the projection settings.

pub mod mesh;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::{ProjectionConfig, ResourceConfig, TutorialConfig};
use crate::render::shader::{ShaderError, ShaderLibrary};
use crate::render::{Mesh, Program, RenderBackend, RenderError};
use mesh::generator::MeshKind;
use mesh::{MeshData, MeshError};

/// Asset loading errors
#[derive(Debug, Error)]
pub enum AssetError {
    /// A mesh document failed to load
    #[error("Mesh '{name}': {source}")]
    Mesh {
        /// Mesh file name
        name: String,
        /// Underlying error
        source: MeshError,
    },

    /// The shader directory could not be loaded
    #[error("Shader error: {0}")]
    Shader(#[from] ShaderError),

    /// Uploading an asset failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// No file and no generator for this mesh
    #[error("Mesh '{0}' not found")]
    NotFound(String),
}

/// Shaders, meshes and projection settings available to scenes
#[derive(Debug, Clone)]
pub struct Resources {
    shaders: ShaderLibrary,
    mesh_dir: PathBuf,
    projection: ProjectionConfig,
    meshes: HashMap<String, MeshData>,
}

impl Default for Resources {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Resources {
    /// Built-in shaders and the default mesh directory
    #[must_use]
    pub fn builtin() -> Self {
        let resources = ResourceConfig::default();
        Self {
            shaders: ShaderLibrary::builtin(),
            mesh_dir: resources.mesh_dir,
            projection: ProjectionConfig::default(),
            meshes: HashMap::new(),
        }
    }

    /// Resources described by a configuration
    ///
    /// # Errors
    /// [`AssetError::Shader`] if the configured shader directory cannot be read.
    pub fn from_config(config: &TutorialConfig) -> Result<Self, AssetError> {
        let mut shaders = ShaderLibrary::builtin();
        if let Some(dir) = &config.resources.shader_dir {
            let count = shaders.load_dir(dir)?;
            log::info!("Loaded {count} shader overrides from {}", dir.display());
        }
        Ok(Self {
            shaders,
            mesh_dir: config.resources.mesh_dir.clone(),
            projection: config.projection.clone(),
            meshes: HashMap::new(),
        })
    }

    /// Use another mesh directory
    #[must_use]
    pub fn with_mesh_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mesh_dir = dir.into();
        self.meshes.clear();
        self
    }

    /// Shader library
    #[must_use]
    pub const fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    /// Directory mesh documents are read from
    #[must_use]
    pub fn mesh_dir(&self) -> &Path {
        &self.mesh_dir
    }

    /// Projection settings
    #[must_use]
    pub const fn projection(&self) -> &ProjectionConfig {
        &self.projection
    }

    /// Link two library shaders and create the program
    ///
    /// # Errors
    /// [`RenderError::Shader`] for a missing or incompatible source.
    pub fn program(&self, backend: &mut dyn RenderBackend, vertex: &str, fragment: &str) -> Result<Program, RenderError> {
        Program::load(backend, &self.shaders, vertex, fragment)
    }

    /// Mesh document by file name, cached after the first load
    ///
    /// Files in the mesh directory win. A missing file whose stem names a
    /// [`MeshKind`] is generated instead.
    ///
    /// # Errors
    /// [`AssetError::Mesh`] for an invalid document, [`AssetError::NotFound`]
    /// when there is neither a file nor a generator.
    pub fn mesh_data(&mut self, file_name: &str) -> Result<&MeshData, AssetError> {
        if !self.meshes.contains_key(file_name) {
            let data = self.read_mesh(file_name)?;
            self.meshes.insert(file_name.to_string(), data);
        }
        self.meshes
            .get(file_name)
            .ok_or_else(|| AssetError::NotFound(file_name.to_string()))
    }

    /// Load a mesh document and upload it
    ///
    /// # Errors
    /// See [`mesh_data`](Self::mesh_data); upload failures are [`AssetError::Render`].
    pub fn load_mesh(&mut self, backend: &mut dyn RenderBackend, file_name: &str) -> Result<Mesh, AssetError> {
        let data = self.mesh_data(file_name)?;
        Ok(Mesh::upload(data, backend)?)
    }

    fn read_mesh(&self, file_name: &str) -> Result<MeshData, AssetError> {
        let path = self.mesh_dir.join(file_name);
        if path.is_file() {
            log::debug!("Loading mesh {}", path.display());
            return MeshData::load(&path).map_err(|source| AssetError::Mesh {
                name: file_name.to_string(),
                source,
            });
        }

        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        let kind = MeshKind::from_name(stem).ok_or_else(|| AssetError::NotFound(file_name.to_string()))?;
        log::info!("{} not found, generating {}", path.display(), kind.name());
        Ok(kind.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gltut-assets-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file_falls_back_to_generator() {
        let mut resources = Resources::builtin().with_mesh_dir(temp_dir("fallback"));
        let data = resources.mesh_data("UnitPlane.xml").unwrap();
        assert_eq!(data.vertex_count(), 4);
        assert!(matches!(
            resources.mesh_data("Teapot.xml"),
            Err(AssetError::NotFound(name)) if name == "Teapot.xml"
        ));
    }

    #[test]
    fn test_file_in_mesh_dir_wins() {
        let dir = temp_dir("override");
        let mut plane = MeshKind::UnitPlane.generate();
        plane.attributes[0].size = 2;
        plane.attributes[0].data = mesh::AttributeData::Float(vec![0.0; 8]);
        std::fs::write(dir.join("UnitPlane.xml"), plane.to_xml()).unwrap();

        let mut resources = Resources::builtin().with_mesh_dir(&dir);
        assert_eq!(resources.mesh_data("UnitPlane.xml").unwrap().attributes[0].size, 2);
    }

    #[test]
    fn test_invalid_file_reports_its_name() {
        let dir = temp_dir("invalid");
        std::fs::write(dir.join("Broken.xml"), "<mesh>").unwrap();
        let mut resources = Resources::builtin().with_mesh_dir(&dir);
        let err = resources.mesh_data("Broken.xml").unwrap_err();
        assert!(err.to_string().starts_with("Mesh 'Broken.xml'"));
    }

    #[test]
    fn test_load_mesh_uploads() {
        let mut backend = RecordingBackend::new();
        let mut resources = Resources::builtin().with_mesh_dir(temp_dir("upload"));
        let mesh = resources.load_mesh(&mut backend, "UnitConeTint.xml").unwrap();
        assert!(mesh.index_buffer().is_some());
        assert_eq!(backend.summary().buffers, 2);
    }

    #[test]
    fn test_shader_dir_overrides_builtin() {
        let dir = temp_dir("shaders");
        std::fs::write(
            dir.join("base_color.frag"),
            "#version 330\nuniform vec4 baseColor;\nuniform float fade;\nout vec4 outputColor;\nvoid main() { outputColor = baseColor * fade; }\n",
        )
        .unwrap();
        let config = TutorialConfig::default().with_shader_dir(&dir);
        let resources = Resources::from_config(&config).unwrap();
        let program = resources
            .shaders()
            .link("pos_only_world_transform.vert", "base_color.frag")
            .unwrap();
        assert!(program.uniform("fade").is_some());
    }
}
