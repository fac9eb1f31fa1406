//! Program linking
//!
//! Combines a vertex and a fragment [`ShaderInterface`] the way an OpenGL
//! linker would: stage interfaces must match, locations must not overlap,
//! and uniforms shared by both stages must agree. The result is the
//! [`ProgramInterface`] a backend creates programs from.

use std::collections::BTreeMap;

use super::interface::{BlockMember, GlslType, InterfaceVariable, ShaderInterface, UniformDecl};
use super::{ShaderError, ShaderSource, ShaderStage};
use crate::assets::mesh::format::MAX_ATTRIBUTES;

/// Color outputs a GL 3.3 context is guaranteed to provide
pub const MAX_DRAW_BUFFERS: u32 = 8;

/// Uniform with its assigned location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedUniform {
    /// Uniform name
    pub name: String,
    /// Declared type
    pub ty: GlslType,
    /// Array length, if an array
    pub array_len: Option<u32>,
    /// First location; arrays occupy one location per element
    pub location: u32,
}

impl LinkedUniform {
    /// Number of locations used
    #[must_use]
    pub fn location_count(&self) -> u32 {
        self.array_len.unwrap_or(1)
    }
}

/// Uniform block with its assigned index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedBlock {
    /// Block name
    pub name: String,
    /// Block index, in order of first declaration
    pub index: u32,
    /// Members with std140 offsets
    pub members: Vec<BlockMember>,
    /// Data size in bytes
    pub size: usize,
}

/// Linked interface of a vertex + fragment program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInterface {
    /// Vertex shader name
    pub vertex_shader: String,
    /// Fragment shader name
    pub fragment_shader: String,
    /// Vertex inputs; every location is resolved
    pub attributes: Vec<InterfaceVariable>,
    /// Values passed from the vertex to the fragment stage
    pub varyings: Vec<InterfaceVariable>,
    /// Fragment outputs; every location is resolved
    pub outputs: Vec<InterfaceVariable>,
    /// Uniforms sorted by name
    pub uniforms: Vec<LinkedUniform>,
    /// Uniform blocks in index order
    pub blocks: Vec<LinkedBlock>,
}

impl ProgramInterface {
    /// Reflect and link two sources
    ///
    /// # Errors
    /// Any reflection error of either source, or a link error.
    pub fn from_sources(vertex: &ShaderSource, fragment: &ShaderSource) -> Result<Self, ShaderError> {
        Self::link(&vertex.reflect()?, &fragment.reflect()?)
    }

    /// Link a vertex and a fragment interface
    ///
    /// # Errors
    /// * [`ShaderError::StageMismatch`] if the stages are not vertex then fragment
    /// * [`ShaderError::InterfaceMismatch`] if a fragment input has no matching vertex output
    /// * [`ShaderError::DuplicateLocation`] if attribute or output locations overlap
    /// * [`ShaderError::UniformConflict`] if the stages disagree on a uniform or block
    pub fn link(vertex: &ShaderInterface, fragment: &ShaderInterface) -> Result<Self, ShaderError> {
        expect_stage(vertex, ShaderStage::Vertex)?;
        expect_stage(fragment, ShaderStage::Fragment)?;

        for input in &fragment.inputs {
            check_varying(input, vertex)?;
        }

        let blocks = link_blocks(vertex, fragment)?;
        let uniforms = link_uniforms(vertex, fragment)?;

        let program = Self {
            vertex_shader: vertex.shader.clone(),
            fragment_shader: fragment.shader.clone(),
            attributes: assign_locations(&vertex.inputs, MAX_ATTRIBUTES)?,
            varyings: fragment.inputs.clone(),
            outputs: assign_locations(&fragment.outputs, MAX_DRAW_BUFFERS)?,
            uniforms,
            blocks,
        };
        log::debug!(
            "Linked {} + {}: {} attributes, {} uniforms, {} blocks",
            program.vertex_shader,
            program.fragment_shader,
            program.attributes.len(),
            program.uniforms.len(),
            program.blocks.len()
        );
        Ok(program)
    }

    /// Uniform by name
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&LinkedUniform> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    /// Uniform owning a location, including array element locations
    #[must_use]
    pub fn uniform_at(&self, location: u32) -> Option<&LinkedUniform> {
        self.uniforms
            .iter()
            .find(|u| (u.location..u.location + u.location_count()).contains(&location))
    }

    /// Uniform block by name
    #[must_use]
    pub fn block(&self, name: &str) -> Option<&LinkedBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Vertex attribute by name
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&InterfaceVariable> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Vertex attribute bound to a location
    #[must_use]
    pub fn attribute_at(&self, location: u32) -> Option<&InterfaceVariable> {
        self.attributes.iter().find(|a| a.location == Some(location))
    }
}

fn expect_stage(interface: &ShaderInterface, expected: ShaderStage) -> Result<(), ShaderError> {
    if interface.stage == expected {
        Ok(())
    } else {
        Err(ShaderError::StageMismatch {
            shader: interface.shader.clone(),
            expected,
            found: interface.stage,
        })
    }
}

fn check_varying(input: &InterfaceVariable, vertex: &ShaderInterface) -> Result<(), ShaderError> {
    let mismatch = |message: String| ShaderError::InterfaceMismatch {
        variable: input.name.clone(),
        message,
    };

    let output = vertex
        .output(&input.name)
        .ok_or_else(|| mismatch(format!("{} declares no matching output", vertex.shader)))?;
    if output.ty != input.ty || output.array_len != input.array_len {
        return Err(mismatch(format!(
            "vertex output is {}{}, fragment input is {}{}",
            output.ty,
            array_suffix(output.array_len),
            input.ty,
            array_suffix(input.array_len)
        )));
    }
    if output.interpolation.unwrap_or_default() != input.interpolation.unwrap_or_default() {
        return Err(mismatch("interpolation qualifiers differ".to_string()));
    }
    Ok(())
}

fn array_suffix(array_len: Option<u32>) -> String {
    array_len.map_or_else(String::new, |len| format!("[{len}]"))
}

fn slots(variable: &InterfaceVariable) -> u32 {
    variable.ty.location_slots() * variable.array_len.unwrap_or(1)
}

/// Location range `start..end` of a variable, checked against `limit`
fn location_range(variable: &InterfaceVariable, start: u32, limit: u32) -> Result<std::ops::Range<u32>, ShaderError> {
    let count = slots(variable);
    match start.checked_add(count) {
        Some(end) if end <= limit => Ok(start..end),
        _ => Err(ShaderError::LocationOutOfRange {
            variable: variable.name.clone(),
            location: start,
            slots: count,
            limit,
        }),
    }
}

/// Resolve locations: explicit ones first, then the lowest free range for
/// each remaining variable in declaration order
fn assign_locations(variables: &[InterfaceVariable], limit: u32) -> Result<Vec<InterfaceVariable>, ShaderError> {
    let mut used: BTreeMap<u32, String> = BTreeMap::new();

    for variable in variables {
        if let Some(start) = variable.location {
            for location in location_range(variable, start, limit)? {
                if let Some(first) = used.insert(location, variable.name.clone()) {
                    return Err(ShaderError::DuplicateLocation {
                        location,
                        first,
                        second: variable.name.clone(),
                    });
                }
            }
        }
    }

    let mut resolved = Vec::with_capacity(variables.len());
    for variable in variables {
        let mut variable = variable.clone();
        if variable.location.is_none() {
            let count = slots(&variable);
            let start = (0..limit)
                .find(|&start| (start..start.saturating_add(count)).all(|l| !used.contains_key(&l)))
                .unwrap_or(limit);
            for location in location_range(&variable, start, limit)? {
                used.insert(location, variable.name.clone());
            }
            variable.location = Some(start);
        }
        resolved.push(variable);
    }
    Ok(resolved)
}

fn link_blocks(vertex: &ShaderInterface, fragment: &ShaderInterface) -> Result<Vec<LinkedBlock>, ShaderError> {
    let mut blocks: Vec<LinkedBlock> = Vec::new();

    for block in vertex.blocks.iter().chain(&fragment.blocks) {
        if let Some(existing) = blocks.iter().find(|b| b.name == block.name) {
            let same = existing.members.len() == block.members.len()
                && existing
                    .members
                    .iter()
                    .zip(&block.members)
                    .all(|(a, b)| a.name == b.name && a.ty == b.ty && a.array_len == b.array_len);
            if !same {
                return Err(ShaderError::UniformConflict {
                    name: block.name.clone(),
                    message: "uniform block members differ".to_string(),
                });
            }
            continue;
        }
        blocks.push(LinkedBlock {
            name: block.name.clone(),
            index: blocks.len() as u32,
            members: block.members.clone(),
            size: block.size,
        });
    }
    Ok(blocks)
}

fn link_uniforms(vertex: &ShaderInterface, fragment: &ShaderInterface) -> Result<Vec<LinkedUniform>, ShaderError> {
    let mut merged: BTreeMap<&str, &UniformDecl> = BTreeMap::new();

    for uniform in vertex.uniforms.iter().chain(&fragment.uniforms) {
        if let Some(existing) = merged.get(uniform.name.as_str()) {
            if existing.ty != uniform.ty || existing.array_len != uniform.array_len {
                return Err(ShaderError::UniformConflict {
                    name: uniform.name.clone(),
                    message: format!(
                        "{}{} in one stage, {}{} in the other",
                        existing.ty,
                        array_suffix(existing.array_len),
                        uniform.ty,
                        array_suffix(uniform.array_len)
                    ),
                });
            }
            continue;
        }
        merged.insert(&uniform.name, uniform);
    }

    // Members of anonymous blocks share the global namespace with uniforms
    let anonymous_members = vertex
        .blocks
        .iter()
        .chain(&fragment.blocks)
        .filter(|b| b.instance_name.is_none())
        .flat_map(|b| b.members.iter().map(move |m| (b.name.as_str(), m.name.as_str())));
    for (block, member) in anonymous_members {
        if merged.contains_key(member) {
            return Err(ShaderError::UniformConflict {
                name: member.to_string(),
                message: format!("also declared as a member of uniform block '{block}'"),
            });
        }
    }

    let mut location = 0;
    Ok(merged
        .into_values()
        .map(|uniform| {
            let linked = LinkedUniform {
                name: uniform.name.clone(),
                ty: uniform.ty,
                array_len: uniform.array_len,
                location,
            };
            location += linked.location_count();
            linked
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shader::Interpolation;

    fn interface(name: &str, text: &str) -> ShaderInterface {
        ShaderSource::new(name, text).unwrap().reflect().unwrap()
    }

    const VERT: &str = "#version 330\n\
        layout(location = 0) in vec4 position;\n\
        layout(location = 1) in vec4 color;\n\
        smooth out vec4 theColor;\n\
        uniform mat4 perspectiveMatrix;\n\
        uniform vec3 offset;\n\
        uniform float time;\n";

    const FRAG: &str = "#version 330\n\
        smooth in vec4 theColor;\n\
        out vec4 outputColor;\n\
        uniform float time;\n\
        uniform vec4 baseColor;\n";

    #[test]
    fn test_link_assigns_sorted_uniform_locations() {
        let program = ProgramInterface::link(&interface("a.vert", VERT), &interface("a.frag", FRAG)).unwrap();

        let names: Vec<(&str, u32)> = program.uniforms.iter().map(|u| (u.name.as_str(), u.location)).collect();
        assert_eq!(
            names,
            vec![("baseColor", 0), ("offset", 1), ("perspectiveMatrix", 2), ("time", 3)]
        );
        assert_eq!(program.uniform_at(2).unwrap().ty, GlslType::Mat4);
        assert_eq!(program.attribute("color").unwrap().location, Some(1));
        assert_eq!(program.outputs[0].location, Some(0));
        assert_eq!(program.varyings[0].interpolation, Some(Interpolation::Smooth));
    }

    #[test]
    fn test_stage_order_is_checked() {
        let vert = interface("a.vert", VERT);
        let frag = interface("a.frag", FRAG);
        assert!(matches!(
            ProgramInterface::link(&frag, &vert),
            Err(ShaderError::StageMismatch { expected: ShaderStage::Vertex, .. })
        ));
    }

    #[test]
    fn test_missing_or_mistyped_varying() {
        let vert = interface("a.vert", "#version 330\nout vec3 theColor;\n");
        let frag = interface("a.frag", FRAG);
        assert!(matches!(
            ProgramInterface::link(&vert, &frag),
            Err(ShaderError::InterfaceMismatch { variable, .. }) if variable == "theColor"
        ));

        let vert = interface("a.vert", "#version 330\nout vec4 somethingElse;\n");
        assert!(ProgramInterface::link(&vert, &frag).is_err());

        let vert = interface("a.vert", "#version 330\nflat out vec4 theColor;\n");
        assert!(ProgramInterface::link(&vert, &frag).is_err());
    }

    #[test]
    fn test_duplicate_attribute_location() {
        let vert = interface(
            "a.vert",
            "#version 330\nlayout(location = 0) in vec4 a;\nlayout(location = 0) in vec4 b;\n",
        );
        let frag = interface("a.frag", "#version 330\nout vec4 c;\n");
        assert!(matches!(
            ProgramInterface::link(&vert, &frag),
            Err(ShaderError::DuplicateLocation { location: 0, .. })
        ));

        // A mat4 at location 0 covers locations 0..4
        let vert = interface(
            "a.vert",
            "#version 330\nlayout(location = 0) in mat4 m;\nlayout(location = 3) in vec4 b;\n",
        );
        assert!(matches!(
            ProgramInterface::link(&vert, &frag),
            Err(ShaderError::DuplicateLocation { location: 3, .. })
        ));
    }

    #[test]
    fn test_attribute_locations_stay_below_limit() {
        let frag = interface("a.frag", "#version 330\nout vec4 c;\n");

        let vert = interface("a.vert", "#version 330\nlayout(location = 12) in mat4 m;\n");
        let program = ProgramInterface::link(&vert, &frag).unwrap();
        assert_eq!(program.attribute("m").unwrap().location, Some(12));

        let vert = interface("a.vert", "#version 330\nlayout(location = 15) in mat4 m;\n");
        assert!(matches!(
            ProgramInterface::link(&vert, &frag),
            Err(ShaderError::LocationOutOfRange { location: 15, slots: 4, limit: 16, .. })
        ));

        let vert = interface("a.vert", "#version 330\nlayout(location = 4294967295) in mat4 m;\n");
        assert!(matches!(
            ProgramInterface::link(&vert, &frag),
            Err(ShaderError::LocationOutOfRange { location: u32::MAX, .. })
        ));
    }

    #[test]
    fn test_implicit_locations_run_out() {
        let frag = interface("a.frag", "#version 330\nout vec4 c;\n");
        let vert = interface(
            "a.vert",
            "#version 330\nin mat4 a;\nin mat4 b;\nin mat4 c;\nin mat4 d;\nin vec4 e;\n",
        );
        assert!(matches!(
            ProgramInterface::link(&vert, &frag),
            Err(ShaderError::LocationOutOfRange { variable, limit: 16, .. }) if variable == "e"
        ));
    }

    #[test]
    fn test_implicit_locations_fill_gaps() {
        let vert = interface(
            "a.vert",
            "#version 330\nin vec4 first;\nlayout(location = 0) in vec4 fixed;\nin mat2 second;\n",
        );
        let frag = interface("a.frag", "#version 330\nout vec4 c;\n");
        let program = ProgramInterface::link(&vert, &frag).unwrap();
        assert_eq!(program.attribute("fixed").unwrap().location, Some(0));
        assert_eq!(program.attribute("first").unwrap().location, Some(1));
        assert_eq!(program.attribute("second").unwrap().location, Some(2));
        assert_eq!(program.attribute_at(2).unwrap().name, "second");
    }

    #[test]
    fn test_uniform_type_conflict() {
        let vert = interface("a.vert", "#version 330\nuniform vec4 time;\nout vec4 theColor;\n");
        let frag = interface("a.frag", FRAG);
        assert!(matches!(
            ProgramInterface::link(&vert, &frag),
            Err(ShaderError::UniformConflict { name, .. }) if name == "time"
        ));
    }

    #[test]
    fn test_blocks_are_shared_and_compared() {
        let block = "layout(std140) uniform GlobalMatrices { mat4 cameraToClip; mat4 worldToCamera; };\n";
        let vert = interface("a.vert", &format!("#version 330\n{block}"));
        let frag = interface("a.frag", &format!("#version 330\n{block}out vec4 c;\n"));
        let program = ProgramInterface::link(&vert, &frag).unwrap();
        assert_eq!(program.blocks.len(), 1);
        assert_eq!(program.block("GlobalMatrices").unwrap().index, 0);

        let other = interface(
            "a.frag",
            "#version 330\nlayout(std140) uniform GlobalMatrices { mat4 cameraToClip; };\nout vec4 c;\n",
        );
        assert!(matches!(
            ProgramInterface::link(&vert, &other),
            Err(ShaderError::UniformConflict { .. })
        ));

        let clash = interface("a.frag", "#version 330\nuniform mat4 cameraToClip;\nout vec4 c;\n");
        assert!(matches!(
            ProgramInterface::link(&vert, &clash),
            Err(ShaderError::UniformConflict { name, .. }) if name == "cameraToClip"
        ));
    }

    #[test]
    fn test_array_uniform_locations() {
        let vert = interface("a.vert", "#version 330\nuniform vec4 a[3];\nuniform float b;\n");
        let frag = interface("a.frag", "#version 330\nout vec4 c;\n");
        let program = ProgramInterface::link(&vert, &frag).unwrap();
        assert_eq!(program.uniform("b").unwrap().location, 3);
        assert_eq!(program.uniform_at(2).unwrap().name, "a");
    }
}
