//! # Shader Interface Reflection
//!
//! Extracts the global declarations of a GLSL 330 shader: the `#version`
//! directive, `in`/`out` variables with their `layout(location = N)` and
//! interpolation qualifiers, plain `uniform` declarations and `std140`
//! uniform blocks with member offsets.
//!
//! Function bodies and global constants are skipped. Declarations outside the
//! subset the tutorials use (structs, non-uniform interface blocks, `binding`
//! layouts, initializers) are reported as [`ShaderError::Syntax`] with the
//! line they start on, so unsupported shaders fail loudly instead of being
//! half-reflected.

use std::fmt;

use super::{ShaderError, ShaderSource, ShaderStage};

/// The only GLSL version the tutorial shaders target
pub const SUPPORTED_VERSION: u32 = 330;

/// Base unit of std140 array strides and matrix columns
const STD140_VEC4: usize = 16;

/// Scalar component kind of a GLSL type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `float`
    Float,
    /// `int`
    Int,
    /// `uint`
    Uint,
    /// `bool`
    Bool,
}

/// GLSL types that may appear in reflected declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum GlslType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Uint,
    UVec2,
    UVec3,
    UVec4,
    Bool,
    BVec2,
    BVec3,
    BVec4,
    Mat2,
    Mat3,
    Mat4,
}

impl GlslType {
    const ALL: [Self; 19] = [
        Self::Float,
        Self::Vec2,
        Self::Vec3,
        Self::Vec4,
        Self::Int,
        Self::IVec2,
        Self::IVec3,
        Self::IVec4,
        Self::Uint,
        Self::UVec2,
        Self::UVec3,
        Self::UVec4,
        Self::Bool,
        Self::BVec2,
        Self::BVec3,
        Self::BVec4,
        Self::Mat2,
        Self::Mat3,
        Self::Mat4,
    ];

    /// GLSL keyword
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Int => "int",
            Self::IVec2 => "ivec2",
            Self::IVec3 => "ivec3",
            Self::IVec4 => "ivec4",
            Self::Uint => "uint",
            Self::UVec2 => "uvec2",
            Self::UVec3 => "uvec3",
            Self::UVec4 => "uvec4",
            Self::Bool => "bool",
            Self::BVec2 => "bvec2",
            Self::BVec3 => "bvec3",
            Self::BVec4 => "bvec4",
            Self::Mat2 => "mat2",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
        }
    }

    /// Parse a GLSL type keyword; `matNxN` aliases are accepted
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mat2x2" => Some(Self::Mat2),
            "mat3x3" => Some(Self::Mat3),
            "mat4x4" => Some(Self::Mat4),
            _ => Self::ALL.into_iter().find(|t| t.name() == name),
        }
    }

    /// Scalar kind of each component
    #[must_use]
    pub const fn scalar(self) -> ScalarKind {
        match self {
            Self::Float | Self::Vec2 | Self::Vec3 | Self::Vec4 | Self::Mat2 | Self::Mat3 | Self::Mat4 => {
                ScalarKind::Float
            }
            Self::Int | Self::IVec2 | Self::IVec3 | Self::IVec4 => ScalarKind::Int,
            Self::Uint | Self::UVec2 | Self::UVec3 | Self::UVec4 => ScalarKind::Uint,
            Self::Bool | Self::BVec2 | Self::BVec3 | Self::BVec4 => ScalarKind::Bool,
        }
    }

    /// Rows of a column (vector length); 1 for scalars
    #[must_use]
    pub const fn rows(self) -> usize {
        match self {
            Self::Float | Self::Int | Self::Uint | Self::Bool => 1,
            Self::Vec2 | Self::IVec2 | Self::UVec2 | Self::BVec2 | Self::Mat2 => 2,
            Self::Vec3 | Self::IVec3 | Self::UVec3 | Self::BVec3 | Self::Mat3 => 3,
            Self::Vec4 | Self::IVec4 | Self::UVec4 | Self::BVec4 | Self::Mat4 => 4,
        }
    }

    /// Matrix columns; 1 for scalars and vectors
    #[must_use]
    pub const fn columns(self) -> usize {
        match self {
            Self::Mat2 => 2,
            Self::Mat3 => 3,
            Self::Mat4 => 4,
            _ => 1,
        }
    }

    /// Whether the type is a matrix
    #[must_use]
    pub const fn is_matrix(self) -> bool {
        self.columns() > 1
    }

    /// Total number of scalar components
    #[must_use]
    pub const fn components(self) -> usize {
        self.rows() * self.columns()
    }

    /// Vertex attribute locations the type occupies
    #[must_use]
    pub const fn location_slots(self) -> u32 {
        self.columns() as u32
    }

    /// std140 base alignment in bytes
    #[must_use]
    pub const fn std140_alignment(self) -> usize {
        if self.is_matrix() {
            return STD140_VEC4;
        }
        match self.rows() {
            1 => 4,
            2 => 8,
            _ => STD140_VEC4,
        }
    }

    /// std140 size in bytes; matrix columns are padded to a vec4
    #[must_use]
    pub const fn std140_size(self) -> usize {
        if self.is_matrix() {
            self.columns() * STD140_VEC4
        } else {
            self.rows() * 4
        }
    }
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interpolation qualifier of a stage interface variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Perspective-correct (the default)
    #[default]
    Smooth,
    /// No interpolation
    Flat,
    /// Screen-space linear
    NoPerspective,
}

impl Interpolation {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "smooth" => Some(Self::Smooth),
            "flat" => Some(Self::Flat),
            "noperspective" => Some(Self::NoPerspective),
            _ => None,
        }
    }
}

/// `in` or `out` variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceVariable {
    /// Variable name
    pub name: String,
    /// Declared type
    pub ty: GlslType,
    /// Array length, if declared as an array
    pub array_len: Option<u32>,
    /// Explicit `layout(location = N)`
    pub location: Option<u32>,
    /// Explicit interpolation qualifier
    pub interpolation: Option<Interpolation>,
}

/// Plain (non-block) uniform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDecl {
    /// Uniform name
    pub name: String,
    /// Declared type
    pub ty: GlslType,
    /// Array length, if declared as an array
    pub array_len: Option<u32>,
}

/// Member of a `std140` uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMember {
    /// Member name
    pub name: String,
    /// Declared type
    pub ty: GlslType,
    /// Array length, if declared as an array
    pub array_len: Option<u32>,
    /// std140 byte offset from the start of the block
    pub offset: usize,
}

/// Memory layout of a uniform block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockLayout {
    /// `layout(std140)`
    Std140,
}

/// Uniform block declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    /// Block name, used by `glGetUniformBlockIndex`
    pub name: String,
    /// Instance name, if the block is not anonymous
    pub instance_name: Option<String>,
    /// Memory layout
    pub layout: BlockLayout,
    /// Members in declaration order
    pub members: Vec<BlockMember>,
    /// Size in bytes, rounded up to a multiple of 16
    pub size: usize,
}

impl UniformBlock {
    /// Member by name
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&BlockMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Reflected global declarations of one shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInterface {
    /// Shader name
    pub shader: String,
    /// Pipeline stage
    pub stage: ShaderStage,
    /// `#version` number
    pub version: u32,
    /// `in` variables in declaration order
    pub inputs: Vec<InterfaceVariable>,
    /// `out` variables in declaration order
    pub outputs: Vec<InterfaceVariable>,
    /// Plain uniforms in declaration order
    pub uniforms: Vec<UniformDecl>,
    /// Uniform blocks in declaration order
    pub blocks: Vec<UniformBlock>,
}

impl ShaderInterface {
    /// Input by name
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&InterfaceVariable> {
        self.inputs.iter().find(|v| v.name == name)
    }

    /// Output by name
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&InterfaceVariable> {
        self.outputs.iter().find(|v| v.name == name)
    }

    /// Plain uniform by name
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&UniformDecl> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    /// Uniform block by name
    #[must_use]
    pub fn block(&self, name: &str) -> Option<&UniformBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Reflect the global declarations of a shader
    ///
    /// # Errors
    /// Returns [`ShaderError::UnsupportedVersion`] when the first directive
    /// is not `#version 330`, and [`ShaderError::Syntax`] for declarations
    /// outside the supported subset.
    pub fn reflect(source: &ShaderSource) -> Result<Self, ShaderError> {
        let mut reflector = Reflector {
            shader: &source.name,
            interface: Self {
                shader: source.name.clone(),
                stage: source.stage,
                version: 0,
                inputs: Vec::new(),
                outputs: Vec::new(),
                uniforms: Vec::new(),
                blocks: Vec::new(),
            },
        };

        let text = strip_comments(&source.source).map_err(|line| reflector.syntax(line, "unterminated block comment"))?;
        let (version, body) = reflector.version(&text)?;
        reflector.interface.version = version;

        for statement in split_statements(&body).map_err(|(line, message)| reflector.syntax(line, message))? {
            reflector.declaration(&statement)?;
        }

        log::trace!(
            "Reflected {}: {} inputs, {} outputs, {} uniforms, {} blocks",
            source.name,
            reflector.interface.inputs.len(),
            reflector.interface.outputs.len(),
            reflector.interface.uniforms.len(),
            reflector.interface.blocks.len()
        );
        Ok(reflector.interface)
    }
}

/// Round `offset` up to a multiple of `alignment`
const fn align(offset: usize, alignment: usize) -> usize {
    offset.div_ceil(alignment) * alignment
}

/// Assign std140 offsets to `members` and return the block size
///
/// Arrays and matrices use a 16-byte element stride; the block size is
/// rounded up to 16 bytes.
pub fn std140_layout(members: &mut [BlockMember]) -> usize {
    let mut offset = 0;
    for member in members.iter_mut() {
        let (alignment, size) = match member.array_len {
            Some(len) => {
                let stride = align(member.ty.std140_size(), STD140_VEC4);
                (STD140_VEC4, stride * len as usize)
            }
            None => (member.ty.std140_alignment(), member.ty.std140_size()),
        };
        offset = align(offset, alignment);
        member.offset = offset;
        offset += size;
    }
    align(offset, STD140_VEC4)
}

/// Replace comments with spaces, keeping newlines so line numbers survive.
/// On an unterminated block comment, returns the line it starts on.
fn strip_comments(source: &str) -> Result<String, usize> {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        line += 1;
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                let start = line;
                chars.next();
                let mut previous = ' ';
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        line += 1;
                    }
                    if previous == '*' && c == '/' {
                        closed = true;
                        break;
                    }
                    previous = c;
                }
                if !closed {
                    return Err(start);
                }
                out.push(' ');
            }
            _ => {
                if c == '\n' {
                    line += 1;
                }
                out.push(c);
            }
        }
    }
    Ok(out)
}

/// A global-scope statement
#[derive(Debug)]
struct Statement {
    /// Text before the `{` or `;`
    head: String,
    /// Block body for `uniform Name { ... }` declarations
    body: Option<String>,
    /// Text between `}` and `;` of a block
    tail: String,
    /// Line of the first character of the statement
    line: usize,
    /// Line the block body starts on
    body_line: usize,
}

/// Split source into global statements, skipping function definitions and
/// preprocessor lines
fn split_statements(text: &str) -> Result<Vec<Statement>, (usize, &'static str)> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut start_line = 0;
    let mut line = 1;
    let mut chars = text.chars();
    let mut at_line_start = true;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
            at_line_start = true;
            current.push(' ');
            continue;
        }
        if at_line_start && c == '#' {
            // Preprocessor directive: skip to end of line
            for c in chars.by_ref() {
                if c == '\n' {
                    line += 1;
                    break;
                }
            }
            continue;
        }
        if !c.is_whitespace() {
            at_line_start = false;
            if current.trim().is_empty() {
                start_line = line;
            }
        }

        match c {
            ';' => {
                if !current.trim().is_empty() {
                    statements.push(Statement {
                        head: std::mem::take(&mut current),
                        body: None,
                        tail: String::new(),
                        line: start_line,
                        body_line: start_line,
                    });
                }
                current.clear();
            }
            '{' => {
                let body_line = line;
                let mut depth = 1;
                let mut body = String::new();
                for c in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' => depth -= 1,
                        '\n' => line += 1,
                        _ => {}
                    }
                    if depth == 0 {
                        break;
                    }
                    body.push(c);
                }
                if depth != 0 {
                    return Err((body_line, "unbalanced braces"));
                }

                if current.trim_end().ends_with(')') {
                    // Function definition
                    current.clear();
                    at_line_start = false;
                    continue;
                }

                let mut tail = String::new();
                let mut terminated = false;
                for c in chars.by_ref() {
                    if c == ';' {
                        terminated = true;
                        break;
                    }
                    if c == '\n' {
                        line += 1;
                    }
                    tail.push(c);
                }
                if !terminated {
                    return Err((start_line, "block declaration is missing ';'"));
                }
                statements.push(Statement {
                    head: std::mem::take(&mut current),
                    body: Some(body),
                    tail,
                    line: start_line,
                    body_line,
                });
            }
            '}' => return Err((line, "unexpected '}'")),
            _ => current.push(c),
        }
    }

    if current.trim().is_empty() {
        Ok(statements)
    } else {
        Err((start_line, "unexpected end of file, expected ';'"))
    }
}

/// Split a declaration into identifier/number words and single-character symbols
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    In,
    Out,
    Uniform,
}

#[derive(Debug, Default)]
struct Qualifiers {
    location: Option<u32>,
    std140: bool,
    interpolation: Option<Interpolation>,
    storage: Option<Storage>,
    has_layout: bool,
}

struct Reflector<'a> {
    shader: &'a str,
    interface: ShaderInterface,
}

impl Reflector<'_> {
    fn syntax(&self, line: usize, message: impl Into<String>) -> ShaderError {
        ShaderError::Syntax {
            shader: self.shader.to_string(),
            line,
            message: message.into(),
        }
    }

    /// Parse the leading `#version` line; returns the version and the rest of
    /// the text with the directive blanked out
    fn version(&self, text: &str) -> Result<(u32, String), ShaderError> {
        let unsupported = |version: &str| ShaderError::UnsupportedVersion {
            shader: self.shader.to_string(),
            version: version.to_string(),
        };

        let Some((index, line)) = text.lines().enumerate().find(|(_, l)| !l.trim().is_empty()) else {
            return Err(unsupported("missing"));
        };
        let mut words = line.split_whitespace();
        if words.next() != Some("#version") {
            return Err(unsupported("missing"));
        }
        let number = words.next().unwrap_or_default();
        match words.next() {
            None | Some("core" | "compatibility") => {}
            Some(profile) => return Err(self.syntax(index + 1, format!("unknown profile '{profile}'"))),
        }
        let version: u32 = number.parse().map_err(|_| unsupported(number))?;
        if version != SUPPORTED_VERSION {
            return Err(unsupported(number));
        }

        let rest = text
            .lines()
            .enumerate()
            .map(|(i, l)| if i == index { "" } else { l })
            .collect::<Vec<_>>()
            .join("\n");
        Ok((version, rest))
    }

    fn declaration(&mut self, statement: &Statement) -> Result<(), ShaderError> {
        let tokens = tokenize(&statement.head);
        let line = statement.line;
        let mut qualifiers = Qualifiers::default();
        let mut pos = 0;

        while let Some(token) = tokens.get(pos) {
            match token.as_str() {
                "layout" => {
                    pos = self.layout(&tokens, pos + 1, line, &mut qualifiers)?;
                    continue;
                }
                "in" => qualifiers.storage = Some(Storage::In),
                "out" => qualifiers.storage = Some(Storage::Out),
                "uniform" => qualifiers.storage = Some(Storage::Uniform),
                "smooth" | "flat" | "noperspective" => qualifiers.interpolation = Interpolation::from_keyword(token),
                "centroid" | "invariant" | "highp" | "mediump" | "lowp" => {}
                "const" | "precision" => return Ok(()),
                "attribute" | "varying" => {
                    return Err(self.syntax(line, format!("'{token}' is not available in GLSL 330 core")))
                }
                "struct" => return Err(self.syntax(line, "struct declarations are not supported")),
                _ => break,
            }
            pos += 1;
        }

        let Some(storage) = qualifiers.storage else {
            // Global variable or function prototype; nothing the host binds
            return Ok(());
        };

        if let Some(body) = &statement.body {
            return self.block(&tokens[pos..], body, &statement.tail, statement, storage, &qualifiers);
        }
        if qualifiers.std140 {
            return Err(self.syntax(line, "std140 applies only to uniform blocks"));
        }

        let type_name = tokens.get(pos).ok_or_else(|| self.syntax(line, "missing type"))?;
        let ty = GlslType::from_name(type_name)
            .ok_or_else(|| self.syntax(line, format!("unsupported type '{type_name}'")))?;
        let declarators = self.declarators(&tokens[pos + 1..], line)?;

        match storage {
            Storage::Uniform => {
                if qualifiers.location.is_some() || qualifiers.interpolation.is_some() {
                    return Err(self.syntax(line, "uniforms take no location or interpolation qualifier"));
                }
                for (name, array_len) in declarators {
                    self.interface.uniforms.push(UniformDecl { name, ty, array_len });
                }
            }
            Storage::In | Storage::Out => {
                if storage == Storage::In && self.interface.stage == ShaderStage::Vertex && qualifiers.interpolation.is_some() {
                    return Err(self.syntax(line, "vertex inputs cannot have interpolation qualifiers"));
                }
                if qualifiers.location.is_some() && declarators.len() > 1 {
                    return Err(self.syntax(line, "a location qualifier needs a single declarator"));
                }
                if ty.scalar() == ScalarKind::Bool {
                    return Err(self.syntax(line, "bool types cannot be stage inputs or outputs"));
                }
                for (name, array_len) in declarators {
                    let variable = InterfaceVariable {
                        name,
                        ty,
                        array_len,
                        location: qualifiers.location,
                        interpolation: qualifiers.interpolation,
                    };
                    if storage == Storage::In {
                        self.interface.inputs.push(variable);
                    } else {
                        self.interface.outputs.push(variable);
                    }
                }
            }
        }
        Ok(())
    }

    /// Parse `( item, item = value, ... )`; returns the position after `)`
    fn layout(
        &self,
        tokens: &[String],
        mut pos: usize,
        line: usize,
        qualifiers: &mut Qualifiers,
    ) -> Result<usize, ShaderError> {
        if tokens.get(pos).map(String::as_str) != Some("(") {
            return Err(self.syntax(line, "expected '(' after layout"));
        }
        qualifiers.has_layout = true;
        pos += 1;

        loop {
            let key = tokens.get(pos).ok_or_else(|| self.syntax(line, "unterminated layout qualifier"))?;
            pos += 1;
            let value = if tokens.get(pos).map(String::as_str) == Some("=") {
                let value = tokens.get(pos + 1).ok_or_else(|| self.syntax(line, "missing layout value"))?;
                pos += 2;
                Some(value.as_str())
            } else {
                None
            };

            match (key.as_str(), value) {
                ("location", Some(value)) => {
                    let location = value
                        .parse()
                        .map_err(|_| self.syntax(line, format!("invalid location '{value}'")))?;
                    qualifiers.location = Some(location);
                }
                ("std140", None) => qualifiers.std140 = true,
                ("row_major" | "column_major", None) => {}
                ("shared" | "packed", None) => {
                    return Err(self.syntax(line, format!("'{key}' blocks have no portable layout, use std140")))
                }
                ("binding", _) => return Err(self.syntax(line, "'binding' layout requires GLSL 420")),
                (other, _) => return Err(self.syntax(line, format!("unsupported layout qualifier '{other}'"))),
            }

            match tokens.get(pos).map(String::as_str) {
                Some(",") => pos += 1,
                Some(")") => return Ok(pos + 1),
                _ => return Err(self.syntax(line, "expected ',' or ')' in layout qualifier")),
            }
        }
    }

    /// Parse `name[N], name, ...`
    fn declarators(&self, tokens: &[String], line: usize) -> Result<Vec<(String, Option<u32>)>, ShaderError> {
        let mut declarators = Vec::new();
        let mut pos = 0;

        loop {
            let name = tokens.get(pos).ok_or_else(|| self.syntax(line, "missing variable name"))?;
            if !is_identifier(name) {
                return Err(self.syntax(line, format!("expected a name, found '{name}'")));
            }
            pos += 1;

            let mut array_len = None;
            if tokens.get(pos).map(String::as_str) == Some("[") {
                let len = tokens
                    .get(pos + 1)
                    .and_then(|t| t.parse::<u32>().ok())
                    .filter(|&len| len > 0)
                    .ok_or_else(|| self.syntax(line, "array length must be a positive integer literal"))?;
                if tokens.get(pos + 2).map(String::as_str) != Some("]") {
                    return Err(self.syntax(line, "expected ']'"));
                }
                array_len = Some(len);
                pos += 3;
            }
            declarators.push((name.clone(), array_len));

            match tokens.get(pos).map(String::as_str) {
                None => return Ok(declarators),
                Some(",") => pos += 1,
                Some("=") => return Err(self.syntax(line, "initializers are not supported")),
                Some(other) => return Err(self.syntax(line, format!("unexpected '{other}'"))),
            }
        }
    }

    fn block(
        &mut self,
        head: &[String],
        body: &str,
        tail: &str,
        statement: &Statement,
        storage: Storage,
        qualifiers: &Qualifiers,
    ) -> Result<(), ShaderError> {
        let line = statement.line;
        if storage != Storage::Uniform {
            return Err(self.syntax(line, "only uniform blocks are supported"));
        }
        let [name] = head else {
            return Err(self.syntax(line, "expected a single block name"));
        };
        if !qualifiers.std140 {
            return Err(self.syntax(line, format!("uniform block '{name}' must use layout(std140)")));
        }

        let mut members = Vec::new();
        let mut member_line = statement.body_line;
        for part in body.split(';') {
            let part_line = member_line + part.chars().take_while(|c| c.is_whitespace()).filter(|&c| c == '\n').count();
            member_line += part.matches('\n').count();

            let tokens = tokenize(part);
            let mut pos = 0;
            while matches!(tokens.get(pos).map(String::as_str), Some("highp" | "mediump" | "lowp")) {
                pos += 1;
            }
            let Some(type_name) = tokens.get(pos) else {
                continue;
            };
            let ty = GlslType::from_name(type_name)
                .ok_or_else(|| self.syntax(part_line, format!("unsupported block member type '{type_name}'")))?;
            for (member, array_len) in self.declarators(&tokens[pos + 1..], part_line)? {
                members.push(BlockMember {
                    name: member,
                    ty,
                    array_len,
                    offset: 0,
                });
            }
        }
        if members.is_empty() {
            return Err(self.syntax(line, format!("uniform block '{name}' has no members")));
        }

        let tail_tokens = tokenize(tail);
        let instance_name = match tail_tokens.as_slice() {
            [] => None,
            [instance] if is_identifier(instance) => Some(instance.clone()),
            _ => return Err(self.syntax(line, "block instance arrays are not supported")),
        };

        let size = std140_layout(&mut members);
        self.interface.blocks.push(UniformBlock {
            name: name.clone(),
            instance_name,
            layout: BlockLayout::Std140,
            members,
            size,
        });
        Ok(())
    }
}

fn is_identifier(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && token.chars().all(|c| c.is_alphanumeric() || c == '_')
}
