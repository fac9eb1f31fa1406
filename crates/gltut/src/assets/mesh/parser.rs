//! XML reader for mesh documents
//!
//! Parsing is strict: the element order follows the grammar (attributes,
//! then VAOs, then commands), unknown child elements are rejected, and every
//! value is range-checked against its declared type before the structural
//! checks of [`MeshData::validate_with`] run.

use std::path::Path;

use log::{debug, warn};
use roxmltree::{Document, Node};

use super::format::{
    Attribute, AttributeData, AttributeType, IndexType, MeshData, MeshElement, NamedVao, PrimitiveType,
    RenderCommand,
};
use super::schema::{attribute as attr, element, MESH_NAMESPACE};
use super::{Location, MeshError};

/// Source positions of the elements of one document
#[derive(Default)]
struct Positions {
    attributes: Vec<Location>,
    vaos: Vec<Location>,
    sources: Vec<Vec<Location>>,
    commands: Vec<Location>,
}

impl Positions {
    fn locate(&self, element: MeshElement) -> Location {
        let found = match element {
            MeshElement::Attribute(i) => self.attributes.get(i),
            MeshElement::Vao(i) => self.vaos.get(i),
            MeshElement::Source(i, j) => self.sources.get(i).and_then(|s| s.get(j)),
            MeshElement::Command(i) => self.commands.get(i),
        };
        found.copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Attributes,
    Vaos,
    Commands,
}

impl MeshData {
    /// Load and validate a mesh document from disk
    ///
    /// # Errors
    /// Returns [`MeshError::Io`] if the file cannot be read, or any parse or
    /// validation error of [`MeshData::from_xml`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let path = path.as_ref();
        debug!("Loading mesh {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_xml(&text)
    }

    /// Parse and validate a mesh document
    ///
    /// # Errors
    /// Returns the first syntax, value or structural error, located in the
    /// source text where possible.
    pub fn from_xml(text: &str) -> Result<Self, MeshError> {
        let document = Document::parse(text)?;
        let root = document.root_element();

        if root.tag_name().name() != element::MESH {
            return Err(MeshError::WrongRoot {
                found: root.tag_name().name().to_string(),
            });
        }
        match root.tag_name().namespace() {
            Some(MESH_NAMESPACE) => {}
            Some(other) => {
                return Err(MeshError::WrongRoot {
                    found: format!("{{{other}}}{}", element::MESH),
                })
            }
            None => warn!("Mesh document has no namespace, expected {MESH_NAMESPACE}"),
        }
        let namespace = root.tag_name().namespace();

        let mut mesh = Self::default();
        let mut positions = Positions::default();
        let mut section = Section::Attributes;

        for child in root.children().filter(Node::is_element) {
            let name = child.tag_name().name();
            let at = location(child);
            let next = match name {
                element::ATTRIBUTE => Some(Section::Attributes),
                element::VAO => Some(Section::Vaos),
                element::INDICES | element::ARRAYS => Some(Section::Commands),
                _ => None,
            };
            let Some(next) = next.filter(|&n| n >= section && child.tag_name().namespace() == namespace) else {
                return Err(MeshError::UnexpectedElement {
                    name: name.to_string(),
                    parent: element::MESH,
                    at,
                });
            };
            section = next;

            match name {
                element::ATTRIBUTE => {
                    mesh.attributes.push(parse_attribute(child)?);
                    positions.attributes.push(at);
                }
                element::VAO => {
                    let (vao, sources) = parse_vao(child, namespace)?;
                    mesh.vaos.push(vao);
                    positions.vaos.push(at);
                    positions.sources.push(sources);
                }
                element::INDICES => {
                    mesh.commands.push(parse_indices(child)?);
                    positions.commands.push(at);
                }
                _ => {
                    mesh.commands.push(parse_arrays(child)?);
                    positions.commands.push(at);
                }
            }
        }

        mesh.validate_with(|element| positions.locate(element))?;
        debug!(
            "Parsed mesh: {} attributes, {} vertices, {} vaos, {} commands",
            mesh.attributes.len(),
            mesh.vertex_count(),
            mesh.vaos.len(),
            mesh.commands.len()
        );
        Ok(mesh)
    }
}

fn location(node: Node<'_, '_>) -> Location {
    let pos = node.document().text_pos_at(node.range().start);
    Location::at(pos.row, pos.col)
}

fn required<'a>(node: Node<'a, '_>, element: &'static str, attribute: &'static str) -> Result<&'a str, MeshError> {
    node.attribute(attribute).ok_or_else(|| MeshError::MissingAttribute {
        element,
        attribute,
        at: location(node),
    })
}

fn invalid(node: Node<'_, '_>, element: &'static str, attribute: &'static str, value: &str) -> MeshError {
    MeshError::InvalidValue {
        element,
        attribute,
        value: value.to_string(),
        at: location(node),
    }
}

/// Parse an unsigned attribute value no larger than `max`
fn parse_unsigned(
    node: Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
    max: u64,
) -> Result<u32, MeshError> {
    let text = required(node, element, attribute)?;
    let value: u64 = text.trim().parse().map_err(|_| invalid(node, element, attribute, text))?;
    if value > max {
        return Err(MeshError::OutOfRange {
            element,
            attribute,
            value: value.to_string(),
            expected: format!("0..={max}"),
            at: location(node),
        });
    }
    // max never exceeds u32::MAX
    Ok(value as u32)
}

fn parse_bool(node: Node<'_, '_>, element: &'static str, attribute: &'static str) -> Result<bool, MeshError> {
    match node.attribute(attribute).map(str::trim) {
        None | Some("false" | "0") => Ok(false),
        Some("true" | "1") => Ok(true),
        Some(other) => Err(invalid(node, element, attribute, other)),
    }
}

/// All text content of an element, joined by spaces
fn element_text(node: Node<'_, '_>) -> String {
    node.children()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_attribute(node: Node<'_, '_>) -> Result<Attribute, MeshError> {
    const EL: &str = element::ATTRIBUTE;
    let index = parse_unsigned(node, EL, attr::INDEX, 15)?;
    let size = {
        let value = parse_unsigned(node, EL, attr::SIZE, 4)?;
        if value == 0 {
            return Err(MeshError::OutOfRange {
                element: EL,
                attribute: attr::SIZE,
                value: "0".to_string(),
                expected: "1..=4".to_string(),
                at: location(node),
            });
        }
        value
    };
    let type_name = required(node, EL, attr::TYPE)?;
    let attr_type =
        AttributeType::from_name(type_name.trim()).ok_or_else(|| invalid(node, EL, attr::TYPE, type_name))?;
    let integral = parse_bool(node, EL, attr::INTEGRAL)?;
    let data = parse_values(node, attr_type)?;

    Ok(Attribute::new(index, attr_type, size, data).with_integral(integral))
}

fn parse_values(node: Node<'_, '_>, attr_type: AttributeType) -> Result<AttributeData, MeshError> {
    let text = element_text(node);
    let tokens = text.split_whitespace();

    let Some((min, max)) = attr_type.integer_range() else {
        let values = tokens
            .map(|t| t.parse::<f32>().map_err(|_| invalid(node, element::ATTRIBUTE, "data", t)))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(AttributeData::Float(values));
    };

    let values = tokens
        .map(|t| {
            let value: i64 = t.parse().map_err(|_| invalid(node, element::ATTRIBUTE, "data", t))?;
            if value < min || value > max {
                return Err(MeshError::OutOfRange {
                    element: element::ATTRIBUTE,
                    attribute: "data",
                    value: t.to_string(),
                    expected: format!("{min}..={max} for {attr_type}"),
                    at: location(node),
                });
            }
            Ok(value)
        })
        .collect::<Result<Vec<i64>, _>>()?;

    // Every value was range-checked above, so the narrowing casts are exact.
    let data = match attr_type {
        AttributeType::Int | AttributeType::NormInt => AttributeData::Int(values.iter().map(|&v| v as i32).collect()),
        AttributeType::Uint | AttributeType::NormUint => AttributeData::Uint(values.iter().map(|&v| v as u32).collect()),
        AttributeType::Short | AttributeType::NormShort => {
            AttributeData::Short(values.iter().map(|&v| v as i16).collect())
        }
        AttributeType::Ushort | AttributeType::NormUshort => {
            AttributeData::Ushort(values.iter().map(|&v| v as u16).collect())
        }
        AttributeType::Byte | AttributeType::NormByte => AttributeData::Byte(values.iter().map(|&v| v as i8).collect()),
        AttributeType::Ubyte | AttributeType::NormUbyte => {
            AttributeData::Ubyte(values.iter().map(|&v| v as u8).collect())
        }
        AttributeType::Float | AttributeType::Half => AttributeData::Float(values.iter().map(|&v| v as f32).collect()),
    };
    Ok(data)
}

fn parse_vao(node: Node<'_, '_>, namespace: Option<&str>) -> Result<(NamedVao, Vec<Location>), MeshError> {
    let name = required(node, element::VAO, attr::NAME)?;
    let mut sources = Vec::new();
    let mut positions = Vec::new();

    for child in node.children().filter(Node::is_element) {
        if child.tag_name().name() != element::SOURCE || child.tag_name().namespace() != namespace {
            return Err(MeshError::UnexpectedElement {
                name: child.tag_name().name().to_string(),
                parent: element::VAO,
                at: location(child),
            });
        }
        sources.push(parse_unsigned(child, element::SOURCE, attr::ATTRIB, 15)?);
        positions.push(location(child));
    }

    Ok((NamedVao::new(name, sources), positions))
}

fn parse_primitive(node: Node<'_, '_>, element: &'static str) -> Result<PrimitiveType, MeshError> {
    let cmd = required(node, element, attr::CMD)?;
    PrimitiveType::from_name(cmd.trim()).ok_or_else(|| invalid(node, element, attr::CMD, cmd))
}

fn parse_indices(node: Node<'_, '_>) -> Result<RenderCommand, MeshError> {
    const EL: &str = element::INDICES;
    let primitive = parse_primitive(node, EL)?;
    let type_name = required(node, EL, attr::TYPE)?;
    let index_type = IndexType::from_name(type_name.trim()).ok_or_else(|| invalid(node, EL, attr::TYPE, type_name))?;
    let max = u64::from(index_type.max_value());

    let primitive_restart = if node.attribute(attr::PRIM_RESTART).is_some() {
        Some(parse_unsigned(node, EL, attr::PRIM_RESTART, max)?)
    } else {
        None
    };

    let indices = element_text(node)
        .split_whitespace()
        .map(|t| {
            let value: u64 = t.parse().map_err(|_| invalid(node, EL, "data", t))?;
            if value > max {
                return Err(MeshError::OutOfRange {
                    element: EL,
                    attribute: "data",
                    value: t.to_string(),
                    expected: format!("0..={max} for {index_type}"),
                    at: location(node),
                });
            }
            Ok(value as u32)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RenderCommand::Indexed {
        primitive,
        index_type,
        primitive_restart,
        indices,
    })
}

fn parse_arrays(node: Node<'_, '_>) -> Result<RenderCommand, MeshError> {
    const EL: &str = element::ARRAYS;
    Ok(RenderCommand::Arrays {
        primitive: parse_primitive(node, EL)?,
        start: parse_unsigned(node, EL, attr::START, u64::from(u32::MAX))?,
        count: parse_unsigned(node, EL, attr::COUNT, u64::from(u32::MAX))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mesh xmlns="http://www.arcsynthesis.com/gltut/mesh">
    <attribute index="0" type="float" size="3">
        0.0 0.5 0.0
        0.5 -0.366 0.0
        -0.5 -0.366 0.0
    </attribute>
    <attribute index="1" type="norm-ubyte" size="4">
        255 0 0 255
        0 255 0 255
        0 0 255 255
    </attribute>
    <vao name="flat">
        <source attrib="0"/>
    </vao>
    <indices cmd="triangles" type="ushort">0 1 2</indices>
</mesh>
"#;

    fn replace(from: &str, to: &str) -> String {
        TRIANGLE.replacen(from, to, 1)
    }

    #[test]
    fn test_parse_triangle() {
        let mesh = MeshData::from_xml(TRIANGLE).unwrap();
        assert_eq!(mesh.attributes.len(), 2);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.attributes[1].attr_type, AttributeType::NormUbyte);
        assert_eq!(
            mesh.attributes[1].data,
            AttributeData::Ubyte(vec![255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255])
        );
        assert_eq!(mesh.vao("flat").map(|v| v.sources.clone()), Some(vec![0]));
        assert_eq!(
            mesh.commands[0],
            RenderCommand::Indexed {
                primitive: PrimitiveType::Triangles,
                index_type: IndexType::Ushort,
                primitive_restart: None,
                indices: vec![0, 1, 2],
            }
        );
    }

    #[test]
    fn test_prefixed_namespace() {
        let text = r#"<msh:mesh xmlns:msh="http://www.arcsynthesis.com/gltut/mesh">
            <msh:attribute index="0" type="float" size="2">0 0 1 0 1 1</msh:attribute>
            <msh:arrays cmd="triangles" start="0" count="3"/>
        </msh:mesh>"#;
        let mesh = MeshData::from_xml(text).unwrap();
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_missing_namespace_is_accepted() {
        let text = r#"<mesh>
            <attribute index="0" type="float" size="1">1 2</attribute>
            <arrays cmd="points" start="0" count="2"/>
        </mesh>"#;
        assert!(MeshData::from_xml(text).is_ok());
    }

    #[test]
    fn test_wrong_root() {
        let err = MeshData::from_xml("<model/>").unwrap_err();
        assert!(matches!(err, MeshError::WrongRoot { found } if found == "model"));

        let err = MeshData::from_xml(r#"<mesh xmlns="urn:other"/>"#).unwrap_err();
        assert!(matches!(err, MeshError::WrongRoot { .. }));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(MeshData::from_xml("<mesh>"), Err(MeshError::Xml(_))));
    }

    #[test]
    fn test_missing_attribute_reports_line() {
        let err = MeshData::from_xml(&replace(r#" size="3""#, "")).unwrap_err();
        match err {
            MeshError::MissingAttribute { element, attribute, at } => {
                assert_eq!(element, "attribute");
                assert_eq!(attribute, "size");
                assert_eq!(at.line(), Some(3));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_index_and_size_ranges() {
        let err = MeshData::from_xml(&replace(r#"index="0""#, r#"index="16""#)).unwrap_err();
        assert!(matches!(err, MeshError::OutOfRange { attribute: "index", .. }));

        let err = MeshData::from_xml(&replace(r#"size="3""#, r#"size="0""#)).unwrap_err();
        assert!(matches!(err, MeshError::OutOfRange { attribute: "size", .. }));

        let err = MeshData::from_xml(&replace(r#"size="3""#, r#"size="five""#)).unwrap_err();
        assert!(matches!(err, MeshError::InvalidValue { attribute: "size", .. }));
    }

    #[test]
    fn test_unknown_type_keyword() {
        let err = MeshData::from_xml(&replace(r#"type="float""#, r#"type="double""#)).unwrap_err();
        assert!(matches!(err, MeshError::InvalidValue { attribute: "type", value, .. } if value == "double"));
    }

    #[test]
    fn test_value_out_of_type_range() {
        let err = MeshData::from_xml(&replace("255 0 0 255", "256 0 0 255")).unwrap_err();
        assert!(matches!(err, MeshError::OutOfRange { attribute: "data", .. }));

        let err = MeshData::from_xml(&replace("0.0 0.5 0.0", "0.0 zero 0.0")).unwrap_err();
        assert!(matches!(err, MeshError::InvalidValue { attribute: "data", .. }));
    }

    #[test]
    fn test_integral_flag() {
        let err = MeshData::from_xml(&replace(r#"size="4""#, r#"size="4" integral="true""#)).unwrap_err();
        assert!(matches!(err, MeshError::IntegralNotAllowed { attr_type: AttributeType::NormUbyte, .. }));

        let err = MeshData::from_xml(&replace(r#"size="4""#, r#"size="4" integral="maybe""#)).unwrap_err();
        assert!(matches!(err, MeshError::InvalidValue { attribute: "integral", .. }));
    }

    #[test]
    fn test_data_count_must_match_size() {
        let err = MeshData::from_xml(&replace("-0.5 -0.366 0.0", "-0.5 -0.366")).unwrap_err();
        assert!(matches!(err, MeshError::InvalidValue { attribute: "data", .. }));
    }

    #[test]
    fn test_unknown_source_is_located() {
        let err = MeshData::from_xml(&replace(r#"attrib="0""#, r#"attrib="5""#)).unwrap_err();
        match err {
            MeshError::UnknownSource { vao, attrib, at } => {
                assert_eq!(vao, "flat");
                assert_eq!(attrib, 5);
                assert_eq!(at.line(), Some(14));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = MeshData::from_xml(&replace(">0 1 2<", ">0 1 3<")).unwrap_err();
        assert!(matches!(err, MeshError::IndexOutOfBounds { value: 3, vertex_count: 3, .. }));
    }

    #[test]
    fn test_mixed_commands() {
        let text = replace(
            "</indices>",
            "</indices>\n    <arrays cmd=\"points\" start=\"0\" count=\"1\"/>",
        );
        let err = MeshData::from_xml(&text).unwrap_err();
        match err {
            MeshError::MixedCommands { at } => assert_eq!(at.line(), Some(17)),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_element_order_enforced() {
        let text = replace(
            "<vao name=\"flat\">",
            "<indices cmd=\"points\" type=\"ubyte\">0</indices>\n    <vao name=\"flat\">",
        );
        let err = MeshData::from_xml(&text).unwrap_err();
        assert!(matches!(err, MeshError::UnexpectedElement { name, .. } if name == "vao"));
    }

    #[test]
    fn test_no_commands() {
        let text = replace(r#"<indices cmd="triangles" type="ushort">0 1 2</indices>"#, "");
        assert!(matches!(MeshData::from_xml(&text), Err(MeshError::NoCommands)));
    }

    #[test]
    fn test_primitive_restart_parsed() {
        let text = replace(
            r#"<indices cmd="triangles" type="ushort">0 1 2</indices>"#,
            r#"<indices cmd="tri-strip" type="ubyte" prim-restart="255">0 1 2 255 2 1 0</indices>"#,
        );
        let mesh = MeshData::from_xml(&text).unwrap();
        assert!(matches!(
            &mesh.commands[0],
            RenderCommand::Indexed { primitive_restart: Some(255), index_type: IndexType::Ubyte, .. }
        ));
    }
}
