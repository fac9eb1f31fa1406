//! Mesh vocabulary: namespace, element and attribute names, and the
//! RELAX NG compact grammar shipped with the crate.

/// Namespace of every mesh element
pub const MESH_NAMESPACE: &str = "http://www.arcsynthesis.com/gltut/mesh";

/// RELAX NG (compact syntax) grammar for mesh documents
pub const MESH_SCHEMA_RNC: &str = include_str!("../../../resources/schema/mesh.rnc");

/// Element names
pub mod element {
    /// Root element
    pub const MESH: &str = "mesh";
    /// Vertex attribute array
    pub const ATTRIBUTE: &str = "attribute";
    /// Named vertex array object
    pub const VAO: &str = "vao";
    /// Attribute reference inside a `vao`
    pub const SOURCE: &str = "source";
    /// Indexed draw command
    pub const INDICES: &str = "indices";
    /// Array draw command
    pub const ARRAYS: &str = "arrays";
}

/// Attribute names
pub mod attribute {
    /// Attribute slot on `attribute`
    pub const INDEX: &str = "index";
    /// Component or index type
    pub const TYPE: &str = "type";
    /// Components per vertex
    pub const SIZE: &str = "size";
    /// Integer pass-through flag
    pub const INTEGRAL: &str = "integral";
    /// VAO name
    pub const NAME: &str = "name";
    /// Attribute reference on `source`
    pub const ATTRIB: &str = "attrib";
    /// Primitive mode
    pub const CMD: &str = "cmd";
    /// Primitive restart index
    pub const PRIM_RESTART: &str = "prim-restart";
    /// First vertex of an array draw
    pub const START: &str = "start";
    /// Vertex count of an array draw
    pub const COUNT: &str = "count";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::mesh::{AttributeType, PrimitiveType};

    #[test]
    fn test_grammar_declares_namespace() {
        assert!(MESH_SCHEMA_RNC.contains(MESH_NAMESPACE));
        assert!(MESH_SCHEMA_RNC.contains("element msh:mesh"));
    }

    #[test]
    fn test_grammar_lists_every_keyword() {
        for t in AttributeType::ALL {
            assert!(MESH_SCHEMA_RNC.contains(&format!("\"{}\"", t.name())), "missing {t}");
        }
        for p in PrimitiveType::ALL {
            assert!(MESH_SCHEMA_RNC.contains(&format!("\"{}\"", p.name())), "missing {p}");
        }
    }
}
