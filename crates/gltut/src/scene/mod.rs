//! Scene transforms
//!
//! Scenes build model matrices with a [`MatrixStack`], either by issuing
//! push/transform/pop sequences directly or by walking a [`Node`] tree of
//! [`Joint`]s.
//!
//! ```text
//! Node<Joint>  ──walk──►  MatrixStack  ──top()──►  modelToCamera / modelToWorld
//! ```

pub mod hierarchy;
pub mod matrix_stack;

pub use hierarchy::{Geometry, Joint, Node};
pub use matrix_stack::{MatrixStack, PushStack};
