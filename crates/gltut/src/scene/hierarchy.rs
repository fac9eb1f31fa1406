//! Transform hierarchies
//!
//! [`Node`] is a plain owned tree with a builder API. Nodes carry a
//! depth-first index assigned by [`Node::rebuild_indices`]. A tree of
//! [`Joint`]s is walked with a [`MatrixStack`] to produce one model matrix
//! per piece of geometry.

use crate::foundation::math::{Mat4, Vec3};
use crate::scene::matrix_stack::{MatrixStack, PushStack};

/// Tree node owning its children
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    value: T,
    index: usize,
    children: Vec<Node<T>>,
}

impl<T> Node<T> {
    /// Node without children
    pub const fn new(value: T) -> Self {
        Self {
            value,
            index: 0,
            children: Vec::new(),
        }
    }

    /// Add a child without children of its own
    #[must_use]
    pub fn leaf(mut self, child: T) -> Self {
        self.add_leaf(child);
        self
    }

    /// Add several leaves
    #[must_use]
    pub fn leaves(mut self, children: impl IntoIterator<Item = T>) -> Self {
        self.add_leaves(children);
        self
    }

    /// Add a subtree
    #[must_use]
    pub fn node(mut self, child: Self) -> Self {
        self.add_node(child);
        self
    }

    /// Add several subtrees
    #[must_use]
    pub fn nodes(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.add_nodes(children);
        self
    }

    /// Add a leaf in place
    pub fn add_leaf(&mut self, child: T) {
        self.children.push(Self::new(child));
    }

    /// Add several leaves in place
    pub fn add_leaves(&mut self, children: impl IntoIterator<Item = T>) {
        self.children.extend(children.into_iter().map(Self::new));
    }

    /// Add a subtree in place
    pub fn add_node(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Add several subtrees in place
    pub fn add_nodes(&mut self, children: impl IntoIterator<Item = Self>) {
        self.children.extend(children);
    }

    /// Number the tree depth-first, root first, starting at 0
    ///
    /// Returns the number of nodes.
    pub fn rebuild_indices(&mut self) -> usize {
        self.number_from(0)
    }

    fn number_from(&mut self, next: usize) -> usize {
        self.index = next;
        let mut next = next + 1;
        for child in &mut self.children {
            next = child.number_from(next);
        }
        next
    }

    /// Value stored in this node
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Mutable value stored in this node
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Index from the last [`rebuild_indices`](Self::rebuild_indices)
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Direct children
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Self::len).sum::<usize>()
    }

    /// Always false; a tree has at least its root
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Visit every node depth-first, root first, with its index
    pub fn visit(&self, f: &mut impl FnMut(usize, &T)) {
        f(self.index, &self.value);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// Geometry attached to a joint, relative to the joint frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Offset of the geometry center
    pub offset: Vec3,
    /// Scale applied after the offset
    pub scale: Vec3,
}

impl Geometry {
    /// Geometry at `offset` scaled by `scale`
    #[must_use]
    pub const fn new(offset: Vec3, scale: Vec3) -> Self {
        Self { offset, scale }
    }
}

/// Articulation point of a hierarchy
///
/// The joint frame is `translate(translation) * Ry * Rz * Rx` relative to the
/// parent. The geometry transform applies only to the joint's own geometry,
/// not to its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// Name used in logs
    pub name: &'static str,
    /// Offset from the parent frame
    pub translation: Vec3,
    /// Rotation about X, Y and Z in degrees
    pub angles: Vec3,
    /// Geometry drawn in this frame
    pub geometry: Option<Geometry>,
}

impl Joint {
    /// Joint with no rotation and no geometry
    #[must_use]
    pub fn new(name: &'static str, translation: Vec3) -> Self {
        Self {
            name,
            translation,
            angles: Vec3::zeros(),
            geometry: None,
        }
    }

    /// Rotation about X (pitch), degrees
    #[must_use]
    pub fn pitch(mut self, degrees: f32) -> Self {
        self.angles.x = degrees;
        self
    }

    /// Rotation about Y (yaw), degrees
    #[must_use]
    pub fn yaw(mut self, degrees: f32) -> Self {
        self.angles.y = degrees;
        self
    }

    /// Rotation about Z (roll), degrees
    #[must_use]
    pub fn roll(mut self, degrees: f32) -> Self {
        self.angles.z = degrees;
        self
    }

    /// Attach geometry
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    fn apply(&self, stack: &mut MatrixStack) {
        stack.translate(self.translation);
        if self.angles.y != 0.0 {
            stack.rotate_y(self.angles.y);
        }
        if self.angles.z != 0.0 {
            stack.rotate_z(self.angles.z);
        }
        if self.angles.x != 0.0 {
            stack.rotate_x(self.angles.x);
        }
    }
}

impl Node<Joint> {
    /// Walk the hierarchy and call `draw` with each geometry's model matrix
    ///
    /// Joints are visited depth-first; the stack is left as it was found.
    ///
    /// # Errors
    /// Stops at and returns the first error from `draw`.
    pub fn walk<E>(
        &self,
        stack: &mut MatrixStack,
        draw: &mut impl FnMut(&Joint, &Mat4) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut frame = PushStack::new(stack);
        self.value.apply(&mut frame);

        if let Some(geometry) = self.value.geometry {
            let mut local = PushStack::new(&mut frame);
            local.translate(geometry.offset);
            local.scale(geometry.scale);
            draw(&self.value, &local.top())?;
        }

        for child in &self.children {
            child.walk(&mut frame, draw)?;
        }
        Ok(())
    }

    /// Model matrix of every geometry, in walk order
    #[must_use]
    pub fn model_matrices(&self, stack: &mut MatrixStack) -> Vec<(&'static str, Mat4)> {
        let mut matrices = Vec::new();
        let _ = self.walk(stack, &mut |joint, matrix| {
            matrices.push((joint.name, *matrix));
            Ok::<(), std::convert::Infallible>(())
        });
        matrices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    #[test]
    fn test_builder_and_indices() {
        let mut tree = Node::new('a')
            .leaves(['b', 'c'])
            .node(Node::new('d').leaf('e'))
            .nodes([Node::new('f')]);
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.rebuild_indices(), 6);

        let mut seen = Vec::new();
        tree.visit(&mut |index, value| seen.push((index, *value)));
        assert_eq!(seen, [(0, 'a'), (1, 'b'), (2, 'c'), (3, 'd'), (4, 'e'), (5, 'f')]);
    }

    #[test]
    fn test_in_place_additions() {
        let mut tree = Node::new(0);
        tree.add_leaf(1);
        tree.add_leaves([2, 3]);
        tree.add_node(Node::new(4).leaf(5));
        tree.add_nodes(vec![Node::new(6)]);
        tree.rebuild_indices();
        assert_eq!(tree.children().len(), 5);
        assert_eq!(tree.children()[3].children()[0].index(), 5);
        *tree.value_mut() = 10;
        assert_eq!(*tree.value(), 10);
    }

    #[test]
    fn test_walk_composes_parent_frames() {
        let unit = Geometry::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let tree = Node::new(Joint::new("root", Vec3::new(0.0, 0.0, -10.0)).yaw(90.0))
            .node(Node::new(Joint::new("arm", Vec3::new(0.0, 0.0, 2.0)).with_geometry(unit)));

        let mut stack = MatrixStack::new();
        let matrices = tree.model_matrices(&mut stack);
        assert_eq!(matrices.len(), 1);
        assert_eq!(matrices[0].0, "arm");

        // +Z in the root frame is +X after the 90 degree yaw.
        let origin = matrices[0].1 * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin, Vec4::new(2.0, 0.0, -10.0, 1.0), epsilon = 1e-5);
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.top(), Mat4::identity());
    }

    #[test]
    fn test_geometry_transform_does_not_reach_children() {
        let stretched = Geometry::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 5.0));
        let tree = Node::new(Joint::new("parent", Vec3::zeros()).with_geometry(stretched))
            .leaf(Joint::new("child", Vec3::new(1.0, 0.0, 0.0)).with_geometry(Geometry::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))));

        let matrices = tree.model_matrices(&mut MatrixStack::new());
        assert_eq!(matrices.len(), 2);
        assert_relative_eq!(matrices[1].1, Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_walk_stops_on_error() {
        let geometry = Geometry::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let tree = Node::new(Joint::new("a", Vec3::zeros()).with_geometry(geometry))
            .leaf(Joint::new("b", Vec3::zeros()).with_geometry(geometry));
        let mut stack = MatrixStack::new();
        let mut count = 0;
        let result = tree.walk(&mut stack, &mut |_, _| {
            count += 1;
            Err("stop")
        });
        assert_eq!(result, Err("stop"));
        assert_eq!(count, 1);
        assert_eq!(stack.depth(), 0);
    }
}
