//! Matrix stack for hierarchical transforms
//!
//! Every operation right-multiplies the current matrix, so transforms apply to
//! vertices in the reverse of the order they are issued: the last call acts
//! first. [`push`](MatrixStack::push) saves the current matrix and
//! [`pop`](MatrixStack::pop) restores it.

use std::ops::{Deref, DerefMut};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Current matrix plus a stack of saved matrices
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixStack {
    current: Mat4,
    saved: Vec<Mat4>,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStack {
    /// Stack whose current matrix is the identity
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial_matrix(Mat4::identity())
    }

    /// Stack starting from `matrix`
    #[must_use]
    pub const fn with_initial_matrix(matrix: Mat4) -> Self {
        Self {
            current: matrix,
            saved: Vec::new(),
        }
    }

    /// Save the current matrix
    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restore the last saved matrix; does nothing when nothing is saved
    pub fn pop(&mut self) {
        if let Some(matrix) = self.saved.pop() {
            self.current = matrix;
        }
    }

    /// Restore the last saved matrix without removing it
    pub fn reset(&mut self) {
        if let Some(matrix) = self.saved.last() {
            self.current = *matrix;
        }
    }

    /// Current matrix
    #[must_use]
    pub const fn top(&self) -> Mat4 {
        self.current
    }

    /// Number of saved matrices
    #[must_use]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Rotate around `axis` by `angle_deg` degrees
    pub fn rotate(&mut self, axis: Vec3, angle_deg: f32) {
        self.rotate_rad(axis, utils::deg_to_rad(angle_deg));
    }

    /// Rotate around `axis` by `angle_rad` radians; a zero axis is ignored
    pub fn rotate_rad(&mut self, axis: Vec3, angle_rad: f32) {
        if let Some(axis) = nalgebra::Unit::try_new(axis, f32::EPSILON) {
            self.current *= Mat4::from_axis_angle(&axis, angle_rad);
        }
    }

    /// Rotate around X, degrees
    pub fn rotate_x(&mut self, angle_deg: f32) {
        self.current *= Mat4::rotation_x_deg(angle_deg);
    }

    /// Rotate around Y, degrees
    pub fn rotate_y(&mut self, angle_deg: f32) {
        self.current *= Mat4::rotation_y_deg(angle_deg);
    }

    /// Rotate around Z, degrees
    pub fn rotate_z(&mut self, angle_deg: f32) {
        self.current *= Mat4::rotation_z_deg(angle_deg);
    }

    /// Non-uniform scale
    pub fn scale(&mut self, scale: Vec3) {
        self.current *= Mat4::new_nonuniform_scaling(&scale);
    }

    /// Uniform scale
    pub fn uniform_scale(&mut self, scale: f32) {
        self.current *= Mat4::new_scaling(scale);
    }

    /// Translate
    pub fn translate(&mut self, offset: Vec3) {
        self.current *= Mat4::new_translation(&offset);
    }

    /// Apply a right-handed view matrix
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.current *= <Mat4 as Mat4Ext>::look_at(eye, target, up);
    }

    /// Apply an OpenGL perspective projection; `fov_deg` is the vertical field of view
    pub fn perspective(&mut self, fov_deg: f32, aspect_ratio: f32, z_near: f32, z_far: f32) {
        self.current *= Mat4::perspective_gl(fov_deg, aspect_ratio, z_near, z_far);
    }

    /// Apply an OpenGL orthographic projection
    pub fn orthographic(&mut self, left: f32, right: f32, bottom: f32, top: f32, z_near: f32, z_far: f32) {
        self.current *= Mat4::new_orthographic(left, right, bottom, top, z_near, z_far);
    }

    /// Right-multiply an arbitrary matrix
    pub fn apply_matrix(&mut self, matrix: &Mat4) {
        self.current *= matrix;
    }

    /// Replace the current matrix
    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.current = matrix;
    }

    /// Replace the current matrix with the identity
    pub fn set_identity(&mut self) {
        self.current = Mat4::identity();
    }
}

/// Pushes on creation and pops when dropped
///
/// Dereferences to the stack so transforms can be issued through the guard.
#[derive(Debug)]
pub struct PushStack<'a> {
    stack: &'a mut MatrixStack,
}

impl<'a> PushStack<'a> {
    /// Save the current matrix of `stack` until the guard is dropped
    pub fn new(stack: &'a mut MatrixStack) -> Self {
        stack.push();
        Self { stack }
    }
}

impl Deref for PushStack<'_> {
    type Target = MatrixStack;

    fn deref(&self) -> &MatrixStack {
        self.stack
    }
}

impl DerefMut for PushStack<'_> {
    fn deref_mut(&mut self) -> &mut MatrixStack {
        self.stack
    }
}

impl Drop for PushStack<'_> {
    fn drop(&mut self) {
        self.stack.pop();
    }
}
