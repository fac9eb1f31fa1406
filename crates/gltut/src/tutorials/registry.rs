//! Tutorials by name

use crate::application::Tutorial;

use super::{Cube, MovingTriangle, MultipleObjects, Oriented, Transform, Triangle, World};

/// A runnable tutorial
#[derive(Debug, Clone, Copy)]
pub struct TutorialEntry {
    /// Name accepted by [`create`]
    pub name: &'static str,
    /// One-line summary
    pub description: &'static str,
    /// Fresh, uninitialized instance
    pub build: fn() -> Box<dyn Tutorial>,
}

/// Every tutorial, in teaching order
pub const TUTORIALS: &[TutorialEntry] = &[
    TutorialEntry {
        name: "triangle",
        description: "Colored triangle from one vertex buffer",
        build: || Box::new(Triangle::new()),
    },
    TutorialEntry {
        name: "moving-triangle",
        description: "Triangle moved and faded by the shaders",
        build: || Box::new(MovingTriangle::shader()),
    },
    TutorialEntry {
        name: "moving-triangle-cpu",
        description: "Triangle moved by rewriting its vertex buffer",
        build: || Box::new(MovingTriangle::cpu()),
    },
    TutorialEntry {
        name: "cube",
        description: "Box under a perspective matrix",
        build: || Box::new(Cube::matrix()),
    },
    TutorialEntry {
        name: "cube-manual",
        description: "Box projected by scalar shader uniforms",
        build: || Box::new(Cube::manual()),
    },
    TutorialEntry {
        name: "multiple-objects",
        description: "Two wedges via base-vertex draws; space toggles depth clamping",
        build: || Box::new(MultipleObjects::new()),
    },
    TutorialEntry {
        name: "transform",
        description: "Robot arm hierarchy driven from the keyboard",
        build: || Box::new(Transform::new()),
    },
    TutorialEntry {
        name: "oriented",
        description: "Gimbal lock with three nested rings and a ship",
        build: || Box::new(Oriented::new()),
    },
    TutorialEntry {
        name: "world",
        description: "Forest and Parthenon, camera matrices in a uniform block",
        build: || Box::new(World::ubo()),
    },
    TutorialEntry {
        name: "world-uniforms",
        description: "Forest and Parthenon, camera matrices as program uniforms",
        build: || Box::new(World::uniforms()),
    },
];

/// Look up an entry, ignoring case
#[must_use]
pub fn find(name: &str) -> Option<&'static TutorialEntry> {
    TUTORIALS.iter().find(|entry| entry.name.eq_ignore_ascii_case(name))
}

/// Build the tutorial called `name`
#[must_use]
pub fn create(name: &str) -> Option<Box<dyn Tutorial>> {
    find(name).map(|entry| (entry.build)())
}

/// Registered names
pub fn names() -> impl Iterator<Item = &'static str> {
    TUTORIALS.iter().map(|entry| entry.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_match_instances() {
        for entry in TUTORIALS {
            assert_eq!((entry.build)().name(), entry.name);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let unique: HashSet<_> = names().collect();
        assert_eq!(unique.len(), TUTORIALS.len());
    }

    #[test]
    fn test_create() {
        assert_eq!(create("Oriented").map(|t| t.name()), Some("oriented"));
        assert!(create("teapot").is_none());
    }
}
