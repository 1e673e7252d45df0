// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene graph nodes

use super::{BufferGeometry, Material};

/// Leaf owning one geometry and one material
#[derive(Debug)]
pub struct MeshNode {
    pub name: String,
    pub geometry: BufferGeometry,
    pub material: Material,
}

/// Scene graph tree. Nodes are owned by exactly one parent.
#[derive(Debug)]
pub enum SceneNode {
    Group {
        name: String,
        children: Vec<SceneNode>,
    },
    Mesh(MeshNode),
}

impl SceneNode {
    pub fn group(name: impl Into<String>, children: Vec<SceneNode>) -> Self {
        SceneNode::Group {
            name: name.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SceneNode::Group { name, .. } => name,
            SceneNode::Mesh(mesh) => &mesh.name,
        }
    }

    pub fn children(&self) -> &[SceneNode] {
        match self {
            SceneNode::Group { children, .. } => children,
            SceneNode::Mesh(_) => &[],
        }
    }

    /// Mesh leaves in depth-first order
    pub fn meshes(&self) -> Vec<&MeshNode> {
        let mut out = Vec::new();
        self.collect_meshes(&mut out);
        out
    }

    fn collect_meshes<'a>(&'a self, out: &mut Vec<&'a MeshNode>) {
        match self {
            SceneNode::Group { children, .. } => {
                for child in children {
                    child.collect_meshes(out);
                }
            }
            SceneNode::Mesh(mesh) => out.push(mesh),
        }
    }

    /// Visit every mesh leaf mutably in depth-first order
    pub fn for_each_mesh_mut(&mut self, f: &mut impl FnMut(&mut MeshNode)) {
        match self {
            SceneNode::Group { children, .. } => {
                for child in children {
                    child.for_each_mesh_mut(f);
                }
            }
            SceneNode::Mesh(mesh) => f(mesh),
        }
    }

    pub fn mesh_count(&self) -> usize {
        match self {
            SceneNode::Group { children, .. } => children.iter().map(SceneNode::mesh_count).sum(),
            SceneNode::Mesh(_) => 1,
        }
    }
}
