// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Raw meshes to scene documents

use super::{Color, IndexBuffer, MeshData, SceneDocument, FORMAT_VERSION};
use crate::decoder::RawMesh;
use crate::resources::ResourceTracker;
use crate::scene::SceneNode;

/// Name of the root group of an imported scene
pub const DEFAULT_ROOT_NAME: &str = "StepImport";

/// Turns decoded meshes into a flat scene: one root, one leaf per mesh.
///
/// Index bounds are not checked here; the decoder guarantees them.
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    pub root_name: String,
    pub default_color: Color,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            default_color: Color::default(),
        }
    }
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the wire document, preserving mesh order
    pub fn build(&self, meshes: Vec<RawMesh>) -> SceneDocument {
        let meshes = meshes
            .into_iter()
            .enumerate()
            .map(|(i, mesh)| MeshData {
                name: mesh.name.unwrap_or_else(|| format!("Mesh {}", i + 1)),
                positions: mesh.positions,
                // Absent normals are left to the renderer
                normals: mesh.normals,
                index: IndexBuffer::from_indices(mesh.indices),
                color: mesh.color.map(Color::from).unwrap_or(self.default_color),
            })
            .collect();

        SceneDocument {
            format_version: FORMAT_VERSION,
            root: self.root_name.clone(),
            meshes,
        }
    }

    /// Build and realize in one step, for callers already on the caller side
    pub fn build_scene(&self, meshes: Vec<RawMesh>, tracker: &ResourceTracker) -> SceneNode {
        self.build(meshes).realize(tracker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::IndexWidth;

    fn triangle(offset: u32) -> RawMesh {
        let n = (offset + 3) as usize;
        RawMesh::new(vec![0.5; 3 * n], vec![offset, offset + 1, offset + 2])
    }

    #[test]
    fn test_order_and_names_preserved() {
        let doc = SceneBuilder::new().build(vec![
            triangle(0).with_name("Bracket"),
            triangle(0),
            triangle(0).with_name("Bolt"),
        ]);

        let names: Vec<_> = doc.meshes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Bracket", "Mesh 2", "Bolt"]);
        assert_eq!(doc.root, DEFAULT_ROOT_NAME);
    }

    #[test]
    fn test_color_fallback() {
        let doc = SceneBuilder::new().build(vec![
            triangle(0).with_color([1.0, 0.0, 0.0]),
            triangle(0),
        ]);
        assert_eq!(doc.meshes[0].color, Color::new(1.0, 0.0, 0.0));
        assert_eq!(doc.meshes[1].color.to_hex(), 0xf0f0f0);
    }

    #[test]
    fn test_normals_passed_through_or_absent() {
        let with = triangle(0).with_normals(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let doc = SceneBuilder::new().build(vec![with.clone(), triangle(0)]);
        assert_eq!(doc.meshes[0].normals, with.normals);
        assert!(doc.meshes[1].normals.is_none());
    }

    #[test]
    fn test_index_width_selection() {
        let doc = SceneBuilder::new().build(vec![triangle(65533), triangle(65534)]);
        // max index 65535 and 65536
        assert_eq!(doc.meshes[0].index.width(), IndexWidth::U16);
        assert_eq!(doc.meshes[1].index.width(), IndexWidth::U32);
        assert_eq!(doc.meshes[0].index.max_index(), Some(65535));
        assert_eq!(doc.meshes[1].index.max_index(), Some(65536));
    }

    #[test]
    fn test_positions_verbatim() {
        let raw = RawMesh::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0], vec![0, 1, 2]);
        let doc = SceneBuilder::new().build(vec![raw.clone()]);
        assert_eq!(doc.meshes[0].positions, raw.positions);
    }

    #[test]
    fn test_build_scene_realizes() {
        let tracker = ResourceTracker::new();
        let scene = SceneBuilder::new().build_scene(vec![triangle(0), triangle(0)], &tracker);
        assert_eq!(scene.mesh_count(), 2);
        assert_eq!(scene.children().len(), 2);
        assert_eq!(tracker.live_count(), 6);
    }
}
