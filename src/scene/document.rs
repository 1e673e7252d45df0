// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Serialized scene exchanged between a worker and its caller

use super::{BufferGeometry, Color, IndexBuffer, Material, MeshNode, SceneNode};
use crate::error::WorkerError;
use crate::resources::ResourceTracker;
use serde::{Deserialize, Serialize};

/// Current wire format version
pub const FORMAT_VERSION: u32 = 1;

/// One mesh leaf in wire form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<f32>>,
    pub index: IndexBuffer,
    pub color: Color,
}

impl MeshData {
    fn check(&self) -> Result<(), String> {
        if self.positions.len() % 3 != 0 {
            return Err(format!("mesh {:?}: ragged position buffer", self.name));
        }
        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(format!("mesh {:?}: normal buffer length mismatch", self.name));
            }
        }
        let n = self.positions.len() / 3;
        if self.index.len() % 3 != 0 {
            return Err(format!("mesh {:?}: partial triangle in index buffer", self.name));
        }
        match self.index.max_index() {
            Some(max) if max >= n => Err(format!(
                "mesh {:?}: index {max} out of range for {n} vertices",
                self.name
            )),
            _ => Ok(()),
        }
    }
}

/// Scene graph without GPU resources: a root group over a flat list of meshes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub format_version: u32,
    pub root: String,
    pub meshes: Vec<MeshData>,
}

impl SceneDocument {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse and check a worker payload
    pub fn from_json(json: &str) -> Result<Self, WorkerError> {
        let document: SceneDocument = serde_json::from_str(json)
            .map_err(|e| WorkerError::MalformedPayload(e.to_string()))?;

        if document.format_version != FORMAT_VERSION {
            return Err(WorkerError::MalformedPayload(format!(
                "unsupported scene format version {}",
                document.format_version
            )));
        }

        for mesh in &document.meshes {
            mesh.check().map_err(WorkerError::MalformedPayload)?;
        }

        Ok(document)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Build the live tree, uploading every buffer and material
    pub fn realize(self, tracker: &ResourceTracker) -> SceneNode {
        let children = self
            .meshes
            .into_iter()
            .map(|mesh| {
                SceneNode::Mesh(MeshNode {
                    name: mesh.name,
                    geometry: BufferGeometry::upload(
                        mesh.positions,
                        mesh.normals,
                        mesh.index,
                        tracker,
                    ),
                    material: Material::phong(mesh.color, tracker),
                })
            })
            .collect();

        SceneNode::group(self.root, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> SceneDocument {
        SceneDocument {
            format_version: FORMAT_VERSION,
            root: "root".into(),
            meshes: vec![MeshData {
                name: "tri".into(),
                positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                normals: None,
                index: IndexBuffer::from_indices(vec![0, 1, 2]),
                color: Color::default(),
            }],
        }
    }

    #[test]
    fn test_json_exchange() {
        let json = document().to_json().unwrap();
        assert_eq!(SceneDocument::from_json(&json).unwrap(), document());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            SceneDocument::from_json("{\"format_version\": 1"),
            Err(WorkerError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut doc = document();
        doc.format_version = 99;
        let json = doc.to_json().unwrap();
        assert!(SceneDocument::from_json(&json).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let mut doc = document();
        doc.meshes[0].index = IndexBuffer::from_indices(vec![0, 1, 3]);
        let json = doc.to_json().unwrap();
        match SceneDocument::from_json(&json) {
            Err(WorkerError::MalformedPayload(msg)) => assert!(msg.contains("out of range")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_realize_allocates_resources() {
        let tracker = ResourceTracker::new();
        let scene = document().realize(&tracker);
        assert_eq!(scene.name(), "root");
        assert_eq!(scene.mesh_count(), 1);
        // position + index buffers and one material
        assert_eq!(tracker.live_count(), 3);
    }
}
