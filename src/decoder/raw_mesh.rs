// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Raw mesh buffers as produced by the native module

use serde::{Deserialize, Serialize};

/// Flat triangle-list buffers for one decoded STEP body.
///
/// `positions` and `normals` hold `x, y, z` triplets; `indices` is a
/// triangle list into the position triplets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMesh {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub positions: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<f32>>,
    pub indices: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[f32; 3]>,
}

impl RawMesh {
    pub fn new(positions: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            name: None,
            positions,
            normals: None,
            indices,
            color: None,
        }
    }

    pub fn with_normals(mut self, normals: Vec<f32>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Number of position triplets
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Largest index, or `None` for an empty index list
    pub fn max_index(&self) -> Option<u32> {
        self.indices.iter().copied().max()
    }

    /// Check the buffer layout and index bounds
    pub fn validate(&self) -> Result<(), String> {
        if self.positions.len() % 3 != 0 {
            return Err(format!(
                "position buffer length {} is not a multiple of 3",
                self.positions.len()
            ));
        }

        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(format!(
                    "normal buffer length {} does not match position buffer length {}",
                    normals.len(),
                    self.positions.len()
                ));
            }
        }

        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            ));
        }

        let finite = |values: &[f32]| values.iter().all(|v| v.is_finite());
        if !finite(&self.positions) || !self.normals.as_deref().map_or(true, finite) {
            return Err("non-finite coordinate".to_string());
        }

        if let Some(color) = &self.color {
            if !finite(&color[..]) {
                return Err(format!("non-finite color {color:?}"));
            }
        }

        let n = self.vertex_count();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(format!("index {bad} out of range for {n} vertices"));
        }

        Ok(())
    }
}
