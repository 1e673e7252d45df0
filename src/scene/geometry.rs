// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Indexed triangle geometry

use crate::resources::{ResourceHandle, ResourceKind, ResourceTracker};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Largest index representable by a 16-bit index buffer
pub const U16_INDEX_LIMIT: u32 = u16::MAX as u32;

/// Storage width of an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    /// Narrowest width that holds `max_index` losslessly
    pub fn for_max_index(max_index: u32) -> Self {
        if max_index <= U16_INDEX_LIMIT {
            IndexWidth::U16
        } else {
            IndexWidth::U32
        }
    }

    pub fn for_indices(indices: &[u32]) -> Self {
        Self::for_max_index(indices.iter().copied().max().unwrap_or(0))
    }

    pub fn bytes_per_index(&self) -> usize {
        match self {
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }
}

/// Triangle-list indices stored at their chosen width
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "width", content = "array", rename_all = "lowercase")]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Store `indices` at the narrowest lossless width
    pub fn from_indices(indices: Vec<u32>) -> Self {
        match IndexWidth::for_indices(&indices) {
            IndexWidth::U16 => IndexBuffer::U16(indices.into_iter().map(|i| i as u16).collect()),
            IndexWidth::U32 => IndexBuffer::U32(indices),
        }
    }

    pub fn width(&self) -> IndexWidth {
        match self {
            IndexBuffer::U16(_) => IndexWidth::U16,
            IndexBuffer::U32(_) => IndexWidth::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(array) => array.len(),
            IndexBuffer::U32(array) => array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Option<usize> {
        match self {
            IndexBuffer::U16(array) => array.get(i).map(|&v| v as usize),
            IndexBuffer::U32(array) => array.get(i).map(|&v| v as usize),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    pub fn max_index(&self) -> Option<usize> {
        self.iter().max()
    }

    /// Complete triangles; a trailing partial triangle is ignored
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (0..self.len() / 3).filter_map(move |t| {
            Some([self.get(3 * t)?, self.get(3 * t + 1)?, self.get(3 * t + 2)?])
        })
    }
}

/// Geometry of one mesh leaf with its GPU buffers
#[derive(Debug)]
pub struct BufferGeometry {
    positions: Vec<f32>,
    normals: Option<Vec<f32>>,
    index: IndexBuffer,
    buffers: Vec<ResourceHandle>,
}

impl BufferGeometry {
    /// Upload buffers: position, normal (when present) and index
    pub fn upload(
        positions: Vec<f32>,
        normals: Option<Vec<f32>>,
        index: IndexBuffer,
        tracker: &ResourceTracker,
    ) -> Self {
        let buffer_count = 2 + usize::from(normals.is_some());
        let buffers = (0..buffer_count)
            .map(|_| tracker.allocate(ResourceKind::Buffer))
            .collect();

        Self {
            positions,
            normals,
            index,
            buffers,
        }
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn normals(&self) -> Option<&[f32]> {
        self.normals.as_deref()
    }

    pub fn index(&self) -> &IndexBuffer {
        &self.index
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.index.len() / 3
    }

    /// Position of vertex `i`, widened to f64
    pub fn position(&self, i: usize) -> Option<Vector3<f64>> {
        let p = self.positions.get(3 * i..3 * i + 3)?;
        Some(Vector3::new(p[0] as f64, p[1] as f64, p[2] as f64))
    }

    /// Vertex triplets of every triangle whose indices are in range
    pub fn triangle_positions(&self) -> impl Iterator<Item = [Vector3<f64>; 3]> + '_ {
        self.index.triangles().filter_map(move |[a, b, c]| {
            Some([self.position(a)?, self.position(b)?, self.position(c)?])
        })
    }

    /// Smooth per-vertex normals: area-weighted sum of adjacent face normals.
    ///
    /// Not applied by the scene builder; for consumers that need normals on
    /// meshes imported without them.
    pub fn compute_vertex_normals(&self) -> Vec<f32> {
        let mut sums = vec![Vector3::<f64>::zeros(); self.vertex_count()];

        for [a, b, c] in self.index.triangles() {
            let (Some(pa), Some(pb), Some(pc)) =
                (self.position(a), self.position(b), self.position(c))
            else {
                continue;
            };
            // Unnormalized cross product weights by twice the triangle area
            let face = (pb - pa).cross(&(pc - pa));
            sums[a] += face;
            sums[b] += face;
            sums[c] += face;
        }

        sums.into_iter()
            .flat_map(|n| {
                let n = n.try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
                [n.x as f32, n.y as f32, n.z as f32]
            })
            .collect()
    }

    /// Number of GPU buffers still held
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Release every GPU buffer; returns how many were released
    pub fn release_buffers(&mut self) -> usize {
        self.buffers
            .drain(..)
            .map(ResourceHandle::release)
            .filter(|released| *released)
            .count()
    }
}
