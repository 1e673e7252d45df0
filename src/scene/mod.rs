// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene graph: geometry, materials, nodes and the worker wire form

mod builder;
mod document;
mod geometry;
mod material;
mod node;

pub use builder::{SceneBuilder, DEFAULT_ROOT_NAME};
pub use document::{MeshData, SceneDocument, FORMAT_VERSION};
pub use geometry::{BufferGeometry, IndexBuffer, IndexWidth, U16_INDEX_LIMIT};
pub use material::{Color, Material, MaterialKind, Texture, TextureRole, DEFAULT_MESH_COLOR};
pub use node::{MeshNode, SceneNode};
