// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Release of GPU resources held by a scene tree

use crate::scene::{Material, MeshNode, SceneNode, TextureRole};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action run for a texture slot. Returns whether a texture was released.
pub type TextureRelease = fn(&mut Material, TextureRole) -> bool;

fn release_slot(material: &mut Material, role: TextureRole) -> bool {
    material
        .take_texture(role)
        .is_some_and(|texture| texture.release())
}

/// Texture slots released on dispose, in order
pub const TEXTURE_RELEASE_TABLE: [(TextureRole, TextureRelease); 15] = [
    (TextureRole::Map, release_slot),
    (TextureRole::LightMap, release_slot),
    (TextureRole::BumpMap, release_slot),
    (TextureRole::NormalMap, release_slot),
    (TextureRole::SpecularMap, release_slot),
    (TextureRole::EnvMap, release_slot),
    (TextureRole::AlphaMap, release_slot),
    (TextureRole::AoMap, release_slot),
    (TextureRole::DisplacementMap, release_slot),
    (TextureRole::EmissiveMap, release_slot),
    (TextureRole::GradientMap, release_slot),
    (TextureRole::MetalnessMap, release_slot),
    (TextureRole::RoughnessMap, release_slot),
    (TextureRole::TransmissionMap, release_slot),
    (TextureRole::OpacityMap, release_slot),
];

/// Counts of resources released by one dispose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposeReport {
    pub buffers: usize,
    pub materials: usize,
    pub textures: usize,
}

impl DisposeReport {
    pub fn total(&self) -> usize {
        self.buffers + self.materials + self.textures
    }
}

/// Releases geometry buffers, materials and bound textures of a tree.
///
/// Disposing the same tree twice is a no-op the second time.
#[derive(Clone)]
pub struct ResourceReclaimer {
    table: Vec<(TextureRole, TextureRelease)>,
}

impl fmt::Debug for ResourceReclaimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.table.iter().map(|(role, _)| role.as_str()))
            .finish()
    }
}

impl Default for ResourceReclaimer {
    fn default() -> Self {
        Self {
            table: TEXTURE_RELEASE_TABLE.to_vec(),
        }
    }
}

impl ResourceReclaimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace or add the release action for a slot
    pub fn with_slot(mut self, role: TextureRole, release: TextureRelease) -> Self {
        match self.table.iter_mut().find(|(r, _)| *r == role) {
            Some(entry) => entry.1 = release,
            None => self.table.push((role, release)),
        }
        self
    }

    pub fn roles(&self) -> impl Iterator<Item = TextureRole> + '_ {
        self.table.iter().map(|(role, _)| *role)
    }

    /// Release everything the tree still holds
    pub fn dispose(&self, scene: &mut SceneNode) -> DisposeReport {
        let mut report = DisposeReport::default();
        scene.for_each_mesh_mut(&mut |mesh| self.dispose_mesh(mesh, &mut report));

        if report.total() > 0 {
            log::debug!(
                "disposed {:?}: {} buffers, {} materials, {} textures",
                scene.name(),
                report.buffers,
                report.materials,
                report.textures
            );
        }
        report
    }

    fn dispose_mesh(&self, mesh: &mut MeshNode, report: &mut DisposeReport) {
        report.buffers += mesh.geometry.release_buffers();

        if mesh.material.release() {
            report.materials += 1;
        }

        for (role, release) in &self.table {
            if release(&mut mesh.material, *role) {
                report.textures += 1;
            }
        }
    }
}
