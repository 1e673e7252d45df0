// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Color-only surface materials and their texture slots

use crate::resources::{ResourceHandle, ResourceKind, ResourceTracker};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default color for meshes imported without one
pub const DEFAULT_MESH_COLOR: u32 = 0xf0f0f0;

/// Linear RGB color with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// From a `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex(&self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::from_hex(DEFAULT_MESH_COLOR)
    }
}

impl From<[f32; 3]> for Color {
    fn from(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

/// Texture slot on a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TextureRole {
    Map,
    LightMap,
    BumpMap,
    NormalMap,
    SpecularMap,
    EnvMap,
    AlphaMap,
    AoMap,
    DisplacementMap,
    EmissiveMap,
    GradientMap,
    MetalnessMap,
    RoughnessMap,
    TransmissionMap,
    OpacityMap,
}

impl TextureRole {
    pub const ALL: [TextureRole; 15] = [
        TextureRole::Map,
        TextureRole::LightMap,
        TextureRole::BumpMap,
        TextureRole::NormalMap,
        TextureRole::SpecularMap,
        TextureRole::EnvMap,
        TextureRole::AlphaMap,
        TextureRole::AoMap,
        TextureRole::DisplacementMap,
        TextureRole::EmissiveMap,
        TextureRole::GradientMap,
        TextureRole::MetalnessMap,
        TextureRole::RoughnessMap,
        TextureRole::TransmissionMap,
        TextureRole::OpacityMap,
    ];

    /// Slot name as used by scene-graph material properties
    pub fn as_str(&self) -> &'static str {
        match self {
            TextureRole::Map => "map",
            TextureRole::LightMap => "lightMap",
            TextureRole::BumpMap => "bumpMap",
            TextureRole::NormalMap => "normalMap",
            TextureRole::SpecularMap => "specularMap",
            TextureRole::EnvMap => "envMap",
            TextureRole::AlphaMap => "alphaMap",
            TextureRole::AoMap => "aoMap",
            TextureRole::DisplacementMap => "displacementMap",
            TextureRole::EmissiveMap => "emissiveMap",
            TextureRole::GradientMap => "gradientMap",
            TextureRole::MetalnessMap => "metalnessMap",
            TextureRole::RoughnessMap => "roughnessMap",
            TextureRole::TransmissionMap => "transmissionMap",
            TextureRole::OpacityMap => "opacityMap",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }
}

/// Texture bound to a material slot
#[derive(Debug)]
pub struct Texture {
    pub name: String,
    handle: ResourceHandle,
}

impl Texture {
    pub fn upload(name: impl Into<String>, tracker: &ResourceTracker) -> Self {
        Self {
            name: name.into(),
            handle: tracker.allocate(ResourceKind::Texture),
        }
    }

    pub fn id(&self) -> u64 {
        self.handle.id()
    }

    pub fn release(self) -> bool {
        self.handle.release()
    }
}

/// Shading model of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialKind {
    Phong,
}

/// Material of one mesh leaf
#[derive(Debug)]
pub struct Material {
    pub kind: MaterialKind,
    pub color: Color,
    textures: BTreeMap<TextureRole, Texture>,
    handle: Option<ResourceHandle>,
}

impl Material {
    /// Phong material with a single color
    pub fn phong(color: Color, tracker: &ResourceTracker) -> Self {
        Self {
            kind: MaterialKind::Phong,
            color,
            textures: BTreeMap::new(),
            handle: Some(tracker.allocate(ResourceKind::Material)),
        }
    }

    /// Bind a texture, returning the one it replaced
    pub fn bind_texture(&mut self, role: TextureRole, texture: Texture) -> Option<Texture> {
        self.textures.insert(role, texture)
    }

    pub fn texture(&self, role: TextureRole) -> Option<&Texture> {
        self.textures.get(&role)
    }

    pub fn take_texture(&mut self, role: TextureRole) -> Option<Texture> {
        self.textures.remove(&role)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Release the material itself (not its textures)
    pub fn release(&mut self) -> bool {
        self.handle.take().is_some_and(ResourceHandle::release)
    }
}
