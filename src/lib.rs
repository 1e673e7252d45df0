// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stepmesh
//!
//! Imports STEP files into scene meshes on isolated worker threads and
//! computes surface area and volume of the result. Decoding is delegated to
//! a native module; scenes own GPU-backed resources until disposed.

pub mod analysis;
pub mod config;
pub mod decoder;
pub mod error;
pub mod reclaim;
pub mod resources;
pub mod scene;
pub mod worker;

pub use analysis::{analyze, stats, surface_area, volume, AnalysisResult, SceneStats};
pub use config::{BridgeConfig, DecoderConfig, StepMeshConfig};
pub use decoder::{ModuleLoader, NativeDecoder, NativeModule, ProcessModuleLoader, RawMesh};
pub use error::{DecodeError, LoadError, WorkerError};
pub use reclaim::{DisposeReport, ResourceReclaimer};
pub use resources::{ResourceKind, ResourceTracker};
pub use scene::{SceneBuilder, SceneNode};
pub use worker::{PendingLoad, WorkerBridge};

use anyhow::{Context, Result};
use std::path::Path;

/// Read a STEP file and load it through `bridge`, blocking until done
pub fn import_step_file(bridge: &WorkerBridge, path: impl AsRef<Path>) -> Result<SceneNode> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read STEP file: {}", path.display()))?;

    bridge
        .load_blocking(bytes)
        .with_context(|| format!("Failed to import STEP file: {}", path.display()))
}
