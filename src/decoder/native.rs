// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Lazy wrapper around the native STEP decoding module

use super::RawMesh;
use crate::config::DecoderConfig;
use crate::error::DecodeError;
use std::sync::Arc;

/// Output of one native `read_step` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportResult {
    pub meshes: Vec<RawMesh>,
}

/// An initialized native decoding module.
///
/// Implementations must be deterministic: the same bytes always produce the
/// same meshes.
pub trait NativeModule: Send {
    /// Version string reported by the module
    fn version(&self) -> String;

    /// Decode STEP bytes. `None` means the module could not process the file.
    fn read_step(&self, bytes: &[u8]) -> Option<ImportResult>;
}

/// Locates and initializes a [`NativeModule`]
pub trait ModuleLoader: Send + Sync {
    fn load(&self, config: &DecoderConfig) -> Result<Box<dyn NativeModule>, DecodeError>;
}

impl<F> ModuleLoader for F
where
    F: Fn(&DecoderConfig) -> Result<Box<dyn NativeModule>, DecodeError> + Send + Sync,
{
    fn load(&self, config: &DecoderConfig) -> Result<Box<dyn NativeModule>, DecodeError> {
        self(config)
    }
}

/// Decoder owned by a single worker.
///
/// The module is loaded on the first [`decode`](Self::decode) and kept for
/// the decoder's lifetime. Workers are one-shot, so in practice every
/// decode pays for one module load.
pub struct NativeDecoder {
    loader: Arc<dyn ModuleLoader>,
    config: DecoderConfig,
    module: Option<Box<dyn NativeModule>>,
}

impl NativeDecoder {
    pub fn new(loader: Arc<dyn ModuleLoader>, config: DecoderConfig) -> Self {
        Self {
            loader,
            config,
            module: None,
        }
    }

    /// Whether the module has been loaded yet
    pub fn is_initialized(&self) -> bool {
        self.module.is_some()
    }

    fn module(&mut self) -> Result<&dyn NativeModule, DecodeError> {
        if self.module.is_none() {
            let module = self.loader.load(&self.config)?;
            log::info!("native STEP module initialized (version {})", module.version());
            self.module = Some(module);
        }

        self.module
            .as_deref()
            .ok_or_else(|| DecodeError::ModuleUnavailable("module slot empty".into()))
    }

    /// Decode STEP bytes into validated raw meshes
    pub fn decode(&mut self, bytes: &[u8]) -> Result<Vec<RawMesh>, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::EmptyInput);
        }

        let module = self.module()?;
        log::debug!("decoding {} STEP bytes", bytes.len());

        let result = module.read_step(bytes).ok_or(DecodeError::NoResult)?;
        if result.meshes.is_empty() {
            return Err(DecodeError::NoMeshes);
        }

        for (mesh, raw) in result.meshes.iter().enumerate() {
            raw.validate()
                .map_err(|reason| DecodeError::InvalidMesh { mesh, reason })?;
        }

        log::debug!("native module returned {} meshes", result.meshes.len());
        Ok(result.meshes)
    }
}
