// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Native module backed by an external converter executable.
//!
//! The converter receives the STEP bytes on stdin and writes an importer
//! result as JSON on stdout:
//!
//! ```json
//! { "success": true,
//!   "meshes": [ { "name": "Body", "color": [0.8, 0.1, 0.1],
//!                 "attributes": { "position": { "array": [0, 0, 0, 1, 0, 0, 0, 1, 0] },
//!                                 "normal":   { "array": [0, 0, 1, 0, 0, 1, 0, 0, 1] } },
//!                 "index": { "array": [0, 1, 2] } } ] }
//! ```

use super::{ImportResult, ModuleLoader, NativeModule, RawMesh};
use crate::config::DecoderConfig;
use crate::error::DecodeError;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[derive(Debug, Deserialize)]
struct ArrayBuffer<T> {
    array: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MeshAttributes {
    position: ArrayBuffer<f32>,
    #[serde(default)]
    normal: Option<ArrayBuffer<f32>>,
}

#[derive(Debug, Deserialize)]
struct ImportedMesh {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    color: Option<[f32; 3]>,
    attributes: MeshAttributes,
    index: ArrayBuffer<u32>,
}

#[derive(Debug, Deserialize)]
struct ImportedDocument {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    meshes: Vec<ImportedMesh>,
}

fn default_success() -> bool {
    true
}

impl From<ImportedMesh> for RawMesh {
    fn from(mesh: ImportedMesh) -> Self {
        RawMesh {
            name: mesh.name,
            positions: mesh.attributes.position.array,
            normals: mesh.attributes.normal.map(|n| n.array),
            indices: mesh.index.array,
            color: mesh.color,
        }
    }
}

/// Parse converter output into an [`ImportResult`].
///
/// Returns `None` for unparsable output or `"success": false`.
pub fn parse_import_json(json: &[u8]) -> Option<ImportResult> {
    let document: ImportedDocument = match serde_json::from_slice(json) {
        Ok(document) => document,
        Err(e) => {
            log::warn!("converter output is not a valid import result: {e}");
            return None;
        }
    };

    if !document.success {
        return None;
    }

    Some(ImportResult {
        meshes: document.meshes.into_iter().map(RawMesh::from).collect(),
    })
}

/// Lowercase hex SHA-256 of a file
pub fn file_sha256(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Loads a [`ProcessModule`] from `DecoderConfig::module_path`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessModuleLoader;

impl ProcessModuleLoader {
    fn resolve_path(config: &DecoderConfig) -> Result<PathBuf, DecodeError> {
        config
            .module_path
            .clone()
            .ok_or_else(|| DecodeError::ModuleUnavailable("no module path configured".into()))
    }
}

impl ModuleLoader for ProcessModuleLoader {
    fn load(&self, config: &DecoderConfig) -> Result<Box<dyn NativeModule>, DecodeError> {
        let path = Self::resolve_path(config)?;

        if !path.is_file() {
            return Err(DecodeError::ModuleUnavailable(format!(
                "module not found at {}",
                path.display()
            )));
        }

        let digest = file_sha256(&path).map_err(|e| {
            DecodeError::ModuleUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;

        if let Some(expected) = &config.module_sha256 {
            if !expected.eq_ignore_ascii_case(&digest) {
                return Err(DecodeError::ModuleUnavailable(format!(
                    "checksum mismatch for {}: expected {expected}, found {digest}",
                    path.display()
                )));
            }
        }

        Ok(Box::new(ProcessModule {
            path,
            args: config.module_args.clone(),
            digest,
        }))
    }
}

/// Runs the converter once per `read_step`
#[derive(Debug, Clone)]
pub struct ProcessModule {
    path: PathBuf,
    args: Vec<String>,
    digest: String,
}

impl ProcessModule {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NativeModule for ProcessModule {
    fn version(&self) -> String {
        format!("{} (sha256 {})", self.path.display(), &self.digest[..12])
    }

    fn read_step(&self, bytes: &[u8]) -> Option<ImportResult> {
        let mut child = match Command::new(&self.path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                log::warn!("failed to start {}: {e}", self.path.display());
                return None;
            }
        };

        // Feed stdin from a scoped thread so a converter that writes before
        // draining its input cannot deadlock against us
        let output = std::thread::scope(|scope| {
            let stdin = child.stdin.take();
            scope.spawn(move || {
                if let Some(mut stdin) = stdin {
                    if let Err(e) = stdin.write_all(bytes) {
                        log::warn!("failed to write STEP bytes to converter: {e}");
                    }
                }
            });
            child.wait_with_output()
        });

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                log::warn!("converter {} failed: {e}", self.path.display());
                return None;
            }
        };

        if !output.status.success() {
            log::warn!(
                "converter exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        parse_import_json(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_json() {
        let json = br#"{
            "success": true,
            "meshes": [
                {
                    "name": "Body",
                    "color": [0.5, 0.25, 1.0],
                    "attributes": {
                        "position": { "array": [0, 0, 0, 1, 0, 0, 0, 1, 0] },
                        "normal": { "array": [0, 0, 1, 0, 0, 1, 0, 0, 1] }
                    },
                    "index": { "array": [0, 1, 2] }
                },
                {
                    "attributes": { "position": { "array": [0, 0, 0, 0, 0, 1, 1, 0, 0] } },
                    "index": { "array": [0, 2, 1] }
                }
            ]
        }"#;

        let result = parse_import_json(json).unwrap();
        assert_eq!(result.meshes.len(), 2);

        let body = &result.meshes[0];
        assert_eq!(body.name.as_deref(), Some("Body"));
        assert_eq!(body.color, Some([0.5, 0.25, 1.0]));
        assert_eq!(body.normals.as_ref().map(Vec::len), Some(9));
        assert_eq!(body.indices, vec![0, 1, 2]);

        let bare = &result.meshes[1];
        assert!(bare.normals.is_none());
        assert!(bare.color.is_none());
    }

    #[test]
    fn test_failed_import_is_no_result() {
        assert!(parse_import_json(br#"{ "success": false, "meshes": [] }"#).is_none());
        assert!(parse_import_json(b"not json").is_none());
    }

    #[test]
    fn test_unconfigured_path_is_unavailable() {
        // The environment is folded in by StepMeshConfig::apply_env only
        match ProcessModuleLoader.load(&DecoderConfig::default()) {
            Err(DecodeError::ModuleUnavailable(msg)) => {
                assert_eq!(msg, "no module path configured")
            }
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("loader accepted an unconfigured module"),
        }
    }

    #[test]
    fn test_missing_module_path() {
        let config = DecoderConfig {
            module_path: Some(PathBuf::from("/nonexistent/step-converter")),
            ..DecoderConfig::default()
        };
        match ProcessModuleLoader.load(&config) {
            Err(DecodeError::ModuleUnavailable(msg)) => assert!(msg.contains("not found")),
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("loader accepted a missing module"),
        }
    }

    #[test]
    fn test_checksum_mismatch() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let module = dir.path().join("converter");
        std::fs::write(&module, b"#!/bin/sh\n")?;

        let config = DecoderConfig {
            module_path: Some(module.clone()),
            module_sha256: Some("0".repeat(64)),
            ..DecoderConfig::default()
        };
        assert!(matches!(
            ProcessModuleLoader.load(&config),
            Err(DecodeError::ModuleUnavailable(msg)) if msg.contains("checksum mismatch")
        ));

        let config = DecoderConfig {
            module_sha256: Some(file_sha256(&module)?.to_uppercase()),
            ..config
        };
        assert!(ProcessModuleLoader.load(&config).is_ok());
        Ok(())
    }
}
