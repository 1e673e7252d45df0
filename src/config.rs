// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Configuration for the decoder and the worker bridge

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up by [`StepMeshConfig::load`]
pub const CONFIG_FILE: &str = "stepmesh.toml";

// Timeouts are written as fractional seconds
fn serialize_timeout<S>(timeout: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match timeout {
        Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    Ok(secs.map(Duration::from_secs_f64))
}

/// Where to find the native decoding module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Path of the converter executable
    pub module_path: Option<PathBuf>,
    /// Expected lowercase hex SHA-256 of the module file
    pub module_sha256: Option<String>,
    /// Extra arguments passed to the converter
    pub module_args: Vec<String>,
}

/// Worker bridge behaviour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Upper bound on the wait for a worker reply. `None` waits forever.
    #[serde(
        serialize_with = "serialize_timeout",
        deserialize_with = "deserialize_timeout",
        skip_serializing_if = "Option::is_none"
    )]
    pub reply_timeout: Option<Duration>,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepMeshConfig {
    pub decoder: DecoderConfig,
    pub bridge: BridgeConfig,
}

impl StepMeshConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: StepMeshConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `stepmesh.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Apply `STEPMESH_*` environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(module) = std::env::var("STEPMESH_MODULE") {
            self.decoder.module_path = Some(PathBuf::from(module));
        }

        if let Ok(digest) = std::env::var("STEPMESH_MODULE_SHA256") {
            self.decoder.module_sha256 = Some(digest.to_lowercase());
        }

        if let Ok(timeout) = std::env::var("STEPMESH_REPLY_TIMEOUT_SECS") {
            match timeout.parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs > 0.0 => {
                    self.bridge.reply_timeout = Some(Duration::from_secs_f64(secs));
                }
                _ => log::warn!("ignoring STEPMESH_REPLY_TIMEOUT_SECS={timeout:?}"),
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
