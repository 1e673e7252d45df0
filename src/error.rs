// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error taxonomy for the import pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure reported by the decoder running inside a worker.
///
/// Always recoverable by the caller: pick a different file, or fix the
/// module configuration and try again.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DecodeError {
    #[error("STEP buffer is empty")]
    EmptyInput,

    #[error("native decoding module unavailable: {0}")]
    ModuleUnavailable(String),

    #[error("STEP file processing failed: native module returned no result")]
    NoResult,

    #[error("STEP file processing returned no meshes")]
    NoMeshes,

    #[error("mesh {mesh} is malformed: {reason}")]
    InvalidMesh { mesh: usize, reason: String },
}

/// Transport failure between the caller and a worker.
///
/// Recoverable by retrying the whole load with a fresh worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),

    #[error("worker exited without replying")]
    Disconnected,

    #[error("worker replied with a malformed payload: {0}")]
    MalformedPayload(String),

    #[error("no reply from worker within {0:?}")]
    TimedOut(Duration),
}

/// Everything `WorkerBridge::load` can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

impl LoadError {
    /// True when retrying with a fresh worker might succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, LoadError::Worker(_))
    }
}
