// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STEP decoding through a native module

mod native;
mod process;
mod raw_mesh;

pub use native::{ImportResult, ModuleLoader, NativeDecoder, NativeModule};
pub use process::{file_sha256, parse_import_json, ProcessModule, ProcessModuleLoader};
pub use raw_mesh::RawMesh;
