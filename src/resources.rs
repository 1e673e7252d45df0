// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! GPU-backed resource bookkeeping
//!
//! Every buffer, material and texture in a live scene holds a
//! [`ResourceHandle`] allocated from a [`ResourceTracker`]. Handles are not
//! `Clone` and releasing one consumes it, so a resource can only be released
//! once through its owner.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Kind of GPU resource behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Buffer,
    Material,
    Texture,
}

#[derive(Default)]
struct TrackerInner {
    next_id: AtomicU64,
    live: DashMap<u64, ResourceKind>,
    allocated: AtomicU64,
    released: AtomicU64,
    stale_releases: AtomicU64,
}

/// Snapshot of tracker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStats {
    pub live: usize,
    pub allocated: u64,
    pub released: u64,
    /// Releases of ids that were not live. Always zero unless handles were forged.
    pub stale_releases: u64,
}

/// Shared registry of live GPU resources
#[derive(Clone, Default)]
pub struct ResourceTracker {
    inner: Arc<TrackerInner>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new handle of the given kind
    pub fn allocate(&self, kind: ResourceKind) -> ResourceHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.live.insert(id, kind);
        self.inner.allocated.fetch_add(1, Ordering::Relaxed);
        ResourceHandle {
            id,
            kind,
            tracker: Arc::clone(&self.inner),
        }
    }

    /// Whether `id` is still live
    pub fn is_live(&self, id: u64) -> bool {
        self.inner.live.contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.inner.live.len()
    }

    pub fn live_count_of(&self, kind: ResourceKind) -> usize {
        self.inner
            .live
            .iter()
            .filter(|entry| *entry.value() == kind)
            .count()
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            live: self.inner.live.len(),
            allocated: self.inner.allocated.load(Ordering::Relaxed),
            released: self.inner.released.load(Ordering::Relaxed),
            stale_releases: self.inner.stale_releases.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for ResourceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTracker")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Ownership token for one live GPU resource
pub struct ResourceHandle {
    id: u64,
    kind: ResourceKind,
    tracker: Arc<TrackerInner>,
}

impl ResourceHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Release the resource. Returns `false` if it was not live.
    pub fn release(self) -> bool {
        if self.tracker.live.remove(&self.id).is_some() {
            self.tracker.released.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            self.tracker.stale_releases.fetch_add(1, Ordering::Relaxed);
            log::warn!("release of {:?} #{} which is not live", self.kind, self.id);
            false
        }
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.id)
    }
}
