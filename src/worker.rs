// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Decoding on isolated worker threads
//!
//! Every [`WorkerBridge::load`] spawns a fresh thread with its own
//! [`NativeDecoder`]. The STEP bytes move into the thread, and exactly one
//! reply comes back over a bounded channel: a serialized scene document or
//! a decode error. The caller side parses the document and uploads it into
//! live resources.
//!
//! There is no pool, no queue and no cancellation. Unless a reply timeout is
//! configured, a worker that never replies leaves the load pending forever.

use crate::config::{DecoderConfig, StepMeshConfig};
use crate::decoder::{ModuleLoader, NativeDecoder, ProcessModuleLoader};
use crate::error::{DecodeError, LoadError, WorkerError};
use crate::resources::ResourceTracker;
use crate::scene::{SceneBuilder, SceneDocument, SceneNode};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, TryRecvError};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread;
use std::time::Duration;

/// The single message a worker sends back
#[derive(Debug)]
enum WorkerReply {
    Scene(String),
    Failed(DecodeError),
    Unserializable(String),
}

type WakerSlot = Arc<Mutex<Option<Waker>>>;

/// Wakes the pending future when the worker exits, including by panic
struct WakeOnExit(WakerSlot);

impl Drop for WakeOnExit {
    fn drop(&mut self) {
        if let Some(waker) = self.0.lock().take() {
            waker.wake();
        }
    }
}

/// Runs STEP decoding on one-shot worker threads
pub struct WorkerBridge {
    loader: Arc<dyn ModuleLoader>,
    decoder_config: DecoderConfig,
    reply_timeout: Option<Duration>,
    builder: SceneBuilder,
    tracker: ResourceTracker,
    spawned: AtomicUsize,
}

impl WorkerBridge {
    pub fn new(loader: Arc<dyn ModuleLoader>, config: StepMeshConfig) -> Self {
        Self {
            loader,
            decoder_config: config.decoder,
            reply_timeout: config.bridge.reply_timeout,
            builder: SceneBuilder::default(),
            tracker: ResourceTracker::new(),
            spawned: AtomicUsize::new(0),
        }
    }

    /// Bridge whose workers run the external converter named in `config`
    pub fn with_process_module(config: StepMeshConfig) -> Self {
        Self::new(Arc::new(ProcessModuleLoader), config)
    }

    /// Share an existing tracker instead of the bridge's own
    pub fn with_tracker(mut self, tracker: ResourceTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_builder(mut self, builder: SceneBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Tracker that owns the resources of every scene this bridge produces
    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// Number of worker threads started so far
    pub fn workers_spawned(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }

    /// Start decoding `bytes` on a new worker.
    ///
    /// The buffer is moved into the worker. Await the returned
    /// [`PendingLoad`] or call [`PendingLoad::wait`].
    pub fn load(&self, bytes: Vec<u8>) -> PendingLoad {
        let worker_id = self.spawned.fetch_add(1, Ordering::Relaxed) + 1;
        let name = format!("stepmesh-worker-{worker_id}");
        let (tx, rx) = channel::bounded::<WorkerReply>(1);
        let waker: WakerSlot = Arc::new(Mutex::new(None));

        let loader = Arc::clone(&self.loader);
        let config = self.decoder_config.clone();
        let builder = self.builder.clone();
        let wake = WakeOnExit(Arc::clone(&waker));

        log::debug!("spawning {name} for {} bytes", bytes.len());
        let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
            let _wake = wake;
            let tx = tx;
            let reply = run_job(bytes, loader, config, &builder);
            // The caller may have stopped waiting
            let _ = tx.send(reply);
        });

        let (reply, spawn_error) = match spawned {
            Ok(_) => (Some(rx), None),
            Err(e) => {
                log::warn!("failed to spawn {name}: {e}");
                (None, Some(WorkerError::Spawn(e.to_string())))
            }
        };

        PendingLoad {
            name,
            reply,
            spawn_error,
            waker,
            tracker: self.tracker.clone(),
            timeout: self.reply_timeout,
        }
    }

    /// Load and block until the worker replies
    pub fn load_blocking(&self, bytes: Vec<u8>) -> Result<SceneNode, LoadError> {
        self.load(bytes).wait()
    }
}

/// Worker body: decode, build and serialize
fn run_job(
    bytes: Vec<u8>,
    loader: Arc<dyn ModuleLoader>,
    config: DecoderConfig,
    builder: &SceneBuilder,
) -> WorkerReply {
    let mut decoder = NativeDecoder::new(loader, config);
    let meshes = match decoder.decode(&bytes) {
        Ok(meshes) => meshes,
        Err(e) => return WorkerReply::Failed(e),
    };
    drop(bytes);

    match builder.build(meshes).to_json() {
        Ok(json) => WorkerReply::Scene(json),
        Err(e) => WorkerReply::Unserializable(e.to_string()),
    }
}

/// A load in flight. Resolves once, with the live scene or the failure.
pub struct PendingLoad {
    name: String,
    reply: Option<Receiver<WorkerReply>>,
    spawn_error: Option<WorkerError>,
    waker: WakerSlot,
    tracker: ResourceTracker,
    timeout: Option<Duration>,
}

impl PendingLoad {
    /// Name of the worker thread serving this load
    pub fn worker_name(&self) -> &str {
        &self.name
    }

    /// Block until the reply arrives, bounded by the configured timeout
    pub fn wait(self) -> Result<SceneNode, LoadError> {
        match self.timeout {
            Some(timeout) => self.wait_timeout(timeout),
            None => self.wait_forever(),
        }
    }

    fn wait_forever(mut self) -> Result<SceneNode, LoadError> {
        let rx = self.take_receiver()?;
        let reply = rx.recv().map_err(|_| WorkerError::Disconnected)?;
        self.finish(reply)
    }

    /// Block for at most `timeout`. The worker keeps running on timeout.
    pub fn wait_timeout(mut self, timeout: Duration) -> Result<SceneNode, LoadError> {
        let rx = self.take_receiver()?;
        match rx.recv_timeout(timeout) {
            Ok(reply) => self.finish(reply),
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("{} did not reply within {timeout:?}", self.name);
                Err(WorkerError::TimedOut(timeout).into())
            }
            Err(RecvTimeoutError::Disconnected) => Err(WorkerError::Disconnected.into()),
        }
    }

    fn take_receiver(&mut self) -> Result<Receiver<WorkerReply>, LoadError> {
        if let Some(err) = self.spawn_error.take() {
            return Err(err.into());
        }
        self.reply
            .take()
            .ok_or_else(|| WorkerError::Disconnected.into())
    }

    fn finish(&self, reply: WorkerReply) -> Result<SceneNode, LoadError> {
        match reply {
            WorkerReply::Scene(json) => {
                let document = SceneDocument::from_json(&json)?;
                log::debug!("{} replied with {} meshes", self.name, document.mesh_count());
                Ok(document.realize(&self.tracker))
            }
            WorkerReply::Failed(e) => {
                log::warn!("{} failed to decode: {e}", self.name);
                Err(e.into())
            }
            WorkerReply::Unserializable(e) => Err(WorkerError::MalformedPayload(e).into()),
        }
    }
}

impl Future for PendingLoad {
    type Output = Result<SceneNode, LoadError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(err) = this.spawn_error.take() {
            return Poll::Ready(Err(err.into()));
        }

        let Some(rx) = this.reply.as_ref() else {
            return Poll::Ready(Err(WorkerError::Disconnected.into()));
        };

        // Register before checking so a reply sent in between still wakes us
        *this.waker.lock() = Some(cx.waker().clone());

        let received = rx.try_recv();
        match received {
            Ok(reply) => {
                this.reply = None;
                Poll::Ready(this.finish(reply))
            }
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => {
                this.reply = None;
                Poll::Ready(Err(WorkerError::Disconnected.into()))
            }
        }
    }
}
