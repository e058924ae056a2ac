//! Test doubles and common utilities for engine contract tests
//!
//! The doubles record how the engine uses them (call counts, overlapping
//! calls) so the tests can assert on scheduling without a container runtime.

#![allow(dead_code)]

use caddy_gen_core::config::{EngineConfig, GenConfig, NotifyConfig};
use caddy_gen_core::engine::EngineEvent;
use caddy_gen_core::error::{Error, Result};
use caddy_gen_core::state::MemoryOutputStore;
use caddy_gen_core::traits::{
    ContainerInfo, ContainerInventory, InventoryQuery, LifecycleEvent, LifecycleKind,
    LifecycleStream, Notifier, OutputStore,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const NETWORK: &str = "gateway";
pub const LABEL: &str = "virtual.bind";

type EventSender = mpsc::UnboundedSender<Result<LifecycleEvent>>;

/// A container inventory driven by the test
pub struct ControlledInventory {
    shared: Shared,
    /// Receiver for the engine's watch stream
    engine_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<Result<LifecycleEvent>>>>>,
    /// Simulated latency of a listing
    list_delay: Option<Duration>,
}

/// Test-side handle onto a [`ControlledInventory`]
#[derive(Clone)]
pub struct InventoryHandle {
    shared: Shared,
    test_tx: Arc<Mutex<Option<EventSender>>>,
}

#[derive(Clone, Default)]
struct Shared {
    containers: Arc<Mutex<Vec<ContainerInfo>>>,
    list_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    fail_listing: Arc<AtomicBool>,
}

impl ControlledInventory {
    /// Create a new controlled inventory
    pub fn new() -> (Self, InventoryHandle) {
        let (test_tx, engine_rx) = mpsc::unbounded_channel();
        let shared = Shared::default();

        let inventory = Self {
            shared: shared.clone(),
            engine_rx: Arc::new(Mutex::new(Some(engine_rx))),
            list_delay: None,
        };
        let handle = InventoryHandle {
            shared,
            test_tx: Arc::new(Mutex::new(Some(test_tx))),
        };

        (inventory, handle)
    }

    /// Make every listing take `delay`
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl ContainerInventory for ControlledInventory {
    async fn list_containers(&self, query: &InventoryQuery) -> Result<Vec<ContainerInfo>> {
        self.shared.list_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }

        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.shared.fail_listing.load(Ordering::SeqCst) {
            return Err(Error::inventory("daemon unreachable"));
        }

        // Same filtering the runtime applies server side
        Ok(self
            .shared
            .containers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.networks.contains_key(&query.network))
            .filter(|c| query.states.iter().any(|s| *s == c.state))
            .cloned()
            .collect())
    }

    fn watch(&self) -> LifecycleStream {
        let rx = self
            .engine_rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");

        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }

    fn runtime_name(&self) -> &'static str {
        "controlled"
    }
}

impl InventoryHandle {
    /// Replace the containers the runtime reports
    pub fn set_containers(&self, containers: Vec<ContainerInfo>) {
        *self.shared.containers.lock().unwrap() = containers;
    }

    /// Number of listings so far (one per reconcile pass)
    pub fn list_calls(&self) -> usize {
        self.shared.list_calls.load(Ordering::SeqCst)
    }

    /// Highest number of listings that overlapped
    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }

    /// Make subsequent listings fail
    pub fn fail_listing(&self, fail: bool) {
        self.shared.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Emit a container start event
    pub fn emit_start(&self, id: &str) {
        self.send(Ok(LifecycleEvent::new(
            LifecycleKind::Start,
            Some(id.to_string()),
        )));
    }

    /// Emit a container stop event
    pub fn emit_stop(&self, id: &str) {
        self.send(Ok(LifecycleEvent::new(
            LifecycleKind::Stop,
            Some(id.to_string()),
        )));
    }

    /// Emit a stream error
    pub fn emit_error(&self, message: &str) {
        self.send(Err(Error::inventory(message)));
    }

    /// End the event stream
    pub fn close_events(&self) {
        self.test_tx.lock().unwrap().take();
    }

    /// Whether the engine dropped its subscription
    pub fn subscription_closed(&self) -> bool {
        self.test_tx
            .lock()
            .unwrap()
            .as_ref()
            .map(|tx| tx.is_closed())
            .unwrap_or(true)
    }

    fn send(&self, item: Result<LifecycleEvent>) {
        if let Some(tx) = self.test_tx.lock().unwrap().as_ref() {
            let _ = tx.send(item);
        }
    }
}

/// A notifier that counts calls
pub struct CountingNotifier {
    calls: Arc<AtomicUsize>,
    targets: Arc<Mutex<Vec<NotifyConfig>>>,
    fail: bool,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            targets: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// A notifier whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Create a new CountingNotifier that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            calls: Arc::clone(&other.calls),
            targets: Arc::clone(&other.targets),
            fail: other.fail,
        }
    }

    /// Get the number of times notify() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Targets notify() was called with
    pub fn targets(&self) -> Vec<NotifyConfig> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for CountingNotifier {
    async fn notify(&self, target: &NotifyConfig) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().push(target.clone());

        if self.fail {
            return Err(Error::notify("exec create failed: no such container"));
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "counting"
    }
}

/// An output store with switchable failures
pub struct FlakyStore {
    inner: MemoryOutputStore,
    fail_read: bool,
    fail_write: bool,
}

impl FlakyStore {
    /// A store whose reads fail
    pub fn unreadable(inner: MemoryOutputStore) -> Self {
        Self {
            inner,
            fail_read: true,
            fail_write: false,
        }
    }

    /// A store whose writes fail
    pub fn unwritable(inner: MemoryOutputStore) -> Self {
        Self {
            inner,
            fail_read: false,
            fail_write: true,
        }
    }
}

#[async_trait::async_trait]
impl OutputStore for FlakyStore {
    async fn read(&self) -> Result<Option<String>> {
        if self.fail_read {
            return Err(Error::output_store("permission denied"));
        }
        self.inner.read().await
    }

    async fn write(&self, content: &str) -> Result<()> {
        if self.fail_write {
            return Err(Error::output_store("read-only file system"));
        }
        self.inner.write(content).await
    }

    fn location(&self) -> String {
        "flaky".to_string()
    }
}

/// A running container on the test network
pub fn container(id: &str, name: &str, ip: &str, binding: &str) -> ContainerInfo {
    ContainerInfo::new(id, name)
        .with_network(NETWORK, ip)
        .with_label(LABEL, binding)
}

/// Helper to create a minimal GenConfig for testing
pub fn minimal_config() -> GenConfig {
    GenConfig {
        network: NETWORK.to_string(),
        label: LABEL.to_string(),
        notify: Some(NotifyConfig::new("caddy", ["caddy", "reload"]).with_working_dir("/etc/caddy")),
        engine: EngineConfig {
            debounce_ms: 1000,
            event_channel_capacity: 100,
            ..EngineConfig::default()
        },
        ..GenConfig::default()
    }
}

/// Drain every event currently buffered
pub fn drain_events(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
