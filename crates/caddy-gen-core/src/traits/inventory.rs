// # Container Inventory Trait
//
// Defines the interface to the container runtime: a point-in-time listing of
// containers on one network, and a live feed of container lifecycle events.
//
// ## Implementations
//
// - Docker (bollard): `caddy-gen-docker` crate
//
// ## Usage
//
// ```rust,ignore
// use caddy_gen_core::traits::{ContainerInventory, InventoryQuery};
// use tokio_stream::StreamExt;
//
// #[tokio::main]
// async fn main() -> caddy_gen_core::Result<()> {
//     let inventory = /* ContainerInventory implementation */;
//
//     let containers = inventory
//         .list_containers(&InventoryQuery::active_on("gateway"))
//         .await?;
//
//     let mut events = inventory.watch();
//     while let Some(event) = events.next().await {
//         println!("lifecycle event: {:?}", event?);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::pin::Pin;
use tokio_stream::Stream;

/// Container states that take part in routing
pub const ACTIVE_STATES: [&str; 3] = ["created", "restarting", "running"];

/// Read-only snapshot of one container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Runtime identifier
    pub id: String,
    /// Display name, without the runtime's leading `/`
    pub name: String,
    /// Runtime state (e.g. "running")
    pub state: String,
    /// IP address per attached network
    pub networks: HashMap<String, String>,
    /// Container labels
    pub labels: HashMap<String, String>,
}

impl ContainerInfo {
    /// Create a container snapshot with no networks or labels
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: "running".to_string(),
            ..Default::default()
        }
    }

    /// Attach the container to a network with the given address
    pub fn with_network(mut self, network: impl Into<String>, ip: impl Into<String>) -> Self {
        self.networks.insert(network.into(), ip.into());
        self
    }

    /// Set a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Non-empty IP address of this container on `network`
    pub fn ip_on(&self, network: &str) -> Option<&str> {
        self.networks
            .get(network)
            .map(String::as_str)
            .filter(|ip| !ip.is_empty())
    }
}

/// Filter for a container listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryQuery {
    /// Only containers attached to this network
    pub network: String,
    /// Only containers in one of these states
    pub states: Vec<String>,
}

impl InventoryQuery {
    /// Containers on `network` in one of [`ACTIVE_STATES`]
    pub fn active_on(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            states: ACTIVE_STATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Kind of lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleKind {
    Start,
    Stop,
}

impl LifecycleKind {
    /// Map a runtime action name ("start", "stop") to a kind
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// A container start or stop notification
///
/// Only used as a trigger; the engine does not look at the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// What happened
    pub kind: LifecycleKind,
    /// Container the event refers to, if the runtime reported it
    pub container_id: Option<String>,
}

impl LifecycleEvent {
    /// Create a lifecycle event
    pub fn new(kind: LifecycleKind, container_id: Option<String>) -> Self {
        Self { kind, container_id }
    }
}

/// Stream of lifecycle events handed out by [`ContainerInventory::watch`]
pub type LifecycleStream =
    Pin<Box<dyn Stream<Item = Result<LifecycleEvent, crate::Error>> + Send + 'static>>;

/// Trait for container runtime implementations
///
/// # Responsibilities
///
/// Inventories are **observers**. They report what the runtime holds and
/// what changes in it; they never decide when to regenerate output,
/// never retry, and never write files.
///
/// - `list_containers` must apply both filters of the query on the runtime
///   side or locally; the engine trusts the result as-is.
/// - `watch` must only yield container `start` and `stop` events.
/// - Dropping the stream returned by `watch` closes the subscription. Any
///   task spawned to feed it must exit once the stream is dropped.
/// - A stream item `Err(_)` or the end of the stream is treated as fatal by
///   the engine; do not reconnect internally.
#[async_trait]
pub trait ContainerInventory: Send + Sync {
    /// List the containers matching `query`, in runtime order
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ContainerInfo>)`: Snapshot at call time
    /// - `Err(Error)`: Runtime unreachable or request rejected
    async fn list_containers(
        &self,
        query: &InventoryQuery,
    ) -> Result<Vec<ContainerInfo>, crate::Error>;

    /// Subscribe to container start/stop events
    fn watch(&self) -> LifecycleStream;

    /// Runtime name (for logging)
    fn runtime_name(&self) -> &'static str;
}
