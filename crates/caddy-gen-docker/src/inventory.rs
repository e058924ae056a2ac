//! Container listing and lifecycle events over the Docker API

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::ListContainersOptions;
use bollard::models::{ContainerSummary, EventMessage};
use bollard::system::EventsOptions;
use caddy_gen_core::Error;
use caddy_gen_core::traits::{
    ContainerInfo, ContainerInventory, InventoryQuery, LifecycleEvent, LifecycleKind,
    LifecycleStream,
};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, trace, warn};

/// Lifecycle events buffered between the pump task and the engine
const EVENT_BUFFER: usize = 64;

/// Docker-backed container inventory
#[derive(Debug, Clone)]
pub struct DockerInventory {
    docker: Docker,
}

impl DockerInventory {
    /// Create an inventory on top of a connected client
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ContainerInventory for DockerInventory {
    async fn list_containers(&self, query: &InventoryQuery) -> Result<Vec<ContainerInfo>, Error> {
        let summaries = self
            .docker
            .list_containers(Some(list_options(query)))
            .await
            .map_err(|e| Error::inventory(format!("Failed to list containers: {}", e)))?;

        trace!(count = summaries.len(), network = %query.network, "Docker listing");
        Ok(summaries.into_iter().map(container_from_summary).collect())
    }

    fn watch(&self) -> LifecycleStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let docker = self.docker.clone();

        tokio::spawn(async move {
            let events = docker.events(Some(events_options()));
            tokio::pin!(events);

            loop {
                tokio::select! {
                    // Subscriber gone: stop reading and drop the HTTP stream
                    _ = tx.closed() => {
                        debug!("Event subscriber dropped, closing Docker event stream");
                        break;
                    }

                    item = events.next() => match item {
                        Some(Ok(message)) => {
                            let Some(event) = lifecycle_from_message(&message) else {
                                continue;
                            };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            warn!("Docker event stream failed: {}", e);
                            let _ = tx
                                .send(Err(Error::inventory(format!("Docker event stream failed: {}", e))))
                                .await;
                            break;
                        }
                        None => {
                            debug!("Docker event stream ended");
                            break;
                        }
                    },
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }

    fn runtime_name(&self) -> &'static str {
        "docker"
    }
}

fn list_options(query: &InventoryQuery) -> ListContainersOptions<String> {
    let mut filters = HashMap::new();
    filters.insert("network".to_string(), vec![query.network.clone()]);
    filters.insert("status".to_string(), query.states.clone());

    ListContainersOptions {
        all: true,
        filters,
        ..Default::default()
    }
}

fn events_options() -> EventsOptions<String> {
    let mut filters = HashMap::new();
    filters.insert("type".to_string(), vec!["container".to_string()]);
    filters.insert(
        "event".to_string(),
        vec!["start".to_string(), "stop".to_string()],
    );

    EventsOptions {
        filters,
        ..Default::default()
    }
}

/// Map a Docker container summary to a [`ContainerInfo`]
///
/// Docker reports names with a leading `/`; it is stripped. Containers
/// without a name fall back to their id.
pub fn container_from_summary(summary: ContainerSummary) -> ContainerInfo {
    let id = summary.id.unwrap_or_default();
    let name = summary
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|name| name.trim_start_matches('/').to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| id.clone());

    let networks = summary
        .network_settings
        .and_then(|settings| settings.networks)
        .unwrap_or_default()
        .into_iter()
        .map(|(network, endpoint)| (network, endpoint.ip_address.unwrap_or_default()))
        .collect();

    ContainerInfo {
        id,
        name,
        state: summary.state.unwrap_or_default(),
        networks,
        labels: summary.labels.unwrap_or_default(),
    }
}

/// Map a Docker event to a lifecycle event
///
/// Returns `None` for anything but container start and stop.
pub fn lifecycle_from_message(message: &EventMessage) -> Option<LifecycleEvent> {
    let kind = message.action.as_deref().and_then(LifecycleKind::from_action)?;
    let container_id = message.actor.as_ref().and_then(|actor| actor.id.clone());

    Some(LifecycleEvent::new(kind, container_id))
}
