//! Core caddy-gen engine
//!
//! The GenEngine is responsible for:
//! - Watching container lifecycle events via ContainerInventory
//! - Debouncing bursts of events into single reconcile passes
//! - Regenerating the Caddy configuration from container labels
//! - Writing it via OutputStore and notifying only when the text changed
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ ContainerInventory │─── LifecycleEvent ───┐
//! └────────────────────┘                      │
//!                                             ▼
//!                                    ┌──────────────┐
//!                                    │  Debouncer   │
//!                                    └──────────────┘
//!                                             │ quiet window elapsed
//!                                             ▼
//!                                    ┌──────────────┐
//!                                    │  GenEngine   │
//!                                    │  reconcile() │
//!                                    └──────────────┘
//!                                             │
//!         ┌───────────────────────────────────┼──────────────────────────┐
//!         │                                   │                          │
//!         ▼                                   ▼                          ▼
//! ┌────────────────────┐            ┌──────────────┐            ┌─────────────┐
//! │ ContainerInventory │            │ OutputStore  │            │  Notifier   │
//! │ (list)             │            │ (diff/write) │            │  (reload)   │
//! └────────────────────┘            └──────────────┘            └─────────────┘
//! ```
//!
//! ## Reconcile Pass
//!
//! 1. List containers on the network in an active state
//! 2. Parse each container's label into bindings (bad bindings are skipped)
//! 3. Group by hostname list and render
//! 4. Read the previous output (missing or unreadable counts as empty)
//! 5. Identical: log and stop. Different: write, then notify.

pub mod debounce;

pub use debounce::{DebounceState, Debouncer};

use crate::binding::{BindingSpec, container_bindings};
use crate::config::{GenConfig, NotifyConfig};
use crate::error::{Error, Result};
use crate::render::{Renderer, group_routes};
use crate::traits::{ContainerInventory, InventoryQuery, Notifier, OutputStore};
use std::future::Future;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Events emitted by the GenEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started watching
    Started {
        network: String,
    },

    /// A binding was skipped during a pass
    BindingRejected {
        container: String,
        reason: String,
    },

    /// New configuration written
    ConfigWritten {
        location: String,
        bindings: usize,
        groups: usize,
    },

    /// Rendered configuration matched the stored one
    ConfigUnchanged,

    /// Notify command started
    NotifySucceeded {
        container_id: String,
    },

    /// Notify command failed (the write stands)
    NotifyFailed {
        container_id: String,
        error: String,
    },

    /// Reconcile pass aborted
    PassFailed {
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Result of one reconcile pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The output changed and was rewritten
    Written { bindings: usize, groups: usize },
    /// The output already matched
    Unchanged,
}

/// Rendered configuration for the current inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedConfig {
    /// Caddyfile text
    pub text: String,
    /// Number of bindings rendered
    pub bindings: usize,
    /// Number of host blocks rendered
    pub groups: usize,
}

/// Core caddy-gen engine
///
/// The engine is the application context: it owns the runtime handles, the
/// output store and the debounce state, and is passed explicitly to whatever
/// drives it.
///
/// ## Lifecycle
///
/// 1. Create with [`GenEngine::new()`]
/// 2. Start with [`GenEngine::run()`] or [`GenEngine::run_until()`]
/// 3. Engine runs until the shutdown future resolves or the event stream fails
///
/// ## Concurrency
///
/// Passes run inline on the watcher loop and are awaited before the next
/// event is read, so two passes never overlap. Events that arrive during a
/// pass wait in the stream and re-arm the debouncer afterwards, which leaves
/// at most one pass pending.
pub struct GenEngine {
    /// Container runtime
    inventory: Box<dyn ContainerInventory>,

    /// Post-write action
    notifier: Box<dyn Notifier>,

    /// Destination of the rendered configuration
    store: Box<dyn OutputStore>,

    /// Network to scan
    network: String,

    /// Label holding the binding string
    label: String,

    /// Notify target (None disables notification)
    notify: Option<NotifyConfig>,

    renderer: Renderer,

    debouncer: Debouncer,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl GenEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `inventory`: Container runtime implementation
    /// - `notifier`: Notifier implementation
    /// - `store`: Output store implementation
    /// - `config`: caddy-gen configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        inventory: Box<dyn ContainerInventory>,
        notifier: Box<dyn Notifier>,
        store: Box<dyn OutputStore>,
        config: GenConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            inventory,
            notifier,
            store,
            renderer: Renderer::new(config.engine.matcher_prefix.clone()),
            debouncer: Debouncer::new(config.engine.debounce_window()),
            network: config.network,
            label: config.label,
            notify: config.notify,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run until Ctrl-C
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until the given oneshot fires (or its sender is dropped)
    ///
    /// `None` behaves like [`GenEngine::run()`].
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        match shutdown_rx {
            Some(rx) => {
                self.run_until(async {
                    let _ = rx.await;
                })
                .await
            }
            None => self.run().await,
        }
    }

    /// Watch lifecycle events and reconcile until `shutdown` resolves
    ///
    /// One pass is scheduled at startup. Returns `Ok(())` on shutdown and
    /// `Err` when the event stream fails or ends.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.emit_event(EngineEvent::Started {
            network: self.network.clone(),
        });

        let mut events = self.inventory.watch();
        info!(
            network = %self.network,
            "Waiting for {} events...",
            self.inventory.runtime_name()
        );

        // Initial pass goes through the debouncer like any other trigger
        self.debouncer.trigger(Instant::now());

        tokio::pin!(shutdown);

        let result = loop {
            let deadline = self.debouncer.deadline();

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }

                item = events.next() => match item {
                    Some(Ok(event)) => {
                        debug!(kind = ?event.kind, container = ?event.container_id, "Lifecycle event");
                        self.debouncer.trigger(Instant::now());
                    }
                    Some(Err(e)) => {
                        error!("Error receiving events: {}", e);
                        break Err(e);
                    }
                    None => {
                        error!("Event stream ended");
                        break Err(Error::inventory("event stream ended"));
                    }
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.debouncer.fire(Instant::now()) {
                        self.run_pass().await;
                    }
                }
            }
        };

        // Close the subscription before reporting the stop
        drop(events);
        if self.debouncer.is_pending() {
            debug!("Dropping pending reconcile pass");
            self.debouncer.cancel();
        }

        let reason = match &result {
            Ok(()) => "Shutdown signal".to_string(),
            Err(e) => e.to_string(),
        };
        self.emit_event(EngineEvent::Stopped { reason });
        info!("Engine stopped");

        result
    }

    /// Run one reconcile pass
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileOutcome)`: Pass completed
    /// - `Err(Error)`: Listing or writing failed; nothing was notified
    pub async fn reconcile(&self) -> Result<ReconcileOutcome> {
        let generated = self.generate().await?;

        let previous = match self.store.read().await {
            Ok(content) => content.unwrap_or_default(),
            Err(e) => {
                debug!("Previous output unreadable, treating as empty: {}", e);
                String::new()
            }
        };

        if generated.text == previous {
            info!("No change, skip notifying");
            self.emit_event(EngineEvent::ConfigUnchanged);
            return Ok(ReconcileOutcome::Unchanged);
        }

        self.store.write(&generated.text).await?;
        let location = self.store.location();
        info!(
            bindings = generated.bindings,
            groups = generated.groups,
            "Config written: {}",
            location
        );
        self.emit_event(EngineEvent::ConfigWritten {
            location,
            bindings: generated.bindings,
            groups: generated.groups,
        });

        self.notify().await;

        Ok(ReconcileOutcome::Written {
            bindings: generated.bindings,
            groups: generated.groups,
        })
    }

    /// Render the configuration for the current inventory without writing it
    pub async fn generate(&self) -> Result<GeneratedConfig> {
        let query = InventoryQuery::active_on(self.network.as_str());
        let containers = self.inventory.list_containers(&query).await.map_err(|e| {
            Error::inventory(format!("failed to list containers: {}", e))
        })?;
        debug!(count = containers.len(), "Listed containers");

        let mut bindings: Vec<BindingSpec> = Vec::new();
        for container in &containers {
            for parsed in container_bindings(container, &self.label, &self.network) {
                match parsed {
                    Ok(spec) => bindings.push(spec),
                    Err(e) => {
                        warn!(container = %container.name, "Skipping binding: {}", e);
                        self.emit_event(EngineEvent::BindingRejected {
                            container: container.name.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        let binding_count = bindings.len();
        let groups = group_routes(bindings);

        Ok(GeneratedConfig {
            text: self.renderer.render(&groups),
            bindings: binding_count,
            groups: groups.len(),
        })
    }

    /// Run a pass from the watcher loop; failures are logged, not returned
    async fn run_pass(&self) {
        if let Err(e) = self.reconcile().await {
            error!("Failed to reconcile: {}", e);
            self.emit_event(EngineEvent::PassFailed {
                error: e.to_string(),
            });
        }
    }

    /// Invoke the notifier if a target is configured
    async fn notify(&self) {
        let Some(target) = &self.notify else {
            return;
        };

        info!(
            container_id = %target.container_id,
            command = ?target.command,
            "Notify via {}",
            self.notifier.notifier_name()
        );

        match self.notifier.notify(target).await {
            Ok(()) => self.emit_event(EngineEvent::NotifySucceeded {
                container_id: target.container_id.clone(),
            }),
            Err(e) => {
                error!(container_id = %target.container_id, "Failed to notify: {}", e);
                self.emit_event(EngineEvent::NotifyFailed {
                    container_id: target.container_id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        send_event(&self.event_tx, event);
    }
}

/// Hand an event to the consumer without blocking
///
/// Returns `true` when the event was delivered. A full channel drops the
/// event with a warning; a dropped receiver means nobody listens, which is
/// not worth reporting.
fn send_event(tx: &mpsc::Sender<EngineEvent>, event: EngineEvent) -> bool {
    match tx.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}
