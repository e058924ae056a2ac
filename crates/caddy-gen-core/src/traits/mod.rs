//! Core traits for caddy-gen
//!
//! This module defines the seams to the external collaborators.
//!
//! - [`ContainerInventory`]: List containers and watch lifecycle events
//! - [`Notifier`]: Run the post-write reload action
//! - [`OutputStore`]: Read and replace the generated configuration

pub mod inventory;
pub mod notifier;
pub mod output_store;

pub use inventory::{
    ACTIVE_STATES, ContainerInfo, ContainerInventory, InventoryQuery, LifecycleEvent,
    LifecycleKind, LifecycleStream,
};
pub use notifier::Notifier;
pub use output_store::OutputStore;
