// # Docker Backend
//
// This crate provides the Docker implementations of the caddy-gen seams:
//
// - `DockerInventory`: lists containers and streams lifecycle events
// - `DockerExecNotifier`: runs the reload command inside a container
// - `connect`: builds a client from `RuntimeConnectionConfig`
//
// ## Boundaries
//
// Backends report and execute; they never decide. Debouncing, change
// detection and the decision to notify stay in `GenEngine`. Nothing here
// retries: a failed request is returned to the engine as-is.
//
// ## API Reference
//
// - List containers: GET `/containers/json?all=true&filters=...`
// - Monitor events: GET `/events?filters=...`
// - Exec: POST `/containers/:id/exec`, POST `/exec/:id/start`

mod connect;
mod exec;
mod inventory;

pub use connect::{
    DEFAULT_HTTP_PORT, DEFAULT_HTTPS_PORT, DEFAULT_TIMEOUT_SECS, Endpoint, TlsFiles, connect,
    endpoint_for,
};
pub use exec::DockerExecNotifier;
pub use inventory::{DockerInventory, container_from_summary, lifecycle_from_message};
