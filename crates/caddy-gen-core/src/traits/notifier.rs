// # Notifier Trait
//
// Defines the interface for the post-write action, typically asking a
// running Caddy container to reload its configuration.
//
// ## Implementations
//
// - Docker exec: `caddy-gen-docker` crate
//
// ## Usage
//
// ```rust,ignore
// use caddy_gen_core::{NotifyConfig, Notifier};
//
// let target = NotifyConfig::new("caddy", ["caddy", "reload"]);
// notifier.notify(&target).await?;
// ```

use async_trait::async_trait;

use crate::config::NotifyConfig;

/// Trait for notifier implementations
///
/// # Responsibilities
///
/// The engine calls `notify` at most once per reconcile pass, and only after
/// the new configuration has been written. Implementations run the command
/// once and report the outcome:
///
/// - No retries. A failure is logged by the engine and the pass still counts
///   as successful; the written file is never rolled back.
/// - No decisions about whether to notify; that is owned by `GenEngine`.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Run the configured command inside the target
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The command was started
    /// - `Err(Error)`: The command could not be started
    async fn notify(&self, target: &NotifyConfig) -> Result<(), crate::Error>;

    /// Notifier name (for logging)
    fn notifier_name(&self) -> &'static str;
}
