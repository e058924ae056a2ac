//! Configuration types for caddy-gen
//!
//! All settings come from `CADDY_GEN_*` environment variables. The two JSON
//! valued settings (`CADDY_GEN_DOCKER`, `CADDY_GEN_NOTIFY`) are best-effort:
//! a malformed value disables the feature instead of failing startup.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Network to scan
pub const ENV_NETWORK: &str = "CADDY_GEN_NETWORK";
/// Output file path
pub const ENV_OUTFILE: &str = "CADDY_GEN_OUTFILE";
/// Label holding the binding string
pub const ENV_LABEL: &str = "CADDY_GEN_LABEL";
/// JSON runtime connection settings
pub const ENV_DOCKER: &str = "CADDY_GEN_DOCKER";
/// JSON notify target
pub const ENV_NOTIFY: &str = "CADDY_GEN_NOTIFY";
/// Debounce window in milliseconds
pub const ENV_DEBOUNCE_MS: &str = "CADDY_GEN_DEBOUNCE_MS";
/// Log level, read by the daemon before anything else
pub const ENV_LOG_LEVEL: &str = "CADDY_GEN_LOG_LEVEL";

/// Main caddy-gen configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenConfig {
    /// Network whose containers are routed
    pub network: String,

    /// Where the generated configuration is written
    pub output_path: PathBuf,

    /// Container label holding the binding string
    pub label: String,

    /// How to reach the container runtime (runtime defaults when absent)
    pub runtime: Option<RuntimeConnectionConfig>,

    /// Command to run after each write (no-op when absent)
    pub notify: Option<NotifyConfig>,

    /// Engine settings
    pub engine: EngineConfig,
}

impl GenConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            network: default_network(),
            output_path: default_output_path(),
            label: default_label(),
            runtime: None,
            notify: None,
            engine: EngineConfig::default(),
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Unset keys fall back to defaults. Numeric values that do not parse
    /// fall back to defaults as well.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(network) = lookup(ENV_NETWORK) {
            config.network = network;
        }
        if let Some(path) = lookup(ENV_OUTFILE) {
            config.output_path = PathBuf::from(path);
        }
        if let Some(label) = lookup(ENV_LABEL) {
            config.label = label;
        }

        config.runtime = parse_optional_json(lookup(ENV_DOCKER).as_deref());
        config.notify = parse_optional_json::<NotifyConfig>(lookup(ENV_NOTIFY).as_deref())
            .filter(|notify| {
                let usable = notify.is_usable();
                if !usable {
                    tracing::warn!(
                        "Ignoring {}: containerId and command must not be empty",
                        ENV_NOTIFY
                    );
                }
                usable
            });

        if let Some(ms) = lookup(ENV_DEBOUNCE_MS) {
            config.engine.debounce_ms = ms.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid {} '{}', using default", ENV_DEBOUNCE_MS, ms);
                default_debounce_ms()
            });
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.network.trim().is_empty() {
            return Err(crate::Error::config("Network name cannot be empty"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(crate::Error::config("Output path cannot be empty"));
        }
        if self.label.trim().is_empty() {
            return Err(crate::Error::config("Label key cannot be empty"));
        }

        self.engine.validate()?;

        Ok(())
    }
}

impl Default for GenConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Target of the post-write command
///
/// Deserialized from `{"containerId": "...", "workingDir": "...", "command": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyConfig {
    /// Container to run the command in
    pub container_id: String,

    /// Working directory inside the container
    #[serde(default)]
    pub working_dir: Option<String>,

    /// Argument vector
    pub command: Vec<String>,
}

impl NotifyConfig {
    /// Create a notify target
    pub fn new<I, S>(container_id: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            container_id: container_id.into(),
            working_dir: None,
            command: command.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn is_usable(&self) -> bool {
        !self.container_id.trim().is_empty() && !self.command.is_empty()
    }
}

/// How to reach the container runtime
///
/// Mirrors the usual Docker client options: a unix socket path, or a
/// host/port pair over HTTP or HTTPS. HTTPS takes PEM file paths for the
/// client key, client certificate and CA.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConnectionConfig {
    /// Unix socket path (e.g. "/var/run/docker.sock")
    #[serde(default)]
    pub socket_path: Option<String>,

    /// Remote host name or address
    #[serde(default)]
    pub host: Option<String>,

    /// Remote port
    #[serde(default)]
    pub port: Option<u16>,

    /// Remote protocol ("http" or "https")
    #[serde(default)]
    pub protocol: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// CA certificate (PEM path) used to verify an HTTPS daemon
    #[serde(default)]
    pub ca: Option<String>,

    /// Client certificate (PEM path) for HTTPS
    #[serde(default)]
    pub cert: Option<String>,

    /// Client private key (PEM path) for HTTPS
    #[serde(default)]
    pub key: Option<String>,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Quiet period after the last trigger before a pass runs (milliseconds)
    pub debounce_ms: u64,

    /// Prefix of the generated host matcher names
    pub matcher_prefix: String,

    /// Capacity of the engine event channel
    ///
    /// When full, engine events are dropped (with a warning log).
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Debounce window as a duration
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.debounce_ms == 0 {
            return Err(crate::Error::config("Debounce window must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if !self.matcher_prefix.starts_with('@') || self.matcher_prefix.len() < 2 {
            return Err(crate::Error::config(
                "Matcher prefix must start with '@' and name the matcher",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            matcher_prefix: default_matcher_prefix(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Parse an optional JSON setting
///
/// Absent or blank input yields `None`. Malformed input is logged and also
/// yields `None`; it is never an error.
pub fn parse_optional_json<T: DeserializeOwned>(raw: Option<&str>) -> Option<T> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring malformed JSON setting: {}", e);
            None
        }
    }
}

fn default_network() -> String {
    "gateway".to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("docker-sites.caddy")
}

fn default_label() -> String {
    "virtual.bind".to_string()
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_matcher_prefix() -> String {
    "@caddy-gen-".to_string()
}

fn default_event_channel_capacity() -> usize {
    256
}
