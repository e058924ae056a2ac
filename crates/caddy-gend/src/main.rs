// # caddy-gen - Caddy Config Generator Daemon
//
// This is a thin integration layer. Label parsing, rendering, debouncing and
// change detection all live in caddy-gen-core; Docker access lives in
// caddy-gen-docker.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Connecting to Docker and wiring the engine
// 4. Running until SIGTERM/SIGINT
//
// ## Configuration
//
// - `CADDY_GEN_NETWORK`: Network to scan (default: gateway)
// - `CADDY_GEN_OUTFILE`: Output file (default: docker-sites.caddy)
// - `CADDY_GEN_LABEL`: Label holding the bindings (default: virtual.bind)
// - `CADDY_GEN_DOCKER`: JSON connection options, e.g. `{"socketPath": "/var/run/docker.sock"}`
// - `CADDY_GEN_NOTIFY`: JSON notify target, e.g.
//   `{"containerId": "caddy", "workingDir": "/etc/caddy", "command": ["caddy", "reload"]}`
// - `CADDY_GEN_DEBOUNCE_MS`: Quiet window before regenerating (default: 1000)
// - `CADDY_GEN_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export CADDY_GEN_NETWORK=gateway
// export CADDY_GEN_OUTFILE=/data/docker-sites.caddy
// export CADDY_GEN_NOTIFY='{"containerId":"caddy","command":["caddy","reload","--config","/etc/caddy/Caddyfile"]}'
//
// caddy-gen
// ```

use anyhow::{Context, Result};
use caddy_gen_core::config::ENV_LOG_LEVEL;
use caddy_gen_core::engine::EngineEvent;
use caddy_gen_core::{FileOutputStore, GenConfig, GenEngine};
use caddy_gen_docker::{DockerExecNotifier, DockerInventory};
use std::env;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (event stream lost)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<GenExitCode> for ExitCode {
    fn from(code: GenExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            ENV_LOG_LEVEL,
            other
        ),
    }
}

fn main() -> ExitCode {
    let raw_level = env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string());
    let log_level = match parse_log_level(&raw_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return GenExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return GenExitCode::ConfigError.into();
    }

    // Loaded after logging so ignored JSON settings are reported
    let config = GenConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Configuration validation error: {}", e);
        return GenExitCode::ConfigError.into();
    }

    info!("Starting caddy-gen");
    info!(
        network = %config.network,
        label = %config.label,
        output = %config.output_path.display(),
        notify = config.notify.is_some(),
        "Configuration loaded"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return GenExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Run the daemon
async fn run_daemon(config: GenConfig) -> GenExitCode {
    let (mut engine, event_rx) = match build_engine(config).await {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return GenExitCode::ConfigError;
        }
    };

    tokio::spawn(log_engine_events(event_rx));

    match engine.run_until(shutdown_signal()).await {
        Ok(()) => {
            info!("Shutting down daemon");
            GenExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Daemon error: {}", e);
            GenExitCode::RuntimeError
        }
    }
}

/// Connect to Docker and assemble the engine
async fn build_engine(config: GenConfig) -> Result<(GenEngine, mpsc::Receiver<EngineEvent>)> {
    let docker = caddy_gen_docker::connect(config.runtime.as_ref())
        .await
        .context("connecting to Docker")?;

    let store = FileOutputStore::new(&config.output_path)
        .await
        .context("preparing output file")?;

    let engine = GenEngine::new(
        Box::new(DockerInventory::new(docker.clone())),
        Box::new(DockerExecNotifier::new(docker)),
        Box::new(store),
        config,
    )?;

    Ok(engine)
}

/// Forward engine events to the log until the engine goes away
async fn log_engine_events(mut event_rx: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = event_rx.recv().await {
        debug!(?event, "Engine event");
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn shutdown_signal() {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to setup signal handlers: {}, falling back to Ctrl-C", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", name);
}

/// Wait for Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: SIGINT"),
        Err(e) => {
            error!("Failed to wait for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
