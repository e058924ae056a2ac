//! Docker client construction

use bollard::{API_DEFAULT_VERSION, Docker};
use caddy_gen_core::config::RuntimeConnectionConfig;
use caddy_gen_core::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Request timeout when none is configured (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Port used for plain `host` endpoints without an explicit port
pub const DEFAULT_HTTP_PORT: u16 = 2375;

/// Port used for `https` endpoints without an explicit port
pub const DEFAULT_HTTPS_PORT: u16 = 2376;

/// Where the Docker daemon is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Unix socket
    Socket { path: String, timeout: u64 },
    /// Plain HTTP
    Http { address: String, timeout: u64 },
    /// HTTPS with a client certificate
    Https {
        address: String,
        timeout: u64,
        tls: TlsFiles,
    },
    /// bollard's local defaults (honors `DOCKER_HOST`)
    LocalDefaults,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket { path, .. } => write!(f, "unix://{}", path),
            Self::Http { address, .. } | Self::Https { address, .. } => write!(f, "{}", address),
            Self::LocalDefaults => write!(f, "local defaults"),
        }
    }
}

/// PEM files for an HTTPS endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub ca: PathBuf,
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl TlsFiles {
    fn from_config(config: &RuntimeConnectionConfig) -> Result<Self> {
        let file = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| {
                    Error::config(format!("https Docker endpoint needs a '{}' file path", name))
                })
        };

        Ok(Self {
            ca: file(&config.ca, "ca")?,
            cert: file(&config.cert, "cert")?,
            key: file(&config.key, "key")?,
        })
    }
}

/// Pick the endpoint described by `config`
///
/// `socketPath` wins over `host`. Without either the local defaults are
/// used. `http` (or `tcp`) and `https` are accepted as protocols; `https`
/// requires the `ca`, `cert` and `key` files.
pub fn endpoint_for(config: Option<&RuntimeConnectionConfig>) -> Result<Endpoint> {
    let Some(config) = config else {
        return Ok(Endpoint::LocalDefaults);
    };
    let timeout = config.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);

    if let Some(path) = config.socket_path.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(Endpoint::Socket {
            path: path.trim_start_matches("unix://").to_string(),
            timeout,
        });
    }

    if let Some(host) = config.host.as_deref().filter(|h| !h.trim().is_empty()) {
        let host = host.trim();
        return match config.protocol.as_deref().unwrap_or("http") {
            "http" | "tcp" => Ok(Endpoint::Http {
                address: format!("http://{}:{}", host, config.port.unwrap_or(DEFAULT_HTTP_PORT)),
                timeout,
            }),
            "https" => Ok(Endpoint::Https {
                address: format!("https://{}:{}", host, config.port.unwrap_or(DEFAULT_HTTPS_PORT)),
                timeout,
                tls: TlsFiles::from_config(config)?,
            }),
            other => Err(Error::config(format!(
                "Unsupported Docker protocol '{}': use a unix socket, http or https",
                other
            ))),
        };
    }

    Ok(Endpoint::LocalDefaults)
}

/// Connect to the Docker daemon and verify it answers
pub async fn connect(config: Option<&RuntimeConnectionConfig>) -> Result<Docker> {
    let endpoint = endpoint_for(config)?;

    let client = match &endpoint {
        Endpoint::Socket { path, timeout } => {
            Docker::connect_with_socket(path, *timeout, API_DEFAULT_VERSION)
        }
        Endpoint::Http { address, timeout } => {
            Docker::connect_with_http(address, *timeout, API_DEFAULT_VERSION)
        }
        Endpoint::Https {
            address,
            timeout,
            tls,
        } => Docker::connect_with_ssl(
            address,
            &tls.key,
            &tls.cert,
            &tls.ca,
            *timeout,
            API_DEFAULT_VERSION,
        ),
        Endpoint::LocalDefaults => Docker::connect_with_local_defaults(),
    }
    .map_err(|e| Error::inventory(format!("Cannot connect to Docker at {}: {}", endpoint, e)))?;

    client.ping().await.map_err(|e| {
        Error::inventory(format!(
            "Docker daemon at {} is not responding: {}",
            endpoint, e
        ))
    })?;

    debug!(%endpoint, "Connected to Docker daemon");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_config_uses_local_defaults() {
        assert_eq!(endpoint_for(None).unwrap(), Endpoint::LocalDefaults);
        assert_eq!(
            endpoint_for(Some(&RuntimeConnectionConfig::default())).unwrap(),
            Endpoint::LocalDefaults
        );
    }

    #[test]
    fn test_socket_path_wins() {
        let config = RuntimeConnectionConfig {
            socket_path: Some("/var/run/docker.sock".to_string()),
            host: Some("docker.internal".to_string()),
            timeout: Some(5),
            ..Default::default()
        };

        assert_eq!(
            endpoint_for(Some(&config)).unwrap(),
            Endpoint::Socket {
                path: "/var/run/docker.sock".to_string(),
                timeout: 5
            }
        );
    }

    #[test]
    fn test_host_defaults_port_and_timeout() {
        let config = RuntimeConnectionConfig {
            host: Some("10.0.0.1".to_string()),
            ..Default::default()
        };

        let endpoint = endpoint_for(Some(&config)).unwrap();
        assert_eq!(
            endpoint,
            Endpoint::Http {
                address: "http://10.0.0.1:2375".to_string(),
                timeout: DEFAULT_TIMEOUT_SECS
            }
        );
        assert_eq!(endpoint.to_string(), "http://10.0.0.1:2375");
    }

    #[test]
    fn test_https_uses_client_certificates() {
        let config = RuntimeConnectionConfig {
            host: Some("docker.example.com".to_string()),
            protocol: Some("https".to_string()),
            ca: Some("/certs/ca.pem".to_string()),
            cert: Some("/certs/cert.pem".to_string()),
            key: Some("/certs/key.pem".to_string()),
            ..Default::default()
        };

        let endpoint = endpoint_for(Some(&config)).unwrap();
        assert_eq!(
            endpoint,
            Endpoint::Https {
                address: "https://docker.example.com:2376".to_string(),
                timeout: DEFAULT_TIMEOUT_SECS,
                tls: TlsFiles {
                    ca: PathBuf::from("/certs/ca.pem"),
                    cert: PathBuf::from("/certs/cert.pem"),
                    key: PathBuf::from("/certs/key.pem"),
                },
            }
        );
        assert_eq!(endpoint.to_string(), "https://docker.example.com:2376");
    }

    #[test]
    fn test_https_without_key_is_a_config_error() {
        let config = RuntimeConnectionConfig {
            host: Some("docker.example.com".to_string()),
            port: Some(2376),
            protocol: Some("https".to_string()),
            ca: Some("/certs/ca.pem".to_string()),
            cert: Some("/certs/cert.pem".to_string()),
            ..Default::default()
        };

        match endpoint_for(Some(&config)) {
            Err(Error::Config(msg)) => assert!(msg.contains("'key'"), "{}", msg),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_reports_unreadable_certificates() {
        let config = RuntimeConnectionConfig {
            host: Some("127.0.0.1".to_string()),
            protocol: Some("https".to_string()),
            ca: Some("/nonexistent/ca.pem".to_string()),
            cert: Some("/nonexistent/cert.pem".to_string()),
            key: Some("/nonexistent/key.pem".to_string()),
            ..Default::default()
        };

        assert!(matches!(connect(Some(&config)).await, Err(Error::Inventory(_))));
    }

    #[tokio::test]
    async fn test_connect_fails_before_io_on_bad_protocol() {
        let config = RuntimeConnectionConfig {
            host: Some("docker.example.com".to_string()),
            protocol: Some("ssh".to_string()),
            ..Default::default()
        };

        assert!(matches!(connect(Some(&config)).await, Err(Error::Config(_))));
    }
}
