//! Binding label grammar
//!
//! One container label describes any number of routes:
//!
//! ```text
//! label      := group (";" group)*
//! group      := head ("|" directive)*
//! head       := [path] port hostname*
//! directive  := "host:" text     -> placed in the host block
//!             | text             -> placed in this binding's reverse_proxy block
//! ```
//!
//! `path` is recognized by its leading `/`. Tokens in the head are separated
//! by whitespace; groups and directives are trimmed before use. Directives are
//! opaque and passed through unchanged.

use crate::error::BindingError;
use crate::traits::ContainerInfo;

/// Directive prefix that routes a directive to the host block
pub const HOST_DIRECTIVE_PREFIX: &str = "host:";

/// One route declared by a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSpec {
    /// Hostnames to match, in declaration order (empty matches any host)
    pub hostnames: Vec<String>,
    /// Container-side port
    pub port: u16,
    /// Path prefix, or empty for all paths
    pub path_matcher: String,
    /// Display name of the declaring container
    pub container_name: String,
    /// Directives for the host block
    pub host_directives: Vec<String>,
    /// Directives for this binding's reverse_proxy block
    pub proxy_directives: Vec<String>,
    /// Address the proxy forwards to
    pub proxy_target: String,
}

impl BindingSpec {
    /// Key used to group bindings into one host block
    pub fn host_key(&self) -> String {
        self.hostnames.join(" ")
    }

    /// `<proxy_target>:<port>`
    pub fn upstream(&self) -> String {
        format!("{}:{}", self.proxy_target, self.port)
    }
}

/// Where a label came from
#[derive(Debug, Clone, Copy)]
pub struct BindingSource<'a> {
    /// Container display name
    pub container: &'a str,
    /// Network that was scanned
    pub network: &'a str,
    /// The container's address on that network
    pub proxy_target: Option<&'a str>,
}

impl<'a> BindingSource<'a> {
    /// Describe `info` as seen on `network`
    pub fn from_container(info: &'a ContainerInfo, network: &'a str) -> Self {
        Self {
            container: &info.name,
            network,
            proxy_target: info.ip_on(network),
        }
    }
}

/// Parse every binding group of a label value
///
/// Returns one entry per non-empty group, in declaration order. A missing or
/// blank label yields nothing. Each group succeeds or fails on its own.
pub fn parse_bindings(
    raw: Option<&str>,
    source: &BindingSource<'_>,
) -> Vec<Result<BindingSpec, BindingError>> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split(';')
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(|group| parse_binding(group, source))
        .collect()
}

/// Parse the bindings a container declares under `label`
pub fn container_bindings(
    info: &ContainerInfo,
    label: &str,
    network: &str,
) -> Vec<Result<BindingSpec, BindingError>> {
    let source = BindingSource::from_container(info, network);
    parse_bindings(info.labels.get(label).map(String::as_str), &source)
}

/// Parse a single binding group
pub fn parse_binding(
    group: &str,
    source: &BindingSource<'_>,
) -> Result<BindingSpec, BindingError> {
    let mut segments = group.split('|').map(str::trim);
    let head = segments.next().unwrap_or_default();
    if head.is_empty() {
        return Err(BindingError::EmptyHead);
    }

    let mut tokens = head.split_whitespace().peekable();
    let path_matcher = match tokens.peek() {
        Some(token) if token.starts_with('/') => tokens.next().unwrap_or_default().to_string(),
        _ => String::new(),
    };

    let port_token = tokens.next().ok_or_else(|| BindingError::MissingPort {
        head: head.to_string(),
    })?;
    let port = parse_port(port_token).ok_or_else(|| BindingError::InvalidPort {
        token: port_token.to_string(),
        head: head.to_string(),
    })?;
    let hostnames: Vec<String> = tokens.map(str::to_string).collect();

    let (host_directives, proxy_directives) = split_directives(segments);

    let proxy_target = source
        .proxy_target
        .filter(|ip| !ip.is_empty())
        .ok_or_else(|| BindingError::MissingProxyTarget {
            container: source.container.to_string(),
            network: source.network.to_string(),
        })?;

    Ok(BindingSpec {
        hostnames,
        port,
        path_matcher,
        container_name: source.container.to_string(),
        host_directives,
        proxy_directives,
        proxy_target: proxy_target.to_string(),
    })
}

fn parse_port(token: &str) -> Option<u16> {
    token.parse::<u16>().ok().filter(|port| *port > 0)
}

fn split_directives<'a>(segments: impl Iterator<Item = &'a str>) -> (Vec<String>, Vec<String>) {
    let mut host = Vec::new();
    let mut proxy = Vec::new();

    for directive in segments.filter(|d| !d.is_empty()) {
        match directive.strip_prefix(HOST_DIRECTIVE_PREFIX).map(str::trim) {
            // A bare `host:` carries nothing to render
            Some("") => {}
            Some(rest) => host.push(rest.to_string()),
            None => proxy.push(directive.to_string()),
        }
    }

    (host, proxy)
}
