//! Route grouping and Caddyfile rendering
//!
//! Bindings that declare the same ordered hostname list share one named host
//! matcher and one `handle` block:
//!
//! ```text
//! @caddy-gen-0 host app.example.com
//! handle @caddy-gen-0 {
//!   tls internal
//!   # web1
//!   reverse_proxy /api {
//!     to 10.0.0.5:3000
//!   }
//! }
//! ```
//!
//! Group order is the order in which each hostname list is first seen, and
//! matcher names are numbered in that order, so identical input always renders
//! to identical bytes.

use std::collections::HashMap;

use crate::binding::BindingSpec;

/// Default prefix of generated matcher names
pub const DEFAULT_MATCHER_PREFIX: &str = "@caddy-gen-";

const INDENT: &str = "  ";

/// Bindings sharing one hostname list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGroup {
    /// Space-joined hostnames
    pub key: String,
    /// Bindings in source order
    pub bindings: Vec<BindingSpec>,
}

/// Group bindings by their exact hostname list
///
/// Stable: groups appear in first-seen order and bindings keep their source
/// order inside a group. No binding is dropped or merged.
pub fn group_routes(bindings: Vec<BindingSpec>) -> Vec<RouteGroup> {
    let mut groups: Vec<RouteGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for binding in bindings {
        let key = binding.host_key();
        match index.get(&key) {
            Some(&i) => groups[i].bindings.push(binding),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(RouteGroup {
                    key,
                    bindings: vec![binding],
                });
            }
        }
    }

    groups
}

/// Renders route groups to Caddyfile text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renderer {
    matcher_prefix: String,
}

impl Renderer {
    /// Create a renderer using `matcher_prefix` for matcher names
    pub fn new(matcher_prefix: impl Into<String>) -> Self {
        Self {
            matcher_prefix: matcher_prefix.into(),
        }
    }

    /// Name of the matcher for the group at `index`
    pub fn matcher_name(&self, index: usize) -> String {
        format!("{}{}", self.matcher_prefix, index)
    }

    /// Render all groups, separated by one blank line
    ///
    /// No groups render to the empty string.
    pub fn render(&self, groups: &[RouteGroup]) -> String {
        groups
            .iter()
            .enumerate()
            .map(|(i, group)| self.render_group(i, group))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn render_group(&self, index: usize, group: &RouteGroup) -> String {
        let matcher = self.matcher_name(index);
        let mut lines = vec![
            format!("{} host {}", matcher, group.key),
            format!("handle {} {{", matcher),
        ];

        lines.extend(
            group
                .bindings
                .iter()
                .flat_map(|b| b.host_directives.iter())
                .map(|d| indent(1, d)),
        );

        for binding in &group.bindings {
            lines.push(indent(1, &format!("# {}", binding.container_name)));
            lines.push(indent(
                1,
                &format!("reverse_proxy {} {{", binding.path_matcher),
            ));
            lines.extend(binding.proxy_directives.iter().map(|d| indent(2, d)));
            lines.push(indent(2, &format!("to {}", binding.upstream())));
            lines.push(indent(1, "}"));
        }

        lines.push("}".to_string());
        lines.join("\n")
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_MATCHER_PREFIX)
    }
}

fn indent(level: usize, line: &str) -> String {
    format!("{}{}", INDENT.repeat(level), line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(hosts: &[&str], port: u16, path: &str, name: &str, ip: &str) -> BindingSpec {
        BindingSpec {
            hostnames: hosts.iter().map(|h| h.to_string()).collect(),
            port,
            path_matcher: path.to_string(),
            container_name: name.to_string(),
            host_directives: Vec::new(),
            proxy_directives: Vec::new(),
            proxy_target: ip.to_string(),
        }
    }

    #[test]
    fn test_groups_by_exact_hostname_order() {
        let groups = group_routes(vec![
            binding(&["a", "b"], 80, "", "one", "10.0.0.1"),
            binding(&["b", "a"], 81, "", "two", "10.0.0.2"),
            binding(&["a", "b"], 82, "", "three", "10.0.0.3"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "a b");
        assert_eq!(groups[1].key, "b a");
        let ports: Vec<u16> = groups[0].bindings.iter().map(|b| b.port).collect();
        assert_eq!(ports, vec![80, 82]);
    }

    #[test]
    fn test_group_order_is_first_seen() {
        let groups = group_routes(vec![
            binding(&["z.example.com"], 80, "", "z", "10.0.0.1"),
            binding(&["a.example.com"], 80, "", "a", "10.0.0.2"),
            binding(&[], 80, "", "any", "10.0.0.3"),
            binding(&["z.example.com"], 81, "", "z2", "10.0.0.4"),
            binding(&[], 81, "", "any2", "10.0.0.5"),
        ]);

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["z.example.com", "a.example.com", ""]);
        assert_eq!(groups[2].bindings.len(), 2);
    }

    #[test]
    fn test_grouping_keeps_every_binding() {
        let input = vec![
            binding(&["a"], 80, "", "one", "10.0.0.1"),
            binding(&["a"], 80, "", "one", "10.0.0.1"),
            binding(&["b"], 80, "/x", "two", "10.0.0.2"),
        ];
        let groups = group_routes(input.clone());

        let total: usize = groups.iter().map(|g| g.bindings.len()).sum();
        assert_eq!(total, input.len());
        assert_eq!(groups[0].bindings[0], groups[0].bindings[1]);
    }

    #[test]
    fn test_render_single_binding() {
        let mut spec = binding(&["app.example.com"], 8080, "", "web1", "10.0.0.5");
        spec.host_directives = vec!["tls internal".to_string()];

        let text = Renderer::default().render(&group_routes(vec![spec]));

        let expected = "\
@caddy-gen-0 host app.example.com
handle @caddy-gen-0 {
  tls internal
  # web1
  reverse_proxy  {
    to 10.0.0.5:8080
  }
}";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_shared_host_block() {
        let mut first = binding(&["shop.example.com"], 3000, "/api", "shop-api", "10.0.0.2");
        first.proxy_directives = vec!["header_up X-Real-IP {remote_host}".to_string()];
        first.host_directives = vec!["encode gzip".to_string()];
        let mut second = binding(&["shop.example.com"], 80, "", "shop-web", "10.0.0.3");
        second.host_directives = vec!["tls internal".to_string()];
        let other = binding(&["blog.example.com"], 2368, "", "blog", "10.0.0.4");

        let text = Renderer::default().render(&group_routes(vec![first, second, other]));

        let expected = "\
@caddy-gen-0 host shop.example.com
handle @caddy-gen-0 {
  encode gzip
  tls internal
  # shop-api
  reverse_proxy /api {
    header_up X-Real-IP {remote_host}
    to 10.0.0.2:3000
  }
  # shop-web
  reverse_proxy  {
    to 10.0.0.3:80
  }
}

@caddy-gen-1 host blog.example.com
handle @caddy-gen-1 {
  # blog
  reverse_proxy  {
    to 10.0.0.4:2368
  }
}";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_empty_is_empty_string() {
        assert_eq!(Renderer::default().render(&[]), "");
    }

    #[test]
    fn test_render_is_deterministic() {
        let groups = group_routes(vec![
            binding(&["a.example.com"], 80, "", "a", "10.0.0.1"),
            binding(&["b.example.com"], 80, "", "b", "10.0.0.2"),
            binding(&["a.example.com"], 81, "/x", "c", "10.0.0.3"),
        ]);
        let renderer = Renderer::default();

        assert_eq!(renderer.render(&groups), renderer.render(&groups));
    }

    #[test]
    fn test_custom_matcher_prefix() {
        let renderer = Renderer::new("@docker-");
        let text = renderer.render(&group_routes(vec![binding(
            &["x.example.com"],
            80,
            "",
            "x",
            "10.0.0.1",
        )]));

        assert!(text.starts_with("@docker-0 host x.example.com\nhandle @docker-0 {"));
        assert!(!text.ends_with('\n'));
    }
}
