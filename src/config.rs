//! Manager configuration.
//!
//! Mirrors the knobs a deployment actually turns: the base namespace that
//! prefixes scope and space ids in web references, and the live-session
//! limit. Loadable from TOML.

use serde::{Deserialize, Serialize};

use crate::document::Uri;
use crate::error::ConfigError;

fn default_id() -> String {
    "network".to_owned()
}

fn default_namespace() -> String {
    "http://localhost:8080/ontology/".to_owned()
}

fn default_max_sessions() -> i32 {
    -1
}

/// Configuration for a [`NetworkManager`](crate::manager::NetworkManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Identifier of this manager instance.
    #[serde(default = "default_id")]
    pub id: String,

    /// Base namespace prefixing scope and space ids in web references.
    /// No query, no fragment, must not end with `#`; a missing trailing
    /// slash is appended automatically.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Maximum number of live sessions; negative disables the limit.
    #[serde(default = "default_max_sessions")]
    pub max_active_sessions: i32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            namespace: default_namespace(),
            max_active_sessions: default_max_sessions(),
        }
    }
}

impl ManagerConfig {
    /// Parse a configuration from TOML and validate it.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: ManagerConfig = toml::from_str(input).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validated()
    }

    /// Read and parse a configuration file.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            message: format!("read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate the namespace rules, appending a trailing slash if missing.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::InvalidNamespace {
                namespace: self.namespace,
                message: "namespace cannot be empty".into(),
            });
        }
        if self.namespace.contains('?') {
            return Err(ConfigError::InvalidNamespace {
                namespace: self.namespace,
                message: "URI query is not allowed".into(),
            });
        }
        if self.namespace.ends_with('#') {
            return Err(ConfigError::InvalidNamespace {
                namespace: self.namespace,
                message: "namespace must not end with a hash character".into(),
            });
        }
        if self.namespace.contains('#') {
            return Err(ConfigError::InvalidNamespace {
                namespace: self.namespace,
                message: "URI fragment is not allowed".into(),
            });
        }
        if !self.namespace.ends_with('/') {
            tracing::warn!(namespace = %self.namespace,
                "namespace does not end with a slash, appending one");
            self.namespace.push('/');
        }
        Ok(self)
    }

    /// The namespace as a [`Uri`].
    pub fn namespace_uri(&self) -> Uri {
        Uri::new(self.namespace.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ManagerConfig::default().validated().unwrap();
        assert_eq!(config.id, "network");
        assert_eq!(config.max_active_sessions, -1);
        assert!(config.namespace.ends_with('/'));
    }

    #[test]
    fn parses_partial_toml() {
        let config = ManagerConfig::from_toml_str(
            r#"
            namespace = "http://example.org/net"
            max_active_sessions = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.namespace, "http://example.org/net/");
        assert_eq!(config.max_active_sessions, 10);
        assert_eq!(config.id, "network");
    }

    #[test]
    fn rejects_query_and_fragment() {
        for bad in [
            "http://example.org/net?x=1",
            "http://example.org/net#frag",
            "http://example.org/net#",
            "",
        ] {
            let config = ManagerConfig {
                namespace: bad.to_owned(),
                ..Default::default()
            };
            assert!(config.validated().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = ManagerConfig::from_toml_str("max_active_sessions = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn loads_from_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("manager.toml");
        std::fs::write(&path, "id = \"test-net\"\nmax_active_sessions = 5\n").unwrap();

        let config = ManagerConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.id, "test-net");
        assert_eq!(config.max_active_sessions, 5);

        let err = ManagerConfig::from_toml_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
