// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub repo: RepoConfig,

    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory (file backend) or database file (sqlite backend).
    pub path: Option<PathBuf>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: None,
            namespace: default_namespace(),
        }
    }
}

impl StoreConfig {
    /// Location used by the configured backend, falling back to the data dir.
    pub fn resolved_path(&self) -> PathBuf {
        match (&self.path, self.backend) {
            (Some(path), _) => path.clone(),
            (None, StoreBackend::Sqlite) => paths::db_path(),
            (None, _) => paths::definitions_dir(),
        }
    }
}

fn default_namespace() -> String {
    "tse-def".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Definition sources, tried in order.
    pub sources: Vec<String>,
    pub server: String,
    pub schema: String,
    pub timeout_secs: u64,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            sources: vec!["tokenscript_org".into(), "script_uri".into()],
            server: "http://localhost:8080/".into(),
            schema: "2020/06".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub url: String,
    pub ipfs_gateway: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://rpc.ankr.com/eth".into(),
            ipfs_gateway: "https://ipfs.io/ipfs/".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub base_url: String,
    pub token_id: String,
    /// Sent as `X-API-KEY` when present.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://testnets-api.opensea.io/api/v1".into(),
            token_id: "0".into(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.store.backend, StoreBackend::File);
        assert_eq!(c.store.namespace, "tse-def");
        assert_eq!(c.repo.sources, vec!["tokenscript_org", "script_uri"]);
        assert_eq!(c.repo.schema, "2020/06");
        assert_eq!(c.metadata.token_id, "0");
        assert!(c.metadata.api_key.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.repo.timeout_secs, 30);
        assert_eq!(config.rpc.ipfs_gateway, "https://ipfs.io/ipfs/");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[store]
backend = "sqlite"
path = "/var/lib/tsengine/defs.db"
namespace = "staging"

[repo]
sources = ["script_uri"]
server = "https://repo.example/"
schema = "2022/09"
timeout_secs = 5

[rpc]
url = "http://127.0.0.1:8545"
ipfs_gateway = "https://gateway.example/ipfs/"

[metadata]
base_url = "http://127.0.0.1:9000/api/v1"
token_id = "42"
api_key = "secret"
timeout_secs = 2
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(
            config.store.resolved_path(),
            PathBuf::from("/var/lib/tsengine/defs.db")
        );
        assert_eq!(config.store.namespace, "staging");
        assert_eq!(config.repo.sources, vec!["script_uri"]);
        assert_eq!(config.repo.timeout_secs, 5);
        assert_eq!(config.rpc.url, "http://127.0.0.1:8545");
        assert_eq!(config.metadata.token_id, "42");
        assert_eq!(config.metadata.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_store_section_partial() {
        let config: Config = toml::from_str("[store]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.namespace, "tse-def");
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_resolved_path_defaults_per_backend() {
        let sqlite = StoreConfig {
            backend: StoreBackend::Sqlite,
            ..StoreConfig::default()
        };
        assert_eq!(sqlite.resolved_path(), paths::db_path());
        assert_eq!(
            StoreConfig::default().resolved_path(),
            paths::definitions_dir()
        );
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result: Result<Config, _> = toml::from_str("[store]\nbackend = \"redis\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.repo.server, config.repo.server);
        assert_eq!(deserialized.store.backend, config.store.backend);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }
}
