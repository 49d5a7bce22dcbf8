use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "ordtree.config.json";

/// ordtree configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Schema file describing the message types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Directory of persisted prototype documents
    #[serde(default = "default_document_dir")]
    pub document_dir: String,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_document_dir() -> String {
    "prototypes".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn get_schema_path(&self, cwd: &Path) -> Option<PathBuf> {
        self.schema.as_ref().map(|schema| cwd.join(schema))
    }

    pub fn get_document_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.document_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: None,
            document_dir: default_document_dir(),
            log_level: default_log_level(),
        }
    }
}
