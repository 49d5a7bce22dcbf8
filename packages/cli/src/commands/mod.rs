pub mod document;
pub mod edit;
pub mod inspect;

pub use document::{from_message, new, FromMessageArgs, NewArgs};
pub use edit::{apply, check, instantiate, ApplyArgs, CheckArgs, InstantiateArgs};
pub use inspect::{mot, mtt, roundtrip, MessageArgs, MttArgs};

use crate::config::Config;
use anyhow::{anyhow, Context as _, Result};
use colored::Colorize;
use ordtree_schema::{Message, TypeRegistry};
use ordtree_tree::MttCache;
use std::path::{Path, PathBuf};

/// Everything a command needs: where it runs, the config and the schema
pub struct Context {
    pub cwd: PathBuf,
    pub config: Config,
    pub registry: TypeRegistry,
    pub cache: MttCache,
}

impl Context {
    pub fn new(cwd: PathBuf, config: Config, schema: Option<PathBuf>) -> Result<Self> {
        let schema_path = schema
            .map(|path| cwd.join(path))
            .or_else(|| config.get_schema_path(&cwd))
            .ok_or_else(|| anyhow!("No schema given: pass --schema or set \"schema\" in ordtree.config.json"))?;
        let registry = TypeRegistry::load(&schema_path)
            .with_context(|| format!("loading schema {}", schema_path.display()))?;
        tracing::info!(
            "loaded {} message types from {}",
            registry.message_names().len(),
            schema_path.display()
        );
        Ok(Self {
            cwd,
            config,
            registry,
            cache: MttCache::new(),
        })
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.cwd.join(path)
    }

    pub fn read_json(&self, path: &Path) -> Result<serde_json::Value> {
        let path = self.resolve(path);
        let content = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn read_message(&self, message_type: &str, path: &Path) -> Result<Message> {
        let json = self.read_json(path)?;
        Ok(self.registry.message_from_json(message_type, &json)?)
    }

    /// Print to stdout, or write to `out` when given
    pub fn emit(&self, text: &str, out: Option<&Path>) -> Result<()> {
        match out {
            Some(out) => {
                let path = self.resolve(out);
                std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
                eprintln!("  {} {}", "✓".green(), path.display());
            }
            None => println!("{}", text),
        }
        Ok(())
    }
}

/// Document id derived from a display name
pub fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}
