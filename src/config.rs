//! Site Configuration Loader
//!
//! Reads the site's YAML configuration. Extension tags the build tool
//! understands (`!!python/name:...`, `!ENV`, ...) are irrelevant here and are
//! handled according to a [`TagPolicy`].

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unsupported tag {0} in configuration")]
    UnknownTag(String),

    #[error("`plugins` must be a list, found {0}")]
    PluginsNotAList(&'static str),

    #[error("Plugin entry #{index} is malformed: {reason}")]
    MalformedPlugin { index: usize, reason: String },
}

/// What to do with tagged nodes the loader cannot interpret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagPolicy {
    /// Replace the tagged node with null
    #[default]
    Nullify,
    /// Fail the load
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub unknown_tags: TagPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluginDeclaration {
    pub id: String,
    pub settings: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    root: Value,
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, LoadOptions::default())
    }

    pub fn load_with(path: &Path, options: LoadOptions) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text, options).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        debug!(path = %path.display(), "loaded site configuration");
        Ok(config)
    }

    pub fn parse(text: &str, options: LoadOptions) -> Result<Self, ConfigError> {
        let raw: Value = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        let root = strip_tags(raw, options.unknown_tags)?;
        Ok(Self { root })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Enabled plugins, normalized from bare names and `{name: settings}` entries
    pub fn plugins(&self) -> Result<Vec<PluginDeclaration>, ConfigError> {
        let entries = match self.root.get("plugins") {
            None | Some(Value::Null) => return Ok(vec![]),
            Some(Value::Sequence(seq)) => seq,
            Some(other) => return Err(ConfigError::PluginsNotAList(kind_of(other))),
        };

        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| normalize_plugin(index, entry))
            .collect()
    }
}

fn normalize_plugin(index: usize, entry: &Value) -> Result<PluginDeclaration, ConfigError> {
    match entry {
        Value::String(id) => Ok(PluginDeclaration {
            id: id.clone(),
            settings: None,
        }),
        Value::Mapping(map) if map.len() == 1 => {
            let (key, settings) = map.iter().next().ok_or_else(|| ConfigError::MalformedPlugin {
                index,
                reason: "empty mapping".to_string(),
            })?;
            let id = key.as_str().ok_or_else(|| ConfigError::MalformedPlugin {
                index,
                reason: format!("plugin name must be a string, found {}", kind_of(key)),
            })?;
            let settings = match settings {
                Value::Null => None,
                other => Some(other.clone()),
            };
            Ok(PluginDeclaration {
                id: id.to_string(),
                settings,
            })
        }
        Value::Mapping(map) => Err(ConfigError::MalformedPlugin {
            index,
            reason: format!("expected a single-key mapping, found {} keys", map.len()),
        }),
        other => Err(ConfigError::MalformedPlugin {
            index,
            reason: format!("expected a name or mapping, found {}", kind_of(other)),
        }),
    }
}

fn strip_tags(value: Value, policy: TagPolicy) -> Result<Value, ConfigError> {
    match value {
        Value::Tagged(tagged) => match policy {
            TagPolicy::Nullify => Ok(Value::Null),
            TagPolicy::Reject => Err(ConfigError::UnknownTag(tagged.tag.to_string())),
        },
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|v| strip_tags(v, policy))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        Value::Mapping(map) => {
            let mut out = serde_yaml::Mapping::new();
            for (k, v) in map {
                out.insert(k, strip_tags(v, policy)?);
            }
            Ok(Value::Mapping(out))
        }
        other => Ok(other),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
