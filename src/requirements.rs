//! Requirement Manifest Loader
//!
//! Flat `name==version` pins, one per line.

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RequirementsError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    packages: BTreeMap<String, String>,
    /// Non-comment lines that are not `name==version`
    pub unparsed: Vec<String>,
}

fn pin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([a-zA-Z0-9\-_]+)==(.+)$").expect("static regex"))
}

impl Requirements {
    pub fn load(path: &Path) -> Result<Self, RequirementsError> {
        if !path.exists() {
            return Err(RequirementsError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| RequirementsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let requirements = Self::parse(&text);
        debug!(
            path = %path.display(),
            pinned = requirements.packages.len(),
            unparsed = requirements.unparsed.len(),
            "loaded requirements"
        );
        Ok(requirements)
    }

    pub fn parse(text: &str) -> Self {
        let mut requirements = Self::default();
        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match pin_pattern().captures(line) {
                Some(caps) => {
                    requirements
                        .packages
                        .insert(caps[1].to_string(), caps[2].to_string());
                }
                None => requirements.unparsed.push(line.to_string()),
            }
        }
        requirements
    }

    pub fn version_of(&self, package: &str) -> Option<&str> {
        self.packages.get(package).map(String::as_str)
    }

    pub fn contains(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
