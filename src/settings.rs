//! Pipeline Settings
//!
//! Conventional locations for every input, optionally overridden from a JSON
//! settings file and then from the command line.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::config::TagPolicy;
use crate::invoker::BuildInvoker;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    /// Directory every other relative path is resolved against
    #[serde(default = "default_project")]
    pub project: PathBuf,
    #[serde(default = "default_config")]
    pub config: PathBuf,
    #[serde(default = "default_requirements")]
    pub requirements: PathBuf,
    #[serde(default = "default_docs_root")]
    pub docs_root: PathBuf,
    #[serde(default)]
    pub build: BuildSettings,
    /// Built site to inspect for Mermaid assets; the check is skipped when unset
    #[serde(default)]
    pub site_dir: Option<PathBuf>,
    #[serde(default)]
    pub unknown_tags: TagPolicy,
}

fn default_project() -> PathBuf { PathBuf::from(".") }
fn default_config() -> PathBuf { PathBuf::from("mkdocs.yml") }
fn default_requirements() -> PathBuf { PathBuf::from("requirements.txt") }
fn default_docs_root() -> PathBuf { PathBuf::from("docs") }

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSettings {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_program() -> String { "mkdocs".to_string() }
fn default_args() -> Vec<String> { vec!["build".to_string(), "--strict".to_string()] }
fn default_timeout_secs() -> u64 { 60 }

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            project: default_project(),
            config: default_config(),
            requirements: default_requirements(),
            docs_root: default_docs_root(),
            build: BuildSettings::default(),
            site_dir: None,
            unknown_tags: TagPolicy::default(),
        }
    }
}

impl PipelineSettings {
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `path` joined onto the project directory unless already absolute
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || self.project == Path::new(".") {
            path.to_path_buf()
        } else {
            self.project.join(path)
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.resolve(&self.config)
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.resolve(&self.requirements)
    }

    pub fn docs_path(&self) -> PathBuf {
        self.resolve(&self.docs_root)
    }

    pub fn site_path(&self) -> Option<PathBuf> {
        self.site_dir.as_deref().map(|dir| self.resolve(dir))
    }

    pub fn build_invoker(&self) -> BuildInvoker {
        BuildInvoker::new(self.build.program.clone(), self.build.args.clone())
            .with_timeout(Duration::from_secs(self.build.timeout_secs))
            .in_dir(self.project.clone())
    }
}
