//! Core Checks
//!
//! Plugin coverage, data-file references, and the strict build. Each check
//! converts every anticipated failure into findings; none of them return
//! errors to the pipeline.

use std::path::PathBuf;
use tracing::debug;

use crate::config::{LoadOptions, PluginDeclaration, SiteConfig};
use crate::invoker::{BuildInvoker, BuildOutcome};
use crate::requirements::Requirements;
use crate::rules::{PackageRule, RuleTable};
use crate::scanner;
use crate::validation::{Check, Finding, FindingLevel, Findings};

pub const PLUGIN_CHECK: &str = "Plugin dependencies";
pub const REFERENCE_CHECK: &str = "CSV file references";
pub const BUILD_CHECK: &str = "Site build";

pub struct PluginCoverageCheck {
    pub config_path: PathBuf,
    pub requirements_path: PathBuf,
    pub rules: RuleTable,
    pub load_options: LoadOptions,
}

impl PluginCoverageCheck {
    pub fn new(config_path: impl Into<PathBuf>, requirements_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            requirements_path: requirements_path.into(),
            rules: RuleTable::default(),
            load_options: LoadOptions::default(),
        }
    }

    fn manifest_name(&self) -> String {
        file_label(&self.requirements_path)
    }
}

impl Check for PluginCoverageCheck {
    fn name(&self) -> &'static str {
        PLUGIN_CHECK
    }

    fn run(&self, findings: &mut Findings<'_>) {
        let config = match SiteConfig::load_with(&self.config_path, self.load_options) {
            Ok(config) => config,
            Err(e) => return findings.error(e.to_string()),
        };

        let requirements = match Requirements::load(&self.requirements_path) {
            Ok(requirements) => requirements,
            Err(e) => return findings.error(e.to_string()),
        };
        for line in &requirements.unparsed {
            findings.warning(format!("Could not parse requirement: {line}"));
        }

        let plugins = match config.plugins() {
            Ok(plugins) => plugins,
            Err(e) => return findings.error(e.to_string()),
        };
        if plugins.is_empty() {
            return findings.warning(format!(
                "No plugins configured in {}",
                file_label(&self.config_path)
            ));
        }

        evaluate_coverage(&plugins, &requirements, &self.rules, &self.manifest_name(), findings);
    }
}

/// Records one finding per plugin. `manifest` names the requirements file in messages.
pub fn evaluate_coverage(
    plugins: &[PluginDeclaration],
    requirements: &Requirements,
    rules: &RuleTable,
    manifest: &str,
    findings: &mut Findings<'_>,
) {
    for plugin in plugins {
        let id = plugin.id.as_str();
        match rules.lookup(id) {
            Some(PackageRule::Builtin) => findings.success(format!("Plugin '{id}' is built-in")),
            Some(PackageRule::Package(package)) => match requirements.version_of(package) {
                Some(version) => findings.success(format!(
                    "Plugin '{id}' → package '{package}' ({version})"
                )),
                None => findings.push(
                    Finding::new(
                        FindingLevel::Error,
                        format!("Plugin '{id}' requires package '{package}' but it's not in {manifest}"),
                    )
                    .with_remediation(format!("Pin '{package}==<version>' in {manifest}")),
                ),
            },
            None => findings.warning(format!(
                "Plugin '{id}' not in known plugin mapping - cannot verify package"
            )),
        }
    }
}

pub struct CsvReferenceCheck {
    pub docs_root: PathBuf,
}

impl CsvReferenceCheck {
    pub fn new(docs_root: impl Into<PathBuf>) -> Self {
        Self {
            docs_root: docs_root.into(),
        }
    }
}

impl Check for CsvReferenceCheck {
    fn name(&self) -> &'static str {
        REFERENCE_CHECK
    }

    fn run(&self, findings: &mut Findings<'_>) {
        let report = match scanner::scan(&self.docs_root) {
            Ok(report) => report,
            Err(e) => return findings.error(e.to_string()),
        };

        for entry in &report.unreadable {
            findings.error(format!(
                "Could not read {} ({})",
                entry.path.display(),
                entry.error
            ));
        }

        if report.documents == 0 {
            return findings.warning(format!(
                "No markdown files found in {}/",
                self.docs_root.display()
            ));
        }

        for reference in &report.references {
            // root-relative, not page-relative
            if reference.resolve(&self.docs_root).exists() {
                findings.success(format!("CSV file exists: {}", reference.path));
            } else {
                findings.push(
                    Finding::new(
                        FindingLevel::Error,
                        format!(
                            "CSV file not found: {} (referenced in {})",
                            reference.path,
                            reference.document.display()
                        ),
                    )
                    .with_remediation(format!(
                        "Paths in read_csv() resolve from {}/, not from the page's folder",
                        self.docs_root.display()
                    )),
                );
            }
        }

        if report.references.is_empty() {
            findings.info(format!(
                "No CSV file references found in {} markdown files",
                report.documents
            ));
        }
    }
}

pub struct BuildCheck {
    pub invoker: BuildInvoker,
}

impl BuildCheck {
    pub fn new(invoker: BuildInvoker) -> Self {
        Self { invoker }
    }
}

impl Check for BuildCheck {
    fn name(&self) -> &'static str {
        BUILD_CHECK
    }

    fn run(&self, findings: &mut Findings<'_>) {
        let command = self.invoker.command_line();
        let outcome = match self.invoker.run() {
            Ok(outcome) => outcome,
            Err(e) => return findings.error(e.to_string()),
        };
        debug!(passed = outcome.passed(), ?outcome, "build outcome");

        match outcome {
            BuildOutcome::Succeeded { .. } => {
                findings.success(format!("Site build succeeded (`{command}`)"));
            }
            BuildOutcome::Failed { code, stderr } => {
                let status = code.map_or_else(
                    || "terminated by signal".to_string(),
                    |c| format!("exit code {c}"),
                );
                let mut finding = Finding::new(
                    FindingLevel::Error,
                    format!("Site build failed (`{command}`, {status})"),
                );
                if !stderr.trim().is_empty() {
                    finding = finding.with_detail(stderr);
                }
                findings.push(finding);
            }
            BuildOutcome::TimedOut { limit } => {
                findings.error(format!("Site build timed out after {limit:?} (`{command}`)"));
            }
            BuildOutcome::Unavailable { program } => {
                findings.warning(format!("`{program}` command not found - skipping build test"));
            }
        }
    }
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
