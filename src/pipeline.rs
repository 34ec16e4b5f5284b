//! Validation Pipeline - Single Entry Point
//!
//! Runs every check in a fixed order, never stopping early, and folds the
//! verdicts into one exit status. The runner only looks at verdicts, never at
//! the reasons behind them.

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use crate::assets::SiteAssetsCheck;
use crate::checks::{BuildCheck, CsvReferenceCheck, PluginCoverageCheck};
use crate::config::LoadOptions;
use crate::hashing::fingerprint;
use crate::settings::PipelineSettings;
use crate::validation::{Check, FindingSink, Findings, ValidationResult};

pub const EXIT_PASSED: u8 = 0;
pub const EXIT_FAILED: u8 = 1;

pub struct ValidationPipeline {
    checks: Vec<Box<dyn Check>>,
}

impl ValidationPipeline {
    pub fn new() -> Self {
        Self { checks: vec![] }
    }

    /// Plugin coverage, data references, build; then site assets when a site dir is set
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        let mut plugins =
            PluginCoverageCheck::new(settings.config_path(), settings.requirements_path());
        plugins.load_options = LoadOptions {
            unknown_tags: settings.unknown_tags,
        };

        let mut pipeline = Self::new()
            .with_check(Box::new(plugins))
            .with_check(Box::new(CsvReferenceCheck::new(settings.docs_path())))
            .with_check(Box::new(BuildCheck::new(settings.build_invoker())));

        if let Some(site) = settings.site_path() {
            pipeline = pipeline.with_check(Box::new(SiteAssetsCheck::new(site)));
        }
        pipeline
    }

    pub fn with_check(mut self, check: Box<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn run(&self, sink: &mut dyn FindingSink) -> PipelineReport {
        let mut results = Vec::with_capacity(self.checks.len());

        for check in &self.checks {
            let span = info_span!("check", name = check.name());
            let _guard = span.enter();

            sink.begin_check(check.name());
            let mut findings = Findings::new(check.name(), &mut *sink);
            check.run(&mut findings);
            let result = findings.finish();

            debug!(valid = result.valid, findings = result.findings.len(), "check finished");
            results.push(result);
        }

        PipelineReport { results }
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::from_settings(&PipelineSettings::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineReport {
    pub results: Vec<ValidationResult>,
}

impl PipelineReport {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.valid)
    }

    pub fn exit_code(&self) -> u8 {
        if self.all_passed() {
            EXIT_PASSED
        } else {
            EXIT_FAILED
        }
    }

    pub fn verdict(&self, check: &str) -> Option<bool> {
        self.results.iter().find(|r| r.check == check).map(|r| r.valid)
    }

    pub fn verdicts(&self) -> Vec<(&str, bool)> {
        self.results.iter().map(|r| (r.check.as_str(), r.valid)).collect()
    }

    /// Stable digest of verdicts and findings; equal across runs on an unchanged tree
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        fingerprint(&self.results)
    }
}
