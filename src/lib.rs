//! docsite-validate - Post-build validation for generated documentation sites
//!
//! # Guarantees
//! 1. Every check runs; one failure never stops the others
//! 2. A check fails iff it recorded an error, and every error explains itself
//! 3. Warnings never change a verdict
//! 4. Exit status is 0 iff every verdict passed
//! 5. Unchanged inputs give identical verdicts, findings, and fingerprint

pub mod assets;
pub mod checks;
pub mod config;
pub mod hashing;
pub mod invoker;
pub mod pipeline;
pub mod report;
pub mod requirements;
pub mod rules;
pub mod scanner;
pub mod settings;
pub mod validation;

pub use assets::SiteAssetsCheck;
pub use checks::{BuildCheck, CsvReferenceCheck, PluginCoverageCheck};
pub use config::{ConfigError, LoadOptions, PluginDeclaration, SiteConfig, TagPolicy};
pub use invoker::{BuildError, BuildInvoker, BuildOutcome, BUILD_TIMEOUT};
pub use pipeline::{PipelineReport, ValidationPipeline};
pub use report::{ConsoleSink, RunReport};
pub use requirements::{Requirements, RequirementsError};
pub use rules::{PackageRule, RuleTable, PLUGIN_RULES};
pub use scanner::{CsvReference, ScanError, ScanReport, Unreadable};
pub use settings::{BuildSettings, PipelineSettings, SettingsError};
pub use validation::{Check, Finding, FindingLevel, FindingSink, Findings, NullSink, ValidationResult};

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
