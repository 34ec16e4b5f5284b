//! Validation System - Findings and Verdicts
//!
//! Checks record findings. The verdict is derived from the findings,
//! never set directly: a check passes iff it recorded no error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FindingLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl FindingLevel {
    pub fn label(&self) -> &'static str {
        match self {
            FindingLevel::Success => "✓ SUCCESS:",
            FindingLevel::Info => "INFO:",
            FindingLevel::Warning => "⚠ WARNING:",
            FindingLevel::Error => "✗ ERROR:",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub level: FindingLevel,
    pub message: String,
    /// Verbatim text attached to the finding, e.g. captured build stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remediation: Vec<String>,
}

impl Finding {
    pub fn new(level: FindingLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            detail: None,
            remediation: vec![],
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_remediation(mut self, hint: impl Into<String>) -> Self {
        self.remediation.push(hint.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub check: String,
    pub valid: bool,
    pub findings: Vec<Finding>,
}

impl ValidationResult {
    pub fn from_findings(check: &str, findings: Vec<Finding>) -> Self {
        let valid = !findings.iter().any(|f| f.level == FindingLevel::Error);
        Self {
            check: check.to_string(),
            valid,
            findings,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.level == FindingLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.level == FindingLevel::Warning)
    }

    /// True if any finding's message or detail contains `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.findings.iter().any(|f| {
            f.message.contains(needle)
                || f.detail.as_deref().is_some_and(|d| d.contains(needle))
        })
    }
}

/// Receives findings the moment a check records them.
pub trait FindingSink {
    fn begin_check(&mut self, _check: &str) {}
    fn record(&mut self, check: &str, finding: &Finding);
}

/// Discards everything. Used for quiet and JSON runs.
pub struct NullSink;

impl FindingSink for NullSink {
    fn record(&mut self, _check: &str, _finding: &Finding) {}
}

impl FindingSink for Vec<(String, Finding)> {
    fn record(&mut self, check: &str, finding: &Finding) {
        self.push((check.to_string(), finding.clone()));
    }
}

/// Per-check accumulator. Forwards every finding to the sink as it is recorded.
pub struct Findings<'a> {
    check: &'static str,
    items: Vec<Finding>,
    sink: &'a mut dyn FindingSink,
}

impl<'a> Findings<'a> {
    pub fn new(check: &'static str, sink: &'a mut dyn FindingSink) -> Self {
        Self {
            check,
            items: vec![],
            sink,
        }
    }

    pub fn push(&mut self, finding: Finding) {
        self.sink.record(self.check, &finding);
        self.items.push(finding);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Finding::new(FindingLevel::Success, message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Finding::new(FindingLevel::Info, message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Finding::new(FindingLevel::Warning, message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Finding::new(FindingLevel::Error, message));
    }

    pub fn finish(self) -> ValidationResult {
        ValidationResult::from_findings(self.check, self.items)
    }
}

/// An independent check producing a verdict plus findings.
///
/// Implementations turn every anticipated failure mode into findings.
/// A panic inside `run` is a defect, not a validation failure.
pub trait Check {
    fn name(&self) -> &'static str;
    fn run(&self, findings: &mut Findings<'_>);
}
