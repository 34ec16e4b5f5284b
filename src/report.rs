//! Reporting - live console findings, summary table, JSON run report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::pipeline::PipelineReport;
use crate::validation::{Finding, FindingLevel, FindingSink, ValidationResult};
use crate::TOOL_VERSION;

pub const BANNER: &str = "=== Documentation Site Validation ===";

/// Prints each finding as soon as it is recorded.
///
/// Error details (captured build diagnostics) go to the error stream verbatim.
pub struct ConsoleSink<O: Write, E: Write> {
    out: O,
    err: E,
}

impl ConsoleSink<std::io::Stdout, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdout(), std::io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    pub fn banner(&mut self) {
        let _ = writeln!(self.out, "\n{BANNER}");
    }

    pub fn summary(&mut self, report: &PipelineReport) {
        let _ = write!(self.out, "{}", render_summary(report));
        let _ = self.out.flush();
    }
}

impl<O: Write, E: Write> FindingSink for ConsoleSink<O, E> {
    fn begin_check(&mut self, check: &str) {
        let _ = writeln!(self.out, "\n{} Checking {check}...", FindingLevel::Info.label());
    }

    fn record(&mut self, _check: &str, finding: &Finding) {
        let _ = writeln!(self.out, "{} {}", finding.level.label(), finding.message);
        if let Some(detail) = &finding.detail {
            if finding.level == FindingLevel::Error {
                let _ = self.out.flush();
                let _ = writeln!(self.err, "{}", detail.trim_end());
            } else {
                for line in detail.lines() {
                    let _ = writeln!(self.out, "   {line}");
                }
            }
        }
        for hint in &finding.remediation {
            let _ = writeln!(self.out, "   → {hint}");
        }
    }
}

pub fn render_summary(report: &PipelineReport) -> String {
    let mut out = String::from("\n=== Summary ===\n");
    for (check, passed) in report.verdicts() {
        let status = if passed { "PASS" } else { "FAIL" };
        out.push_str(&format!("  {status} - {check}\n"));
    }
    if report.all_passed() {
        out.push_str("\n✓ All validations passed!\n");
    } else {
        out.push_str("\n✗ Some validations failed. Please fix the issues above.\n");
    }
    out
}

/// Machine-readable form of a run, emitted with `--json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub tool_version: String,
    pub generated_at: DateTime<Utc>,
    pub passed: bool,
    pub exit_code: u8,
    /// Digest of `results` only, so it is stable across runs
    pub fingerprint: String,
    pub results: Vec<ValidationResult>,
}

impl RunReport {
    pub fn new(report: &PipelineReport) -> Result<Self, serde_json::Error> {
        Ok(Self {
            tool_version: TOOL_VERSION.to_string(),
            generated_at: Utc::now(),
            passed: report.all_passed(),
            exit_code: report.exit_code(),
            fingerprint: report.fingerprint()?,
            results: report.results.clone(),
        })
    }
}
