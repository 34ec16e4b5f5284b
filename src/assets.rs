//! Built-site Mermaid asset check
//!
//! Inspects the generated HTML for the Mermaid runtime, rendered diagrams, and
//! whether the runtime URL carries a freshness (`?v=`) parameter.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::scanner::{self, ScanError, Unreadable};
use crate::validation::{Check, Finding, FindingLevel, Findings};

pub const ASSETS_CHECK: &str = "Mermaid assets";

const MERMAID_SCRIPT: &str = "mermaid.min.js";
const MERMAID_SCRIPT_FRESH: &str = "mermaid.min.js?v=";
const DIAGRAM_CLASS: &str = r#"class="mermaid""#;
const DIAGRAM_FENCE: &str = r#"<pre><code class="language-mermaid">"#;
const DIAGRAM_LANGUAGE: &str = "language-mermaid";
const CSP_MARKER: &str = "Content-Security-Policy";
const SNIPPET_CHARS: usize = 200;

fn diagram_div() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?s)(<div[^>]*class="mermaid"[^>]*>.*?</div>)"#).expect("static regex")
    })
}

pub struct SiteAssetsCheck {
    pub site_dir: PathBuf,
}

impl SiteAssetsCheck {
    pub fn new(site_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_dir: site_dir.into(),
        }
    }
}

struct Page {
    name: String,
    content: String,
}

/// Every readable HTML page under `site_dir`. Pages that cannot be read are returned separately.
fn html_pages(site_dir: &Path) -> Result<(Vec<Page>, Vec<Unreadable>), ScanError> {
    let walk = scanner::files_with_extension(site_dir, "html")?;
    let mut unreadable = walk.unreadable;
    let mut pages = Vec::with_capacity(walk.files.len());
    for path in walk.files {
        match fs::read(&path) {
            Ok(bytes) => pages.push(Page {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                content: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Err(source) => unreadable.push(Unreadable {
                path: path.strip_prefix(site_dir).unwrap_or(&path).to_path_buf(),
                error: ScanError::Read { path, source },
            }),
        }
    }
    Ok((pages, unreadable))
}

impl Check for SiteAssetsCheck {
    fn name(&self) -> &'static str {
        ASSETS_CHECK
    }

    fn run(&self, findings: &mut Findings<'_>) {
        let (pages, unreadable) = match html_pages(&self.site_dir) {
            Ok(walk) => walk,
            Err(e) => return findings.error(e.to_string()),
        };
        for entry in &unreadable {
            findings.error(format!(
                "Could not read {} ({})",
                entry.path.display(),
                entry.error
            ));
        }
        let Some(sample) = pages.first() else {
            return findings.error("No HTML files found in site directory");
        };
        findings.info(format!("Found {} HTML files to check", pages.len()));

        match pages.iter().find(|p| p.content.contains(MERMAID_SCRIPT)) {
            Some(page) => findings.success(format!("Mermaid script found in: {}", page.name)),
            None => findings.error("Mermaid JavaScript library not found in any HTML file"),
        }

        let mut diagrams_found = false;
        for page in &pages {
            if !(page.content.contains(DIAGRAM_CLASS) || page.content.contains(DIAGRAM_FENCE)) {
                continue;
            }
            diagrams_found = true;
            let count =
                page.content.matches(DIAGRAM_CLASS).count() + page.content.matches(DIAGRAM_LANGUAGE).count();
            let mut finding = Finding::new(
                FindingLevel::Success,
                format!("Found {count} mermaid diagram(s) in: {}", page.name),
            );
            if let Some(caps) = diagram_div().captures(&page.content) {
                let snippet: String = caps[1].chars().take(SNIPPET_CHARS).collect();
                finding = finding.with_detail(format!("{snippet}..."));
            }
            findings.push(finding);
        }
        if !diagrams_found {
            findings.error("No mermaid diagrams found in any HTML file");
        }

        // freshness parameter is observed on the first page only
        if sample.content.contains(MERMAID_SCRIPT_FRESH) {
            findings.success("Mermaid script has cache busting parameter");
        } else if sample.content.contains(MERMAID_SCRIPT) {
            findings.warning("Mermaid script found but no cache busting parameter");
        }

        if sample.content.contains(CSP_MARKER) {
            findings.push(
                Finding::new(
                    FindingLevel::Error,
                    format!("Content-Security-Policy found in {} - may block inline scripts", sample.name),
                )
                .with_remediation("Check CSP headers in deployed site"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::NullSink;

    fn run(site: &Path) -> crate::ValidationResult {
        let mut sink = NullSink;
        let mut findings = Findings::new(ASSETS_CHECK, &mut sink);
        SiteAssetsCheck::new(site).run(&mut findings);
        findings.finish()
    }

    const INDEX: &str = r#"<html><head><script src="js/mermaid.min.js?v=20240101120000"></script></head>
<body><div class="mermaid">graph TD; A-->B;</div></body></html>"#;

    #[test]
    fn test_healthy_site_passes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), INDEX).unwrap();
        let result = run(dir.path());
        assert!(result.valid, "{:?}", result.findings);
        assert!(result.mentions("Found 1 mermaid diagram(s) in: index.html"));
        assert!(result.mentions("cache busting parameter"));
        assert_eq!(result.warnings().count(), 0);
    }

    #[test]
    fn test_missing_freshness_parameter_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("index.html"),
            INDEX.replace("mermaid.min.js?v=20240101120000", "mermaid.min.js"),
        )
        .unwrap();
        let result = run(dir.path());
        assert!(result.valid);
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn test_no_html_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path());
        assert!(!result.valid);
        assert!(result.mentions("No HTML files found"));
    }

    #[test]
    fn test_missing_site_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&dir.path().join("site"));
        assert!(!result.valid);
        assert!(result.mentions("directory not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_page_reported_alongside_others() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), INDEX).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.html"), dir.path().join("stale.html")).unwrap();

        let result = run(dir.path());
        assert!(!result.valid);
        assert_eq!(result.errors().count(), 1);
        assert!(result.errors().any(|f| f.message.contains("stale.html")));
        assert!(result.mentions("Found 1 mermaid diagram(s) in: index.html"));
    }

    #[test]
    fn test_missing_runtime_and_diagrams_fail() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html><body>plain</body></html>").unwrap();
        let result = run(dir.path());
        assert!(!result.valid);
        assert_eq!(result.errors().count(), 2);
    }
}
