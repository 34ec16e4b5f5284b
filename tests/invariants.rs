//! Contract Invariant Tests
//!
//! These tests verify the pipeline's guarantees against real project trees.

use std::fs;
use std::path::Path;

use docsite_validate::{
    checks::{BUILD_CHECK, PLUGIN_CHECK, REFERENCE_CHECK},
    BuildCheck, BuildInvoker, Check, CsvReferenceCheck, Findings, NullSink, PipelineSettings,
    PluginCoverageCheck, ValidationPipeline, ValidationResult,
};
use tempfile::TempDir;

const MKDOCS_YML: &str = r#"
site_name: Operations Handbook
theme:
  name: material
markdown_extensions:
  - pymdownx.emoji:
      emoji_index: !!python/name:material.extensions.emoji.twemoji
      emoji_generator: !!python/name:material.extensions.emoji.to_svg
plugins:
  - search
  - git-revision-date
  - table-reader:
      data_path: docs
"#;

const REQUIREMENTS: &str = "\
# docs toolchain
mkdocs==1.6.0
mkdocs-material==9.5.3
mkdocs-git-revision-date-plugin==0.3.2
mkdocs-table-reader-plugin==2.2.2
";

const MISSING_TOOL: &str = "docsite-validate-test-missing-tool";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A consistent project: every plugin pinned, every CSV present
fn create_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "mkdocs.yml", MKDOCS_YML);
    write(root, "requirements.txt", REQUIREMENTS);
    write(root, "docs/index.md", "# Handbook\n\n{{ read_csv('data/oncall.csv') }}\n");
    write(root, "docs/data/oncall.csv", "team,primary\nplatform,alice\n");
    dir
}

fn settings_for(project: &Path) -> PipelineSettings {
    let mut settings = PipelineSettings::default();
    settings.project = project.to_path_buf();
    settings.build.program = MISSING_TOOL.to_string();
    settings
}

fn run_check(check: &dyn Check) -> ValidationResult {
    let mut sink = NullSink;
    let mut findings = Findings::new(check.name(), &mut sink);
    check.run(&mut findings);
    findings.finish()
}

#[test]
fn invariant_satisfied_plugins_pass() {
    let project = create_project();
    let root = project.path();
    let result = run_check(&PluginCoverageCheck::new(
        root.join("mkdocs.yml"),
        root.join("requirements.txt"),
    ));

    assert!(result.valid, "{:?}", result.findings);
    assert!(result.mentions("Plugin 'search' is built-in"));
    assert!(result.mentions("mkdocs-table-reader-plugin"));
}

#[test]
fn invariant_unmet_package_fails_and_is_named() {
    let project = create_project();
    let root = project.path();
    write(root, "requirements.txt", "mkdocs==1.6.0\nmkdocs-table-reader-plugin==2.2.2\n");

    let result = run_check(&PluginCoverageCheck::new(
        root.join("mkdocs.yml"),
        root.join("requirements.txt"),
    ));

    assert!(!result.valid);
    assert!(result.mentions("mkdocs-git-revision-date-plugin"));
    // a failing check always explains itself
    assert!(result.errors().count() >= 1);
}

#[test]
fn invariant_warnings_never_fail_plugin_check() {
    let project = create_project();
    let root = project.path();
    write(root, "mkdocs.yml", "site_name: x\nplugins:\n  - search\n  - social\n");
    write(root, "requirements.txt", "mkdocs>=1.5\n");

    let result = run_check(&PluginCoverageCheck::new(
        root.join("mkdocs.yml"),
        root.join("requirements.txt"),
    ));

    assert!(result.valid);
    assert_eq!(result.warnings().count(), 2);
    assert!(result.mentions("Could not parse requirement: mkdocs>=1.5"));
}

#[test]
fn invariant_empty_plugin_list_warns_and_passes() {
    let project = create_project();
    let root = project.path();
    write(root, "mkdocs.yml", "site_name: x\n");

    let result = run_check(&PluginCoverageCheck::new(
        root.join("mkdocs.yml"),
        root.join("requirements.txt"),
    ));
    assert!(result.valid);
    assert!(result.mentions("No plugins configured"));
}

#[test]
fn invariant_missing_inputs_are_hard_failures() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    let result = run_check(&PluginCoverageCheck::new(
        root.join("mkdocs.yml"),
        root.join("requirements.txt"),
    ));
    assert!(!result.valid);
    assert!(result.mentions("mkdocs.yml not found"));

    write(root, "mkdocs.yml", MKDOCS_YML);
    let result = run_check(&PluginCoverageCheck::new(
        root.join("mkdocs.yml"),
        root.join("requirements.txt"),
    ));
    assert!(!result.valid);
    assert!(result.mentions("requirements.txt not found"));

    let result = run_check(&CsvReferenceCheck::new(root.join("docs")));
    assert!(!result.valid);
    assert!(result.mentions("directory not found"));
}

#[test]
fn invariant_no_directives_pass() {
    let project = create_project();
    let root = project.path();
    write(root, "docs/index.md", "# Handbook\n\nNothing tabular.\n");
    write(root, "docs/guides/setup.md", "Read the CSV export guide.\n");

    let result = run_check(&CsvReferenceCheck::new(root.join("docs")));
    assert!(result.valid);
    assert!(result.mentions("No CSV file references found"));
}

#[test]
fn invariant_references_resolve_from_docs_root() {
    let project = create_project();
    let docs = project.path().join("docs");
    write(&docs, "page.md", "{{ read_csv('data/x.csv') }}\n");

    let result = run_check(&CsvReferenceCheck::new(&docs));
    assert!(!result.valid);
    assert!(result
        .errors()
        .any(|f| f.message.contains("data/x.csv") && f.message.contains("page.md")));

    write(&docs, "data/x.csv", "a,b\n1,2\n");
    let result = run_check(&CsvReferenceCheck::new(&docs));
    assert!(result.valid, "{:?}", result.findings);
}

#[test]
fn invariant_nested_pages_do_not_resolve_page_relative() {
    let project = create_project();
    let docs = project.path().join("docs");
    // exists next to the page, but not under the root
    write(&docs, "teams/roster.md", "{{ read_csv(\"members.csv\") }}\n");
    write(&docs, "teams/members.csv", "name\nalice\n");

    let result = run_check(&CsvReferenceCheck::new(&docs));
    assert!(!result.valid);
    assert!(result.mentions("members.csv"));
    assert!(result.mentions("roster.md"));
}

#[test]
fn invariant_every_missing_reference_reported() {
    let project = create_project();
    let docs = project.path().join("docs");
    write(
        &docs,
        "costs.md",
        "{{ read_csv('data/q1.csv') }}\n{{ read_csv('data/q2.csv') }}\n",
    );

    let result = run_check(&CsvReferenceCheck::new(&docs));
    assert_eq!(result.errors().count(), 2);
}

#[test]
fn invariant_empty_docs_root_warns_and_passes() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();

    let result = run_check(&CsvReferenceCheck::new(&docs));
    assert!(result.valid, "{:?}", result.findings);
    assert_eq!(result.warnings().count(), 1);
    assert_eq!(result.errors().count(), 0);
    assert!(result.mentions("No markdown files found"));
}

#[cfg(unix)]
#[test]
fn invariant_unreadable_page_does_not_hide_other_references() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    write(&docs, "a.md", "{{ read_csv('data/missing.csv') }}\n");
    std::os::unix::fs::symlink(docs.join("renamed.md"), docs.join("old.md")).unwrap();

    let result = run_check(&CsvReferenceCheck::new(&docs));
    assert!(!result.valid);
    assert_eq!(result.errors().count(), 2);
    assert!(result.errors().any(|f| f.message.contains("old.md")));
    assert!(result
        .errors()
        .any(|f| f.message.contains("data/missing.csv") && f.message.contains("a.md")));
}

#[test]
fn invariant_missing_build_tool_skips() {
    let result = run_check(&BuildCheck::new(BuildInvoker::new(MISSING_TOOL, vec![])));
    assert!(result.valid);
    assert_eq!(result.warnings().count(), 1);
    assert!(result.mentions("command not found"));
}

#[cfg(unix)]
#[test]
fn invariant_build_outcomes() {
    let sh = |script: &str| BuildInvoker::new("sh", vec!["-c".to_string(), script.to_string()]);

    let result = run_check(&BuildCheck::new(sh("exit 0")));
    assert!(result.valid);

    let result = run_check(&BuildCheck::new(sh(
        "echo \"WARNING - Doc file 'index.md' contains a link 'missing.md'\" >&2; exit 1",
    )));
    assert!(!result.valid);
    assert!(result.mentions("contains a link 'missing.md'"));

    let result = run_check(&BuildCheck::new(
        sh("sleep 10").with_timeout(std::time::Duration::from_millis(200)),
    ));
    assert!(!result.valid);
    assert!(result.mentions("timed out"));
}

#[test]
fn invariant_consistent_project_exits_zero() {
    let project = create_project();
    let report = ValidationPipeline::from_settings(&settings_for(project.path())).run(&mut NullSink);

    assert_eq!(report.verdict(PLUGIN_CHECK), Some(true));
    assert_eq!(report.verdict(REFERENCE_CHECK), Some(true));
    assert_eq!(report.verdict(BUILD_CHECK), Some(true));
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn invariant_any_failure_exits_one_without_stopping() {
    let project = create_project();
    fs::remove_file(project.path().join("mkdocs.yml")).unwrap();

    let report = ValidationPipeline::from_settings(&settings_for(project.path())).run(&mut NullSink);

    assert_eq!(report.verdict(PLUGIN_CHECK), Some(false));
    // later checks still ran
    assert_eq!(report.verdict(REFERENCE_CHECK), Some(true));
    assert_eq!(report.verdict(BUILD_CHECK), Some(true));
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn invariant_runs_are_idempotent() {
    let project = create_project();
    write(project.path(), "docs/broken.md", "{{ read_csv('data/gone.csv') }}\n");
    let pipeline = ValidationPipeline::from_settings(&settings_for(project.path()));

    let first = pipeline.run(&mut NullSink);
    let second = pipeline.run(&mut NullSink);

    assert_eq!(first, second);
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
    assert_eq!(first.exit_code(), 1);
}
