//! Data Reference Scanner
//!
//! Finds `read_csv('<path>')` directives in markdown documents. Paths resolve
//! against the document root, not the directory of the referencing page.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{}/ directory not found", .0.display())]
    RootNotFound(PathBuf),

    #[error("Failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvReference {
    /// Path as written in the directive
    pub path: String,
    /// Referencing document, relative to the document root
    pub document: PathBuf,
}

impl CsvReference {
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }
}

/// A document or directory entry that could not be read. The rest of the tree is still scanned.
#[derive(Debug)]
pub struct Unreadable {
    /// Relative to the scanned root
    pub path: PathBuf,
    pub error: ScanError,
}

#[derive(Debug, Default)]
pub struct FileWalk {
    pub files: Vec<PathBuf>,
    pub unreadable: Vec<Unreadable>,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub documents: usize,
    pub references: Vec<CsvReference>,
    pub unreadable: Vec<Unreadable>,
}

fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"read_csv\(\s*['"]([^'"]+)['"]\s*\)"#).expect("static regex")
    })
}

/// Every directive path in `text`, in order of appearance
pub fn extract_references(text: &str) -> Vec<String> {
    directive_pattern()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Files under `root` with extension `ext`, sorted. Only a missing root is fatal.
pub fn files_with_extension(root: &Path, ext: &str) -> Result<FileWalk, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    let mut walk = FileWalk::default();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                let path = source.path().unwrap_or(root);
                let path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
                walk.unreadable.push(Unreadable {
                    path,
                    error: ScanError::Walk {
                        root: root.to_path_buf(),
                        source,
                    },
                });
                continue;
            }
        };
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == ext) {
            walk.files.push(entry.into_path());
        }
    }
    walk.files.sort();
    walk.unreadable.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(walk)
}

pub fn scan(root: &Path) -> Result<ScanReport, ScanError> {
    let walk = files_with_extension(root, "md")?;
    let mut report = ScanReport {
        documents: walk.files.len(),
        references: vec![],
        unreadable: walk.unreadable,
    };

    for doc in &walk.files {
        let relative = doc.strip_prefix(root).unwrap_or(doc).to_path_buf();
        let bytes = match fs::read(doc) {
            Ok(bytes) => bytes,
            Err(source) => {
                report.unreadable.push(Unreadable {
                    path: relative,
                    error: ScanError::Read {
                        path: doc.clone(),
                        source,
                    },
                });
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        for path in extract_references(&text) {
            report.references.push(CsvReference {
                path,
                document: relative.clone(),
            });
        }
    }

    debug!(
        root = %root.display(),
        documents = report.documents,
        references = report.references.len(),
        unreadable = report.unreadable.len(),
        "scanned document tree"
    );
    Ok(report)
}
