//! Build Tool Invoker
//!
//! Runs the external site generator in strict mode under a wall-clock limit.
//! Child output is captured in anonymous temp files.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub const BUILD_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Working directory {} does not exist", .0.display())]
    WorkingDir(PathBuf),

    #[error("Failed to set up output capture: {0}")]
    Capture(#[source] io::Error),

    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// How a build invocation ended.
///
/// `Unavailable` means the tool is not installed, which is a skip rather than
/// a broken build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Succeeded { stderr: String },
    Failed { code: Option<i32>, stderr: String },
    TimedOut { limit: Duration },
    Unavailable { program: String },
}

impl BuildOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, BuildOutcome::Succeeded { .. } | BuildOutcome::Unavailable { .. })
    }
}

#[derive(Debug, Clone)]
pub struct BuildInvoker {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl BuildInvoker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: BUILD_TIMEOUT,
            working_dir: None,
        }
    }

    /// `mkdocs build --strict`, warnings promoted to errors
    pub fn strict_mkdocs() -> Self {
        Self::new("mkdocs", vec!["build".to_string(), "--strict".to_string()])
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn run(&self) -> Result<BuildOutcome, BuildError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.working_dir {
            // spawn reports a missing cwd as NotFound, which would read as "tool not installed"
            if !dir.is_dir() {
                return Err(BuildError::WorkingDir(dir.clone()));
            }
            command.current_dir(dir);
        }

        let stdout = tempfile::tempfile().map_err(BuildError::Capture)?;
        let mut stderr = tempfile::tempfile().map_err(BuildError::Capture)?;
        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr.try_clone().map_err(BuildError::Capture)?));

        debug!(command = %self.command_line(), timeout_secs = self.timeout.as_secs(), "starting build");
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(BuildOutcome::Unavailable {
                    program: self.program.clone(),
                });
            }
            Err(source) => {
                return Err(BuildError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
        };

        let started = Instant::now();
        let status = loop {
            let polled = child.try_wait().map_err(|source| BuildError::Wait {
                program: self.program.clone(),
                source,
            })?;
            if let Some(status) = polled {
                break status;
            }
            if started.elapsed() > self.timeout {
                warn!(command = %self.command_line(), "build exceeded time limit, killing");
                let _ = child.kill();
                let _ = child.wait();
                return Ok(BuildOutcome::TimedOut {
                    limit: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stderr = read_capture(&mut stderr).map_err(BuildError::Capture)?;
        debug!(code = ?status.code(), elapsed_ms = started.elapsed().as_millis() as u64, "build finished");

        if status.success() {
            Ok(BuildOutcome::Succeeded { stderr })
        } else {
            Ok(BuildOutcome::Failed {
                code: status.code(),
                stderr,
            })
        }
    }
}

impl Default for BuildInvoker {
    fn default() -> Self {
        Self::strict_mkdocs()
    }
}

fn read_capture(file: &mut File) -> io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
