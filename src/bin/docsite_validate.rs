//! docsite-validate CLI
//!
//! Runs the validation pipeline over a documentation project.
//! Exit 0 when every check passes, 1 otherwise.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docsite_validate::{
    ConsoleSink, NullSink, PipelineSettings, RunReport, TagPolicy, ValidationPipeline,
};

const LOG_ENV: &str = "DOCSITE_VALIDATE_LOG";

#[derive(Parser)]
#[command(name = "docsite-validate")]
#[command(version, about = "Validate a documentation site's plugins, data references, and build")]
struct Cli {
    /// Document root scanned for read_csv() references [default: docs]
    docs_root: Option<PathBuf>,

    /// Project directory; other relative paths resolve against it [default: .]
    #[arg(short = 'C', long)]
    project: Option<PathBuf>,

    /// JSON settings file; command-line flags take precedence
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Site configuration [default: mkdocs.yml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Requirement manifest [default: requirements.txt]
    #[arg(long)]
    requirements: Option<PathBuf>,

    /// Build tool executable, looked up on PATH [default: mkdocs]
    #[arg(long)]
    build_tool: Option<String>,

    /// Build time limit in seconds [default: 60]
    #[arg(long)]
    build_timeout: Option<u64>,

    /// Built site directory; enables the Mermaid asset check
    #[arg(long)]
    site: Option<PathBuf>,

    /// Fail on configuration tags the loader does not understand
    #[arg(long)]
    strict_tags: bool,

    /// Print a JSON run report instead of the live console output
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_settings(self) -> Result<(PipelineSettings, bool), String> {
        let mut settings = match &self.settings {
            Some(path) => PipelineSettings::load_from_file(path).map_err(|e| e.to_string())?,
            None => PipelineSettings::default(),
        };
        if let Some(root) = self.docs_root {
            settings.docs_root = root;
        }
        if let Some(project) = self.project {
            settings.project = project;
        }
        if let Some(config) = self.config {
            settings.config = config;
        }
        if let Some(requirements) = self.requirements {
            settings.requirements = requirements;
        }
        if let Some(tool) = self.build_tool {
            settings.build.program = tool;
        }
        if let Some(secs) = self.build_timeout {
            settings.build.timeout_secs = secs;
        }
        if let Some(site) = self.site {
            settings.site_dir = Some(site);
        }
        if self.strict_tags {
            settings.unknown_tags = TagPolicy::Reject;
        }
        Ok((settings, self.json))
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let (settings, json) = match cli.into_settings() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?settings, "resolved settings");

    let pipeline = ValidationPipeline::from_settings(&settings);

    if json {
        let report = pipeline.run(&mut NullSink);
        let run = match RunReport::new(&report) {
            Ok(run) => run,
            Err(e) => {
                eprintln!("error: failed to build report: {e}");
                return ExitCode::FAILURE;
            }
        };
        match serde_json::to_string_pretty(&run) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("error: failed to serialize report: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::from(report.exit_code());
    }

    let mut console = ConsoleSink::stdio();
    console.banner();
    let report = pipeline.run(&mut console);
    console.summary(&report);
    ExitCode::from(report.exit_code())
}
