use std::path::PathBuf;

use clap::Parser;

use crate::manifest::Section;

#[derive(Parser, Debug)]
#[command(
    name = "license-fetchr",
    about = "Resolve the upstream GitHub license of every npm dependency",
    version
)]
pub struct Cli {
    /// package.json, or a directory containing one
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Config file [default: ./.license-fetchr/config.toml, fallback ~/.config/license-fetchr/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Maximum number of dependencies resolved concurrently (overrides config)
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Ignore devDependencies
    #[arg(long)]
    pub skip_dev: bool,

    /// Show all dependencies (not just warnings/errors) and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

impl Cli {
    /// Dependency tables to read from the manifest.
    pub fn sections(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|s| !(self.skip_dev && *s == Section::DevDependencies))
            .collect()
    }
}
