//! `mf init` command implementation.

use std::path::PathBuf;

use clap::Args;
use mf_config::{CliSettings, Settings};
use mf_mermaid::Workspace;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the init command.
#[derive(Args)]
pub(crate) struct InitArgs {
    /// Path to configuration file (default: auto-discover mermaid.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scratch directory for mermaid-cli input and output (overrides config).
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Directory for SVG files in `files` mode (overrides config).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl InitArgs {
    /// Execute the init command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the directories cannot be
    /// prepared.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            working_dir: self.working_dir,
            output_dir: self.output_dir,
            verbose: self.verbose.then_some(true),
            ..CliSettings::default()
        };
        let settings = Settings::load(self.config.as_deref(), Some(&cli_settings))?;

        if let Some(path) = &settings.config_path {
            output.location("Config", path);
        }
        let workspace = Workspace::prepare(&settings)?;

        output.location("Working directory", workspace.dir());
        output.location("Output directory", &settings.output_dir);
        output.done("Mermaid workspace ready");
        Ok(())
    }
}
