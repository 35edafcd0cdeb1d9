//! Running mermaid-cli.
//!
//! [`Invoker`] builds the argument vector from [`Settings`] and hands it to a
//! [`CommandRunner`]. No shell is involved, so chart text and paths are never
//! interpreted.

use std::path::Path;
use std::process::Command;

use mf_config::Settings;

use crate::error::InvokeError;
use crate::workspace::{Batch, Workspace};

/// Runs an external program to completion.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Spawn`] if the program cannot be started and
    /// [`InvokeError::Exit`] if it exits unsuccessfully.
    fn run(&self, program: &str, args: &[String]) -> Result<(), InvokeError>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<(), InvokeError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| InvokeError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }
        Err(InvokeError::Exit {
            program: program.to_owned(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

/// Builds and runs tool invocations for a workspace.
pub(crate) struct Invoker<'a> {
    settings: &'a Settings,
    workspace: &'a Workspace,
    runner: &'a dyn CommandRunner,
}

impl<'a> Invoker<'a> {
    pub(crate) fn new(
        settings: &'a Settings,
        workspace: &'a Workspace,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            settings,
            workspace,
            runner,
        }
    }

    /// Render every chart of a batch with one invocation.
    ///
    /// The batch input is a markdown file; mermaid-cli renders each fenced
    /// block and numbers the outputs after the `--output` name.
    pub(crate) fn run_batch(&self, batch: &Batch) -> Result<(), InvokeError> {
        let args = self.arguments(&batch.input_path(), &batch.output_template());
        self.run(&args)
    }

    /// Render a single chart.
    pub(crate) fn run_single(&self, id: &str) -> Result<(), InvokeError> {
        let args = self.arguments(
            &self.workspace.input_path(id),
            &self.workspace.output_path(id),
        );
        self.run(&args)
    }

    fn run(&self, args: &[String]) -> Result<(), InvokeError> {
        if self.settings.verbose {
            tracing::info!(command = %self.settings.command, args = ?args, "Running mermaid-cli");
        }
        self.runner.run(&self.settings.command, args)
    }

    /// Full argument vector: configured leading args, then the generated ones.
    pub(crate) fn arguments(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = self.settings.args.clone();
        let generated = [
            ("--backgroundColor", self.settings.background_color.clone()),
            ("--cssFile", display(&self.workspace.theme_css_path())),
            ("--input", display(input)),
            ("--output", display(output)),
            ("--configFile", display(&self.workspace.mermaid_config_path())),
            (
                "--puppeteerConfigFile",
                display(&self.workspace.puppeteer_config_path()),
            ),
        ];
        for (flag, value) in generated {
            args.push(flag.to_owned());
            args.push(value);
        }
        args
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
