//! `mf render` command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use mf_config::{CliSettings, OutputMode, Settings};
use mf_mermaid::MermaidPlugin;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown files to render.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory for the HTML files (default: next to each input).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mermaid.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scratch directory for mermaid-cli input and output (overrides config).
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Directory for SVG files in `files` mode (overrides config).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// How charts are embedded: inline, data-uri or files (overrides config).
    #[arg(long)]
    mode: Option<OutputMode>,

    /// Disable the definition cache.
    #[arg(long)]
    no_cache: bool,

    /// Run mermaid-cli once per chart instead of once per document.
    #[arg(long)]
    no_batch: bool,

    /// Fail on the first chart that cannot be rendered.
    #[arg(long)]
    throw_on_error: bool,

    /// Enable verbose output (settings and mermaid-cli invocations).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, a file cannot be read or
    /// written, or a chart fails while `--throw-on-error` is set.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            working_dir: self.working_dir.clone(),
            output_dir: self.output_dir.clone(),
            mode: self.mode,
            cache: self.no_cache.then_some(false),
            batch: self.no_batch.then_some(false),
            throw_on_error: self.throw_on_error.then_some(true),
            verbose: self.verbose.then_some(true),
        };
        let settings = Settings::load(self.config.as_deref(), Some(&cli_settings))?;
        let mut plugin = MermaidPlugin::new(settings)?;

        self.render_all(&mut plugin, &Output::new())
    }

    /// Render every input with one plugin, so the cache spans files.
    fn render_all(&self, plugin: &mut MermaidPlugin, output: &Output) -> Result<(), CliError> {
        if let Some(out_dir) = &self.out_dir {
            fs::create_dir_all(out_dir)?;
        }

        for file in &self.files {
            let markdown = fs::read_to_string(file)?;
            let result = plugin
                .render_markdown(&markdown)
                .map_err(|source| CliError::Render {
                    path: file.display().to_string(),
                    source,
                })?;

            for warning in &result.warnings {
                output.chart_warning(file, warning);
            }

            let target = html_path(file, self.out_dir.as_deref());
            fs::write(&target, result.html)?;
            tracing::debug!(input = %file.display(), output = %target.display(), "Wrote HTML");
            output.rendered(file, &target);
        }

        output.summary(self.files.len(), plugin.cache().len());
        Ok(())
    }
}

/// `<name>.html` next to the input, or inside `out_dir`.
fn html_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let html = input.with_extension("html");
    match (out_dir, html.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => html,
    }
}

#[cfg(test)]
mod tests {
    use mf_mermaid::MockRunner;
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(files: Vec<PathBuf>, out_dir: Option<PathBuf>) -> RenderArgs {
        RenderArgs {
            files,
            out_dir,
            config: None,
            working_dir: None,
            output_dir: None,
            mode: None,
            no_cache: false,
            no_batch: false,
            throw_on_error: false,
            verbose: false,
        }
    }

    fn plugin(root: &Path, runner: MockRunner, throw_on_error: bool) -> MermaidPlugin {
        let settings = Settings {
            working_dir: root.join("work"),
            output_dir: root.join("svg"),
            throw_on_error,
            ..Default::default()
        };
        MermaidPlugin::with_runner(settings, Box::new(runner)).unwrap()
    }

    #[test]
    fn test_html_path() {
        assert_eq!(
            html_path(Path::new("docs/guide.md"), None),
            PathBuf::from("docs/guide.html")
        );
        assert_eq!(
            html_path(Path::new("docs/guide.md"), Some(Path::new("site"))),
            PathBuf::from("site/guide.html")
        );
    }

    #[test]
    fn test_render_files_share_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let chart = "```mermaid\ngraph TD\n  A --> B\n```\n";
        let first = tmp.path().join("first.md");
        let second = tmp.path().join("second.md");
        fs::write(&first, format!("# First\n\n{chart}")).unwrap();
        fs::write(&second, format!("# Second\n\n{chart}")).unwrap();
        let runner = MockRunner::new();
        let mut plugin = plugin(tmp.path(), runner.clone(), false);
        let out_dir = tmp.path().join("site");

        args(vec![first, second], Some(out_dir.clone()))
            .render_all(&mut plugin, &Output::new())
            .unwrap();

        assert_eq!(runner.invocations(), 1);
        let html = fs::read_to_string(out_dir.join("second.html")).unwrap();
        assert!(html.starts_with(r#"<h1 id="second">Second</h1><figure class="mermaid"><svg"#));
        assert!(out_dir.join("first.html").exists());
    }

    #[test]
    fn test_render_strict_failure_names_file() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = tmp.path().join("broken.md");
        fs::write(&doc, "```mermaid\ngraph\n```\n").unwrap();
        let mut plugin = plugin(tmp.path(), MockRunner::failing("Parse error"), true);

        let err = args(vec![doc.clone()], None)
            .render_all(&mut plugin, &Output::new())
            .unwrap_err();

        assert!(err.to_string().starts_with(&doc.display().to_string()));
        assert!(!tmp.path().join("broken.html").exists());
    }

    #[test]
    fn test_render_missing_input() {
        let tmp = tempfile::tempdir().unwrap();
        let mut plugin = plugin(tmp.path(), MockRunner::new(), false);

        let err = args(vec![tmp.path().join("missing.md")], None)
            .render_all(&mut plugin, &Output::new())
            .unwrap_err();

        assert!(matches!(err, CliError::Io(_)));
    }
}
