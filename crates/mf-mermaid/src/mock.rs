//! Mock command runner for testing.
//!
//! Provides [`MockRunner`], which stands in for mermaid-cli by writing a small
//! SVG for every chart it is pointed at.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mf_renderer::escape_html;

use crate::error::InvokeError;
use crate::invoker::CommandRunner;

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<Vec<String>>,
    definitions: Vec<String>,
    failure: Option<String>,
    skip_marker: Option<String>,
}

/// Mock mermaid-cli.
///
/// Understands `--input`/`--output` like mermaid-cli: a definition file maps
/// to the output path, while a markdown input yields one `<stem>-N.<ext>`
/// output per fenced `mermaid` block. A missing input fails the call. Each
/// produced SVG is 800x600 and carries
/// the definition text in a `<desc>` element, so tests can match outputs to
/// inputs. Clones share state, so a clone can be handed to the plugin while
/// the test keeps another for assertions.
///
/// # Example
///
/// ```ignore
/// use mf_mermaid::{MermaidPlugin, MockRunner};
///
/// let runner = MockRunner::new();
/// let mut plugin = MermaidPlugin::with_runner(settings, Box::new(runner.clone()))?;
/// plugin.render_markdown("```mermaid\ngraph TD\n```")?;
/// assert_eq!(runner.invocations(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
}

impl MockRunner {
    /// Create a runner that renders every definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner that exits with status 1 and the given stderr.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn failing(stderr: impl Into<String>) -> Self {
        let runner = Self::default();
        runner.state.lock().unwrap().failure = Some(stderr.into());
        runner
    }

    /// Skip output for definitions containing `marker`, while still exiting 0.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn skipping(self, marker: impl Into<String>) -> Self {
        self.state.lock().unwrap().skip_marker = Some(marker.into());
        self
    }

    /// Number of times the runner was called.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Argument vectors of every call.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Definition file contents read across all calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn definitions(&self) -> Vec<String> {
        self.state.lock().unwrap().definitions.clone()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<(), InvokeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(args.to_vec());

        let exit = |stderr: String| InvokeError::Exit {
            program: program.to_owned(),
            code: Some(1),
            stderr,
        };

        if let Some(stderr) = &state.failure {
            return Err(exit(stderr.clone()));
        }

        let (Some(input), Some(output)) = (flag_value(args, "--input"), flag_value(args, "--output"))
        else {
            return Err(exit("missing --input or --output".to_owned()));
        };

        let content = fs::read_to_string(&input)
            .map_err(|e| exit(format!("Input file {} unreadable: {e}", input.display())))?;
        let charts: Vec<(String, PathBuf)> = if input.extension().is_some_and(|ext| ext == "md") {
            markdown_charts(&content)
                .into_iter()
                .enumerate()
                .map(|(i, definition)| (definition, numbered(&output, i + 1)))
                .collect()
        } else {
            vec![(content, output)]
        };

        for (definition, output) in charts {
            state.definitions.push(definition.clone());
            if state
                .skip_marker
                .as_deref()
                .is_some_and(|marker| definition.contains(marker))
            {
                continue;
            }
            fs::write(&output, mock_svg(&definition)).map_err(|e| exit(e.to_string()))?;
        }
        Ok(())
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<PathBuf> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

/// Bodies of the fenced `mermaid` blocks of a markdown file.
fn markdown_charts(markdown: &str) -> Vec<String> {
    let mut charts = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for line in markdown.lines() {
        if let Some(lines) = current.as_mut() {
            if line.trim() == "```" {
                charts.push(lines.join("\n"));
                current = None;
            } else {
                lines.push(line);
            }
        } else if line.trim() == "```mermaid" {
            current = Some(Vec::new());
        }
    }
    charts
}

/// `dir/chart.svg` becomes `dir/chart-<n>.svg`.
fn numbered(output: &Path, n: usize) -> PathBuf {
    let stem = output.file_stem().unwrap_or_default().to_string_lossy();
    let name = match output.extension() {
        Some(ext) => format!("{stem}-{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{n}"),
    };
    output.with_file_name(name)
}

fn mock_svg(definition: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="600"><desc>{}</desc></svg>"#,
        escape_html(definition.trim())
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(input: &Path, output: &Path) -> Vec<String> {
        vec![
            "--input".to_owned(),
            input.display().to_string(),
            "--output".to_owned(),
            output.display().to_string(),
        ]
    }

    #[test]
    fn test_single_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.mmd"), "graph TD\n  A --> B\n").unwrap();
        let runner = MockRunner::new();

        runner
            .run(
                "mmdc",
                &args(&tmp.path().join("a.mmd"), &tmp.path().join("a.svg")),
            )
            .unwrap();

        assert_eq!(
            fs::read_to_string(tmp.path().join("a.svg")).unwrap(),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="600"><desc>graph TD
  A --&gt; B</desc></svg>"#
        );
        assert_eq!(runner.invocations(), 1);
    }

    #[test]
    fn test_markdown_batch() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("charts.md"),
            "```mermaid\ngraph A\n```\n\n```mermaid\ngraph B\n```\n\n```mermaid\ngraph C\n```\n",
        )
        .unwrap();
        let runner = MockRunner::new().skipping("B");

        runner
            .run(
                "mmdc",
                &args(&tmp.path().join("charts.md"), &tmp.path().join("chart.svg")),
            )
            .unwrap();

        assert!(tmp.path().join("chart-1.svg").exists());
        assert!(!tmp.path().join("chart-2.svg").exists());
        assert!(
            fs::read_to_string(tmp.path().join("chart-3.svg"))
                .unwrap()
                .contains("<desc>graph C</desc>")
        );
        assert_eq!(runner.definitions(), vec!["graph A", "graph B", "graph C"]);
    }

    #[test]
    fn test_missing_input_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = MockRunner::new();

        let err = runner
            .run(
                "mmdc",
                &args(&tmp.path().join("*.mmd"), &tmp.path().join("*.svg")),
            )
            .unwrap_err();

        assert!(err.to_string().contains("*.mmd"));
        assert!(runner.definitions().is_empty());
    }

    #[test]
    fn test_failing() {
        let runner = MockRunner::failing("Parse error");
        let clone = runner.clone();

        let err = clone.run("mmdc", &[]).unwrap_err();

        assert!(err.to_string().contains("Parse error"));
        assert_eq!(runner.invocations(), 1);
    }
}
