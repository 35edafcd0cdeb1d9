//! Progress and diagnostics on stderr.
//!
//! HTML goes to files, so everything the user reads is written here. Message
//! text is built by plain functions and only styled at the last step.

use std::path::Path;

use console::{Style, Term};

/// Styled stderr reporter for the render and init commands.
pub(crate) struct Output {
    term: Term,
    ok: Style,
    warn: Style,
    fail: Style,
    dim: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
            dim: Style::new().dim(),
        }
    }

    /// One rendered document and where its HTML went.
    pub(crate) fn rendered(&self, input: &Path, target: &Path) {
        self.line(&self.dim, &rendered_line(input, target));
    }

    /// A chart warning, prefixed with the document it came from.
    pub(crate) fn chart_warning(&self, input: &Path, warning: &str) {
        self.line(&self.warn, &warning_line(input, warning));
    }

    /// `label: path` for a resolved setting.
    pub(crate) fn location(&self, label: &str, path: &Path) {
        self.line(&self.dim, &format!("{label}: {}", path.display()));
    }

    /// Final tally of a render run.
    pub(crate) fn summary(&self, files: usize, charts: usize) {
        self.line(&self.ok, &summary_line(files, charts));
    }

    pub(crate) fn done(&self, msg: &str) {
        self.line(&self.ok, msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(&self.fail, msg);
    }

    fn line(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}

fn rendered_line(input: &Path, target: &Path) -> String {
    format!("{} -> {}", input.display(), target.display())
}

fn warning_line(input: &Path, warning: &str) -> String {
    format!("warning: {}: {warning}", input.display())
}

fn summary_line(files: usize, charts: usize) -> String {
    let plural = |n: usize, word: &str| {
        if n == 1 {
            format!("{n} {word}")
        } else {
            format!("{n} {word}s")
        }
    };
    format!(
        "Rendered {}, {} cached",
        plural(files, "file"),
        plural(charts, "chart")
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_rendered_line() {
        assert_eq!(
            rendered_line(Path::new("docs/a.md"), Path::new("site/a.html")),
            "docs/a.md -> site/a.html"
        );
    }

    #[test]
    fn test_warning_line() {
        assert_eq!(
            warning_line(Path::new("a.md"), "mermaid block 0: unknown attribute 'x' ignored"),
            "warning: a.md: mermaid block 0: unknown attribute 'x' ignored"
        );
    }

    #[test]
    fn test_summary_line_pluralizes() {
        assert_eq!(summary_line(1, 1), "Rendered 1 file, 1 chart cached");
        assert_eq!(summary_line(3, 0), "Rendered 3 files, 0 charts cached");
    }
}
