//! Working directory shared with the external tool.
//!
//! Holds the tool configuration files written at startup, the `<id>.mmd`
//! input and `<id>.svg` output of a chart rendered on its own, and one
//! short-lived subdirectory per [`Batch`].

use std::fmt::Write;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mf_config::Settings;
use tempfile::TempDir;

use crate::consts::{
    BATCH_DIR_PREFIX, BATCH_INPUT_FILE, BATCH_OUTPUT_STEM, INPUT_EXT, LANGUAGE,
    MERMAID_CONFIG_FILE, OUTPUT_EXT, PUPPETEER_CONFIG_FILE, THEME_CSS_FILE,
};
use crate::error::MermaidError;

/// Scratch directory for tool input and output.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    /// Create the working directory and write the tool configuration files.
    ///
    /// The directory is wiped first when `clear_working_dir` is set. The
    /// output directory is handled the same way with `clear_output_dir`.
    pub fn prepare(settings: &Settings) -> Result<Self, MermaidError> {
        let dir = settings.working_dir.clone();
        reset_dir(&dir, settings.clear_working_dir)?;
        reset_dir(&settings.output_dir, settings.clear_output_dir)?;

        let workspace = Self { dir };
        fs::write(
            workspace.mermaid_config_path(),
            settings.mermaid_config_json()?,
        )?;
        fs::write(
            workspace.puppeteer_config_path(),
            settings.puppeteer_config_json()?,
        )?;
        // Theme CSS is written as a single line.
        let css: String = settings
            .theme_css
            .chars()
            .filter(|c| !matches!(c, '\r' | '\n'))
            .collect();
        fs::write(workspace.theme_css_path(), css)?;

        tracing::debug!(dir = %workspace.dir.display(), "Prepared mermaid workspace");
        Ok(workspace)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn mermaid_config_path(&self) -> PathBuf {
        self.dir.join(MERMAID_CONFIG_FILE)
    }

    #[must_use]
    pub fn puppeteer_config_path(&self) -> PathBuf {
        self.dir.join(PUPPETEER_CONFIG_FILE)
    }

    #[must_use]
    pub fn theme_css_path(&self) -> PathBuf {
        self.dir.join(THEME_CSS_FILE)
    }

    /// Definition file for a chart.
    #[must_use]
    pub fn input_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{INPUT_EXT}"))
    }

    /// File the tool writes for a chart.
    #[must_use]
    pub fn output_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{OUTPUT_EXT}"))
    }

    /// Write a chart definition for the tool.
    pub fn write_input(&self, id: &str, definition: &str) -> io::Result<()> {
        fs::write(self.input_path(id), definition)
    }

    /// Read the tool output for a chart and remove its temporary files.
    pub fn take_output(&self, id: &str) -> Result<String, MermaidError> {
        let path = self.output_path(id);
        let svg = match fs::read_to_string(&path) {
            Ok(svg) => svg,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.discard(id);
                return Err(MermaidError::MissingOutput(path));
            }
            Err(e) => {
                self.discard(id);
                return Err(e.into());
            }
        };
        self.discard(id);
        Ok(svg)
    }

    /// Write the charts of a batch into a fresh subdirectory.
    ///
    /// `charts` holds `(id, definition)` pairs. The tool numbers its outputs
    /// in file order, so the n-th pair maps to [`Batch::output_path`]`(n)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or input file cannot be written.
    pub fn write_batch(&self, charts: &[(&str, &str)]) -> io::Result<Batch> {
        let dir = tempfile::Builder::new()
            .prefix(BATCH_DIR_PREFIX)
            .tempdir_in(&self.dir)?;

        let mut markdown = String::new();
        for (_, definition) in charts {
            write!(markdown, "```{LANGUAGE}\n{definition}\n```\n\n").unwrap();
        }
        let batch = Batch {
            dir,
            ids: charts.iter().map(|(id, _)| (*id).to_owned()).collect(),
        };
        fs::write(batch.input_path(), markdown)?;
        Ok(batch)
    }

    /// Remove whatever temporary files exist for a chart.
    pub fn discard(&self, id: &str) {
        for path in [self.input_path(id), self.output_path(id)] {
            if let Err(e) = fs::remove_file(&path)
                && e.kind() != io::ErrorKind::NotFound
            {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
            }
        }
    }
}

/// Charts rendered together by one tool invocation.
///
/// The batch directory and everything the tool wrote into it are removed
/// when the batch is dropped.
#[derive(Debug)]
pub struct Batch {
    dir: TempDir,
    ids: Vec<String>,
}

impl Batch {
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Chart ids in the order their blocks appear in the input file.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Markdown file passed as `--input`.
    #[must_use]
    pub fn input_path(&self) -> PathBuf {
        self.dir().join(BATCH_INPUT_FILE)
    }

    /// Output name passed as `--output`.
    #[must_use]
    pub fn output_template(&self) -> PathBuf {
        self.dir().join(format!("{BATCH_OUTPUT_STEM}.{OUTPUT_EXT}"))
    }

    /// SVG the tool writes for the chart at `index` (numbered from 1).
    #[must_use]
    pub fn output_path(&self, index: usize) -> PathBuf {
        self.dir()
            .join(format!("{BATCH_OUTPUT_STEM}-{}.{OUTPUT_EXT}", index + 1))
    }

    /// Read the SVG for the chart at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`MermaidError::MissingOutput`] if the tool skipped the chart.
    pub fn read_output(&self, index: usize) -> Result<String, MermaidError> {
        let path = self.output_path(index);
        fs::read_to_string(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                MermaidError::MissingOutput(path)
            } else {
                e.into()
            }
        })
    }
}

/// Create `dir`, wiping it first when `clear` is set.
fn reset_dir(dir: &Path, clear: bool) -> io::Result<()> {
    if clear && dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn settings_in(root: &Path) -> Settings {
        Settings {
            working_dir: root.join("work"),
            output_dir: root.join("out"),
            ..Default::default()
        }
    }

    #[test]
    fn test_prepare_writes_config_files() {
        let tmp = tempfile::tempdir().unwrap();
        let mut settings = settings_in(tmp.path());
        settings.theme_css = ".node rect {\r\n  fill: #eee;\n}".to_owned();
        settings.mermaid_config = toml::from_str(r#"theme = "forest""#).unwrap();

        let workspace = Workspace::prepare(&settings).unwrap();

        assert_eq!(workspace.dir(), tmp.path().join("work"));
        assert!(tmp.path().join("out").is_dir());
        assert_eq!(
            fs::read_to_string(workspace.theme_css_path()).unwrap(),
            ".node rect {  fill: #eee;}"
        );
        let mermaid = fs::read_to_string(workspace.mermaid_config_path()).unwrap();
        assert!(mermaid.contains(r#""theme": "forest""#));
        assert_eq!(
            fs::read_to_string(workspace.puppeteer_config_path()).unwrap(),
            "{}"
        );
    }

    #[test]
    fn test_prepare_clears_directories_when_configured() {
        let tmp = tempfile::tempdir().unwrap();
        let mut settings = settings_in(tmp.path());
        fs::create_dir_all(tmp.path().join("work")).unwrap();
        fs::create_dir_all(tmp.path().join("out")).unwrap();
        fs::write(tmp.path().join("work/stale.mmd"), "graph TD").unwrap();
        fs::write(tmp.path().join("out/stale.svg"), "<svg/>").unwrap();

        Workspace::prepare(&settings).unwrap();
        assert!(tmp.path().join("work/stale.mmd").exists());
        assert!(tmp.path().join("out/stale.svg").exists());

        settings.clear_working_dir = true;
        settings.clear_output_dir = true;
        Workspace::prepare(&settings).unwrap();
        assert!(!tmp.path().join("work/stale.mmd").exists());
        assert!(!tmp.path().join("out/stale.svg").exists());
        assert!(tmp.path().join("work").join(MERMAID_CONFIG_FILE).exists());
    }

    #[test]
    fn test_paths() {
        let workspace = Workspace {
            dir: PathBuf::from("/tmp/charts"),
        };
        assert_eq!(
            workspace.input_path("abc"),
            PathBuf::from("/tmp/charts/abc.mmd")
        );
        assert_eq!(
            workspace.output_path("abc"),
            PathBuf::from("/tmp/charts/abc.svg")
        );
    }

    #[test]
    fn test_write_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = Workspace::prepare(&settings_in(tmp.path())).unwrap();

        let batch = workspace
            .write_batch(&[("aaa", "graph A"), ("bbb", "\n\ngraph B\n  B --> C")])
            .unwrap();

        assert_eq!(batch.dir().parent(), Some(workspace.dir()));
        assert!(
            batch
                .dir()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("batch-")
        );
        assert_eq!(batch.ids(), ["aaa".to_owned(), "bbb".to_owned()]);
        assert_eq!(
            fs::read_to_string(batch.input_path()).unwrap(),
            "```mermaid\ngraph A\n```\n\n```mermaid\n\n\ngraph B\n  B --> C\n```\n\n"
        );
        assert_eq!(batch.output_template(), batch.dir().join("chart.svg"));
        assert_eq!(batch.output_path(1), batch.dir().join("chart-2.svg"));
    }

    #[test]
    fn test_batch_removed_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = Workspace::prepare(&settings_in(tmp.path())).unwrap();
        let batch = workspace.write_batch(&[("aaa", "graph A")]).unwrap();
        fs::write(batch.output_path(0), "<svg></svg>").unwrap();
        let dir = batch.dir().to_path_buf();

        assert_eq!(batch.read_output(0).unwrap(), "<svg></svg>");
        assert!(matches!(
            batch.read_output(1).unwrap_err(),
            MermaidError::MissingOutput(_)
        ));
        drop(batch);

        assert!(!dir.exists());
    }

    #[test]
    fn test_take_output_removes_temporaries() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = Workspace::prepare(&settings_in(tmp.path())).unwrap();
        workspace.write_input("abc", "graph TD").unwrap();
        fs::write(workspace.output_path("abc"), "<svg></svg>").unwrap();

        assert_eq!(workspace.take_output("abc").unwrap(), "<svg></svg>");
        assert!(!workspace.input_path("abc").exists());
        assert!(!workspace.output_path("abc").exists());
    }

    #[test]
    fn test_take_output_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = Workspace::prepare(&settings_in(tmp.path())).unwrap();
        workspace.write_input("abc", "graph TD").unwrap();

        let err = workspace.take_output("abc").unwrap_err();

        assert!(matches!(err, MermaidError::MissingOutput(ref p) if *p == workspace.output_path("abc")));
        assert!(!workspace.input_path("abc").exists());
    }
}
