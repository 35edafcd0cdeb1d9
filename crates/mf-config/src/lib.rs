//! Settings for mermaid figure rendering.
//!
//! Parses `mermaid.toml` with serde and provides auto-discovery of the file
//! in parent directories. Every field has a default, so an empty file (or no
//! file at all) yields a usable configuration.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `working_dir`
//! - `output_dir`
//! - `command`
//! - `args`
//! - `background_color`
//! - `url_prefix`

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mermaid.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded settings.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the scratch directory for tool input and output.
    pub working_dir: Option<PathBuf>,
    /// Override the directory for `files` mode artifacts.
    pub output_dir: Option<PathBuf>,
    /// Override the embedding mode.
    pub mode: Option<OutputMode>,
    /// Override the definition cache flag.
    pub cache: Option<bool>,
    /// Override the batching flag.
    pub batch: Option<bool>,
    /// Override the strict error policy.
    pub throw_on_error: Option<bool>,
    /// Override verbose logging.
    pub verbose: Option<bool>,
}

/// How rendered diagrams are embedded into the page.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// SVG markup placed directly in the HTML.
    #[default]
    Inline,
    /// `<img>` with a base64 `data:` URI.
    DataUri,
    /// `<img>` referencing an SVG file in the output directory.
    Files,
}

impl OutputMode {
    /// Name as written in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::DataUri => "data-uri",
            Self::Files => "files",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(Self::Inline),
            "data-uri" => Ok(Self::DataUri),
            "files" => Ok(Self::Files),
            other => Err(format!(
                "unknown mode '{other}', expected inline, data-uri or files"
            )),
        }
    }
}

/// Mermaid rendering settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scratch directory for `.mmd` inputs, `.svg` outputs and tool config files.
    pub working_dir: PathBuf,
    /// Directory receiving final SVG files in `files` mode.
    pub output_dir: PathBuf,
    /// Wipe the working directory when the plugin starts.
    pub clear_working_dir: bool,
    /// Wipe the output directory when the plugin starts.
    pub clear_output_dir: bool,
    /// Value passed to `--backgroundColor`.
    pub background_color: String,
    /// CSS written to `theme.css` and passed to `--cssFile`.
    pub theme_css: String,
    /// Program to run.
    pub command: String,
    /// Leading arguments placed before the generated ones.
    pub args: Vec<String>,
    /// Embedding mode.
    pub mode: OutputMode,
    /// URL prefix for `<img src>` in `files` mode.
    pub url_prefix: String,
    /// Raw attribute string appended to generated `<img>` tags.
    pub img_attributes: String,
    /// Render all pending diagrams of a document with one tool invocation.
    pub batch: bool,
    /// Reuse results for identical definitions.
    pub cache: bool,
    /// Propagate rendering errors instead of emitting fallback markup.
    pub throw_on_error: bool,
    /// Log the effective settings and every tool invocation.
    pub verbose: bool,
    /// Passed through to the tool as `mermaidConfig.json`.
    pub mermaid_config: toml::Table,
    /// Passed through to the tool as `puppeteerConfig.json`.
    pub puppeteer_config: toml::Table,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("mermaidTmp"),
            output_dir: PathBuf::from("mermaid"),
            clear_working_dir: false,
            clear_output_dir: false,
            background_color: "white".to_owned(),
            theme_css: String::new(),
            command: "npx".to_owned(),
            args: ["-p", "@mermaid-js/mermaid-cli", "mmdc", "-q"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            mode: OutputMode::Inline,
            url_prefix: "/mermaid/".to_owned(),
            img_attributes: String::new(),
            batch: true,
            cache: true,
            throw_on_error: false,
            verbose: false,
            mermaid_config: toml::Table::new(),
            puppeteer_config: toml::Table::new(),
            config_path: None,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Passthrough table could not be converted to JSON.
    #[error("JSON conversion error: {0}")]
    Json(#[from] serde_json::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Settings field (e.g., "`command`").
        field: String,
        /// Error message (e.g., "${`MMDC`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Settings {
    /// Load settings from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mermaid.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// CLI settings are applied after loading and path resolution, then the
    /// result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// an environment variable is missing or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut settings = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(cli) = cli_settings {
            settings.apply_cli_settings(cli);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any check fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.command, "command")?;
        require_non_empty(&self.background_color, "background_color")?;
        if self.mode == OutputMode::Files {
            require_non_empty(&self.url_prefix, "url_prefix")?;
        }
        if self.working_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "working_dir cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Contents of `mermaidConfig.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the table cannot be serialized.
    pub fn mermaid_config_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.mermaid_config)?)
    }

    /// Contents of `puppeteerConfig.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the table cannot be serialized.
    pub fn puppeteer_config_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.puppeteer_config)?)
    }

    /// Apply CLI settings.
    fn apply_cli_settings(&mut self, cli: &CliSettings) {
        if let Some(working_dir) = &cli.working_dir {
            self.working_dir.clone_from(working_dir);
        }
        if let Some(output_dir) = &cli.output_dir {
            self.output_dir.clone_from(output_dir);
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if let Some(cache) = cli.cache {
            self.cache = cache;
        }
        if let Some(batch) = cli.batch {
            self.batch = batch;
        }
        if let Some(throw_on_error) = cli.throw_on_error {
            self.throw_on_error = throw_on_error;
        }
        if let Some(verbose) = cli.verbose {
            self.verbose = verbose;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load settings from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut settings: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        settings.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        settings.resolve_paths(config_dir);
        settings.config_path = Some(path.to_path_buf());

        Ok(settings)
    }

    /// Resolve relative directories against the config file directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        if self.working_dir.is_relative() {
            self.working_dir = config_dir.join(&self.working_dir);
        }
        if self.output_dir.is_relative() {
            self.output_dir = config_dir.join(&self.output_dir);
        }
    }
}
