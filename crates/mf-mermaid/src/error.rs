//! Error types for mermaid rendering.

use std::path::PathBuf;

/// Failure running the external tool.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// The program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The program ran but reported failure.
    #[error("{program} exited with {}: {stderr}", exit_code_label(.code.as_ref()))]
    Exit {
        program: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_code_label(code: Option<&i32>) -> String {
    code.map_or_else(|| "signal".to_owned(), |c| format!("status {c}"))
}

/// Error from the mermaid plugin.
#[derive(Debug, thiserror::Error)]
pub enum MermaidError {
    /// Settings could not be turned into tool configuration.
    #[error(transparent)]
    Config(#[from] mf_config::ConfigError),
    /// Filesystem error in the working or output directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The external tool failed.
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    /// The tool succeeded but did not write the expected file.
    #[error("renderer produced no output at {}", .0.display())]
    MissingOutput(PathBuf),
    /// The produced SVG could not be rewritten.
    #[error("invalid SVG: {0}")]
    Svg(String),
    /// No chart is registered under the id.
    #[error("unknown chart {0}")]
    UnknownChart(String),
    /// A chart failed and strict error handling is enabled.
    #[error("failed to render mermaid chart {id}: {message}")]
    ChartFailed { id: String, message: String },
}
