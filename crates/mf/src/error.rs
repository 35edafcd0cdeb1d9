//! CLI error types.

use mf_config::ConfigError;
use mf_mermaid::MermaidError;
use mf_renderer::RenderError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Mermaid(#[from] MermaidError),

    #[error("{path}: {source}")]
    Render {
        path: String,
        #[source]
        source: RenderError,
    },
}
