//! Internal constants for mermaid rendering.

/// Fence language handled by the processor (compared case-insensitively).
pub const LANGUAGE: &str = "mermaid";

/// Tool configuration files written into the working directory.
pub const MERMAID_CONFIG_FILE: &str = "mermaidConfig.json";
pub const PUPPETEER_CONFIG_FILE: &str = "puppeteerConfig.json";
pub const THEME_CSS_FILE: &str = "theme.css";

/// Extension of chart definition files handed to the tool.
pub const INPUT_EXT: &str = "mmd";
/// Extension of files produced by the tool.
pub const OUTPUT_EXT: &str = "svg";

/// Prefix of the per-batch subdirectory of the working directory.
pub const BATCH_DIR_PREFIX: &str = "batch-";
/// Markdown file holding one fenced block per chart of a batch.
pub const BATCH_INPUT_FILE: &str = "charts.md";
/// Output name given to the tool; it writes `chart-1.svg`, `chart-2.svg`, ...
pub const BATCH_OUTPUT_STEM: &str = "chart";

pub const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";
