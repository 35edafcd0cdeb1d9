//! Mermaid chart rendering for markdown documents.
//!
//! Fenced `mermaid` blocks are turned into SVG by running mermaid-cli
//! (`mmdc`) as a subprocess:
//! - [`MermaidProcessor`] implements `CodeBlockProcessor`, leaving placeholders
//!   during parsing and rendering all charts of a document afterwards
//! - [`ChartCache`] keys charts by definition text so repeats render once
//! - `figcaption`, `alt` and `title` directive lines become figure metadata
//! - The root `<svg>` gets accessibility labels and an `aspect-ratio` style
//!
//! Failed charts fall back to `<pre class="mermaid">` with the original
//! definition unless `throw_on_error` is set.
//!
//! # Example
//!
//! ```ignore
//! use mf_config::Settings;
//! use mf_mermaid::MermaidPlugin;
//!
//! let mut plugin = MermaidPlugin::new(Settings::load(None, None)?)?;
//! let result = plugin.render_markdown("```mermaid\ngraph TD\n  A --> B\n```")?;
//! println!("{}", result.html);
//! ```

mod cache;
mod consts;
mod directives;
mod error;
mod invoker;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod output;
mod plugin;
mod processor;
mod svg;
mod workspace;

pub use cache::{ChartCache, ChartRecord, ChartState};
pub use directives::{Directives, extract};
pub use error::{InvokeError, MermaidError};
pub use invoker::{CommandRunner, SystemRunner};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockRunner;
pub use plugin::MermaidPlugin;
pub use processor::MermaidProcessor;
pub use svg::{SvgLabels, annotate};
pub use workspace::{Batch, Workspace};
