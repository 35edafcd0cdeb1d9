//! Markdown to HTML renderer with pluggable code block processors.
//!
//! This crate provides a generic [`MarkdownRenderer`] that walks pulldown-cmark
//! events and writes HTML through the [`RenderBackend`] trait.
//!
//! # Processors
//!
//! Fenced code blocks can be claimed by a [`CodeBlockProcessor`]. Processors
//! see every fenced block while events are consumed (the parse phase) and may
//! leave a placeholder behind. Once the whole document has been walked, each
//! processor gets a single [`post_process`](CodeBlockProcessor::post_process)
//! call to replace its placeholders. This two-phase split lets a processor
//! batch expensive work (e.g. subprocess calls) across a whole document.
//!
//! # Example
//!
//! ```
//! use pulldown_cmark::Parser;
//! use mf_renderer::{HtmlBackend, MarkdownRenderer};
//!
//! let markdown = "# Hello\n\n**Bold** text";
//! let parser = Parser::new(markdown);
//! let result = MarkdownRenderer::<HtmlBackend>::new().render(parser).unwrap();
//! assert!(result.html.contains("<strong>Bold</strong>"));
//! ```

mod backend;
mod code_block;
mod error;
mod html;
mod renderer;
mod state;

pub use backend::RenderBackend;
pub use code_block::{CodeBlockProcessor, ProcessError, ProcessResult};
pub use error::RenderError;
pub use html::HtmlBackend;
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::escape_html;
