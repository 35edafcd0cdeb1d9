//! Code block processor trait for extensible fenced block handling.
//!
//! Processors are registered with the renderer and checked in order when a
//! fenced block is encountered. The first processor returning a
//! non-`PassThrough` result wins.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use mf_renderer::{CodeBlockProcessor, ProcessResult};
//!
//! struct ShoutProcessor;
//!
//! impl CodeBlockProcessor for ShoutProcessor {
//!     fn process(
//!         &mut self,
//!         language: &str,
//!         _attrs: &HashMap<String, String>,
//!         source: &str,
//!         _index: usize,
//!     ) -> ProcessResult {
//!         if language == "shout" {
//!             ProcessResult::Inline(format!("<p>{}</p>", source.to_uppercase()))
//!         } else {
//!             ProcessResult::PassThrough
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;

/// Error a processor may return from [`CodeBlockProcessor::post_process`].
pub type ProcessError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace code block with placeholder for deferred processing.
    ///
    /// The processor replaces it during `post_process`.
    Placeholder(String),

    /// Replace code block with HTML immediately.
    Inline(String),

    /// Render as a regular code block.
    PassThrough,
}

/// Trait for processing special code blocks.
///
/// # Phases
///
/// [`process`](Self::process) is called while the document is being walked,
/// once per fenced block. [`post_process`](Self::post_process) is called once
/// after the walk with the complete HTML, so work deferred behind placeholders
/// can be done in one go.
pub trait CodeBlockProcessor {
    /// Process a code block and return the result.
    ///
    /// # Arguments
    ///
    /// * `language` - Language identifier from the fence info string, as written
    /// * `attrs` - Attributes parsed from the fence (`key=value` pairs)
    /// * `source` - Raw content of the code block
    /// * `index` - Zero-based index of the block within the document
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult;

    /// Replace placeholders in the rendered HTML.
    ///
    /// An error aborts the whole render and is returned to the caller of
    /// [`MarkdownRenderer::render`](crate::MarkdownRenderer::render).
    ///
    /// Default implementation is a no-op.
    fn post_process(&mut self, _html: &mut String) -> Result<(), ProcessError> {
        Ok(())
    }

    /// Warnings generated during processing.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

impl<P: CodeBlockProcessor + ?Sized> CodeBlockProcessor for &mut P {
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult {
        (**self).process(language, attrs, source, index)
    }

    fn post_process(&mut self, html: &mut String) -> Result<(), ProcessError> {
        (**self).post_process(html)
    }

    fn warnings(&self) -> &[String] {
        (**self).warnings()
    }
}

/// Parse fence info string into language and attributes.
///
/// Format: `language [key=value ...]`
#[must_use]
pub(crate) fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().unwrap_or_default().to_owned();

    let attrs = parts
        .filter_map(|part| part.split_once('='))
        .map(|(key, value)| {
            let value = value.trim_matches('"').trim_matches('\'');
            (key.to_owned(), value.to_owned())
        })
        .collect();

    (language, attrs)
}
