//! Render error type.

use crate::code_block::ProcessError;

/// Error returned when rendering a document fails.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A code block processor failed while replacing its placeholders.
    #[error("code block processor failed: {0}")]
    Processor(#[source] ProcessError),
}
