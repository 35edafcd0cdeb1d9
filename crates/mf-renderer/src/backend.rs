//! Render backend trait for output-specific markup.
//!
//! The generic renderer handles structure (lists, tables, inline formatting);
//! a backend decides how the few format-sensitive elements are written.

/// Backend trait for format-specific rendering operations.
pub trait RenderBackend {
    /// Render a fenced or indented code block that no processor claimed.
    ///
    /// # Arguments
    ///
    /// * `lang` - Language from the fence info string, if any
    /// * `content` - Raw code content
    /// * `out` - Output buffer to write to
    fn code_block(lang: Option<&str>, content: &str, out: &mut String);

    /// Render blockquote start tag.
    fn blockquote_start(out: &mut String);

    /// Render blockquote end tag.
    fn blockquote_end(out: &mut String);

    /// Render an image once its alt text has been collected.
    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    /// Render a hard break.
    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    /// Render a horizontal rule.
    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    /// Render a task list marker.
    fn task_list_marker(checked: bool, out: &mut String) {
        if checked {
            out.push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            out.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }
}
