//! HTML backend for markdown rendering.

use std::fmt::Write;

use crate::backend::RenderBackend;
use crate::state::escape_html;

/// HTML render backend.
///
/// Produces `<pre><code class="language-…">` for code blocks, `<blockquote>`
/// for blockquotes and `<img>` for images.
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        if let Some(lang) = lang {
            write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            )
            .unwrap();
        } else {
            write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
        }
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        write!(out, r#"<img src="{}""#, escape_html(src)).unwrap();
        if !title.is_empty() {
            write!(out, r#" title="{}""#, escape_html(title)).unwrap();
        }
        write!(out, r#" alt="{}">"#, escape_html(alt)).unwrap();
    }
}
