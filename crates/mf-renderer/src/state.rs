//! Context tracked while walking markdown events.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

/// Buffered code block.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    active: bool,
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub(crate) fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    pub(crate) fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// Table column alignment and header tracking.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub(crate) fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub(crate) fn end_head(&mut self) {
        self.in_head = false;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    /// Cell tag name for the current row (`th` in the header, `td` otherwise).
    pub(crate) fn cell_tag(&self) -> &'static str {
        if self.in_head { "th" } else { "td" }
    }

    /// Inline style for the current cell's alignment.
    pub(crate) fn alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Image waiting for its alt text.
#[derive(Default)]
pub(crate) struct ImageState {
    /// (src, title) of the image being collected.
    pending: Option<(String, String)>,
    alt: String,
}

impl ImageState {
    pub(crate) fn start(&mut self, src: String, title: String) {
        self.pending = Some((src, title));
        self.alt.clear();
    }

    /// Finish the image, returning (src, title, alt).
    pub(crate) fn end(&mut self) -> Option<(String, String, String)> {
        let (src, title) = self.pending.take()?;
        Some((src, title, std::mem::take(&mut self.alt)))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.alt.push_str(text);
    }
}

/// Heading buffer with unique anchor generation.
#[derive(Default)]
pub(crate) struct HeadingState {
    level: Option<u8>,
    /// Plain text, used for the anchor slug.
    text: String,
    /// Inner HTML with inline formatting.
    html: String,
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    pub(crate) fn start(&mut self, level: u8) {
        self.level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    pub(crate) fn is_active(&self) -> bool {
        self.level.is_some()
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    /// Finish the heading, returning (level, id, inner html).
    pub(crate) fn complete(&mut self) -> Option<(u8, String, String)> {
        let level = self.level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let id = self.unique_id(&text);
        Some((level, id, html))
    }

    fn unique_id(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.id_counts.entry(base.clone()).or_default();
        let id = match *count {
            0 => base,
            n => format!("{base}-{n}"),
        };
        *count += 1;
        id
    }
}

/// Convert text to a URL-safe slug.
#[must_use]
pub(crate) fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    // Start as if after a dash so leading separators are dropped.
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
