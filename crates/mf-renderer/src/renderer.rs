//! Generic markdown renderer with pluggable backend.

use std::collections::HashMap;
use std::fmt::Write;
use std::marker::PhantomData;

use pulldown_cmark::{CodeBlockKind, Event, Tag, TagEnd};

use crate::backend::RenderBackend;
use crate::code_block::{CodeBlockProcessor, ProcessResult, parse_fence_info};
use crate::error::RenderError;
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, escape_html};

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML content.
    pub html: String,
    /// Warnings reported by code block processors.
    pub warnings: Vec<String>,
}

/// Generic markdown renderer with pluggable backend.
///
/// The `'p` lifetime bounds registered processors, so a processor can borrow
/// state (e.g. a cache) that outlives a single document.
///
/// # Code Block Processors
///
/// Custom code block processing can be added via [`with_processor`](Self::with_processor).
/// Processors are checked in order; the first returning a non-`PassThrough` result wins.
pub struct MarkdownRenderer<'p, B: RenderBackend> {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    processors: Vec<Box<dyn CodeBlockProcessor + 'p>>,
    /// Index handed to processors for the next fenced block.
    code_block_index: usize,
    /// Attributes from the fence info of the current code block.
    pending_attrs: HashMap<String, String>,
    _backend: PhantomData<B>,
}

impl<'p, B: RenderBackend> MarkdownRenderer<'p, B> {
    /// Create a new renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            processors: Vec::new(),
            code_block_index: 0,
            pending_attrs: HashMap::new(),
            _backend: PhantomData,
        }
    }

    /// Add a code block processor.
    ///
    /// Pass `&mut processor` to keep ownership of a processor whose state
    /// should survive the render.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use mf_renderer::{CodeBlockProcessor, HtmlBackend, MarkdownRenderer, ProcessResult};
    ///
    /// struct Upper;
    ///
    /// impl CodeBlockProcessor for Upper {
    ///     fn process(
    ///         &mut self,
    ///         language: &str,
    ///         _attrs: &HashMap<String, String>,
    ///         source: &str,
    ///         _index: usize,
    ///     ) -> ProcessResult {
    ///         if language == "upper" {
    ///             ProcessResult::Inline(source.to_uppercase())
    ///         } else {
    ///             ProcessResult::PassThrough
    ///         }
    ///     }
    /// }
    ///
    /// let mut upper = Upper;
    /// let result = MarkdownRenderer::<HtmlBackend>::new()
    ///     .with_processor(&mut upper)
    ///     .render(pulldown_cmark::Parser::new("```upper\nhi\n```"))
    ///     .unwrap();
    /// assert_eq!(result.html, "HI\n");
    /// ```
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'p>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Render markdown events.
    ///
    /// All events are consumed first, then every processor's `post_process`
    /// runs once over the complete HTML.
    pub fn render<'a, I>(mut self, events: I) -> Result<RenderResult, RenderError>
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }

        let mut html = std::mem::take(&mut self.output);
        for processor in &mut self.processors {
            processor
                .post_process(&mut html)
                .map_err(RenderError::Processor)?;
        }

        let warnings = self
            .processors
            .iter()
            .flat_map(|p| p.warnings())
            .cloned()
            .collect();

        Ok(RenderResult { html, warnings })
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.output.push_str(&html),
            Event::SoftBreak => self.push_inline("\n"),
            Event::HardBreak => B::hard_break(&mut self.output),
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => self.heading.start(level as u8),
            Tag::BlockQuote(_) => B::blockquote_start(&mut self.output),
            Tag::CodeBlock(kind) => {
                let (lang, attrs) = match kind {
                    CodeBlockKind::Fenced(info) => {
                        let (lang, attrs) = parse_fence_info(&info);
                        ((!lang.is_empty()).then_some(lang), attrs)
                    }
                    CodeBlockKind::Indented => (None, HashMap::new()),
                };
                self.pending_attrs = attrs;
                self.code.start(lang);
            }
            Tag::List(Some(1)) => self.output.push_str("<ol>"),
            Tag::List(Some(start)) => write!(self.output, r#"<ol start="{start}">"#).unwrap(),
            Tag::List(None) => self.output.push_str("<ul>"),
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let tag = self.table.cell_tag();
                let align = self.table.alignment_style();
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link { dest_url, .. } => {
                let link = format!(r#"<a href="{}">"#, escape_html(&dest_url));
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => self.image.start(dest_url.into_string(), title.into_string()),
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some((level, id, html)) = self.heading.complete() {
                    write!(
                        self.output,
                        r#"<h{level} id="{id}">{}</h{level}>"#,
                        html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => B::blockquote_end(&mut self.output),
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                write!(self.output, "</{}>", self.table.cell_tag()).unwrap();
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                if let Some((src, title, alt)) = self.image.end() {
                    B::image(&src, &alt, &title, &mut self.output);
                }
            }
        }
    }

    /// Offer the finished code block to processors, falling back to the backend.
    fn finish_code_block(&mut self) {
        let (lang, content) = self.code.end();
        let attrs = std::mem::take(&mut self.pending_attrs);
        let index = self.code_block_index;
        self.code_block_index += 1;

        if let Some(lang) = lang.as_deref() {
            for processor in &mut self.processors {
                match processor.process(lang, &attrs, &content, index) {
                    ProcessResult::Placeholder(html) | ProcessResult::Inline(html) => {
                        self.output.push_str(&html);
                        return;
                    }
                    ProcessResult::PassThrough => {}
                }
            }
        }

        B::code_block(lang.as_deref(), &content, &mut self.output);
    }

    fn text(&mut self, text: &str) {
        // Priority: code > image alt > heading > normal text
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        let html = format!("<code>{}</code>", escape_html(code));
        if self.heading.is_active() {
            self.heading.push_text(code);
            self.heading.push_html(&html);
        } else {
            self.output.push_str(&html);
        }
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<'_, B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Options, Parser};

    use super::*;
    use crate::HtmlBackend;
    use crate::code_block::ProcessError;

    fn render_html(markdown: &str) -> RenderResult {
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(markdown, options);
        MarkdownRenderer::<HtmlBackend>::new().render(parser).unwrap()
    }

    #[test]
    fn test_basic_paragraph() {
        let result = render_html("Hello, world!");
        assert_eq!(result.html, "<p>Hello, world!</p>");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_heading_with_id() {
        let result = render_html("## Flow *Chart*");
        assert_eq!(
            result.html,
            r#"<h2 id="flow-chart">Flow <em>Chart</em></h2>"#
        );
    }

    #[test]
    fn test_heading_with_inline_code() {
        let result = render_html("# Run `mmdc`");
        assert_eq!(result.html, r#"<h1 id="run-mmdc">Run <code>mmdc</code></h1>"#);
    }

    #[test]
    fn test_code_block_passthrough() {
        let result = render_html("```rust\nfn main() {}\n```");
        assert_eq!(
            result.html,
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_indented_code_block() {
        let result = render_html("    plain text\n");
        assert_eq!(result.html, "<pre><code>plain text\n</code></pre>");
    }

    #[test]
    fn test_image() {
        let result = render_html("![Alt text](image.png)");
        assert_eq!(result.html, r#"<p><img src="image.png" alt="Alt text"></p>"#);
    }

    #[test]
    fn test_table() {
        let result = render_html("| A | B |\n|:--|--:|\n| 1 | 2 |");
        assert_eq!(
            result.html,
            concat!(
                "<table><thead><tr>",
                r#"<th style="text-align:left">A</th><th style="text-align:right">B</th>"#,
                "</tr></thead><tbody><tr>",
                r#"<td style="text-align:left">1</td><td style="text-align:right">2</td>"#,
                "</tr></tbody></table>"
            )
        );
    }

    #[test]
    fn test_lists() {
        let result = render_html("- one\n- two");
        assert_eq!(result.html, "<ul><li>one</li><li>two</li></ul>");

        let result = render_html("3. three\n4. four");
        assert_eq!(
            result.html,
            r#"<ol start="3"><li>three</li><li>four</li></ol>"#
        );
    }

    #[test]
    fn test_inline_formatting() {
        let result = render_html("*a* **b** ~~c~~ [d](https://example.com)");
        assert_eq!(
            result.html,
            r#"<p><em>a</em> <strong>b</strong> <s>c</s> <a href="https://example.com">d</a></p>"#
        );
    }

    struct PlaceholderProcessor {
        sources: Vec<(usize, String)>,
        warnings: Vec<String>,
    }

    impl PlaceholderProcessor {
        fn new() -> Self {
            Self {
                sources: Vec::new(),
                warnings: Vec::new(),
            }
        }
    }

    impl CodeBlockProcessor for PlaceholderProcessor {
        fn process(
            &mut self,
            language: &str,
            attrs: &HashMap<String, String>,
            source: &str,
            index: usize,
        ) -> ProcessResult {
            if language != "diagram" {
                return ProcessResult::PassThrough;
            }
            if let Some(theme) = attrs.get("theme") {
                self.warnings.push(format!("diagram {index}: theme {theme}"));
            }
            self.sources.push((index, source.to_owned()));
            ProcessResult::Placeholder(format!("{{{{DIAGRAM_{index}}}}}"))
        }

        fn post_process(&mut self, html: &mut String) -> Result<(), ProcessError> {
            for (index, source) in &self.sources {
                *html = html.replace(
                    &format!("{{{{DIAGRAM_{index}}}}}"),
                    &format!("<svg>{}</svg>", source.trim()),
                );
            }
            Ok(())
        }

        fn warnings(&self) -> &[String] {
            &self.warnings
        }
    }

    struct FailingProcessor;

    impl CodeBlockProcessor for FailingProcessor {
        fn process(
            &mut self,
            _language: &str,
            _attrs: &HashMap<String, String>,
            _source: &str,
            _index: usize,
        ) -> ProcessResult {
            ProcessResult::PassThrough
        }

        fn post_process(&mut self, _html: &mut String) -> Result<(), ProcessError> {
            Err("renderer exploded".into())
        }
    }

    #[test]
    fn test_processor_placeholder_replaced_after_walk() {
        let markdown = "Intro\n\n```diagram\nA -> B\n```\n\n```diagram theme=dark\nC -> D\n```";
        let mut processor = PlaceholderProcessor::new();

        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_processor(&mut processor)
            .render(Parser::new(markdown))
            .unwrap();

        assert_eq!(
            result.html,
            "<p>Intro</p><svg>A -> B</svg><svg>C -> D</svg>"
        );
        assert_eq!(result.warnings, vec!["diagram 1: theme dark".to_owned()]);
        assert_eq!(
            processor.sources,
            vec![(0, "A -> B\n".to_owned()), (1, "C -> D\n".to_owned())]
        );
    }

    #[test]
    fn test_processor_passthrough_and_unlabelled_blocks() {
        let markdown = "```rust\nfn main() {}\n```\n\n```\nplain\n```";
        let mut processor = PlaceholderProcessor::new();

        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_processor(&mut processor)
            .render(Parser::new(markdown))
            .unwrap();

        assert!(result.html.contains(r#"class="language-rust""#));
        assert!(result.html.contains("<pre><code>plain\n</code></pre>"));
        assert!(processor.sources.is_empty());
    }

    #[test]
    fn test_first_processor_wins() {
        struct Inline;
        impl CodeBlockProcessor for Inline {
            fn process(
                &mut self,
                _language: &str,
                _attrs: &HashMap<String, String>,
                _source: &str,
                _index: usize,
            ) -> ProcessResult {
                ProcessResult::Inline("<div>inline</div>".to_owned())
            }
        }

        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_processor(Inline)
            .with_processor(PlaceholderProcessor::new())
            .render(Parser::new("```diagram\nA\n```"))
            .unwrap();

        assert_eq!(result.html, "<div>inline</div>");
    }

    #[test]
    fn test_processor_error_aborts_render() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_processor(FailingProcessor)
            .render(Parser::new("text"));

        let err = result.unwrap_err();
        assert!(matches!(err, RenderError::Processor(_)));
        assert!(err.to_string().contains("renderer exploded"));
    }
}
