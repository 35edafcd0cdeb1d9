//! Root element rewriting for SVG produced by mermaid-cli.
//!
//! The root `<svg>` gets an `aria-label` from the chart's alt text and a
//! `<title>` child from its title. Fixed `width`/`height` attributes are
//! replaced by a CSS `aspect-ratio` so the chart scales with its container.
//! Everything else is copied through unchanged.

use std::borrow::Cow;
use std::io::Cursor;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::MermaidError;

/// Accessibility text applied to the root element.
#[derive(Clone, Copy, Debug, Default)]
pub struct SvgLabels<'a> {
    /// Directive value, double quotes already written as `&quot;`.
    pub alt: Option<&'a str>,
    /// Directive value, double quotes already written as `&quot;`.
    pub title: Option<&'a str>,
}

fn svg_error(e: impl std::fmt::Display) -> MermaidError {
    MermaidError::Svg(e.to_string())
}

/// Rewrite the root `<svg>` element of `svg`.
///
/// # Errors
///
/// Returns [`MermaidError::Svg`] if the document is not well-formed or has
/// no `<svg>` element.
pub fn annotate(svg: &str, labels: SvgLabels<'_>) -> Result<String, MermaidError> {
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(svg.len() + 128)));
    let mut root_seen = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            MermaidError::Svg(format!("at position {}: {e}", reader.error_position()))
        })?;
        match event {
            Event::Start(e) if !root_seen && e.name().as_ref() == b"svg" => {
                root_seen = true;
                writer
                    .write_event(Event::Start(rewrite_root(&e, labels.alt)?))
                    .map_err(svg_error)?;
                write_title(&mut writer, labels.title)?;
            }
            Event::Empty(e) if !root_seen && e.name().as_ref() == b"svg" => {
                root_seen = true;
                let root = rewrite_root(&e, labels.alt)?;
                if labels.title.is_some() {
                    writer
                        .write_event(Event::Start(root.borrow()))
                        .map_err(svg_error)?;
                    write_title(&mut writer, labels.title)?;
                    writer
                        .write_event(Event::End(BytesEnd::new("svg")))
                        .map_err(svg_error)?;
                } else {
                    writer.write_event(Event::Empty(root)).map_err(svg_error)?;
                }
            }
            Event::Eof => break,
            event => writer.write_event(event).map_err(svg_error)?,
        }
    }

    if !root_seen {
        return Err(MermaidError::Svg("no <svg> element found".to_owned()));
    }
    String::from_utf8(writer.into_inner().into_inner()).map_err(svg_error)
}

/// Copy the root element, applying the aspect ratio and aria label.
fn rewrite_root(
    element: &BytesStart<'_>,
    alt: Option<&str>,
) -> Result<BytesStart<'static>, MermaidError> {
    let mut width = None;
    let mut height = None;
    for attr in element.attributes() {
        let attr = attr.map_err(svg_error)?;
        match attr.key.as_ref() {
            b"width" => width = Some(attr.unescape_value().map_err(svg_error)?.into_owned()),
            b"height" => height = Some(attr.unescape_value().map_err(svg_error)?.into_owned()),
            _ => {}
        }
    }
    let ratio = match (width.as_deref(), height.as_deref()) {
        (Some(w), Some(h)) => aspect_ratio(w, h),
        _ => None,
    };

    let mut root = BytesStart::new("svg");
    let mut style_seen = false;
    for attr in element.attributes() {
        let attr = attr.map_err(svg_error)?;
        match attr.key.as_ref() {
            b"width" | b"height" if ratio.is_some() => {}
            b"aria-label" if alt.is_some() => {}
            b"style" => {
                style_seen = true;
                match &ratio {
                    Some(ratio) => {
                        let existing = attr.unescape_value().map_err(svg_error)?;
                        root.push_attribute(("style", merge_style(ratio, &existing).as_str()));
                    }
                    None => root.push_attribute(attr),
                }
            }
            _ => root.push_attribute(attr),
        }
    }

    if let Some(ratio) = &ratio
        && !style_seen
    {
        root.push_attribute(("style", merge_style(ratio, "").as_str()));
    }
    if let Some(alt) = alt {
        let alt = decode_quotes(alt);
        root.push_attribute(Attribute::from(("aria-label", &*alt)));
    }

    Ok(root)
}

fn write_title(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    title: Option<&str>,
) -> Result<(), MermaidError> {
    let Some(title) = title else {
        return Ok(());
    };
    let title = decode_quotes(title);
    writer
        .create_element("title")
        .write_text_content(BytesText::new(&title))
        .map_err(svg_error)?;
    Ok(())
}

/// Directive values carry `&quot;`; quick-xml escapes on write.
fn decode_quotes(value: &str) -> Cow<'_, str> {
    if value.contains("&quot;") {
        Cow::Owned(value.replace("&quot;", "\""))
    } else {
        Cow::Borrowed(value)
    }
}

/// `W/H` when both dimensions are fixed lengths.
fn aspect_ratio(width: &str, height: &str) -> Option<String> {
    let width = fixed_length(width)?;
    let height = fixed_length(height)?;
    Some(format!("{width}/{height}"))
}

/// Numeric part of a pixel or unitless length; `None` for percentages.
fn fixed_length(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.ends_with('%') {
        return None;
    }
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number
        .parse::<f64>()
        .ok()
        .filter(|n| *n > 0.0)
        .map(|_| number)
}

fn merge_style(ratio: &str, existing: &str) -> String {
    let existing = existing.trim();
    if existing.is_empty() {
        format!("aspect-ratio: {ratio}")
    } else {
        format!("aspect-ratio: {ratio}; {existing}")
    }
}
