//! Figure markup for rendered charts.
//!
//! The SVG is embedded according to [`OutputMode`]:
//! - [`Inline`](OutputMode::Inline): the SVG markup itself
//! - [`DataUri`](OutputMode::DataUri): `<img>` with a base64 `data:` URI
//! - [`Files`](OutputMode::Files): `<img>` pointing at `<output_dir>/<id>.svg`

use std::fmt::Write;
use std::fs;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use mf_config::{OutputMode, Settings};
use mf_renderer::escape_html;

use crate::cache::ChartRecord;
use crate::consts::{OUTPUT_EXT, SVG_DATA_URI_PREFIX};
use crate::error::MermaidError;

/// Build the embeddable content for a rendered chart.
///
/// In `files` mode this writes the SVG into the output directory.
pub(crate) fn embed(
    svg: &str,
    record: &ChartRecord,
    settings: &Settings,
) -> Result<String, MermaidError> {
    match settings.mode {
        OutputMode::Inline => Ok(svg.trim().to_owned()),
        OutputMode::DataUri => {
            let src = format!("{SVG_DATA_URI_PREFIX}{}", BASE64_STANDARD.encode(svg));
            Ok(img_tag(&src, record, &settings.img_attributes))
        }
        OutputMode::Files => {
            let file_name = format!("{}.{OUTPUT_EXT}", record.id);
            fs::create_dir_all(&settings.output_dir)?;
            fs::write(settings.output_dir.join(&file_name), svg)?;
            let src = format!("{}{file_name}", settings.url_prefix);
            Ok(img_tag(&src, record, &settings.img_attributes))
        }
    }
}

fn img_tag(src: &str, record: &ChartRecord, extra: &str) -> String {
    let mut tag = format!(r#"<img src="{src}""#);
    if let Some(alt) = &record.alt {
        write!(tag, r#" alt="{alt}""#).unwrap();
    }
    if let Some(title) = &record.title {
        write!(tag, r#" title="{title}""#).unwrap();
    }
    let extra = extra.trim();
    if !extra.is_empty() {
        write!(tag, " {extra}").unwrap();
    }
    tag.push('>');
    tag
}

/// Wrap embedded content in a figure with an optional caption.
pub(crate) fn figure(content: &str, caption: Option<&str>) -> String {
    match caption {
        Some(caption) => format!(
            r#"<figure class="mermaid">{content}<figcaption>{caption}</figcaption></figure>"#
        ),
        None => format!(r#"<figure class="mermaid">{content}</figure>"#),
    }
}

/// Markup shown instead of a chart that failed to render.
pub(crate) fn fallback(original: &str) -> String {
    format!(r#"<pre class="mermaid">{}</pre>"#, escape_html(original))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cache::ChartState;

    const SVG: &str = r#"<svg aria-label="x"></svg>"#;

    fn record(alt: Option<&str>, title: Option<&str>) -> ChartRecord {
        ChartRecord {
            id: "0123456789abcdef0123456789abcdef".to_owned(),
            original: "graph TD".to_owned(),
            definition: "graph TD".to_owned(),
            caption: None,
            alt: alt.map(str::to_owned),
            title: title.map(str::to_owned),
            state: ChartState::Pending,
        }
    }

    fn settings(mode: OutputMode, output_dir: &Path) -> Settings {
        Settings {
            mode,
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_inline() {
        let settings = settings(OutputMode::Inline, Path::new("unused"));
        let result = embed(&format!("{SVG}\n"), &record(None, None), &settings).unwrap();
        assert_eq!(result, SVG);
    }

    #[test]
    fn test_data_uri() {
        let mut settings = settings(OutputMode::DataUri, Path::new("unused"));
        settings.img_attributes = r#"loading="lazy""#.to_owned();

        let result = embed(SVG, &record(Some("Flow"), None), &settings).unwrap();

        assert_eq!(
            result,
            format!(
                r#"<img src="data:image/svg+xml;base64,{}" alt="Flow" loading="lazy">"#,
                BASE64_STANDARD.encode(SVG)
            )
        );
    }

    #[test]
    fn test_files_writes_svg() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("site/mermaid");
        let mut settings = settings(OutputMode::Files, &out);
        settings.url_prefix = "/assets/charts/".to_owned();

        let result = embed(SVG, &record(Some("Flow"), Some("Overview")), &settings).unwrap();

        assert_eq!(
            result,
            r#"<img src="/assets/charts/0123456789abcdef0123456789abcdef.svg" alt="Flow" title="Overview">"#
        );
        assert_eq!(
            fs::read_to_string(out.join("0123456789abcdef0123456789abcdef.svg")).unwrap(),
            SVG
        );
    }

    #[test]
    fn test_figure() {
        assert_eq!(
            figure("<svg></svg>", Some("Login &quot;flow&quot;")),
            r#"<figure class="mermaid"><svg></svg><figcaption>Login &quot;flow&quot;</figcaption></figure>"#
        );
        assert_eq!(
            figure("<svg></svg>", None),
            r#"<figure class="mermaid"><svg></svg></figure>"#
        );
    }

    #[test]
    fn test_fallback_escapes_definition() {
        assert_eq!(
            fallback("graph TD\n  A --> B"),
            "<pre class=\"mermaid\">graph TD\n  A --&gt; B</pre>"
        );
    }
}
