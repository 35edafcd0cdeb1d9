//! Figure metadata carried inside chart definitions.
//!
//! Mermaid has no syntax for captions or accessibility text, so authors add
//! them as extra lines that must be stripped before the definition reaches
//! the tool:
//!
//! ```text
//! figcaption Request flow
//! alt "Client calls the API"
//! title Overview
//! sequenceDiagram
//!     Client->>API: GET /charts
//! ```

use std::sync::LazyLock;

use regex::Regex;

static FIGCAPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*figcaption[ \t]+(.*)$").unwrap());

static ALT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*alt[ \t]+(.*)$").unwrap());

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*title[ \t]+(.*)$").unwrap());

/// Chart definition with its figure directives pulled out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directives {
    /// Definition handed to the tool, directive lines removed.
    pub definition: String,
    /// Text for `<figcaption>`.
    pub caption: Option<String>,
    /// Alternative text for `aria-label` and `<img alt>`.
    pub alt: Option<String>,
    /// Tooltip text for `<title>` and `<img title>`.
    pub title: Option<String>,
}

/// Extract `figcaption`, `alt` and `title` lines from a chart definition.
///
/// Only the first occurrence of each directive is used and removed. Values
/// are trimmed, lose one pair of enclosing double quotes, and have any
/// remaining double quotes replaced by `&quot;`.
#[must_use]
pub fn extract(definition: &str) -> Directives {
    let mut definition = definition.to_owned();
    let caption = take_directive(&FIGCAPTION_RE, &mut definition);
    let alt = take_directive(&ALT_RE, &mut definition);
    let title = take_directive(&TITLE_RE, &mut definition);

    Directives {
        definition,
        caption,
        alt,
        title,
    }
}

/// Remove the first line matching `re` and return its cleaned value.
fn take_directive(re: &Regex, definition: &mut String) -> Option<String> {
    let caps = re.captures(definition)?;
    let range = caps.get(0)?.range();
    let value = clean_value(&caps[1]);
    definition.replace_range(range, "");
    Some(value)
}

fn clean_value(raw: &str) -> String {
    let value = raw.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    value.replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_extract_all_directives() {
        let source = "figcaption Request flow\nalt \"Client calls the API\"\ntitle Overview\nsequenceDiagram\n    Client->>API: GET";

        let result = extract(source);

        assert_eq!(result.caption.as_deref(), Some("Request flow"));
        assert_eq!(result.alt.as_deref(), Some("Client calls the API"));
        assert_eq!(result.title.as_deref(), Some("Overview"));
        assert_eq!(result.definition, "\n\n\nsequenceDiagram\n    Client->>API: GET");
    }

    #[test]
    fn test_extract_without_directives() {
        let source = "graph TD\n    A --> B";

        let result = extract(source);

        assert_eq!(
            result,
            Directives {
                definition: source.to_owned(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_case_insensitive_and_indented() {
        let source = "graph LR\n\t  FigCaption   Indented caption  \n    A --> B";

        let result = extract(source);

        assert_eq!(result.caption.as_deref(), Some("Indented caption"));
        assert_eq!(result.definition, "graph LR\n\n    A --> B");
    }

    #[test]
    fn test_only_first_occurrence_is_taken() {
        let source = "alt first\ngraph TD\nalt second";

        let result = extract(source);

        assert_eq!(result.alt.as_deref(), Some("first"));
        assert_eq!(result.definition, "\ngraph TD\nalt second");
    }

    #[test]
    fn test_inner_quotes_escaped() {
        let source = "figcaption \"The \"fast\" path\"\ngraph TD";

        let result = extract(source);

        assert_eq!(
            result.caption.as_deref(),
            Some("The &quot;fast&quot; path")
        );
    }

    #[test]
    fn test_unbalanced_quote_kept_as_entity() {
        let result = extract("figcaption \"half open\ngraph TD");
        assert_eq!(result.caption.as_deref(), Some("&quot;half open"));
    }

    #[test]
    fn test_directive_needs_value_separator() {
        // "altitude" is not an alt directive
        let source = "graph TD\naltitude --> ground";

        let result = extract(source);

        assert_eq!(result.alt, None);
        assert_eq!(result.definition, source);
    }

    #[test]
    fn test_mermaid_title_keyword_inside_line_untouched() {
        let source = "pie title Pets\n    \"Dogs\" : 386";
        let result = extract(source);
        assert_eq!(result.title, None);
        assert_eq!(result.definition, source);
    }

    #[test]
    fn test_crlf_line_endings() {
        let source = "figcaption Windows\r\ngraph TD\r\n";

        let result = extract(source);

        assert_eq!(result.caption.as_deref(), Some("Windows"));
        assert_eq!(result.definition, "\ngraph TD\r\n");
    }
}
