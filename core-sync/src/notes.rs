//! Note folding
//!
//! Child notes are never synced on their own. Their HTML bodies are joined
//! and reduced to plain text, which the parent's page carries in its notes
//! property.

use scraper::Html;

/// Literal text placed between consecutive note bodies
pub const NOTES_SEPARATOR: &str = "\n---\n";

/// Join note bodies in the order given
pub fn concatenate_notes<S: AsRef<str>>(bodies: &[S]) -> String {
    bodies
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(NOTES_SEPARATOR)
}

/// Parse `html` and return the concatenated text of every text node.
///
/// Markup is dropped and entities are decoded. Text between elements,
/// including [`NOTES_SEPARATOR`], is kept verbatim.
pub fn sanitize_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect()
}

/// Plain-text notes value for a parent item
pub fn fold_notes<S: AsRef<str>>(bodies: &[S]) -> String {
    sanitize_html(&concatenate_notes(bodies))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenate_keeps_order() {
        let joined = concatenate_notes(&["<p>first</p>", "<p>second</p>"]);
        assert_eq!(joined, "<p>first</p>\n---\n<p>second</p>");
        assert_eq!(concatenate_notes::<&str>(&[]), "");
    }

    #[test]
    fn test_sanitize_strips_markup() {
        let text = sanitize_html(
            "<div data-schema-version=\"8\"><h1>Summary</h1><p>Uses <b>attention</b> only.</p></div>",
        );
        assert_eq!(text, "SummaryUses attention only.");
    }

    #[test]
    fn test_sanitize_decodes_entities() {
        assert_eq!(sanitize_html("<p>Tom &amp; Jerry &lt;3</p>"), "Tom & Jerry <3");
    }

    #[test]
    fn test_sanitize_empty_and_markup_only() {
        assert_eq!(sanitize_html(""), "");
        assert_eq!(sanitize_html("<p></p><br/>"), "");
    }

    #[test]
    fn test_fold_preserves_separator() {
        let folded = fold_notes(&["<p>Alpha</p>", "<p><i>Beta</i></p>"]);
        assert_eq!(folded, "Alpha\n---\nBeta");
    }

    #[test]
    fn test_fold_plain_text_notes() {
        assert_eq!(fold_notes(&["one", "two"]), "one\n---\ntwo");
    }
}
