//! Collapsing editor markup to its visible text for plain-text mode.

use scraper::{ElementRef, Html};

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "dt", "dd", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre", "section", "table", "tr",
    "ul",
];

const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "template", "title"];

/// Visible text of an HTML fragment.
///
/// `<br>` and block-level elements become `\n`; leading and trailing blank
/// lines are dropped.
pub fn html_to_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let mut out = String::new();
    collect_text(fragment.root_element(), &mut out);
    out.trim_matches('\n').to_string()
}

/// Replace newlines with `<br>` so plain text displays as markup.
pub fn newlines_to_br(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "<br>")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();

    if name == "br" {
        out.push('\n');
        return;
    }
    if HIDDEN_ELEMENTS.contains(&name) {
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&name);
    if block && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        }
    }

    if block && !out.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_become_lines() {
        let html = "<p>Hello {{name}},</p><p>see you <strong>soon</strong>.</p>";
        assert_eq!(html_to_text(html), "Hello {{name}},\nsee you soon.");
    }

    #[test]
    fn test_br_and_entities() {
        assert_eq!(html_to_text("a<br>b &amp; c"), "a\nb & c");
    }

    #[test]
    fn test_empty_paragraph_line() {
        assert_eq!(html_to_text("<p>one</p><p><br></p><p>two</p>"), "one\n\ntwo");
    }

    #[test]
    fn test_hidden_elements_dropped() {
        assert_eq!(html_to_text("<style>p{}</style><p>x</p>"), "x");
    }

    #[test]
    fn test_plain_text_input_unchanged() {
        assert_eq!(html_to_text("just text"), "just text");
    }

    #[test]
    fn test_newlines_to_br() {
        assert_eq!(newlines_to_br("a\nb\r\nc"), "a<br>b<br>c");
    }
}
