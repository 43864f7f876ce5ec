//! `{{field}}` placeholder substitution.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::import::RowRecord;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("Invalid placeholder regex"))
}

/// How substituted values are written into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// Values are inserted verbatim.
    None,
    /// Values are HTML-escaped, for bodies that are sent as markup.
    Html,
}

/// Substitute every `{{column}}` token with the row's value.
///
/// Tokens naming a column the row does not have render as the empty string.
/// Everything outside tokens is copied unchanged.
pub fn render(template: &str, row: &RowRecord) -> String {
    render_with(template, row, Escape::None)
}

/// Like [`render`], escaping substituted values as requested.
pub fn render_with(template: &str, row: &RowRecord, escape: Escape) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            let value = row.get(&caps[1]).unwrap_or("");
            match escape {
                Escape::None => value.to_string(),
                Escape::Html => escape_html(value),
            }
        })
        .into_owned()
}

/// Column names referenced by a template, in order of first appearance.
pub fn referenced_fields(template: &str) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(template) {
        let name = caps[1].to_string();
        if !fields.contains(&name) {
            fields.push(name);
        }
    }
    fields
}

pub(crate) fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
