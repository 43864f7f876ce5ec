//! Per-recipient message rendering.
//!
//! Combines the placeholder renderer, the plain-text collapse and the
//! recipient lookup into [`RenderedMessage`]s:
//!
//! ```text
//! MessageTemplate + RowRecord → render_message() → RenderedMessage
//! ```

pub mod recipient;
pub mod template;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::import::RowRecord;

pub use recipient::{resolve_recipient, RECIPIENT_COLUMNS};
pub use template::{referenced_fields, render, render_with, Escape};
pub use text::{html_to_text, newlines_to_br};

/// User-authored subject and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTemplate {
    pub subject: String,
    /// Editor markup (HTML).
    pub body: String,
    /// Send the visible text of `body` instead of the markup.
    pub plain_text: bool,
}

impl MessageTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>, plain_text: bool) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            plain_text,
        }
    }

    /// Render the subject for a row.
    pub fn render_subject(&self, row: &RowRecord) -> String {
        render(&self.subject, row)
    }

    /// Render the body as it goes on the wire.
    ///
    /// Plain-text mode keeps line breaks as `\n` in a `text` field; markup mode
    /// escapes substituted values and sends `html`.
    pub fn render_content(&self, row: &RowRecord) -> MessageContent {
        if self.plain_text {
            MessageContent::Text(render(&html_to_text(&self.body), row))
        } else {
            MessageContent::Html(render_with(&self.body, row, Escape::Html))
        }
    }

    /// Render the body as displayable markup.
    ///
    /// In plain-text mode line breaks become `<br>`.
    pub fn render_preview_body(&self, row: &RowRecord) -> String {
        if self.plain_text {
            let text = render(&html_to_text(&self.body), row);
            newlines_to_br(&template::escape_html(&text))
        } else {
            render_with(&self.body, row, Escape::Html)
        }
    }
}

/// Rendered body, tagged by the field name it is sent under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageContent {
    Html(String),
    Text(String),
}

impl MessageContent {
    pub fn as_str(&self) -> &str {
        match self {
            MessageContent::Html(s) | MessageContent::Text(s) => s,
        }
    }
}

/// One fully rendered message, in the webhook's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub to: String,
    pub subject: String,
    #[serde(flatten)]
    pub content: MessageContent,
}

/// Render a row, or `None` when it has no recipient address.
pub fn render_message(template: &MessageTemplate, row: &RowRecord) -> Option<RenderedMessage> {
    let to = resolve_recipient(row)?;
    Some(RenderedMessage {
        to: to.to_string(),
        subject: template.render_subject(row),
        content: template.render_content(row),
    })
}
