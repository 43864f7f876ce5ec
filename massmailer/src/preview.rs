//! Per-recipient preview paging.

use tracing::debug;

use crate::batch::Attachment;
use crate::import::RowRecord;
use crate::render::{resolve_recipient, MessageContent, MessageTemplate, RenderedMessage};

/// One rendered preview page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// The rendered message. `to` is empty when the row has no recipient, and
    /// the body is always displayable markup.
    pub message: RenderedMessage,
    /// One-based position of the row.
    pub position: usize,
    pub total: usize,
    /// `"name (size)"` per attachment; empty when there are none.
    pub attachments: Vec<String>,
}

/// Cursor over the imported rows.
///
/// The cursor stays within `[0, row_count - 1]`; moving past either end is a
/// no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewNavigator {
    index: usize,
    row_count: usize,
}

impl PreviewNavigator {
    pub fn new(row_count: usize) -> Self {
        Self { index: 0, row_count }
    }

    /// Start over at the first row of a new data set.
    pub fn reset(&mut self, row_count: usize) {
        self.index = 0;
        self.row_count = row_count;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn can_next(&self) -> bool {
        self.index + 1 < self.row_count
    }

    pub fn can_previous(&self) -> bool {
        self.index > 0
    }

    /// Move to the next row. Returns whether the cursor moved.
    pub fn next(&mut self) -> bool {
        if self.can_next() {
            self.index += 1;
            debug!(index = self.index, "preview_next");
            true
        } else {
            false
        }
    }

    /// Move to the previous row. Returns whether the cursor moved.
    pub fn previous(&mut self) -> bool {
        if self.can_previous() {
            self.index -= 1;
            debug!(index = self.index, "preview_previous");
            true
        } else {
            false
        }
    }

    /// Render the row under the cursor with the current template and
    /// attachments. Nothing is cached.
    pub fn current(
        &self,
        rows: &[RowRecord],
        template: &MessageTemplate,
        attachments: &[Attachment],
    ) -> Option<Preview> {
        let row = rows.get(self.index)?;

        Some(Preview {
            message: RenderedMessage {
                to: resolve_recipient(row).unwrap_or_default().to_string(),
                subject: template.render_subject(row),
                content: MessageContent::Html(template.render_preview_body(row)),
            },
            position: self.index + 1,
            total: rows.len(),
            attachments: attachments.iter().map(Attachment::summary).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<RowRecord> {
        vec![
            RowRecord::from_pairs([("name", "Ann"), ("email", "ann@x.com")]),
            RowRecord::from_pairs([("name", "Bob")]),
            RowRecord::from_pairs([("name", "Cleo"), ("To", "cleo@x.com")]),
        ]
    }

    #[test]
    fn test_clamps_at_last_row() {
        let mut nav = PreviewNavigator::new(3);
        assert!(nav.next());
        assert!(nav.next());
        assert_eq!(nav.index(), 2);
        assert!(!nav.can_next());

        assert!(!nav.next());
        assert_eq!(nav.index(), 2);
        assert!(!nav.can_next());
        assert!(nav.can_previous());
    }

    #[test]
    fn test_clamps_at_first_row() {
        let mut nav = PreviewNavigator::new(2);
        assert!(!nav.can_previous());
        assert!(!nav.previous());
        assert_eq!(nav.index(), 0);
    }

    #[test]
    fn test_empty_and_single_row() {
        let mut nav = PreviewNavigator::new(0);
        assert!(!nav.can_next());
        assert!(!nav.next());
        assert!(nav.current(&[], &MessageTemplate::default(), &[]).is_none());

        nav.reset(1);
        assert!(!nav.can_next());
        assert!(!nav.can_previous());
    }

    #[test]
    fn test_reset_returns_to_start() {
        let mut nav = PreviewNavigator::new(3);
        nav.next();
        nav.reset(5);
        assert_eq!(nav.index(), 0);
        assert_eq!(nav.row_count(), 5);
    }

    #[test]
    fn test_current_renders_each_time() {
        let rows = rows();
        let mut nav = PreviewNavigator::new(rows.len());
        let mut template = MessageTemplate::new("Hi {{name}}", "<p>{{name}}</p>", false);

        let first = nav.current(&rows, &template, &[]).unwrap();
        assert_eq!(first.message.to, "ann@x.com");
        assert_eq!(first.message.subject, "Hi Ann");
        assert_eq!(first.position, 1);
        assert_eq!(first.total, 3);
        assert!(first.attachments.is_empty());

        template.subject = "Hello {{name}}".into();
        let attachments = vec![Attachment::from_bytes("plan.pdf", vec![0; 2048]).unwrap()];
        nav.next();
        let second = nav.current(&rows, &template, &attachments).unwrap();
        assert_eq!(second.message.to, "");
        assert_eq!(second.message.subject, "Hello Bob");
        assert_eq!(second.attachments, vec!["plan.pdf (2.0 KB)".to_string()]);
    }
}
