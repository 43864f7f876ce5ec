//! Recipient address lookup.

use crate::import::RowRecord;

/// Column names tried for the recipient address, in priority order.
///
/// Matching is case-sensitive; the first non-empty value wins.
pub const RECIPIENT_COLUMNS: &[&str] = &[
    "email",
    "mail",
    "e-mail",
    "Email",
    "Mail",
    "E-Mail",
    "Empfänger",
    "Recipient",
    "To",
];

/// Destination address of a row, if any candidate column holds a value.
pub fn resolve_recipient(row: &RowRecord) -> Option<&str> {
    RECIPIENT_COLUMNS
        .iter()
        .filter_map(|column| row.get(column))
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_candidate_falls_through() {
        let row = RowRecord::from_pairs([("Email", "a@x.com"), ("email", "")]);
        assert_eq!(resolve_recipient(&row), Some("a@x.com"));
    }

    #[test]
    fn test_first_candidate_wins() {
        let row = RowRecord::from_pairs([("Email", "upper@x.com"), ("email", "lower@x.com")]);
        assert_eq!(resolve_recipient(&row), Some("lower@x.com"));

        let row = RowRecord::from_pairs([("To", "to@x.com"), ("E-Mail", "de@x.com")]);
        assert_eq!(resolve_recipient(&row), Some("de@x.com"));
    }

    #[test]
    fn test_candidate_order() {
        assert_eq!(RECIPIENT_COLUMNS[0], "email");
        let email_pos = RECIPIENT_COLUMNS.iter().position(|c| *c == "email");
        let upper_pos = RECIPIENT_COLUMNS.iter().position(|c| *c == "Email");
        assert!(email_pos < upper_pos);
    }

    #[test]
    fn test_german_column() {
        let row = RowRecord::from_pairs([("Name", "Jörg"), ("Empfänger", "joerg@x.de")]);
        assert_eq!(resolve_recipient(&row), Some("joerg@x.de"));
    }

    #[test]
    fn test_case_sensitive_no_match() {
        let row = RowRecord::from_pairs([("EMAIL", "shout@x.com"), ("to", "lower@x.com")]);
        assert_eq!(resolve_recipient(&row), None);
    }
}
