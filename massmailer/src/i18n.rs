//! User-facing message translation.
//!
//! Lookup goes requested locale → English → the key itself. Messages may carry
//! positional `{0}`, `{1}`, ... arguments.

use std::fmt::Display;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Supported interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::De];

    /// Parse a language tag such as `de`, `de-DE` or `en_US`.
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag
            .split(&['-', '_'][..])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "de" => Some(Locale::De),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
        }
    }

    /// Name of the language in itself.
    pub fn display_name(&self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::De => "Deutsch",
        }
    }
}

const EN: &[(&str, &str)] = &[
    ("warning", "Warning"),
    ("none", "None"),
    ("details", "Details"),
    ("copy", "Copy"),
    ("to", "To"),
    ("subject", "Subject"),
    ("attachments", "Attachments"),
    ("file_error", "File error"),
    ("excel_error", "Excel error"),
    ("parse_error", "Parse error: {0}"),
    ("file_no_data", "The file contains no data"),
    ("excel_no_headers", "No valid column headers found."),
    ("unsupported_file", "Unsupported file type: {0}"),
    ("data_loaded", "{0} records loaded"),
    ("available_placeholders", "Available Placeholders"),
    ("first_row", "First row"),
    ("unknown_placeholder", "Placeholder {{{0}}} matches no column and will be empty"),
    ("unsupported_language", "Unsupported language: {0} (available: {1})"),
    ("no_email", "No email address found in row {0}"),
    ("no_csv", "No CSV data available"),
    ("no_webhook", "No webhook URL configured"),
    ("no_messages", "No message has a recipient; nothing to send"),
    ("network_error", "Network error"),
    ("request_error", "Error with the request: {0}"),
    ("file_too_large", "File {0} is larger than 10 MB and will be skipped"),
    ("attachment_added", "Attachment added"),
    ("settings_saved", "Settings saved"),
    ("settings_error", "Settings could not be saved"),
    ("template_saved", "Template saved"),
    ("template_not_saved", "Template could not be saved"),
    ("template_not_found", "Template not found"),
    ("template_loaded", "{0} has been loaded"),
    ("template_copied", "{0} has been copied"),
    ("template_deleted", "Template has been deleted"),
    ("template_delete_error", "Template could not be deleted"),
    ("export_success", "All settings and templates have been exported"),
    ("export_error", "The data could not be exported"),
    ("import_success", "Settings and templates have been imported"),
    ("import_error", "The data could not be imported"),
    ("data_deleted", "All settings and templates have been reset"),
    ("delete_error", "The data could not be deleted"),
    ("confirm_delete_data", "Are you sure you want to delete all saved settings and templates? This action cannot be undone."),
    ("sending", "Sending {0} messages..."),
    ("send_success", "Successfully sent! ({0}s)"),
    ("message_status", "Message {0}: {1}"),
    ("webhook_timeout", "The webhook did not respond in time (Timeout after {0} seconds)."),
    ("conversion_error", "Error with binary conversion: {0}"),
    ("preview_position", "Recipient {0} of {1}"),
    ("preview_help", "[n]ext, [p]revious, [q]uit"),
];

const DE: &[(&str, &str)] = &[
    ("warning", "Warnung"),
    ("none", "Keine"),
    ("details", "Details"),
    ("copy", "Kopie"),
    ("to", "An"),
    ("subject", "Betreff"),
    ("attachments", "Anhänge"),
    ("file_error", "Datei-Fehler"),
    ("excel_error", "Excel-Fehler"),
    ("parse_error", "Fehler beim Parsen: {0}"),
    ("file_no_data", "Die Datei enthält keine Daten"),
    ("excel_no_headers", "Keine gültigen Spaltenüberschriften gefunden."),
    ("unsupported_file", "Nicht unterstützter Dateityp: {0}"),
    ("data_loaded", "{0} Datensätze geladen"),
    ("available_placeholders", "Verfügbare Platzhalter"),
    ("first_row", "Erste Zeile"),
    ("unknown_placeholder", "Platzhalter {{{0}}} passt zu keiner Spalte und bleibt leer"),
    ("unsupported_language", "Nicht unterstützte Sprache: {0} (verfügbar: {1})"),
    ("no_email", "Keine E-Mail-Adresse gefunden in Zeile {0}"),
    ("no_csv", "Keine CSV-Daten vorhanden"),
    ("no_webhook", "Keine Webhook-URL konfiguriert"),
    ("no_messages", "Keine Nachricht hat einen Empfänger; nichts zu senden"),
    ("network_error", "Netzwerkfehler"),
    ("request_error", "Fehler bei der Anfrage: {0}"),
    ("file_too_large", "Datei {0} ist größer als 10 MB und wird übersprungen"),
    ("attachment_added", "Anhang hinzugefügt"),
    ("settings_saved", "Einstellungen wurden gespeichert"),
    ("settings_error", "Einstellungen konnten nicht gespeichert werden"),
    ("template_saved", "Vorlage wurde gespeichert"),
    ("template_not_saved", "Vorlage konnte nicht gespeichert werden"),
    ("template_not_found", "Vorlage nicht gefunden"),
    ("template_loaded", "\"{0}\" wurde geladen"),
    ("template_copied", "\"{0}\" wurde kopiert"),
    ("template_deleted", "Vorlage wurde gelöscht"),
    ("template_delete_error", "Vorlage konnte nicht gelöscht werden"),
    ("export_success", "Alle Einstellungen und Vorlagen wurden exportiert"),
    ("export_error", "Die Daten konnten nicht exportiert werden"),
    ("import_success", "Einstellungen und Vorlagen wurden importiert"),
    ("import_error", "Die Daten konnten nicht importiert werden"),
    ("data_deleted", "Alle Einstellungen und Vorlagen wurden zurückgesetzt"),
    ("delete_error", "Die Daten konnten nicht gelöscht werden"),
    ("confirm_delete_data", "Sind Sie sicher, dass Sie alle gespeicherten Einstellungen und Vorlagen löschen möchten? Diese Aktion kann nicht rückgängig gemacht werden."),
    ("sending", "Starte Übertragung von {0} Nachrichten..."),
    ("send_success", "Erfolgreich gesendet! ({0}s)"),
    ("message_status", "Nachricht {0}: {1}"),
    ("webhook_timeout", "Der Webhook hat nicht rechtzeitig geantwortet (Timeout nach {0} Sekunden)."),
    ("conversion_error", "Fehler bei der Binärkonvertierung: {0}"),
    ("preview_position", "Empfänger {0} von {1}"),
];

fn table(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => EN,
        Locale::De => DE,
    }
}

fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
    table(locale)
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, text)| *text)
}

fn argument_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("Invalid argument regex"))
}

/// Translate `key` for `locale`, filling `{n}` with `args[n]`.
///
/// Missing translations fall back to English, then to the key. Placeholders
/// without a matching argument are left as they are.
pub fn translate(key: &str, locale: Locale, args: &[&dyn Display]) -> String {
    let Some(text) = lookup(locale, key).or_else(|| lookup(Locale::En, key)) else {
        return key.to_string();
    };

    if args.is_empty() {
        return text.to_string();
    }

    argument_regex()
        .replace_all(text, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| args.get(n))
                .map(|arg| arg.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
