//! Settings and template persistence on top of a [`KeyValueStore`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::kv::KeyValueStore;
use super::StoreError;
use crate::i18n::Locale;
use crate::render::MessageTemplate;

pub const SETTINGS_KEY: &str = "massmailer_settings";
pub const TEMPLATES_KEY: &str = "massmailer_templates";
pub const EXPORT_VERSION: &str = "1.0";

const DEFAULT_SENDER: &str = "no-reply@company.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User settings. Missing fields take their defaults when loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub webhook_url: String,
    pub default_sender: String,
    /// Seconds; zero means the default.
    pub webhook_timeout: u64,
    /// Interface language code.
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            default_sender: DEFAULT_SENDER.to_string(),
            webhook_timeout: DEFAULT_TIMEOUT_SECS,
            language: Locale::En.code().to_string(),
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        match self.webhook_timeout {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    pub fn locale(&self) -> Locale {
        Locale::parse(&self.language).unwrap_or_default()
    }

    pub fn has_webhook(&self) -> bool {
        !self.webhook_url.trim().is_empty()
    }
}

/// A saved subject/body pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Template {
    /// A new, unsaved template with a fresh id.
    pub fn new(name: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            id: new_template_id(),
            name: name.into(),
            subject: subject.into(),
            html: html.into(),
            created: None,
            updated: None,
        }
    }

    /// Duplicate under a new id, named `"<name> (<suffix>)"`.
    pub fn copy_named(&self, suffix: &str) -> Self {
        Self {
            id: new_template_id(),
            name: format!("{} ({})", self.name, suffix),
            created: None,
            updated: None,
            ..self.clone()
        }
    }

    pub fn to_message_template(&self, plain_text: bool) -> MessageTemplate {
        MessageTemplate::new(self.subject.clone(), self.html.clone(), plain_text)
    }
}

fn new_template_id() -> String {
    format!("template_{}", Uuid::new_v4().simple())
}

/// Everything the store holds, as written by `export`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub settings: Settings,
    pub templates: Vec<Template>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

/// Settings and template operations over the selected backend.
#[derive(Debug)]
pub struct StorageService {
    store: KeyValueStore,
}

impl StorageService {
    pub fn new(store: KeyValueStore) -> Self {
        Self { store }
    }

    /// Stored settings merged over the defaults. Unreadable settings are
    /// logged and replaced by the defaults.
    pub fn get_settings(&self) -> Settings {
        match self.store.get(SETTINGS_KEY) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "settings_invalid_using_defaults");
                Settings::default()
            }),
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!(error = %e, "settings_unreadable_using_defaults");
                Settings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.store.put(SETTINGS_KEY, &serde_json::to_value(settings)?)?;
        info!(
            webhook_configured = settings.has_webhook(),
            webhook_timeout = settings.webhook_timeout,
            language = %settings.language,
            "settings_saved"
        );
        Ok(())
    }

    /// All saved templates. Anything that is not a valid template list reads
    /// as empty; a corrupt stored value is removed.
    pub fn get_templates(&self) -> Vec<Template> {
        match self.store.get(TEMPLATES_KEY) {
            Ok(Some(value)) if value.is_array() => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "templates_invalid_using_empty");
                Vec::new()
            }),
            Ok(Some(_)) => {
                warn!("templates_not_an_array_using_empty");
                Vec::new()
            }
            Ok(None) => Vec::new(),
            Err(StoreError::Corrupt { reason, .. }) => {
                warn!(reason = %reason, "templates_corrupt_removing");
                if let Err(e) = self.store.remove(TEMPLATES_KEY) {
                    warn!(error = %e, "templates_remove_failed");
                }
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "templates_unreadable_using_empty");
                Vec::new()
            }
        }
    }

    pub fn save_templates(&self, templates: &[Template]) -> Result<(), StoreError> {
        self.store.put(TEMPLATES_KEY, &serde_json::to_value(templates)?)
    }

    pub fn find_template(&self, id: &str) -> Option<Template> {
        self.get_templates().into_iter().find(|t| t.id == id)
    }

    /// Insert a new template or update the one with the same id.
    ///
    /// Returns the template as stored, with timestamps filled in.
    pub fn save_template(&self, template: Template) -> Result<Template, StoreError> {
        let mut templates = self.get_templates();
        let now = Utc::now();

        let stored = match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => {
                existing.name = template.name;
                existing.subject = template.subject;
                existing.html = template.html;
                existing.updated = Some(now);
                existing.clone()
            }
            None => {
                let stored = Template {
                    created: Some(now),
                    updated: Some(now),
                    ..template
                };
                templates.push(stored.clone());
                stored
            }
        };

        self.save_templates(&templates)?;
        info!(template_id = %stored.id, name = %stored.name, "template_saved");
        Ok(stored)
    }

    /// Remove a template. Returns `false` when no template had that id.
    pub fn delete_template(&self, id: &str) -> Result<bool, StoreError> {
        let templates = self.get_templates();
        let before = templates.len();
        let remaining: Vec<Template> = templates.into_iter().filter(|t| t.id != id).collect();

        if remaining.len() == before {
            return Ok(false);
        }

        self.save_templates(&remaining)?;
        info!(template_id = %id, "template_deleted");
        Ok(true)
    }

    /// Reset to defaults by removing all stored data.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.store.remove(SETTINGS_KEY)?;
        self.store.remove(TEMPLATES_KEY)?;
        info!("store_cleared");
        Ok(())
    }

    pub fn export_data(&self) -> ExportBundle {
        ExportBundle {
            settings: self.get_settings(),
            templates: self.get_templates(),
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        }
    }

    /// Replace settings and templates from an exported bundle.
    ///
    /// The value must have a `settings` object and a `templates` array.
    pub fn import_data(&self, data: &Value) -> Result<(), StoreError> {
        let settings = match data.get("settings") {
            Some(value) if value.is_object() => serde_json::from_value::<Settings>(value.clone())
                .map_err(|e| StoreError::InvalidImport(format!("settings: {}", e)))?,
            _ => return Err(StoreError::InvalidImport("missing settings object".into())),
        };

        let templates = match data.get("templates") {
            Some(value) if value.is_array() => serde_json::from_value::<Vec<Template>>(value.clone())
                .map_err(|e| StoreError::InvalidImport(format!("templates: {}", e)))?,
            _ => return Err(StoreError::InvalidImport("missing templates array".into())),
        };

        self.save_settings(&settings)?;
        self.save_templates(&templates)?;

        info!(templates = templates.len(), "data_imported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{kv::SqliteStore, StoreKind};
    use serde_json::json;

    fn service() -> (tempfile::TempDir, StorageService) {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyValueStore::open(StoreKind::Json, dir.path()).unwrap();
        (dir, StorageService::new(store))
    }

    #[test]
    fn test_default_settings() {
        let (_dir, service) = service();
        let settings = service.get_settings();

        assert_eq!(settings.webhook_url, "");
        assert_eq!(settings.default_sender, "no-reply@company.com");
        assert_eq!(settings.webhook_timeout, 30);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert!(!settings.has_webhook());
    }

    #[test]
    fn test_partial_settings_merge_defaults() {
        let (_dir, service) = service();
        service
            .store
            .put(SETTINGS_KEY, &json!({"webhookUrl": "https://hook"}))
            .unwrap();

        let settings = service.get_settings();
        assert_eq!(settings.webhook_url, "https://hook");
        assert_eq!(settings.default_sender, "no-reply@company.com");
        assert_eq!(settings.webhook_timeout, 30);
    }

    #[test]
    fn test_save_and_load_settings() {
        let (_dir, service) = service();
        let settings = Settings {
            webhook_url: "https://hook".into(),
            default_sender: "team@x.com".into(),
            webhook_timeout: 0,
            language: "de".into(),
        };
        service.save_settings(&settings).unwrap();

        let loaded = service.get_settings();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.timeout(), Duration::from_secs(30));
        assert_eq!(loaded.locale(), Locale::De);
    }

    #[test]
    fn test_template_lifecycle() {
        let (_dir, service) = service();

        let saved = service
            .save_template(Template::new("Welcome", "Hi {{name}}", "<p>Hello</p>"))
            .unwrap();
        assert!(saved.id.starts_with("template_"));
        assert!(saved.created.is_some());

        let updated = service
            .save_template(Template {
                subject: "Hello {{name}}".into(),
                ..saved.clone()
            })
            .unwrap();
        assert_eq!(updated.created, saved.created);
        assert_eq!(service.get_templates().len(), 1);
        assert_eq!(
            service.find_template(&saved.id).unwrap().subject,
            "Hello {{name}}"
        );

        let copy = service.save_template(updated.copy_named("Copy")).unwrap();
        assert_ne!(copy.id, saved.id);
        assert_eq!(copy.name, "Welcome (Copy)");
        assert_eq!(service.get_templates().len(), 2);

        assert!(service.delete_template(&saved.id).unwrap());
        assert!(!service.delete_template(&saved.id).unwrap());
        assert_eq!(service.get_templates().len(), 1);
    }

    #[test]
    fn test_templates_not_an_array() {
        let (_dir, service) = service();
        service.store.put(TEMPLATES_KEY, &json!({"oops": true})).unwrap();
        assert!(service.get_templates().is_empty());
    }

    #[test]
    fn test_corrupt_templates_removed() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put_raw(TEMPLATES_KEY, "[{broken").unwrap();
        let service = StorageService::new(KeyValueStore::EmbeddedDb(store));

        assert!(service.get_templates().is_empty());
        assert_eq!(service.store.get(TEMPLATES_KEY).unwrap(), None);
    }

    #[test]
    fn test_export_import() {
        let (_dir, source) = service();
        source
            .save_settings(&Settings {
                webhook_url: "https://hook".into(),
                ..Settings::default()
            })
            .unwrap();
        source.save_template(Template::new("A", "S", "B")).unwrap();

        let bundle = source.export_data();
        assert_eq!(bundle.version, "1.0");
        let exported = serde_json::to_value(&bundle).unwrap();
        assert!(exported.get("exportDate").is_some());

        let (_dir2, target) = service();
        target.import_data(&exported).unwrap();
        assert_eq!(target.get_settings().webhook_url, "https://hook");
        assert_eq!(target.get_templates().len(), 1);
    }

    #[test]
    fn test_import_requires_settings_and_templates() {
        let (_dir, service) = service();

        let missing_templates = json!({"settings": {}});
        assert!(matches!(
            service.import_data(&missing_templates),
            Err(StoreError::InvalidImport(_))
        ));

        let templates_not_array = json!({"settings": {}, "templates": {}});
        assert!(matches!(
            service.import_data(&templates_not_array),
            Err(StoreError::InvalidImport(_))
        ));

        assert!(service.import_data(&json!({"settings": {}, "templates": []})).is_ok());
    }

    #[test]
    fn test_clear_all() {
        let (_dir, service) = service();
        service
            .save_settings(&Settings {
                webhook_url: "https://hook".into(),
                ..Settings::default()
            })
            .unwrap();
        service.save_template(Template::new("A", "S", "B")).unwrap();

        service.clear_all().unwrap();
        assert_eq!(service.get_settings(), Settings::default());
        assert!(service.get_templates().is_empty());
    }
}
