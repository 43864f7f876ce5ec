//! Configuration module for environment variable parsing.
//!
//! Environment values override what is saved in the settings store for the
//! current run only; they are never written back.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::i18n::Locale;
use crate::store::{Settings, StoreKind};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the settings/template store
    pub data_dir: PathBuf,

    /// Store backend
    pub store_kind: StoreKind,

    /// Interface language override
    pub language: Option<Locale>,

    /// Webhook URL override
    pub webhook_url: Option<String>,

    /// Default sender override
    pub default_sender: Option<String>,

    /// Webhook timeout override in seconds
    pub webhook_timeout_secs: Option<u64>,

    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            data_dir: env::var("MASSMAILER_DATA_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),

            store_kind: parse_with("MASSMAILER_STORE", StoreKind::parse).unwrap_or_default(),

            language: parse_with("MASSMAILER_LANG", Locale::parse),

            webhook_url: non_empty("WEBHOOK_URL"),

            default_sender: non_empty("DEFAULT_SENDER"),

            webhook_timeout_secs: parse_var("WEBHOOK_TIMEOUT_SECS"),

            log_json: parse_bool("MASSMAILER_LOG_JSON", false),
        }
    }

    /// Stored settings with the environment overrides applied.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(url) = &self.webhook_url {
            settings.webhook_url = url.clone();
        }
        if let Some(sender) = &self.default_sender {
            settings.default_sender = sender.clone();
        }
        if let Some(secs) = self.webhook_timeout_secs {
            settings.webhook_timeout = secs;
        }
        if let Some(locale) = self.language {
            settings.language = locale.code().to_string();
        }
        settings
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("massmailer"))
        .unwrap_or_else(|| PathBuf::from(".massmailer"))
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable with `FromStr`, warning on invalid values.
fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = non_empty(name)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, ignoring");
            None
        }
    }
}

fn parse_with<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = non_empty(name)?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        warn!(env_var = name, value = %raw, "Invalid value, ignoring");
    }
    parsed
}

/// Parse a boolean flag like "1", "true", "yes".
fn parse_bool(name: &str, default: bool) -> bool {
    let Some(raw) = non_empty(name) else {
        return default;
    };

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean, using default");
            default
        }
    }
}
