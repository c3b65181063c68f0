use std::path::Path;

use anyhow::Context;
use chrono_tz::Tz;
use comic_core::{ComicError, ThemeCatalog};
use provider::{GeminiConfig, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(alias = "bind_addr")]
    pub server_bind: String,
    pub gemini_api_key: Option<String>,
    pub gemini_endpoint: String,
    pub text_model: String,
    pub image_model: String,
    pub provider_timeout_secs: u64,
    pub timezone: String,
    pub cache_daily_comic: bool,
    /// Replaces the built-in theme catalog when set.
    pub themes: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        let gemini = GeminiConfig::default();
        Self {
            server_bind: "127.0.0.1:5000".into(),
            gemini_api_key: None,
            gemini_endpoint: gemini.endpoint,
            text_model: DEFAULT_TEXT_MODEL.into(),
            image_model: DEFAULT_IMAGE_MODEL.into(),
            provider_timeout_secs: gemini.timeout_secs,
            timezone: comic_core::DEFAULT_TIMEZONE.name().into(),
            cache_daily_comic: true,
            themes: None,
        }
    }
}

impl Settings {
    pub fn require_api_key(&self) -> Result<&str, ComicError> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ComicError::Configuration(
                    "API key not set; export GEMINI_API_KEY (or API_KEY)".into(),
                )
            })
    }

    pub fn gemini_config(&self) -> Result<GeminiConfig, ComicError> {
        Ok(GeminiConfig {
            api_key: self.require_api_key()?.to_string(),
            endpoint: self.gemini_endpoint.clone(),
            timeout_secs: self.provider_timeout_secs,
        })
    }

    pub fn timezone(&self) -> Result<Tz, ComicError> {
        self.timezone.parse::<Tz>().map_err(|e| {
            ComicError::Configuration(format!("invalid timezone '{}': {e}", self.timezone))
        })
    }

    pub fn catalog(&self) -> Result<ThemeCatalog, ComicError> {
        match &self.themes {
            Some(themes) => ThemeCatalog::new(themes.iter().cloned()),
            None => Ok(ThemeCatalog::cats()),
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = load_settings_from(Path::new("server.toml"))?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Defaults, then the optional TOML file, then `APP__*` variables.
pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|raw| raw.try_deserialize::<Settings>())
        .with_context(|| format!("failed to load settings from '{}'", path.display()))
}

/// Plain variable names win over everything else.
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("PORT").and_then(|port| port.parse::<u16>().ok()) {
        settings.server_bind = format!("0.0.0.0:{v}");
    }
    if let Some(v) = lookup("API_KEY") {
        settings.gemini_api_key = Some(v);
    }
    if let Some(v) = lookup("GEMINI_API_KEY") {
        settings.gemini_api_key = Some(v);
    }
    if let Some(v) = lookup("GEMINI_ENDPOINT") {
        settings.gemini_endpoint = v;
    }
    if let Some(v) = lookup("COMIC_TIMEZONE") {
        settings.timezone = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
