//! Server settings read from the client.
//!
//! Settings arrive as `initializationOptions` and in `workspace/didChangeConfiguration`, either
//! as the settings object itself or wrapped in a `cssThemeCompletions` section. Both are
//! validated into [`Settings`] before use.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use themecolors_catalog::{FileCacheOptions, ThemeKind};
use url::Url;

/// Name of the settings section.
pub const SETTINGS_SECTION: &str = "cssThemeCompletions";

/// Default location of the published color data.
pub const DEFAULT_DATA_URL: &str = "https://vsccssthemecompletions.blob.core.windows.net/out/latest.json";

/// Default freshness window, in days.
pub const DEFAULT_REFRESH_DAYS: u32 = 7;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Keys of the settings object, as the client spells them.
const SETTINGS_KEYS: [&str; 5] = ["dataUrl", "dataRefreshInterval", "source", "theme", "languages"];

/// Errors raised while validating settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The settings do not have the expected shape.
	#[error("invalid settings: {0}")]
	Invalid(#[from] serde_json::Error),
	/// `dataUrl` is not a URL.
	#[error("invalid dataUrl {url:?}: {error}")]
	InvalidUrl {
		/// The rejected value.
		url: String,
		/// Parser error.
		error: url::ParseError,
	},
	/// `dataUrl` uses a scheme other than http or https.
	#[error("unsupported dataUrl scheme {0:?}")]
	UnsupportedScheme(String),
	/// `languages` is empty.
	#[error("languages must not be empty")]
	NoLanguages,
}

/// Where completion data comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
	/// Remote JSON document cached on disk.
	#[default]
	Remote,
	/// Color schema queried from the client.
	Schema,
}

/// Validated server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
	/// URL of the remote data document.
	pub data_url: String,
	/// Days after which the cached document is refreshed.
	pub data_refresh_interval: u32,
	/// Completion data source.
	pub source: SourceKind,
	/// Theme used to resolve per-theme default values.
	pub theme: ThemeKind,
	/// Document language identifiers completions are offered in.
	pub languages: Vec<String>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			data_url: DEFAULT_DATA_URL.to_string(),
			data_refresh_interval: DEFAULT_REFRESH_DAYS,
			source: SourceKind::default(),
			theme: ThemeKind::default(),
			languages: ["css", "less", "scss", "stylus", "sass", "html"]
				.into_iter()
				.map(String::from)
				.collect(),
		}
	}
}

impl Settings {
	/// Parses and validates settings from client-provided JSON.
	///
	/// `null` and missing keys take their defaults. An object carrying a
	/// [`SETTINGS_SECTION`] key is unwrapped first.
	///
	/// # Errors
	///
	/// Returns a [`ConfigError`] for a malformed value, a bad `dataUrl` or an empty language
	/// list.
	pub fn from_value(value: JsonValue) -> Result<Self, ConfigError> {
		let value = match value {
			JsonValue::Object(mut map) if map.contains_key(SETTINGS_SECTION) => {
				map.remove(SETTINGS_SECTION).unwrap_or_default()
			}
			other => other,
		};
		let settings: Self = match value {
			JsonValue::Null => Self::default(),
			value => serde_json::from_value(value)?,
		};
		settings.validate()?;
		Ok(settings)
	}

	/// Picks the settings out of a configuration push.
	///
	/// Returns the [`SETTINGS_SECTION`] entry when present, or the object itself when every key
	/// is a settings key. Anything else carries no settings of ours and yields `None`.
	pub fn section(value: JsonValue) -> Option<JsonValue> {
		let JsonValue::Object(mut map) = value else {
			return None;
		};
		if let Some(section) = map.remove(SETTINGS_SECTION) {
			return Some(section);
		}
		let ours = !map.is_empty() && map.keys().all(|key| SETTINGS_KEYS.contains(&key.as_str()));
		ours.then_some(JsonValue::Object(map))
	}

	fn validate(&self) -> Result<(), ConfigError> {
		let url = Url::parse(&self.data_url).map_err(|error| ConfigError::InvalidUrl {
			url: self.data_url.clone(),
			error,
		})?;
		if !matches!(url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
		}
		if self.languages.is_empty() {
			return Err(ConfigError::NoLanguages);
		}
		Ok(())
	}

	/// Freshness window of the cached document.
	pub fn refresh_interval(&self) -> Duration {
		Duration::from_secs(u64::from(self.data_refresh_interval) * SECS_PER_DAY)
	}

	/// Options for the file cache retriever.
	pub fn file_cache_options(&self) -> FileCacheOptions {
		FileCacheOptions {
			data_url: self.data_url.clone(),
			refresh_interval: self.refresh_interval(),
		}
	}

	/// Whether completions are offered in documents of `language_id`.
	pub fn handles_language(&self, language_id: &str) -> bool {
		self.languages.iter().any(|lang| lang == language_id)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[test]
	fn null_yields_defaults() {
		let settings = Settings::from_value(JsonValue::Null).unwrap();
		assert_eq!(settings, Settings::default());
		assert_eq!(settings.refresh_interval(), Duration::from_secs(7 * SECS_PER_DAY));
		assert!(settings.handles_language("scss"));
		assert!(!settings.handles_language("rust"));
	}

	#[test]
	fn section_is_unwrapped_and_partial_keys_merge() {
		let settings = Settings::from_value(json!({
			"cssThemeCompletions": {
				"dataUrl": "http://localhost:8080/colors.json",
				"source": "schema",
				"theme": "highContrast",
			}
		}))
		.unwrap();
		assert_eq!(settings.data_url, "http://localhost:8080/colors.json");
		assert_eq!(settings.source, SourceKind::Schema);
		assert_eq!(settings.theme, ThemeKind::HighContrast);
		assert_eq!(settings.data_refresh_interval, DEFAULT_REFRESH_DAYS);
		assert_eq!(settings.languages.len(), 6);
	}

	#[test]
	fn bare_settings_object_is_accepted() {
		let settings = Settings::from_value(json!({ "dataRefreshInterval": 1, "languages": ["css"] })).unwrap();
		assert_eq!(settings.refresh_interval(), Duration::from_secs(SECS_PER_DAY));
		assert_eq!(settings.file_cache_options().data_url, DEFAULT_DATA_URL);
		assert_eq!(settings.languages, vec!["css".to_string()]);
	}

	#[test]
	fn section_ignores_other_extensions_settings() {
		assert_eq!(Settings::section(json!({ "editor": { "tabSize": 2 } })), None);
		assert_eq!(Settings::section(json!({})), None);
		assert_eq!(Settings::section(JsonValue::Null), None);
		assert_eq!(Settings::section(json!({ "theme": "light", "tabSize": 2 })), None);

		assert_eq!(
			Settings::section(json!({ "editor": {}, "cssThemeCompletions": { "theme": "light" } })),
			Some(json!({ "theme": "light" }))
		);
		assert_eq!(Settings::section(json!({ "theme": "light" })), Some(json!({ "theme": "light" })));
	}

	#[test]
	fn invalid_values_are_rejected() {
		assert!(matches!(
			Settings::from_value(json!({ "dataUrl": "not a url" })),
			Err(ConfigError::InvalidUrl { .. })
		));
		assert!(matches!(
			Settings::from_value(json!({ "dataUrl": "file:///tmp/data.json" })),
			Err(ConfigError::UnsupportedScheme(scheme)) if scheme == "file"
		));
		assert!(matches!(
			Settings::from_value(json!({ "languages": [] })),
			Err(ConfigError::NoLanguages)
		));
		assert!(matches!(
			Settings::from_value(json!({ "dataRefreshInterval": "weekly" })),
			Err(ConfigError::Invalid(_))
		));
		assert!(matches!(
			Settings::from_value(json!({ "source": "carrier-pigeon" })),
			Err(ConfigError::Invalid(_))
		));
	}
}
