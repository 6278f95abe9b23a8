//! Runtime configuration for the feed engine.
//!
//! Every knob has a default and can be overridden by a `GIFSCROLL_*`
//! environment variable; the binary also loads a `.env` file first.  Unset or
//! empty variables fall back to the default, unparseable ones are an error.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    /// Content API base, e.g. `https://www.reddit.com`.
    pub api_base: String,
    /// `limit=` sent with every raw page request.
    pub raw_page_limit: u32,
    /// Extra raw pages a cycle may request after the first before giving up.
    pub max_retries: u32,
    /// Leave `loading` set after a failed cycle (endless spinner compatibility).
    pub sticky_loading_on_error: bool,
    pub http_timeout: Duration,
    pub settings_path: PathBuf,
    pub log_level: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.reddit.com".to_string(),
            raw_page_limit: 100,
            max_retries: 50,
            sticky_loading_on_error: false,
            http_timeout: Duration::from_secs(30),
            settings_path: PathBuf::from("./gifscroll-settings.json"),
            log_level: "info".to_string(),
        }
    }
}

impl FetcherConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base = env_or_default("GIFSCROLL_API_BASE", &defaults.api_base);
        if url::Url::parse(&api_base).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "GIFSCROLL_API_BASE".to_string(),
                message: format!("{api_base:?} is not an absolute URL"),
            });
        }

        let raw_page_limit = parse_env_u64("GIFSCROLL_RAW_PAGE_LIMIT", u64::from(defaults.raw_page_limit))?;
        if raw_page_limit == 0 || raw_page_limit > u64::from(u32::MAX) {
            return Err(ConfigError::InvalidValue {
                name: "GIFSCROLL_RAW_PAGE_LIMIT".to_string(),
                message: format!("{raw_page_limit} is out of range"),
            });
        }

        Ok(Self {
            api_base,
            raw_page_limit: raw_page_limit as u32,
            max_retries: parse_env_u64("GIFSCROLL_MAX_RETRIES", u64::from(defaults.max_retries))?.min(u64::from(u32::MAX)) as u32,
            sticky_loading_on_error: parse_env_bool("GIFSCROLL_STICKY_LOADING", false)?,
            http_timeout: Duration::from_secs(parse_env_u64("GIFSCROLL_HTTP_TIMEOUT_SECS", 30)?),
            settings_path: optional_env("GIFSCROLL_SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_path),
            log_level: env_or_default("GIFSCROLL_LOG_LEVEL", &defaults.log_level),
        })
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    optional_env(name).unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match optional_env(name) {
        Some(v) => v.trim().parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        None => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match optional_env(name) {
        Some(v) => parse_bool(name, &v),
        None => Ok(default),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ParseBool {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_release() {
        let config = FetcherConfig::default();
        assert_eq!(config.raw_page_limit, 100);
        assert_eq!(config.max_retries, 50);
        assert!(!config.sticky_loading_on_error);
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(parse_bool("X", " on ").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(matches!(
            parse_bool("X", "maybe"),
            Err(ConfigError::ParseBool { .. })
        ));
    }

    #[test]
    fn unset_variables_fall_back() {
        assert_eq!(
            parse_env_u64("GIFSCROLL_TEST_SURELY_UNSET_U64", 7).unwrap(),
            7
        );
        assert!(parse_env_bool("GIFSCROLL_TEST_SURELY_UNSET_BOOL", true).unwrap());
        assert_eq!(env_or_default("GIFSCROLL_TEST_SURELY_UNSET_STR", "x"), "x");
    }
}
