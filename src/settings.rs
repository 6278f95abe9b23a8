//! Feed settings and the store that persists them.
//!
//! The persisted form is a small JSON blob,
//! `{ "subreddit": "gifs", "sort": "/hot", "perPage": 10 }`.  Where it lives
//! is up to the [`SettingsStore`] implementation.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Listing order requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sort {
    #[default]
    #[serde(rename = "/hot", alias = "hot")]
    Hot,
    #[serde(rename = "/new", alias = "new")]
    New,
    #[serde(rename = "/rising", alias = "rising")]
    Rising,
    #[serde(rename = "/top", alias = "top")]
    Top,
    #[serde(rename = "/controversial", alias = "controversial")]
    Controversial,
}

impl Sort {
    /// Path segment inserted after the subreddit name.
    pub fn path(self) -> &'static str {
        match self {
            Sort::Hot => "/hot",
            Sort::New => "/new",
            Sort::Rising => "/rising",
            Sort::Top => "/top",
            Sort::Controversial => "/controversial",
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path().trim_start_matches('/'))
    }
}

/// What to fetch and how many posts make up a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSettings {
    pub subreddit: String,
    pub sort: Sort,
    pub per_page: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            subreddit: "gifs".to_string(),
            sort: Sort::Hot,
            per_page: 10,
        }
    }
}

/// Check that `name` is a plain subreddit identifier.
///
/// `+` joins several subreddits into one listing (`gifs+aww`).
pub fn validate_subreddit(name: &str) -> Result<(), SettingsError> {
    if name.trim().is_empty() {
        return Err(SettingsError::EmptySubreddit);
    }
    let plain = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+');
    if !plain {
        return Err(SettingsError::InvalidSubreddit(name.to_string()));
    }
    Ok(())
}

impl FeedSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_subreddit(&self.subreddit)?;
        if self.per_page == 0 {
            return Err(SettingsError::ZeroPerPage);
        }
        Ok(())
    }
}

/// Persistence for [`FeedSettings`].
pub trait SettingsStore: Send + Sync {
    /// The stored settings, or `None` if nothing has been saved yet.
    fn get(&self) -> Result<Option<FeedSettings>, SettingsError>;

    fn set(&self, settings: &FeedSettings) -> Result<(), SettingsError>;
}

/// Keeps settings in memory only.
#[derive(Debug, Default)]
pub struct MemorySettings {
    stored: Mutex<Option<FeedSettings>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(settings: FeedSettings) -> Self {
        Self {
            stored: Mutex::new(Some(settings)),
        }
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self) -> Result<Option<FeedSettings>, SettingsError> {
        Ok(self.stored.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn set(&self, settings: &FeedSettings) -> Result<(), SettingsError> {
        *self.stored.lock().unwrap_or_else(|e| e.into_inner()) = Some(settings.clone());
        Ok(())
    }
}

/// Stores settings as a JSON file on disk.
///
/// A missing file reads as "nothing stored".
#[derive(Debug, Clone)]
pub struct JsonFileSettings {
    path: PathBuf,
}

impl JsonFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self) -> Result<Option<FeedSettings>, SettingsError> {
        let body = match fs::read(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&body)?))
    }

    fn set(&self, settings: &FeedSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, body)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_launch() {
        let s = FeedSettings::default();
        assert_eq!(s.subreddit, "gifs");
        assert_eq!(s.sort, Sort::Hot);
        assert_eq!(s.per_page, 10);
    }

    #[test]
    fn persisted_form_uses_path_sort_and_camel_case() {
        let json = serde_json::to_value(FeedSettings::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "subreddit": "gifs", "sort": "/hot", "perPage": 10 })
        );
    }

    #[test]
    fn sort_accepts_bare_names() {
        let s: FeedSettings =
            serde_json::from_str(r#"{"subreddit":"aww","sort":"top","perPage":5}"#).unwrap();
        assert_eq!(s.sort, Sort::Top);
        assert_eq!(s.sort.to_string(), "top");
    }

    #[test]
    fn validate_rejects_blank_subreddit_and_zero_page() {
        let mut s = FeedSettings::default();
        s.subreddit = "  ".into();
        assert!(matches!(s.validate(), Err(SettingsError::EmptySubreddit)));

        let mut s = FeedSettings::default();
        s.per_page = 0;
        assert!(matches!(s.validate(), Err(SettingsError::ZeroPerPage)));

        assert!(FeedSettings::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_names_that_would_alter_the_url() {
        for name in ["gifs?limit=1#", "gifs/new", "a b", "gifs#top"] {
            let s = FeedSettings {
                subreddit: name.to_string(),
                ..FeedSettings::default()
            };
            assert!(
                matches!(s.validate(), Err(SettingsError::InvalidSubreddit(_))),
                "{name:?} should be rejected"
            );
        }
        assert!(validate_subreddit("High_Quality_Gifs").is_ok());
        assert!(validate_subreddit("gifs+aww").is_ok());
    }

    #[test]
    fn memory_store_starts_empty() {
        let store = MemorySettings::new();
        assert!(store.get().unwrap().is_none());

        store.set(&FeedSettings::default()).unwrap();
        assert_eq!(store.get().unwrap(), Some(FeedSettings::default()));
    }

    #[test]
    fn json_file_missing_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSettings::new(dir.path().join("settings.json"));
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn json_file_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = FeedSettings {
            subreddit: "aww".into(),
            sort: Sort::New,
            per_page: 25,
        };
        JsonFileSettings::new(&path).set(&settings).unwrap();

        let reloaded = JsonFileSettings::new(&path).get().unwrap();
        assert_eq!(reloaded, Some(settings));
    }

    #[test]
    fn json_file_corrupt_blob_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{oops").unwrap();

        let err = JsonFileSettings::new(&path).get().unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
    }
}
