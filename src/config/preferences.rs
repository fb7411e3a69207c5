//! Local UI preferences that survive a restart.
//!
//! Only the category table sort order and the "has loaded once" flag are kept on
//! disk. Members, categories and expenses are always refetched from the remote
//! store so this file can never become a stale source of truth.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Column the category table is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    /// Category name, case-insensitive
    Name,
    /// Planned amount
    Planned,
    /// Actual amount
    Actual,
    /// Planned minus actual
    Diff,
}

/// Sort direction for the category table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// Persisted UI state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPreferences {
    /// Active sort column, `None` keeps insertion order
    pub sort_column: Option<SortColumn>,
    /// Active sort direction
    pub sort_direction: SortDirection,
    /// Set once the first full load has completed
    pub has_loaded: bool,
}

impl UiPreferences {
    /// Selects a sort column; picking the active column again flips the direction.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        if self.sort_column == Some(column) {
            self.sort_direction = match self.sort_direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.sort_column = Some(column);
            self.sort_direction = SortDirection::Asc;
        }
    }
}

/// Path of the preferences file, from `TRIP_PREFERENCES` or the default.
#[must_use]
pub fn preferences_path() -> String {
    std::env::var("TRIP_PREFERENCES").unwrap_or_else(|_| "data/preferences.toml".to_string())
}

/// Reads preferences, returning defaults when the file does not exist yet.
pub fn load_preferences<P: AsRef<Path>>(path: P) -> Result<UiPreferences> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Ok(UiPreferences::default());
    }
    let contents = std::fs::read_to_string(path_ref)?;
    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse preferences {path_ref:?}: {e}"),
    })
}

/// Writes preferences, creating the parent directory if needed.
pub fn save_preferences<P: AsRef<Path>>(path: P, preferences: &UiPreferences) -> Result<()> {
    let path_ref = path.as_ref();
    if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string(preferences).map_err(|e| Error::Config {
        message: format!("Failed to serialize preferences: {e}"),
    })?;
    std::fs::write(path_ref, contents)?;
    Ok(())
}
