//! Trip configuration loading from config.toml
//!
//! This module describes the canonical trip (name, currency, default dates), the
//! members and categories seeded into an empty remote store, and the sync options.
//! Every section is optional; anything missing falls back to the built-in defaults.

use crate::errors::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone)]
pub struct TripConfig {
    /// Canonical trip settings
    #[serde(default)]
    pub trip: TripSettings,
    /// Members seeded when the remote store has none
    #[serde(default = "default_members")]
    pub members: Vec<MemberSeed>,
    /// Categories seeded when the remote store has none
    #[serde(default = "default_categories")]
    pub categories: Vec<CategorySeed>,
    /// Sync behaviour
    #[serde(default)]
    pub sync: SyncOptions,
}

/// Settings for the single trip this deployment tracks
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TripSettings {
    /// Name used to look the trip up (and to create it if missing)
    pub name: String,
    /// ISO currency code used when formatting amounts
    pub currency: String,
    /// Start date used when the trip has to be created
    pub start_date: NaiveDate,
    /// End date used when the trip has to be created
    pub end_date: NaiveDate,
    /// Planned contribution given to members added later
    pub new_member_planned: f64,
}

/// A member seeded into an empty trip
#[derive(Debug, Deserialize, Clone)]
pub struct MemberSeed {
    /// Display name
    pub name: String,
    /// Planned contribution
    pub planned: f64,
    /// Amount already given
    pub given: f64,
}

/// A category seeded into an empty trip
#[derive(Debug, Deserialize, Clone)]
pub struct CategorySeed {
    /// Display name
    pub name: String,
    /// Budgeted amount
    pub planned: f64,
    /// Already-spent amount carried into the seed
    #[serde(default)]
    pub actual: f64,
    /// Hex colour
    pub color: String,
    /// Icon tag
    pub icon: String,
}

/// Options controlling how local writes reach the remote store
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyncOptions {
    /// Spawn remote writes as soon as a mutation is accepted
    pub fire_and_forget: bool,
    /// Capacity of the change-feed channel
    pub feed_capacity: usize,
    /// Seconds between re-reads of the remote rows, 0 disables polling
    pub poll_interval_secs: u64,
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            trip: TripSettings::default(),
            members: default_members(),
            categories: default_categories(),
            sync: SyncOptions::default(),
        }
    }
}

impl Default for TripSettings {
    fn default() -> Self {
        Self {
            name: "Mysore and Bangalore Mini Trip".to_string(),
            currency: "INR".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 24).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 27).unwrap_or_default(),
            new_member_planned: 3000.0,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            fire_and_forget: true,
            feed_capacity: 256,
            poll_interval_secs: 15,
        }
    }
}

fn default_members() -> Vec<MemberSeed> {
    ["Sandy", "Vicky", "Abi", "Lachu", "Yuva", "Kalai", "Karthi"]
        .into_iter()
        .map(|name| MemberSeed {
            name: name.to_string(),
            planned: 3000.0,
            given: 2000.0,
        })
        .collect()
}

fn default_categories() -> Vec<CategorySeed> {
    [
        ("Transportation (Internal)", 0.0, 0.0, "#3B82F6", "car"),
        ("Travel - Train/Bus", 1980.0, 0.0, "#8B5CF6", "plane"),
        ("Activities Fun World", 4497.0, 4497.0, "#10B981", "ticket"),
        ("Turf", 1000.0, 0.0, "#F59E0B", "trophy"),
        ("Food Friday Night", 400.0, 0.0, "#EF4444", "utensils"),
        ("Food Saturday", 2100.0, 0.0, "#EF4444", "utensils"),
        ("Food Sunday", 2100.0, 0.0, "#EF4444", "utensils"),
        ("Food Monday", 2100.0, 0.0, "#EF4444", "utensils"),
        ("Tickets/Entry", 0.0, 0.0, "#06B6D4", "ticket"),
        ("Drinks/Beverages", 0.0, 0.0, "#EC4899", "coffee"),
        ("Emergency/Medical", 500.0, 0.0, "#DC2626", "alert"),
        ("Entertainment", 0.0, 0.0, "#A855F7", "music"),
        ("Tips/Service", 0.0, 0.0, "#84CC16", "heart"),
        ("Souvenirs/Gifts", 0.0, 0.0, "#F97316", "gift"),
    ]
    .into_iter()
    .map(|(name, planned, actual, color, icon)| CategorySeed {
        name: name.to_string(),
        planned,
        actual,
        color: color.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}

/// Loads trip configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A present field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TripConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading trip configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {path_ref:?}: {e}"),
    })
}

/// Loads configuration from `TRIP_CONFIG` (or ./config.toml), using the
/// built-in defaults when the file does not exist.
pub fn load_default_config() -> Result<TripConfig> {
    let path = std::env::var("TRIP_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(path)
    } else {
        tracing::info!("No config file at {path}, using built-in trip defaults");
        Ok(TripConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_default_seeds() {
        let config = TripConfig::default();
        assert_eq!(config.members.len(), 7);
        assert!(
            config
                .members
                .iter()
                .all(|m| m.planned == 3000.0 && m.given == 2000.0)
        );
        assert_eq!(config.categories.len(), 14);
        assert_eq!(config.categories[2].name, "Activities Fun World");
        assert_eq!(config.categories[2].actual, 4497.0);
        assert_eq!(config.trip.currency, "INR");
        assert!(config.sync.fire_and_forget);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
            [trip]
            name = "Goa Weekend"
            start_date = "2026-03-01"
            end_date = "2026-03-03"

            [[members]]
            name = "Asha"
            planned = 1500.0
            given = 500.0

            [sync]
            fire_and_forget = false
        "#;

        let config: TripConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.trip.name, "Goa Weekend");
        assert_eq!(config.trip.currency, "INR");
        assert_eq!(
            config.trip.start_date,
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert_eq!(config.members.len(), 1);
        assert_eq!(config.members[0].given, 500.0);
        // Categories fall back to the defaults
        assert_eq!(config.categories.len(), 14);
        assert!(!config.sync.fire_and_forget);
        assert_eq!(config.sync.feed_capacity, 256);
        assert_eq!(config.sync.poll_interval_secs, 15);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
