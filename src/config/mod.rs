/// Database configuration and connection management
pub mod database;

/// Local UI preferences persisted between sessions
pub mod preferences;

/// Trip settings, seed data and sync options from config.toml
pub mod trip;
