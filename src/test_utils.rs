//! Shared test utilities for `TripBuddy`.
//!
//! This module provides common helper functions for setting up test databases,
//! remote stores and synced trip states with sensible defaults.

use crate::{
    config::trip::TripConfig,
    core::TripState,
    entities::{category, expense, member, trip},
    errors::Result,
    store::RemoteStore,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use std::sync::Arc;
use uuid::Uuid;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a remote store over a fresh in-memory database.
pub async fn setup_remote_store() -> Result<RemoteStore> {
    Ok(RemoteStore::new(setup_test_db().await?))
}

/// Creates a remote store whose database has no tables, so every call fails.
pub async fn offline_remote_store() -> Result<RemoteStore> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    Ok(RemoteStore::new(db))
}

/// Drops the `expenses` table so expense writes fail while everything else works.
pub async fn break_expenses_table(state: &TripState) -> Result<()> {
    state
        .remote()
        .connection()
        .execute_unprepared("DROP TABLE expenses")
        .await?;
    Ok(())
}

/// Inserts a trip named "Test Trip".
pub async fn insert_test_trip(store: &RemoteStore) -> Result<trip::Model> {
    let start = NaiveDate::from_ymd_opt(2026, 1, 24).unwrap_or_default();
    let end = NaiveDate::from_ymd_opt(2026, 1, 27).unwrap_or_default();
    store.insert_trip("Test Trip", start, end).await
}

/// Builds a member row ready for insertion.
pub fn member_row(trip_id: Uuid, name: &str, planned: f64, given: f64) -> member::ActiveModel {
    member::ActiveModel {
        id: Set(Uuid::new_v4()),
        trip_id: Set(Some(trip_id)),
        name: Set(name.to_string()),
        planned_amount: Set(Some(planned)),
        given_amount: Set(Some(given)),
    }
}

/// Builds a category row with nothing spent, ready for insertion.
pub fn category_row(trip_id: Uuid, name: &str, planned: f64) -> category::ActiveModel {
    category::ActiveModel {
        id: Set(Uuid::new_v4()),
        trip_id: Set(Some(trip_id)),
        name: Set(name.to_string()),
        planned_amount: Set(Some(planned)),
        actual_amount: Set(Some(0.0)),
        color: Set(Some("#6B7280".to_string())),
        icon: Set(Some("more-horizontal".to_string())),
    }
}

/// Builds an expense row paid by "Sandy", ready for insertion.
pub fn expense_row(
    trip_id: Uuid,
    category_id: Uuid,
    title: &str,
    amount: f64,
) -> expense::ActiveModel {
    expense::ActiveModel {
        id: Set(Uuid::new_v4()),
        trip_id: Set(Some(trip_id)),
        category_id: Set(category_id),
        title: Set(title.to_string()),
        amount: Set(amount),
        paid_by: Set("Sandy".to_string()),
        created_at: Set(Utc::now()),
    }
}

/// Creates a synced state over a fresh store with the default seed already written.
///
/// # Defaults
/// * `fire_and_forget`: false, so tests decide when writes are flushed
/// * 7 members and 14 categories from the built-in configuration
pub async fn synced_state() -> Result<TripState> {
    let mut config = TripConfig::default();
    config.sync.fire_and_forget = false;

    let mut state = TripState::new(setup_remote_store().await?, Arc::new(config));
    state.init_sync().await;
    state.flush_pending().await;
    // Discard the echoes of the seed writes
    state.apply_remote_changes();
    Ok(state)
}
