//! The in-memory trip snapshot and its outbox.
//!
//! [`TripState`] is the single owner of members, categories, expenses and the
//! itinerary. Mutations live in the sibling modules (`members`, `categories`,
//! `expenses`, `timeline`, `sync`); this module holds the container, read access,
//! and the plumbing that hands queued writes to the remote store.

use super::{
    metrics::{self, BudgetTotals, MemberBalance, Settlement},
    model::{Category, Expense, Member, TimelineEvent, TripInfo},
    pending::{FlushReport, PendingWrites, RemoteWrite, execute_batch},
};
use crate::{
    config::trip::TripConfig,
    errors::{Error, Result},
    store::{ChangeFeed, RemoteStore},
};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Local snapshot of one trip, kept in step with the remote store.
#[derive(Debug)]
pub struct TripState {
    pub(super) remote: RemoteStore,
    pub(super) config: Arc<TripConfig>,
    pub(super) trip_id: Option<Uuid>,
    pub(super) trip: TripInfo,
    pub(super) members: Vec<Member>,
    pub(super) categories: Vec<Category>,
    pub(super) expenses: Vec<Expense>,
    pub(super) timeline: Vec<TimelineEvent>,
    pub(super) pending: PendingWrites,
    pub(super) feed: Option<ChangeFeed>,
}

/// Logs a rejected mutation before the error is returned to the caller.
pub(super) fn log_rejection(operation: &'static str) -> impl Fn(&Error) {
    move |e| warn!(operation, "Rejected mutation: {e}")
}

impl TripState {
    /// Creates an empty, unsynced state. Call [`TripState::init_sync`] to load it.
    #[must_use]
    pub fn new(remote: RemoteStore, config: Arc<TripConfig>) -> Self {
        let trip = TripInfo {
            name: config.trip.name.clone(),
            currency: config.trip.currency.clone(),
            start_date: config.trip.start_date,
            end_date: config.trip.end_date,
        };
        Self {
            remote,
            config,
            trip_id: None,
            trip,
            members: Vec::new(),
            categories: Vec::new(),
            expenses: Vec::new(),
            timeline: Vec::new(),
            pending: PendingWrites::default(),
            feed: None,
        }
    }

    /// Remote store this state writes to
    #[must_use]
    pub const fn remote(&self) -> &RemoteStore {
        &self.remote
    }

    /// Trip name, currency and dates
    #[must_use]
    pub const fn trip(&self) -> &TripInfo {
        &self.trip
    }

    /// Remote trip id, `None` while offline
    #[must_use]
    pub const fn trip_id(&self) -> Option<Uuid> {
        self.trip_id
    }

    /// True once a trip id has been obtained
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.trip_id.is_some()
    }

    /// True while the change feed is attached
    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        self.feed.is_some()
    }

    /// Members in insertion order
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Categories in insertion order
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Expenses, newest first
    #[must_use]
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// Itinerary entries in insertion order
    #[must_use]
    pub fn timeline(&self) -> &[TimelineEvent] {
        &self.timeline
    }

    /// Itinerary entries ordered by date, then time. Untimed entries come first on their day.
    #[must_use]
    pub fn itinerary(&self) -> Vec<&TimelineEvent> {
        let mut events: Vec<&TimelineEvent> = self.timeline.iter().collect();
        events.sort_by_key(|e| (e.date, e.time));
        events
    }

    /// Writes waiting to be sent
    #[must_use]
    pub const fn pending(&self) -> &PendingWrites {
        &self.pending
    }

    /// Looks up a member by id.
    #[must_use]
    pub fn member(&self, id: Uuid) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Looks up a category by id.
    #[must_use]
    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Looks up an expense by id.
    #[must_use]
    pub fn expense(&self, id: Uuid) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    /// Expenses whose category no longer exists
    #[must_use]
    pub fn orphaned_expenses(&self) -> Vec<&Expense> {
        self.expenses
            .iter()
            .filter(|e| self.category(e.category_id).is_none())
            .collect()
    }

    /// Headline totals for the current snapshot
    #[must_use]
    pub fn totals(&self) -> BudgetTotals {
        BudgetTotals::compute(&self.members, &self.categories)
    }

    /// Per-member balances under the equal-split model
    #[must_use]
    pub fn member_balances(&self) -> Vec<MemberBalance> {
        metrics::member_balances(&self.members, metrics::total_actual(&self.categories))
    }

    /// Suggested transfers that square every balance
    #[must_use]
    pub fn settlements(&self) -> Vec<Settlement> {
        metrics::suggest_settlements(&self.member_balances())
    }

    /// Changes the trip dates and queues the remote update.
    pub fn set_trip_dates(&mut self, start: NaiveDate, end: NaiveDate) -> Result<()> {
        if start > end {
            return Err(Error::InvalidDateRange { start, end })
                .inspect_err(log_rejection("set_trip_dates"));
        }
        self.trip.start_date = start;
        self.trip.end_date = end;
        if let Some(id) = self.trip_id {
            self.queue(RemoteWrite::SetTripDates { id, start, end });
        }
        self.issue_pending();
        Ok(())
    }

    /// Queues a write, but only while synced. Offline edits stay local.
    pub(super) fn queue(&mut self, write: RemoteWrite) {
        if self.trip_id.is_some() {
            self.pending.push(write);
        }
    }

    /// Sends queued writes right away when fire-and-forget is enabled.
    pub(super) fn issue_pending(&mut self) {
        if self.config.sync.fire_and_forget {
            // The handle is dropped on purpose, failures are logged by the batch
            let _ = self.dispatch_pending();
        }
    }

    /// Spawns the queued writes on the current runtime.
    ///
    /// Returns `None` when nothing is queued or no runtime is running, in which
    /// case the writes stay queued.
    pub fn dispatch_pending(&mut self) -> Option<JoinHandle<FlushReport>> {
        if self.pending.is_empty() {
            return None;
        }
        let Ok(handle) = Handle::try_current() else {
            debug!("No runtime available, keeping writes queued");
            return None;
        };
        let batch = self.pending.drain();
        let remote = self.remote.clone();
        Some(handle.spawn(async move { execute_batch(&remote, batch).await }))
    }

    /// Sends every queued write and waits for the result.
    pub async fn flush_pending(&mut self) -> FlushReport {
        let batch = self.pending.drain();
        if batch.is_empty() {
            return FlushReport::default();
        }
        let report = execute_batch(&self.remote, batch).await;
        info!(
            written = report.written,
            failed = report.failed.len(),
            "Flushed pending writes"
        );
        report
    }

    /// Detaches the change feed. Returns the number of writes still queued.
    pub fn shutdown(&mut self) -> usize {
        if self.feed.take().is_some() {
            info!("Unsubscribed from change feed");
        }
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::model::NewEvent, test_utils::*};

    #[tokio::test]
    async fn test_new_state_is_unsynced() -> Result<()> {
        let store = setup_remote_store().await?;
        let state = TripState::new(store, Arc::new(TripConfig::default()));

        assert!(!state.is_synced());
        assert!(state.members().is_empty());
        assert_eq!(state.trip().currency, "INR");
        assert_eq!(state.totals().spent_percent, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_trip_dates_rejects_reversed_range() -> Result<()> {
        let mut state = synced_state().await?;
        let start = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 8).unwrap();

        let result = state.set_trip_dates(start, end);
        assert!(matches!(result, Err(Error::InvalidDateRange { .. })));
        assert!(state.pending().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_trip_dates_reaches_store() -> Result<()> {
        let mut state = synced_state().await?;
        let start = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();

        state.set_trip_dates(start, end)?;
        assert_eq!(state.trip().end_date, end);
        assert_eq!(state.pending().len(), 1);

        let report = state.flush_pending().await;
        assert!(report.is_clean());
        let trip = state
            .remote
            .find_trip_by_name(&state.trip().name)
            .await?
            .unwrap();
        assert_eq!(trip.end_date, Some(end));
        Ok(())
    }

    #[tokio::test]
    async fn test_itinerary_orders_by_date_and_time() -> Result<()> {
        let mut state = synced_state().await?;
        let day = NaiveDate::from_ymd_opt(2026, 1, 25).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2026, 1, 24).unwrap();

        let dinner = state.add_event(NewEvent {
            title: "Dinner".to_string(),
            date: day,
            time: chrono::NaiveTime::from_hms_opt(20, 0, 0),
            ..Default::default()
        })?;
        let checkout = state.add_event(NewEvent {
            title: "Checkout".to_string(),
            date: day,
            time: chrono::NaiveTime::from_hms_opt(9, 0, 0),
            ..Default::default()
        })?;
        let drive = state.add_event(NewEvent {
            title: "Drive".to_string(),
            date: earlier,
            ..Default::default()
        })?;

        let order: Vec<Uuid> = state.itinerary().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![drive, checkout, dinner]);
        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_pending_spawns_batch() -> Result<()> {
        let mut state = synced_state().await?;
        state.add_member("Ravi")?;
        assert_eq!(state.pending().len(), 1);

        let handle = state.dispatch_pending().unwrap();
        assert!(state.pending().is_empty());
        let report = handle.await.unwrap();
        assert_eq!(report.written, 1);
        assert!(state.dispatch_pending().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_reports_queued_writes() -> Result<()> {
        let mut state = synced_state().await?;
        assert!(state.is_subscribed());
        state.add_member("Ravi")?;

        assert_eq!(state.shutdown(), 1);
        assert!(!state.is_subscribed());
        Ok(())
    }
}
