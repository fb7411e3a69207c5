//! Initial load, change-feed reconciliation and polling refresh.
//!
//! `init_sync` finds (or creates) the trip, attaches the change feed, then reads the
//! trip's rows in one transaction and seeds whatever is empty. Remote notifications
//! are applied through [`TripState::apply_change`], which reuses the ledger so
//! running totals stay consistent with what local mutations would have produced.
//! Writes from other processes never reach this store's feed; they are picked up by
//! [`TripState::refresh_from_remote`].

use super::{
    ledger::{self, Posting},
    model::{Category, Expense, Member},
    pending::RemoteWrite,
    state::TripState,
};
use crate::{
    entities::trip,
    errors::Result,
    store::{ChangeFeed, Row, RowChange, Table, TripRows},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Tables followed through the change feed
const SYNCED_TABLES: [Table; 3] = [Table::Members, Table::Categories, Table::Expenses];

/// How the initial load went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Connected to the remote trip
    Online {
        /// Remote trip id
        trip_id: Uuid,
        /// Default members queued for insertion because the trip had none
        seeded_members: usize,
        /// Default categories queued for insertion because the trip had none
        seeded_categories: usize,
    },
    /// No trip id could be obtained; running on local defaults only
    Offline,
}

impl TripState {
    /// Loads the trip from the remote store, seeding defaults into an empty one.
    ///
    /// Never fails: if the trip can be neither found nor created the state falls
    /// back to local defaults and nothing is queued.
    pub async fn init_sync(&mut self) -> SyncOutcome {
        self.feed = None;
        self.expenses.clear();

        let Some(trip) = self.resolve_trip().await else {
            warn!("Remote store unavailable, running offline on defaults");
            self.trip_id = None;
            self.members = self.seed_members();
            self.categories = self.seed_categories();
            return SyncOutcome::Offline;
        };

        self.trip_id = Some(trip.id);
        if let Some(start) = trip.start_date {
            self.trip.start_date = start;
        }
        if let Some(end) = trip.end_date {
            self.trip.end_date = end;
        }

        // Attach before loading so nothing written in between is missed
        self.feed = Some(self.remote.subscribe_tables(&SYNCED_TABLES));

        let (seeded_members, seeded_categories) = match self.remote.trip_rows(trip.id).await {
            Ok(rows) => {
                info!(
                    members = rows.members.len(),
                    categories = rows.categories.len(),
                    expenses = rows.expenses.len(),
                    "Loaded trip rows"
                );
                self.load_rows(rows)
            }
            Err(e) => {
                error!("Failed to load trip rows, using defaults locally: {e}");
                self.members = self.seed_members();
                self.categories = self.seed_categories();
                (0, 0)
            }
        };

        self.issue_pending();
        SyncOutcome::Online {
            trip_id: trip.id,
            seeded_members,
            seeded_categories,
        }
    }

    async fn resolve_trip(&self) -> Option<trip::Model> {
        let settings = &self.config.trip;
        match self.remote.find_trip_by_name(&settings.name).await {
            Ok(Some(trip)) => {
                info!(trip_id = %trip.id, "Found trip");
                return Some(trip);
            }
            Ok(None) => info!(name = %settings.name, "Trip not found, creating it"),
            Err(e) => warn!("Trip lookup failed: {e}"),
        }
        match self
            .remote
            .insert_trip(&settings.name, settings.start_date, settings.end_date)
            .await
        {
            Ok(trip) => {
                info!(trip_id = %trip.id, "Created trip");
                Some(trip)
            }
            Err(e) => {
                error!("Failed to create trip: {e}");
                None
            }
        }
    }

    /// Adopts the fetched rows. Returns how many default members and categories
    /// were queued for insertion because their table was empty.
    fn load_rows(&mut self, rows: TripRows) -> (usize, usize) {
        let TripRows {
            members,
            categories,
            expenses,
        } = rows;
        self.expenses = expenses.into_iter().map(Expense::from).collect();

        let seeded_members = if members.is_empty() {
            info!("No members found, seeding defaults");
            self.members = self.seed_members();
            let writes: Vec<RemoteWrite> = self
                .members
                .iter()
                .map(|m| RemoteWrite::InsertMember(m.to_active_model()))
                .collect();
            writes.into_iter().for_each(|w| self.queue(w));
            self.members.len()
        } else {
            self.members = members.into_iter().map(Member::from).collect();
            0
        };

        let seeded_categories = if categories.is_empty() {
            info!("No categories found, seeding defaults");
            self.categories = self.seed_categories();
            let writes: Vec<RemoteWrite> = self
                .categories
                .iter()
                .map(|c| RemoteWrite::InsertCategory(c.to_active_model()))
                .collect();
            writes.into_iter().for_each(|w| self.queue(w));
            self.categories.len()
        } else {
            self.categories = categories.into_iter().map(Category::from).collect();
            0
        };

        (seeded_members, seeded_categories)
    }

    fn seed_members(&self) -> Vec<Member> {
        self.config
            .members
            .iter()
            .map(|seed| Member {
                id: Uuid::new_v4(),
                trip_id: self.trip_id,
                name: seed.name.clone(),
                planned: seed.planned,
                given: seed.given,
            })
            .collect()
    }

    fn seed_categories(&self) -> Vec<Category> {
        self.config
            .categories
            .iter()
            .map(|seed| Category {
                id: Uuid::new_v4(),
                trip_id: self.trip_id,
                name: seed.name.clone(),
                planned: seed.planned,
                actual: seed.actual,
                color: seed.color.clone(),
                icon: seed.icon.clone(),
            })
            .collect()
    }

    /// Re-reads the trip's rows and adopts them. Returns the row-level differences
    /// that were picked up.
    ///
    /// This is how edits made by other processes become visible. Nothing is read
    /// while local writes are still queued, since adopting the remote rows would
    /// drop them from the snapshot; the next refresh after a flush catches up.
    pub async fn refresh_from_remote(&mut self) -> Result<Vec<RowChange>> {
        let Some(trip_id) = self.trip_id else {
            return Ok(Vec::new());
        };
        if !self.pending.is_empty() {
            debug!(queued = self.pending.len(), "Writes queued, skipping refresh");
            return Ok(Vec::new());
        }

        let rows = self.remote.trip_rows(trip_id).await?;
        let members: Vec<Member> = rows.members.into_iter().map(Member::from).collect();
        let categories: Vec<Category> = rows.categories.into_iter().map(Category::from).collect();
        let expenses: Vec<Expense> = rows.expenses.into_iter().map(Expense::from).collect();

        let mut changes = diff_rows(
            Table::Members,
            &self.members,
            &members,
            |m| m.id,
            |m| Row::Member(m.to_row()),
        );
        changes.extend(diff_rows(
            Table::Categories,
            &self.categories,
            &categories,
            |c| c.id,
            |c| Row::Category(c.to_row()),
        ));
        changes.extend(diff_rows(
            Table::Expenses,
            &self.expenses,
            &expenses,
            |e| e.id,
            |e| Row::Expense(e.to_row()),
        ));

        if !changes.is_empty() {
            info!(changes = changes.len(), "Adopted remote rows");
            self.members = members;
            self.categories = categories;
            self.expenses = expenses;
        }
        Ok(changes)
    }

    /// Applies every notification already waiting on the feed. Returns how many were read.
    pub fn apply_remote_changes(&mut self) -> usize {
        let mut count = 0;
        while let Some(change) = self.feed.as_mut().and_then(ChangeFeed::try_next) {
            self.apply_change(change);
            count += 1;
        }
        count
    }

    /// Waits for the next notification and applies it.
    ///
    /// Notifications are applied in the order they were published. Returns `None`
    /// once the state is unsubscribed or the store is gone.
    pub async fn next_remote_change(&mut self) -> Option<RowChange> {
        let change = self.feed.as_mut()?.next().await?;
        self.apply_change(change.clone());
        Some(change)
    }

    /// Folds one remote notification into the snapshot. Returns whether anything changed.
    ///
    /// Rows of other trips are ignored. An insert for a known id is treated as an
    /// update, so echoes of local writes and repeated notifications are no-ops.
    pub fn apply_change(&mut self, change: RowChange) -> bool {
        let changed = match change {
            RowChange::Insert(row) | RowChange::Update(row) if !self.owns(&row) => false,
            RowChange::Insert(Row::Member(row)) => self.upsert_member(row.into(), true),
            RowChange::Update(Row::Member(row)) => self.upsert_member(row.into(), false),
            RowChange::Insert(Row::Category(row)) => self.upsert_category(row.into(), true),
            RowChange::Update(Row::Category(row)) => self.upsert_category(row.into(), false),
            RowChange::Insert(Row::Expense(row)) => self.upsert_expense(row.into(), true),
            RowChange::Update(Row::Expense(row)) => self.upsert_expense(row.into(), false),
            RowChange::Delete { table, id } => self.remove_row(table, id),
        };
        if changed {
            debug!("Applied remote change");
        }
        changed
    }

    fn owns(&self, row: &Row) -> bool {
        self.trip_id.is_some() && row.trip_id() == self.trip_id
    }

    fn upsert_member(&mut self, member: Member, insert: bool) -> bool {
        if let Some(existing) = self.members.iter_mut().find(|m| m.id == member.id) {
            if *existing == member {
                return false;
            }
            *existing = member;
            return true;
        }
        if insert {
            self.members.push(member);
        }
        insert
    }

    fn upsert_category(&mut self, mut category: Category, insert: bool) -> bool {
        if let Some(existing) = self.categories.iter_mut().find(|c| c.id == category.id) {
            let before = existing.clone();
            // The running total is driven by expense notifications
            existing.merge_descriptive(category);
            return *existing != before;
        }
        if !insert {
            return false;
        }
        // An inserted row predates every expense booked against it, so expenses
        // already known here were skipped by the ledger and are credited now
        let known: f64 = self
            .expenses
            .iter()
            .filter(|e| e.category_id == category.id)
            .map(|e| e.amount)
            .sum();
        category.actual += known;
        self.categories.push(category);
        true
    }

    fn upsert_expense(&mut self, expense: Expense, insert: bool) -> bool {
        if let Some(existing) = self.expenses.iter_mut().find(|e| e.id == expense.id) {
            if *existing == expense {
                return false;
            }
            let before = Posting::from(&*existing);
            let after = Posting::from(&expense);
            *existing = expense;
            ledger::rebook(&mut self.categories, Some(before), Some(after));
            return true;
        }
        if !insert {
            return false;
        }
        ledger::rebook(&mut self.categories, None, Some(Posting::from(&expense)));
        self.expenses.insert(0, expense);
        true
    }

    fn remove_row(&mut self, table: Table, id: Uuid) -> bool {
        match table {
            Table::Members => remove_by(&mut self.members, |m| m.id == id).is_some(),
            Table::Categories => remove_by(&mut self.categories, |c| c.id == id).is_some(),
            Table::Expenses => {
                let Some(removed) = remove_by(&mut self.expenses, |e| e.id == id) else {
                    return false;
                };
                ledger::rebook(&mut self.categories, Some(Posting::from(&removed)), None);
                true
            }
            Table::Trips => false,
        }
    }
}

fn remove_by<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> Option<T> {
    let index = items.iter().position(matches)?;
    Some(items.remove(index))
}

/// Row-level changes that turn `local` into `remote`
fn diff_rows<T: PartialEq>(
    table: Table,
    local: &[T],
    remote: &[T],
    id: impl Fn(&T) -> Uuid,
    row: impl Fn(&T) -> Row,
) -> Vec<RowChange> {
    let mut changes = Vec::new();
    for item in remote {
        match local.iter().find(|known| id(known) == id(item)) {
            Some(known) if known == item => {}
            Some(_) => changes.push(RowChange::Update(row(item))),
            None => changes.push(RowChange::Insert(row(item))),
        }
    }
    for item in local {
        if !remote.iter().any(|r| id(r) == id(item)) {
            changes.push(RowChange::Delete {
                table,
                id: id(item),
            });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    #![allow(clippy::panic)]
    use super::*;
    use crate::{
        config::{preferences::UiPreferences, trip::TripConfig},
        core::{
            model::{NewCategory, NewExpense},
            report,
        },
        store::RemoteStore,
        test_utils::*,
    };
    use chrono::{NaiveDate, Utc};
    use sea_orm::DatabaseConnection;
    use std::sync::Arc;

    fn manual_config() -> Arc<TripConfig> {
        let mut config = TripConfig::default();
        config.sync.fire_and_forget = false;
        Arc::new(config)
    }

    fn extra_category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            planned: 500.0,
            color: "#10B981".to_string(),
            icon: "ticket".to_string(),
        }
    }

    fn entry(category_id: Uuid, amount: f64) -> NewExpense {
        NewExpense {
            title: "Entry".to_string(),
            amount,
            category_id,
            paid_by: "Sandy".to_string(),
        }
    }

    fn booked_against(state: &TripState, category_id: Uuid) -> f64 {
        state
            .expenses()
            .iter()
            .filter(|e| e.category_id == category_id)
            .map(|e| e.amount)
            .sum()
    }

    #[tokio::test]
    async fn test_empty_store_is_seeded_with_defaults() -> Result<()> {
        let store = setup_remote_store().await?;
        let mut state = TripState::new(store.clone(), manual_config());

        let outcome = state.init_sync().await;
        let SyncOutcome::Online {
            trip_id,
            seeded_members,
            seeded_categories,
        } = outcome
        else {
            panic!("expected online outcome, got {outcome:?}");
        };
        assert_eq!(seeded_members, 7);
        assert_eq!(seeded_categories, 14);
        assert!(state.members().iter().all(|m| m.planned == 3000.0 && m.given == 2000.0));

        let report = state.flush_pending().await;
        assert!(report.is_clean());
        assert_eq!(report.written, 21);

        let members = store.members_for_trip(trip_id).await?;
        assert_eq!(members.len(), 7);
        assert!(members.iter().any(|m| m.name == "Sandy"));
        let categories = store.categories_for_trip(trip_id).await?;
        assert_eq!(categories.len(), 14);
        let fun = categories
            .iter()
            .find(|c| c.name == "Activities Fun World")
            .unwrap();
        assert_eq!(fun.planned_amount, Some(4497.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_second_load_reuses_trip_and_rows() -> Result<()> {
        let store = setup_remote_store().await?;
        let mut first = TripState::new(store.clone(), manual_config());
        let SyncOutcome::Online { trip_id, .. } = first.init_sync().await else {
            panic!("expected online outcome");
        };
        first.flush_pending().await;

        let mut second = TripState::new(store, manual_config());
        let outcome = second.init_sync().await;
        assert_eq!(
            outcome,
            SyncOutcome::Online {
                trip_id,
                seeded_members: 0,
                seeded_categories: 0,
            }
        );
        assert_eq!(second.members().len(), 7);
        assert!(second.pending().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_store_falls_back_offline() -> Result<()> {
        let store = offline_remote_store().await?;
        let mut state = TripState::new(store, manual_config());

        assert_eq!(state.init_sync().await, SyncOutcome::Offline);
        assert!(!state.is_synced());
        assert!(!state.is_subscribed());
        assert_eq!(state.members().len(), 7);
        assert_eq!(state.categories().len(), 14);

        // Offline edits stay local
        let category = state.categories()[0].id;
        let actual = state.categories()[0].actual;
        state.add_member("Ravi")?;
        state.add_expense(NewExpense {
            title: "Tea".to_string(),
            amount: 40.0,
            category_id: category,
            paid_by: "Ravi".to_string(),
        })?;
        assert_eq!(state.category(category).unwrap().actual, actual + 40.0);
        assert!(state.pending().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_remote_notifications_are_idempotent() -> Result<()> {
        let mut state = synced_state().await?;
        let food = state.add_category(NewCategory {
            name: "Food".to_string(),
            planned: 1000.0,
            color: "#EF4444".to_string(),
            icon: "utensils".to_string(),
        })?;
        let id = state.add_expense(NewExpense {
            title: "Dinner".to_string(),
            amount: 500.0,
            category_id: food,
            paid_by: "Abi".to_string(),
        })?;
        let row = state.expense(id).unwrap().to_row();
        let snapshot = (state.categories().to_vec(), state.expenses().to_vec());

        // Echo of our own insert, delivered twice
        assert!(!state.apply_change(RowChange::Insert(Row::Expense(row.clone()))));
        assert!(!state.apply_change(RowChange::Insert(Row::Expense(row.clone()))));
        assert!(!state.apply_change(RowChange::Update(Row::Expense(row))));
        assert_eq!(
            (state.categories().to_vec(), state.expenses().to_vec()),
            snapshot
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_and_unknown_rows_are_ignored() -> Result<()> {
        let mut state = synced_state().await?;
        let members = state.members().to_vec();

        let mut foreign = state.members()[0].to_row();
        foreign.id = Uuid::new_v4();
        foreign.trip_id = Some(Uuid::new_v4());
        assert!(!state.apply_change(RowChange::Insert(Row::Member(foreign))));

        let mut unknown = state.members()[0].to_row();
        unknown.id = Uuid::new_v4();
        assert!(!state.apply_change(RowChange::Update(Row::Member(unknown))));

        assert!(!state.apply_change(RowChange::Delete {
            table: Table::Members,
            id: Uuid::new_v4()
        }));
        assert_eq!(state.members(), members.as_slice());
        Ok(())
    }

    #[tokio::test]
    async fn test_remote_category_update_keeps_local_total() -> Result<()> {
        let mut state = synced_state().await?;
        let category = state.categories()[0].clone();

        let mut row = category.to_row();
        row.name = "Renamed".to_string();
        row.actual_amount = Some(0.0);
        assert!(state.apply_change(RowChange::Update(Row::Category(row))));

        let merged = state.category(category.id).unwrap();
        assert_eq!(merged.name, "Renamed");
        assert_eq!(merged.actual, category.actual);
        Ok(())
    }

    #[tokio::test]
    async fn test_two_sessions_converge() -> Result<()> {
        let store = setup_remote_store().await?;
        let mut alice = TripState::new(store.clone(), manual_config());
        alice.init_sync().await;
        alice.flush_pending().await;
        let mut bob = TripState::new(store, manual_config());
        bob.init_sync().await;
        // Drop the echoes of alice's seed writes
        alice.apply_remote_changes();

        let category = bob.categories()[0].id;
        let before = bob.category(category).unwrap().actual;
        let id = bob.add_expense(NewExpense {
            title: "Auto".to_string(),
            amount: 120.0,
            category_id: category,
            paid_by: "Vicky".to_string(),
        })?;
        bob.add_member("Ravi")?;
        bob.flush_pending().await;

        let applied = alice.apply_remote_changes();
        assert!(applied >= 3);
        assert!(alice.expense(id).is_some());
        assert_eq!(alice.category(category).unwrap().actual, before + 120.0);
        assert!(alice.members().iter().any(|m| m.name == "Ravi"));

        bob.delete_expense(id)?;
        bob.flush_pending().await;
        alice.apply_remote_changes();
        assert!(alice.expense(id).is_none());
        assert_eq!(alice.category(category).unwrap().actual, before);

        // Bob saw his own echoes without drift
        bob.apply_remote_changes();
        assert_eq!(bob.category(category).unwrap().actual, before);
        assert_eq!(bob.members().len(), alice.members().len());
        Ok(())
    }

    #[tokio::test]
    async fn test_next_remote_change_waits_for_feed() -> Result<()> {
        let store = setup_remote_store().await?;
        let mut state = TripState::new(store.clone(), manual_config());
        let SyncOutcome::Online { trip_id, .. } = state.init_sync().await else {
            panic!("expected online outcome");
        };
        state.flush_pending().await;
        state.apply_remote_changes();

        let inserted = store
            .insert_member(member_row(trip_id, "Ravi", 3000.0, 0.0))
            .await?;

        let change = state.next_remote_change().await.unwrap();
        assert_eq!(change, RowChange::Insert(Row::Member(inserted.clone())));
        assert!(state.member(inserted.id).is_some());

        state.shutdown();
        assert!(state.next_remote_change().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_followed_feed_keeps_running_totals() -> Result<()> {
        let store = setup_remote_store().await?;
        let mut alice = TripState::new(store.clone(), manual_config());
        alice.init_sync().await;
        alice.flush_pending().await;
        alice.apply_remote_changes();
        let mut bob = TripState::new(store, manual_config());
        bob.init_sync().await;

        for round in 0..20 {
            let category = bob.add_category(extra_category(&format!("Extra {round}")))?;
            bob.add_expense(entry(category, 100.0))?;
            bob.flush_pending().await;

            // Category insert, expense insert, category total
            for _ in 0..3 {
                assert!(alice.next_remote_change().await.is_some());
            }
            let synced = alice.category(category).unwrap();
            assert_eq!(synced.actual, 100.0);
            assert_eq!(booked_against(&alice, category), synced.actual);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_category_arriving_after_its_expense_is_credited() -> Result<()> {
        let mut state = synced_state().await?;
        let trip_id = state.trip_id();
        let category = Category {
            id: Uuid::new_v4(),
            trip_id,
            name: "Late".to_string(),
            planned: 800.0,
            actual: 0.0,
            color: "#10B981".to_string(),
            icon: "ticket".to_string(),
        };
        let expense = Expense {
            id: Uuid::new_v4(),
            trip_id,
            category_id: category.id,
            title: "Boat".to_string(),
            amount: 75.0,
            paid_by: "Kalai".to_string(),
            created_at: Utc::now(),
        };

        assert!(state.apply_change(RowChange::Insert(Row::Expense(expense.to_row()))));
        assert!(state.apply_change(RowChange::Insert(Row::Category(category.to_row()))));
        assert_eq!(state.category(category.id).unwrap().actual, 75.0);

        let mut settled = category.to_row();
        settled.actual_amount = Some(75.0);
        assert!(!state.apply_change(RowChange::Update(Row::Category(settled))));
        assert_eq!(state.category(category.id).unwrap().actual, 75.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_notifications_already_in_snapshot_are_absorbed() -> Result<()> {
        let store = setup_remote_store().await?;
        let mut alice = TripState::new(store.clone(), manual_config());
        alice.init_sync().await;
        alice.flush_pending().await;
        alice.apply_remote_changes();
        let mut bob = TripState::new(store, manual_config());
        bob.init_sync().await;

        let category = bob.categories()[0].id;
        let before = alice.category(category).unwrap().actual;
        bob.add_expense(entry(category, 60.0))?;
        bob.flush_pending().await;

        // The snapshot already holds the expense and the total it moved
        let picked_up = alice.refresh_from_remote().await?;
        assert!(!picked_up.is_empty());
        assert_eq!(alice.category(category).unwrap().actual, before + 60.0);

        // The queued notifications for the same write change nothing
        assert_eq!(alice.apply_remote_changes(), 2);
        assert_eq!(alice.category(category).unwrap().actual, before + 60.0);
        assert_eq!(booked_against(&alice, category), 60.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_picks_up_writes_from_another_process() -> Result<()> {
        let mut alice = synced_state().await?;
        let other_process = RemoteStore::new(alice.remote().connection().clone());
        let mut bob = TripState::new(other_process, manual_config());
        assert!(matches!(
            bob.init_sync().await,
            SyncOutcome::Online {
                seeded_members: 0,
                ..
            }
        ));

        let category = bob.categories()[0].id;
        let before = alice.category(category).unwrap().actual;
        let id = bob.add_expense(entry(category, 120.0))?;
        bob.add_member("Ravi")?;
        assert!(bob.flush_pending().await.is_clean());

        // Nothing reaches alice's feed from another process
        assert_eq!(alice.apply_remote_changes(), 0);
        assert!(alice.expense(id).is_none());

        let changes = alice.refresh_from_remote().await?;
        assert!(
            changes
                .iter()
                .any(|c| matches!(c, RowChange::Insert(Row::Expense(row)) if row.id == id))
        );
        assert!(alice.expense(id).is_some());
        assert_eq!(alice.category(category).unwrap().actual, before + 120.0);
        assert!(alice.members().iter().any(|m| m.name == "Ravi"));

        bob.delete_expense(id)?;
        bob.flush_pending().await;
        let changes = alice.refresh_from_remote().await?;
        assert!(changes.contains(&RowChange::Delete {
            table: Table::Expenses,
            id
        }));
        assert_eq!(alice.category(category).unwrap().actual, before);
        assert!(alice.refresh_from_remote().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_waits_for_queued_writes() -> Result<()> {
        let mut state = synced_state().await?;
        let category = state.categories()[0].id;
        let id = state.add_expense(entry(category, 40.0))?;

        assert!(state.refresh_from_remote().await?.is_empty());
        assert!(state.expense(id).is_some());

        state.flush_pending().await;
        state.apply_remote_changes();
        state.refresh_from_remote().await?;
        assert!(state.expense(id).is_some());
        assert_eq!(booked_against(&state, category), 40.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_disconnected_store_runs_offline() -> Result<()> {
        let store = RemoteStore::new(DatabaseConnection::Disconnected);
        let mut state = TripState::new(store, manual_config());

        assert_eq!(state.init_sync().await, SyncOutcome::Offline);
        assert!(state.refresh_from_remote().await?.is_empty());
        let today = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let text = report::render_dashboard(&state, &UiPreferences::default(), today);
        assert!(text.contains("[offline]"));
        assert!(text.contains("Master budget:    INR 21,000.00"));
        Ok(())
    }
}
