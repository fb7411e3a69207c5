//! Remote row store adapter.
//!
//! Wraps the `SeaORM` connection to the hosted tables and publishes a [`RowChange`]
//! for every successful write, which is what keeps other sessions' snapshots current.
//!
//! An expense write and the category totals it moves are committed in one
//! transaction and published together after the commit. Together with
//! [`RemoteStore::trip_rows`], which reads a trip in one transaction, this means a
//! reader never sees an expense without the matching category total.

/// Per-table change notifications
pub mod feed;

pub use feed::{ChangeFeed, Row, RowChange, Table};

use crate::{
    entities::{Category, Expense, Member, Trip, category, expense, member, trip},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveValue::Unchanged, DatabaseTransaction, QueryOrder, Select, Set, TransactionTrait,
    prelude::*,
};
use tokio::sync::broadcast;
use tracing::trace;

/// Notifications buffered per subscriber before it starts lagging
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Every row of one trip, read in a single transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripRows {
    /// `members` rows
    pub members: Vec<member::Model>,
    /// `categories` rows
    pub categories: Vec<category::Model>,
    /// `expenses` rows, newest first
    pub expenses: Vec<expense::Model>,
}

/// Handle to the remote tables plus their change feed. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    db: DatabaseConnection,
    changes: broadcast::Sender<RowChange>,
}

impl RemoteStore {
    /// Wraps a connection with the default feed capacity.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_capacity(db, DEFAULT_FEED_CAPACITY)
    }

    /// Wraps a connection with a custom feed capacity.
    #[must_use]
    pub fn with_capacity(db: DatabaseConnection, capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        Self { db, changes }
    }

    /// Underlying database connection
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Subscribes to row changes of one table.
    #[must_use]
    pub fn subscribe(&self, table: Table) -> ChangeFeed {
        self.subscribe_tables(&[table])
    }

    /// Subscribes to row changes of several tables through one ordered feed.
    #[must_use]
    pub fn subscribe_tables(&self, tables: &[Table]) -> ChangeFeed {
        ChangeFeed::new(tables, self.changes.subscribe())
    }

    fn publish(&self, change: RowChange) {
        trace!(table = %change.table(), "Publishing row change");
        // No subscribers is fine
        let _ = self.changes.send(change);
    }

    async fn commit(&self, txn: DatabaseTransaction, changes: Vec<RowChange>) -> Result<()> {
        txn.commit().await?;
        changes.into_iter().for_each(|change| self.publish(change));
        Ok(())
    }

    /// Reads the members, categories and expenses of a trip as one consistent view.
    pub async fn trip_rows(&self, trip_id: Uuid) -> Result<TripRows> {
        let txn = self.db.begin().await?;
        let members = members_of(trip_id).all(&txn).await?;
        let categories = categories_of(trip_id).all(&txn).await?;
        let expenses = expenses_of(trip_id).all(&txn).await?;
        txn.commit().await?;
        Ok(TripRows {
            members,
            categories,
            expenses,
        })
    }

    /// Finds the trip with the given canonical name.
    pub async fn find_trip_by_name(&self, name: &str) -> Result<Option<trip::Model>> {
        Trip::find()
            .filter(trip::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Creates a trip with a fresh id.
    pub async fn insert_trip(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<trip::Model> {
        let trip = trip::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            start_date: Set(Some(start_date)),
            end_date: Set(Some(end_date)),
        };
        trip.insert(&self.db).await.map_err(Into::into)
    }

    /// Overwrites the trip's dates.
    pub async fn update_trip_dates(
        &self,
        trip_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<trip::Model> {
        let trip = trip::ActiveModel {
            id: Unchanged(trip_id),
            start_date: Set(Some(start_date)),
            end_date: Set(Some(end_date)),
            ..Default::default()
        };
        trip.update(&self.db).await.map_err(Into::into)
    }

    /// All members of a trip.
    pub async fn members_for_trip(&self, trip_id: Uuid) -> Result<Vec<member::Model>> {
        members_of(trip_id).all(&self.db).await.map_err(Into::into)
    }

    /// Inserts a member row.
    pub async fn insert_member(&self, row: member::ActiveModel) -> Result<member::Model> {
        let model = row.insert(&self.db).await?;
        self.publish(RowChange::Insert(Row::Member(model.clone())));
        Ok(model)
    }

    /// Updates the set columns of a member row.
    pub async fn update_member(&self, row: member::ActiveModel) -> Result<member::Model> {
        let model = row.update(&self.db).await?;
        self.publish(RowChange::Update(Row::Member(model.clone())));
        Ok(model)
    }

    /// Deletes a member row. Returns whether a row was removed.
    pub async fn delete_member(&self, id: Uuid) -> Result<bool> {
        let result = Member::delete_by_id(id).exec(&self.db).await?;
        Ok(self.published_delete(Table::Members, id, result.rows_affected))
    }

    /// All categories of a trip.
    pub async fn categories_for_trip(&self, trip_id: Uuid) -> Result<Vec<category::Model>> {
        categories_of(trip_id).all(&self.db).await.map_err(Into::into)
    }

    /// Inserts a category row.
    pub async fn insert_category(&self, row: category::ActiveModel) -> Result<category::Model> {
        let model = row.insert(&self.db).await?;
        self.publish(RowChange::Insert(Row::Category(model.clone())));
        Ok(model)
    }

    /// Updates the set columns of a category row.
    pub async fn update_category(&self, row: category::ActiveModel) -> Result<category::Model> {
        let model = row.update(&self.db).await?;
        self.publish(RowChange::Update(Row::Category(model.clone())));
        Ok(model)
    }

    /// Deletes a category row. Expenses pointing at it are left alone.
    pub async fn delete_category(&self, id: Uuid) -> Result<bool> {
        let result = Category::delete_by_id(id).exec(&self.db).await?;
        Ok(self.published_delete(Table::Categories, id, result.rows_affected))
    }

    /// All expenses of a trip, newest first.
    pub async fn expenses_for_trip(&self, trip_id: Uuid) -> Result<Vec<expense::Model>> {
        expenses_of(trip_id).all(&self.db).await.map_err(Into::into)
    }

    /// Inserts an expense row and writes `totals`, the absolute running totals
    /// of the categories it moves, in the same transaction.
    pub async fn insert_expense(
        &self,
        row: expense::ActiveModel,
        totals: &[(Uuid, f64)],
    ) -> Result<expense::Model> {
        let txn = self.db.begin().await?;
        let model = row.insert(&txn).await?;
        let mut changes = vec![RowChange::Insert(Row::Expense(model.clone()))];
        write_totals(&txn, totals, &mut changes).await?;
        self.commit(txn, changes).await?;
        Ok(model)
    }

    /// Updates the set columns of an expense row together with category `totals`.
    pub async fn update_expense(
        &self,
        row: expense::ActiveModel,
        totals: &[(Uuid, f64)],
    ) -> Result<expense::Model> {
        let txn = self.db.begin().await?;
        let model = row.update(&txn).await?;
        let mut changes = vec![RowChange::Update(Row::Expense(model.clone()))];
        write_totals(&txn, totals, &mut changes).await?;
        self.commit(txn, changes).await?;
        Ok(model)
    }

    /// Deletes an expense row together with category `totals`. Returns whether a
    /// row was removed.
    pub async fn delete_expense(&self, id: Uuid, totals: &[(Uuid, f64)]) -> Result<bool> {
        let txn = self.db.begin().await?;
        let removed = Expense::delete_by_id(id).exec(&txn).await?.rows_affected > 0;
        let mut changes = Vec::with_capacity(totals.len() + 1);
        if removed {
            changes.push(RowChange::Delete {
                table: Table::Expenses,
                id,
            });
        }
        write_totals(&txn, totals, &mut changes).await?;
        self.commit(txn, changes).await?;
        Ok(removed)
    }

    fn published_delete(&self, table: Table, id: Uuid, rows_affected: u64) -> bool {
        if rows_affected == 0 {
            return false;
        }
        self.publish(RowChange::Delete { table, id });
        true
    }
}

fn members_of(trip_id: Uuid) -> Select<Member> {
    Member::find().filter(member::Column::TripId.eq(trip_id))
}

fn categories_of(trip_id: Uuid) -> Select<Category> {
    Category::find().filter(category::Column::TripId.eq(trip_id))
}

fn expenses_of(trip_id: Uuid) -> Select<Expense> {
    Expense::find()
        .filter(expense::Column::TripId.eq(trip_id))
        .order_by_desc(expense::Column::CreatedAt)
}

/// Overwrites category running totals inside `txn`, recording each updated row.
async fn write_totals(
    txn: &DatabaseTransaction,
    totals: &[(Uuid, f64)],
    changes: &mut Vec<RowChange>,
) -> Result<()> {
    for &(id, actual) in totals {
        let row = category::ActiveModel {
            id: Unchanged(id),
            actual_amount: Set(Some(actual)),
            ..Default::default()
        };
        changes.push(RowChange::Update(Row::Category(row.update(txn).await?)));
    }
    Ok(())
}
