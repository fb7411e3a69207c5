//! Outbox of remote writes produced by accepted local mutations.
//!
//! Writes are logged in mutation order and tagged with the entity they touch.
//! Draining the log hands a batch to [`execute_batch`], which applies the writes
//! one by one; a failed write is logged and skipped, never rolled back locally.
//! An expense write carries the category totals it moved and lands in one
//! remote transaction with them.

use super::ledger::TouchedCategory;
use crate::{
    entities::{category, expense, member},
    errors::Result,
    store::RemoteStore,
};
use chrono::NaiveDate;
use sea_orm::ActiveValue;
use std::collections::VecDeque;
use tracing::{debug, error};
use uuid::Uuid;

/// Entity a pending write targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// A trip row
    Trip(Uuid),
    /// A member row
    Member(Uuid),
    /// A category row
    Category(Uuid),
    /// An expense row
    Expense(Uuid),
}

/// One remote write
#[derive(Debug, Clone)]
pub enum RemoteWrite {
    /// Insert a member row
    InsertMember(member::ActiveModel),
    /// Update some member columns
    UpdateMember(member::ActiveModel),
    /// Delete a member row
    DeleteMember(Uuid),
    /// Insert a category row
    InsertCategory(category::ActiveModel),
    /// Update some category columns
    UpdateCategory(category::ActiveModel),
    /// Delete a category row
    DeleteCategory(Uuid),
    /// Insert an expense row
    InsertExpense {
        /// Row values
        row: expense::ActiveModel,
        /// Absolute totals of the categories the insert credited
        totals: Vec<TouchedCategory>,
    },
    /// Update some expense columns
    UpdateExpense {
        /// Patched columns
        row: expense::ActiveModel,
        /// Absolute totals of the categories the update moved
        totals: Vec<TouchedCategory>,
    },
    /// Delete an expense row
    DeleteExpense {
        /// Expense id
        id: Uuid,
        /// Absolute totals of the categories the delete debited
        totals: Vec<TouchedCategory>,
    },
    /// Overwrite the trip's dates
    SetTripDates {
        /// Trip id
        id: Uuid,
        /// First day
        start: NaiveDate,
        /// Last day
        end: NaiveDate,
    },
}

/// A write waiting to be sent, with its position in the log
#[derive(Debug, Clone)]
pub struct PendingWrite {
    /// Monotonic sequence number
    pub seq: u64,
    /// Entity the write targets
    pub entity: EntityRef,
    /// The write itself
    pub write: RemoteWrite,
}

/// Ordered log of writes not yet handed to the remote store
#[derive(Debug, Default)]
pub struct PendingWrites {
    queue: VecDeque<PendingWrite>,
    next_seq: u64,
}

/// Outcome of sending a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Writes the store accepted
    pub written: usize,
    /// Writes that failed, with the error text
    pub failed: Vec<(EntityRef, String)>,
}

impl FlushReport {
    /// True when nothing failed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

fn total_pairs(totals: &[TouchedCategory]) -> Vec<(Uuid, f64)> {
    totals.iter().map(|t| (t.id, t.actual)).collect()
}

fn active_id(value: &ActiveValue<Uuid>) -> Uuid {
    match value {
        ActiveValue::Set(id) | ActiveValue::Unchanged(id) => *id,
        ActiveValue::NotSet => Uuid::nil(),
    }
}

impl RemoteWrite {
    /// Entity this write targets
    #[must_use]
    pub fn entity(&self) -> EntityRef {
        match self {
            Self::InsertMember(row) | Self::UpdateMember(row) => {
                EntityRef::Member(active_id(&row.id))
            }
            Self::DeleteMember(id) => EntityRef::Member(*id),
            Self::InsertCategory(row) | Self::UpdateCategory(row) => {
                EntityRef::Category(active_id(&row.id))
            }
            Self::DeleteCategory(id) => EntityRef::Category(*id),
            Self::InsertExpense { row, .. } | Self::UpdateExpense { row, .. } => {
                EntityRef::Expense(active_id(&row.id))
            }
            Self::DeleteExpense { id, .. } => EntityRef::Expense(*id),
            Self::SetTripDates { id, .. } => EntityRef::Trip(*id),
        }
    }

    /// Sends this write to the remote store.
    pub async fn execute(self, store: &RemoteStore) -> Result<()> {
        match self {
            Self::InsertMember(row) => store.insert_member(row).await.map(drop),
            Self::UpdateMember(row) => store.update_member(row).await.map(drop),
            Self::DeleteMember(id) => store.delete_member(id).await.map(drop),
            Self::InsertCategory(row) => store.insert_category(row).await.map(drop),
            Self::UpdateCategory(row) => store.update_category(row).await.map(drop),
            Self::DeleteCategory(id) => store.delete_category(id).await.map(drop),
            Self::InsertExpense { row, totals } => store
                .insert_expense(row, &total_pairs(&totals))
                .await
                .map(drop),
            Self::UpdateExpense { row, totals } => store
                .update_expense(row, &total_pairs(&totals))
                .await
                .map(drop),
            Self::DeleteExpense { id, totals } => store
                .delete_expense(id, &total_pairs(&totals))
                .await
                .map(drop),
            Self::SetTripDates { id, start, end } => {
                store.update_trip_dates(id, start, end).await.map(drop)
            }
        }
    }
}

impl PendingWrites {
    /// Appends a write to the log.
    pub fn push(&mut self, write: RemoteWrite) {
        let entity = write.entity();
        debug!(seq = self.next_seq, ?entity, "Queued remote write");
        self.queue.push_back(PendingWrite {
            seq: self.next_seq,
            entity,
            write,
        });
        self.next_seq += 1;
    }

    /// Number of queued writes
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued writes for one entity, oldest first
    pub fn for_entity(&self, entity: EntityRef) -> impl Iterator<Item = &PendingWrite> {
        self.queue.iter().filter(move |p| p.entity == entity)
    }

    /// Iterates over every queued write, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &PendingWrite> {
        self.queue.iter()
    }

    /// Removes and returns every queued write.
    pub fn drain(&mut self) -> Vec<PendingWrite> {
        self.queue.drain(..).collect()
    }
}

/// Sends writes in order. Failures are logged and reported; later writes still go out.
pub async fn execute_batch(store: &RemoteStore, batch: Vec<PendingWrite>) -> FlushReport {
    let mut report = FlushReport::default();
    for pending in batch {
        let PendingWrite { seq, entity, write } = pending;
        match write.execute(store).await {
            Ok(()) => report.written += 1,
            Err(e) => {
                error!(seq, ?entity, "Remote write failed: {e}");
                report.failed.push((entity, e.to_string()));
            }
        }
    }
    report
}
