//! Row-level change notifications.
//!
//! Every successful write through [`super::RemoteStore`] is published on a broadcast
//! channel. A [`ChangeFeed`] is a view of that channel filtered to some tables;
//! dropping it unsubscribes. Changes arrive in the order they were published, also
//! across tables, so a category insert is always seen before the expenses booked
//! against it.

use crate::entities::{category, expense, member};
use std::fmt;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::warn;
use uuid::Uuid;

/// Remote tables that carry notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// `trips`
    Trips,
    /// `members`
    Members,
    /// `categories`
    Categories,
    /// `expenses`
    Expenses,
}

impl Table {
    /// Remote table name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trips => "trips",
            Self::Members => "members",
            Self::Categories => "categories",
            Self::Expenses => "expenses",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A full row as it stands after a write
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// `members` row
    Member(member::Model),
    /// `categories` row
    Category(category::Model),
    /// `expenses` row
    Expense(expense::Model),
}

impl Row {
    /// Table the row lives in
    #[must_use]
    pub const fn table(&self) -> Table {
        match self {
            Self::Member(_) => Table::Members,
            Self::Category(_) => Table::Categories,
            Self::Expense(_) => Table::Expenses,
        }
    }

    /// Trip the row is scoped to
    #[must_use]
    pub const fn trip_id(&self) -> Option<Uuid> {
        match self {
            Self::Member(row) => row.trip_id,
            Self::Category(row) => row.trip_id,
            Self::Expense(row) => row.trip_id,
        }
    }
}

/// One row-level change
#[derive(Debug, Clone, PartialEq)]
pub enum RowChange {
    /// A row was inserted
    Insert(Row),
    /// A row was updated; carries the row after the update
    Update(Row),
    /// A row was deleted
    Delete {
        /// Table the row was deleted from
        table: Table,
        /// Id of the deleted row
        id: Uuid,
    },
}

impl RowChange {
    /// Table the change applies to
    #[must_use]
    pub const fn table(&self) -> Table {
        match self {
            Self::Insert(row) | Self::Update(row) => row.table(),
            Self::Delete { table, .. } => *table,
        }
    }
}

/// Subscription to the changes of one or more tables
#[derive(Debug)]
pub struct ChangeFeed {
    tables: Vec<Table>,
    receiver: broadcast::Receiver<RowChange>,
    missed: u64,
}

impl ChangeFeed {
    pub(crate) fn new(tables: &[Table], receiver: broadcast::Receiver<RowChange>) -> Self {
        Self {
            tables: tables.to_vec(),
            receiver,
            missed: 0,
        }
    }

    /// Tables this feed is scoped to
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    fn wants(&self, change: &RowChange) -> bool {
        self.tables.contains(&change.table())
    }

    /// Number of notifications dropped because the subscriber fell behind.
    /// A non-zero value means only a full resync restores consistency.
    #[must_use]
    pub const fn missed(&self) -> u64 {
        self.missed
    }

    /// Waits for the next matching change. Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<RowChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.wants(&change) => return Some(change),
                Ok(_) => {}
                Err(RecvError::Closed) => return None,
                Err(RecvError::Lagged(count)) => self.record_lag(count),
            }
        }
    }

    /// Returns the next queued change without waiting.
    pub fn try_next(&mut self) -> Option<RowChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) if self.wants(&change) => return Some(change),
                Ok(_) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
                Err(TryRecvError::Lagged(count)) => self.record_lag(count),
            }
        }
    }

    fn record_lag(&mut self, count: u64) {
        self.missed += count;
        warn!(tables = ?self.tables, lagged = count, "Change feed lagged, notifications dropped");
    }
}
