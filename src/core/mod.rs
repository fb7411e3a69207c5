/// Categories: add, update, delete
pub mod categories;

/// Expenses: add, update, delete, each rebooked through the ledger
pub mod expenses;

/// Running-total bookkeeping shared by local and remote expense changes
pub mod ledger;

/// Members: add, update, delete
pub mod members;

/// Pure totals, balances, settlements and trip progress
pub mod metrics;

/// Domain types and their mapping to remote rows
pub mod model;

/// Outbox of remote writes
pub mod pending;

/// Dashboard and table formatting
pub mod report;

/// The trip snapshot container
pub mod state;

/// Initial load and change-feed reconciliation
pub mod sync;

/// Itinerary entries, kept locally
pub mod timeline;

pub use state::TripState;
pub use sync::SyncOutcome;
