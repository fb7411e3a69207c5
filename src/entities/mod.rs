//! Entity module - SeaORM definitions for the four remote tables.
//! Each entity has a Model struct for row data and an Entity struct for operations.

pub mod category;
pub mod expense;
pub mod member;
pub mod trip;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use member::{Column as MemberColumn, Entity as Member, Model as MemberModel};
pub use trip::{Column as TripColumn, Entity as Trip, Model as TripModel};
