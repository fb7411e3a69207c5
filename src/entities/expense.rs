//! Expense entity - a single spend event.
//!
//! `category_id` is deliberately not a foreign key: deleting a category leaves its
//! expenses in place. `paid_by` holds a member name, not a member id.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Client-generated identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning trip
    pub trip_id: Option<Uuid>,
    /// Category the amount is booked against
    pub category_id: Uuid,
    /// Short description (e.g. "Dinner")
    pub title: String,
    /// Amount spent
    pub amount: f64,
    /// Name of the member who paid
    pub paid_by: String,
    /// When the expense was logged
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Expense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each expense belongs to one trip
    #[sea_orm(
        belongs_to = "super::trip::Entity",
        from = "Column::TripId",
        to = "super::trip::Column::Id"
    )]
    Trip,
}

impl Related<super::trip::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trip.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
