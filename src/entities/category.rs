//! Category entity - a budget bucket with a planned ceiling and running actual total.
//!
//! `actual_amount` is a cached total; the client keeps it equal to the sum of the
//! expenses booked against the category and writes it back as an absolute value.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Client-generated identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning trip
    pub trip_id: Option<Uuid>,
    /// Display name (e.g. "Food Saturday")
    pub name: String,
    /// Budgeted amount
    pub planned_amount: Option<f64>,
    /// Running total of expenses in this category
    pub actual_amount: Option<f64>,
    /// Hex colour used by charts
    pub color: Option<String>,
    /// Icon tag used by the UI
    pub icon: Option<String>,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each category belongs to one trip
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
