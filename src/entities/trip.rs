//! Trip entity - the single top-level budgeting context.
//!
//! A deployment looks its trip up by a canonical name and reuses it; the
//! dates are optional on the row and fall back to configured defaults.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Trip database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trips")]
pub struct Model {
    /// Client-generated identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Canonical trip name used for lookup-or-create
    pub name: String,
    /// First day of the trip
    pub start_date: Option<Date>,
    /// Last day of the trip
    pub end_date: Option<Date>,
}

/// Defines relationships between Trip and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One trip has many members
    #[sea_orm(has_many = "super::member::Entity")]
    Members,
    /// One trip has many categories
    #[sea_orm(has_many = "super::category::Entity")]
    Categories,
    /// One trip has many expenses
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
