//! Member entity - a trip participant.
//!
//! Both amount columns are nullable on the remote side; a missing value reads as zero.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Member database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    /// Client-generated identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning trip, absent for rows written without one
    pub trip_id: Option<Uuid>,
    /// Display name, also used as the payer label on expenses
    pub name: String,
    /// Amount the member pledged to contribute
    pub planned_amount: Option<f64>,
    /// Amount the member has actually handed over
    pub given_amount: Option<f64>,
}

/// Defines relationships between Member and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each member belongs to one trip
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
