//! In-memory entities and their mapping to and from remote rows.
//!
//! Rows use the remote column names (`planned_amount`, `paid_by`, ...) with nullable
//! amounts; the in-memory shapes use plain values with missing amounts read as zero.
//! Patches map to `ActiveModel`s that only carry the columns being changed.

use crate::{
    entities::{category, expense, member},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveValue::Unchanged, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Colour used when a category row has none
pub const DEFAULT_CATEGORY_COLOR: &str = "#6B7280";
/// Icon used when a category row has none
pub const DEFAULT_CATEGORY_ICON: &str = "more-horizontal";

/// Metadata of the active trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripInfo {
    /// Canonical name
    pub name: String,
    /// ISO currency code
    pub currency: String,
    /// First day
    pub start_date: NaiveDate,
    /// Last day
    pub end_date: NaiveDate,
}

/// A trip participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Identifier
    pub id: Uuid,
    /// Owning trip, `None` while offline
    pub trip_id: Option<Uuid>,
    /// Display name
    pub name: String,
    /// Planned contribution
    pub planned: f64,
    /// Amount actually given
    pub given: f64,
}

/// A budget bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Identifier
    pub id: Uuid,
    /// Owning trip, `None` while offline
    pub trip_id: Option<Uuid>,
    /// Display name
    pub name: String,
    /// Budgeted amount
    pub planned: f64,
    /// Running total of expenses booked here
    pub actual: f64,
    /// Hex colour
    pub color: String,
    /// Icon tag
    pub icon: String,
}

/// A single spend event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Identifier
    pub id: Uuid,
    /// Owning trip, `None` while offline
    pub trip_id: Option<Uuid>,
    /// Category the amount is booked against
    pub category_id: Uuid,
    /// Short description
    pub title: String,
    /// Amount spent
    pub amount: f64,
    /// Name of the paying member
    pub paid_by: String,
    /// When it was logged
    pub created_at: DateTime<Utc>,
}

/// Kind of itinerary entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Getting somewhere
    Travel,
    /// Something to do
    Activity,
    /// A meal
    Food,
    /// Accommodation
    Stay,
    /// Anything else
    #[default]
    Other,
}

/// An itinerary entry. Purely descriptive, never touches money totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Identifier
    pub id: Uuid,
    /// Owning trip, `None` while offline
    pub trip_id: Option<Uuid>,
    /// Headline
    pub title: String,
    /// Free-form notes
    pub description: String,
    /// Day of the event
    pub date: NaiveDate,
    /// Time of day, if known
    pub time: Option<NaiveTime>,
    /// Where it happens
    pub location: String,
    /// Kind tag
    pub kind: EventKind,
}

/// Input for a new category
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// Display name
    pub name: String,
    /// Budgeted amount
    pub planned: f64,
    /// Hex colour
    pub color: String,
    /// Icon tag
    pub icon: String,
}

/// Input for a new expense
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// Short description
    pub title: String,
    /// Amount spent
    pub amount: f64,
    /// Category to book against; must exist
    pub category_id: Uuid,
    /// Name of the paying member
    pub paid_by: String,
}

/// Input for a new timeline event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEvent {
    /// Headline
    pub title: String,
    /// Free-form notes
    pub description: String,
    /// Day of the event
    pub date: NaiveDate,
    /// Time of day, if known
    pub time: Option<NaiveTime>,
    /// Where it happens
    pub location: String,
    /// Kind tag
    pub kind: EventKind,
}

/// Partial update of a member
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberPatch {
    /// New display name
    pub name: Option<String>,
    /// New planned contribution
    pub planned: Option<f64>,
    /// New given amount
    pub given: Option<f64>,
}

/// Partial update of a category.
///
/// The running `actual` total is not patchable; it only moves with expenses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    /// New display name
    pub name: Option<String>,
    /// New budgeted amount
    pub planned: Option<f64>,
    /// New colour
    pub color: Option<String>,
    /// New icon tag
    pub icon: Option<String>,
}

/// Partial update of an expense
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    /// New description
    pub title: Option<String>,
    /// New amount
    pub amount: Option<f64>,
    /// Move to another category
    pub category_id: Option<Uuid>,
    /// New payer
    pub paid_by: Option<String>,
}

/// Partial update of a timeline event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    /// New headline
    pub title: Option<String>,
    /// New notes
    pub description: Option<String>,
    /// New day
    pub date: Option<NaiveDate>,
    /// New time of day; `Some(None)` clears it
    pub time: Option<Option<NaiveTime>>,
    /// New location
    pub location: Option<String>,
    /// New kind tag
    pub kind: Option<EventKind>,
}

/// Rejects empty or whitespace-only text.
pub fn require_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::EmptyField { field });
    }
    Ok(())
}

/// Rejects negative and non-finite amounts.
pub fn require_amount(field: &'static str, amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { field, amount });
    }
    Ok(())
}

fn check_optional_text(field: &'static str, value: Option<&String>) -> Result<()> {
    value.map_or(Ok(()), |v| require_text(field, v))
}

fn check_optional_amount(field: &'static str, amount: Option<f64>) -> Result<()> {
    amount.map_or(Ok(()), |a| require_amount(field, a))
}

impl From<member::Model> for Member {
    fn from(row: member::Model) -> Self {
        Self {
            id: row.id,
            trip_id: row.trip_id,
            name: row.name,
            planned: row.planned_amount.unwrap_or_default(),
            given: row.given_amount.unwrap_or_default(),
        }
    }
}

impl Member {
    /// Remote row for this member
    #[must_use]
    pub fn to_row(&self) -> member::Model {
        member::Model {
            id: self.id,
            trip_id: self.trip_id,
            name: self.name.clone(),
            planned_amount: Some(self.planned),
            given_amount: Some(self.given),
        }
    }

    /// Insert statement values for this member
    #[must_use]
    pub fn to_active_model(&self) -> member::ActiveModel {
        member::ActiveModel {
            id: Set(self.id),
            trip_id: Set(self.trip_id),
            name: Set(self.name.clone()),
            planned_amount: Set(Some(self.planned)),
            given_amount: Set(Some(self.given)),
        }
    }

    /// Copies the patched fields onto this member.
    pub fn apply(&mut self, patch: &MemberPatch) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(planned) = patch.planned {
            self.planned = planned;
        }
        if let Some(given) = patch.given {
            self.given = given;
        }
    }
}

impl MemberPatch {
    /// Rejects empty names and negative amounts.
    pub fn validate(&self) -> Result<()> {
        check_optional_text("member name", self.name.as_ref())?;
        check_optional_amount("planned amount", self.planned)?;
        check_optional_amount("given amount", self.given)
    }

    /// Update statement carrying only the patched columns
    #[must_use]
    pub fn to_active_model(&self, id: Uuid) -> member::ActiveModel {
        let mut row = member::ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(name) = &self.name {
            row.name = Set(name.trim().to_string());
        }
        if let Some(planned) = self.planned {
            row.planned_amount = Set(Some(planned));
        }
        if let Some(given) = self.given {
            row.given_amount = Set(Some(given));
        }
        row
    }
}

impl From<category::Model> for Category {
    fn from(row: category::Model) -> Self {
        Self {
            id: row.id,
            trip_id: row.trip_id,
            name: row.name,
            planned: row.planned_amount.unwrap_or_default(),
            actual: row.actual_amount.unwrap_or_default(),
            color: row
                .color
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            icon: row.icon.unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
        }
    }
}

impl Category {
    /// Remote row for this category
    #[must_use]
    pub fn to_row(&self) -> category::Model {
        category::Model {
            id: self.id,
            trip_id: self.trip_id,
            name: self.name.clone(),
            planned_amount: Some(self.planned),
            actual_amount: Some(self.actual),
            color: Some(self.color.clone()),
            icon: Some(self.icon.clone()),
        }
    }

    /// Insert statement values for this category
    #[must_use]
    pub fn to_active_model(&self) -> category::ActiveModel {
        category::ActiveModel {
            id: Set(self.id),
            trip_id: Set(self.trip_id),
            name: Set(self.name.clone()),
            planned_amount: Set(Some(self.planned)),
            actual_amount: Set(Some(self.actual)),
            color: Set(Some(self.color.clone())),
            icon: Set(Some(self.icon.clone())),
        }
    }

    /// Copies the patched fields onto this category.
    pub fn apply(&mut self, patch: &CategoryPatch) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(planned) = patch.planned {
            self.planned = planned;
        }
        if let Some(color) = &patch.color {
            self.color.clone_from(color);
        }
        if let Some(icon) = &patch.icon {
            self.icon.clone_from(icon);
        }
    }

    /// Takes every descriptive field from a remote row but keeps the local running total.
    pub fn merge_descriptive(&mut self, remote: Self) {
        let actual = self.actual;
        *self = Self { actual, ..remote };
    }
}

impl NewCategory {
    /// Rejects an empty name or a negative budget.
    pub fn validate(&self) -> Result<()> {
        require_text("category name", &self.name)?;
        require_amount("planned amount", self.planned)
    }
}

impl CategoryPatch {
    /// Rejects empty names and negative budgets.
    pub fn validate(&self) -> Result<()> {
        check_optional_text("category name", self.name.as_ref())?;
        check_optional_amount("planned amount", self.planned)
    }

    /// Update statement carrying only the patched columns
    #[must_use]
    pub fn to_active_model(&self, id: Uuid) -> category::ActiveModel {
        let mut row = category::ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(name) = &self.name {
            row.name = Set(name.trim().to_string());
        }
        if let Some(planned) = self.planned {
            row.planned_amount = Set(Some(planned));
        }
        if let Some(color) = &self.color {
            row.color = Set(Some(color.clone()));
        }
        if let Some(icon) = &self.icon {
            row.icon = Set(Some(icon.clone()));
        }
        row
    }
}

impl From<expense::Model> for Expense {
    fn from(row: expense::Model) -> Self {
        Self {
            id: row.id,
            trip_id: row.trip_id,
            category_id: row.category_id,
            title: row.title,
            amount: row.amount,
            paid_by: row.paid_by,
            created_at: row.created_at,
        }
    }
}

impl Expense {
    /// Remote row for this expense
    #[must_use]
    pub fn to_row(&self) -> expense::Model {
        expense::Model {
            id: self.id,
            trip_id: self.trip_id,
            category_id: self.category_id,
            title: self.title.clone(),
            amount: self.amount,
            paid_by: self.paid_by.clone(),
            created_at: self.created_at,
        }
    }

    /// Insert statement values for this expense
    #[must_use]
    pub fn to_active_model(&self) -> expense::ActiveModel {
        expense::ActiveModel {
            id: Set(self.id),
            trip_id: Set(self.trip_id),
            category_id: Set(self.category_id),
            title: Set(self.title.clone()),
            amount: Set(self.amount),
            paid_by: Set(self.paid_by.clone()),
            created_at: Set(self.created_at),
        }
    }

    /// Copies the patched fields onto this expense.
    pub fn apply(&mut self, patch: &ExpensePatch) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(paid_by) = &patch.paid_by {
            self.paid_by.clone_from(paid_by);
        }
    }
}

impl NewExpense {
    /// Rejects an empty title or a negative amount. The category is checked by the caller.
    pub fn validate(&self) -> Result<()> {
        require_text("expense title", &self.title)?;
        require_amount("expense amount", self.amount)
    }
}

impl ExpensePatch {
    /// Rejects empty titles and negative amounts.
    pub fn validate(&self) -> Result<()> {
        check_optional_text("expense title", self.title.as_ref())?;
        check_optional_amount("expense amount", self.amount)
    }

    /// Update statement carrying only the patched columns
    #[must_use]
    pub fn to_active_model(&self, id: Uuid) -> expense::ActiveModel {
        let mut row = expense::ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(title) = &self.title {
            row.title = Set(title.trim().to_string());
        }
        if let Some(amount) = self.amount {
            row.amount = Set(amount);
        }
        if let Some(category_id) = self.category_id {
            row.category_id = Set(category_id);
        }
        if let Some(paid_by) = &self.paid_by {
            row.paid_by = Set(paid_by.clone());
        }
        row
    }
}

impl TimelineEvent {
    /// Copies the patched fields onto this event.
    pub fn apply(&mut self, patch: &EventPatch) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(location) = &patch.location {
            self.location.clone_from(location);
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
    }
}

impl NewEvent {
    /// Rejects an empty title.
    pub fn validate(&self) -> Result<()> {
        require_text("event title", &self.title)
    }
}

impl EventPatch {
    /// Rejects an empty title.
    pub fn validate(&self) -> Result<()> {
        check_optional_text("event title", self.title.as_ref())
    }
}
