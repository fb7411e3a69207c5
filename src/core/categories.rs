//! Category mutations.

use super::{
    model::{Category, CategoryPatch, NewCategory},
    pending::RemoteWrite,
    state::{TripState, log_rejection},
};
use crate::errors::{Error, Result};
use tracing::{info, warn};
use uuid::Uuid;

impl TripState {
    /// Adds a category with nothing spent yet.
    pub fn add_category(&mut self, input: NewCategory) -> Result<Uuid> {
        input.validate().inspect_err(log_rejection("add_category"))?;

        let category = Category {
            id: Uuid::new_v4(),
            trip_id: self.trip_id,
            name: input.name.trim().to_string(),
            planned: input.planned,
            actual: 0.0,
            color: input.color,
            icon: input.icon,
        };
        let id = category.id;
        info!(category = %category.name, planned = category.planned, "Adding category");

        self.queue(RemoteWrite::InsertCategory(category.to_active_model()));
        self.categories.push(category);
        self.issue_pending();
        Ok(id)
    }

    /// Applies a partial update to a category. The running total is not patchable.
    pub fn update_category(&mut self, id: Uuid, patch: &CategoryPatch) -> Result<()> {
        patch
            .validate()
            .inspect_err(log_rejection("update_category"))?;
        let category = self
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(Error::CategoryNotFound { id })
            .inspect_err(log_rejection("update_category"))?;

        category.apply(patch);
        self.queue(RemoteWrite::UpdateCategory(patch.to_active_model(id)));
        self.issue_pending();
        Ok(())
    }

    /// Removes a category. Expenses booked against it stay, as orphans.
    pub fn delete_category(&mut self, id: Uuid) -> Result<()> {
        let index = self
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or(Error::CategoryNotFound { id })
            .inspect_err(log_rejection("delete_category"))?;

        let removed = self.categories.remove(index);
        let orphans = self.expenses.iter().filter(|e| e.category_id == id).count();
        if orphans > 0 {
            warn!(category = %removed.name, orphans, "Deleted category still has expenses");
        }
        self.queue(RemoteWrite::DeleteCategory(id));
        self.issue_pending();
        Ok(())
    }
}
