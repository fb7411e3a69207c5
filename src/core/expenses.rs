//! Expense mutations.
//!
//! Each accepted change is rebooked through the ledger. The queued write carries
//! the touched categories' absolute totals, so the remote `actual_amount` column
//! tracks the local running totals and moves together with the expense row.

use super::{
    ledger::{self, Posting},
    model::{Expense, ExpensePatch, NewExpense},
    pending::RemoteWrite,
    state::{TripState, log_rejection},
};
use crate::errors::{Error, Result};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

impl TripState {
    /// Records an expense against an existing category and credits that category.
    pub fn add_expense(&mut self, input: NewExpense) -> Result<Uuid> {
        input.validate().inspect_err(log_rejection("add_expense"))?;
        self.require_category(input.category_id)
            .inspect_err(log_rejection("add_expense"))?;

        let expense = Expense {
            id: Uuid::new_v4(),
            trip_id: self.trip_id,
            category_id: input.category_id,
            title: input.title.trim().to_string(),
            amount: input.amount,
            paid_by: input.paid_by,
            created_at: Utc::now(),
        };
        let id = expense.id;
        info!(expense = %expense.title, amount = expense.amount, "Adding expense");

        let totals = ledger::rebook(&mut self.categories, None, Some(Posting::from(&expense)));
        self.queue(RemoteWrite::InsertExpense {
            row: expense.to_active_model(),
            totals,
        });
        self.expenses.insert(0, expense);
        self.issue_pending();
        Ok(id)
    }

    /// Applies a partial update to an expense and rebooks the difference.
    ///
    /// Moving an expense to another category debits the old one and credits the new
    /// one; the new category must exist.
    pub fn update_expense(&mut self, id: Uuid, patch: &ExpensePatch) -> Result<()> {
        patch
            .validate()
            .inspect_err(log_rejection("update_expense"))?;
        let index = self
            .expense_index(id)
            .inspect_err(log_rejection("update_expense"))?;
        let current = self.expenses[index].category_id;
        if let Some(category_id) = patch.category_id.filter(|c| *c != current) {
            self.require_category(category_id)
                .inspect_err(log_rejection("update_expense"))?;
        }

        let expense = &mut self.expenses[index];
        let before = Posting::from(&*expense);
        expense.apply(patch);
        let after = Posting::from(&*expense);

        let totals = ledger::rebook(&mut self.categories, Some(before), Some(after));
        self.queue(RemoteWrite::UpdateExpense {
            row: patch.to_active_model(id),
            totals,
        });
        self.issue_pending();
        Ok(())
    }

    /// Removes an expense and debits its category.
    pub fn delete_expense(&mut self, id: Uuid) -> Result<()> {
        let index = self
            .expense_index(id)
            .inspect_err(log_rejection("delete_expense"))?;

        let removed = self.expenses.remove(index);
        info!(expense = %removed.title, amount = removed.amount, "Removed expense");
        let totals = ledger::rebook(&mut self.categories, Some(Posting::from(&removed)), None);
        self.queue(RemoteWrite::DeleteExpense { id, totals });
        self.issue_pending();
        Ok(())
    }

    fn expense_index(&self, id: Uuid) -> Result<usize> {
        self.expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or(Error::ExpenseNotFound { id })
    }

    fn require_category(&self, id: Uuid) -> Result<()> {
        if self.category(id).is_none() {
            return Err(Error::CategoryNotFound { id });
        }
        Ok(())
    }
}
