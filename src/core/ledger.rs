//! Incremental maintenance of `Category::actual`.
//!
//! Every expense change, local or remote, is expressed as a move from one
//! [`Posting`] to another and rebooked here, so a category's running total always
//! equals the sum of the expenses currently pointing at it.

use super::model::{Category, Expense};
use tracing::warn;
use uuid::Uuid;

/// The part of an expense that affects category totals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    /// Category the amount is booked against
    pub category_id: Uuid,
    /// Booked amount
    pub amount: f64,
}

impl From<&Expense> for Posting {
    fn from(expense: &Expense) -> Self {
        Self {
            category_id: expense.category_id,
            amount: expense.amount,
        }
    }
}

/// New absolute total of a category touched by a rebooking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchedCategory {
    /// Category id
    pub id: Uuid,
    /// Running total after the change
    pub actual: f64,
}

/// Adds `delta` to a category's running total. Returns the new total, or `None`
/// if the category is not in the snapshot.
///
/// A total that goes negative is kept as is so the drift stays visible.
pub fn adjust_actual(categories: &mut [Category], category_id: Uuid, delta: f64) -> Option<f64> {
    let category = categories.iter_mut().find(|c| c.id == category_id)?;
    category.actual += delta;
    if category.actual < 0.0 {
        warn!(
            category = %category.name,
            actual = category.actual,
            "Running total went negative"
        );
    }
    Some(category.actual)
}

/// Moves an expense's effect from `before` to `after`.
///
/// `None` on either side means the expense did not exist (insert) or no longer
/// exists (delete). Changing category debits the old one and credits the new one.
/// Categories missing from the snapshot are skipped.
#[allow(clippy::float_cmp)]
pub fn rebook(
    categories: &mut [Category],
    before: Option<Posting>,
    after: Option<Posting>,
) -> Vec<TouchedCategory> {
    let mut touched = Vec::new();
    match (before, after) {
        (Some(old), Some(new)) if old.category_id == new.category_id => {
            let delta = new.amount - old.amount;
            if delta != 0.0 {
                push_adjustment(&mut touched, categories, new.category_id, delta);
            }
        }
        (old, new) => {
            if let Some(old) = old {
                push_adjustment(&mut touched, categories, old.category_id, -old.amount);
            }
            if let Some(new) = new {
                push_adjustment(&mut touched, categories, new.category_id, new.amount);
            }
        }
    }
    touched
}

fn push_adjustment(
    touched: &mut Vec<TouchedCategory>,
    categories: &mut [Category],
    id: Uuid,
    delta: f64,
) {
    if let Some(actual) = adjust_actual(categories, id, delta) {
        touched.push(TouchedCategory { id, actual });
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn category(actual: f64) -> Category {
        Category {
            id: Uuid::new_v4(),
            trip_id: None,
            name: "Food".to_string(),
            planned: 1000.0,
            actual,
            color: "#EF4444".to_string(),
            icon: "utensils".to_string(),
        }
    }

    fn posting(category: &Category, amount: f64) -> Posting {
        Posting {
            category_id: category.id,
            amount,
        }
    }

    #[test]
    fn test_insert_credits_category() {
        let mut categories = vec![category(0.0)];
        let added = posting(&categories[0], 500.0);

        let touched = rebook(&mut categories, None, Some(added));
        assert_eq!(categories[0].actual, 500.0);
        assert_eq!(
            touched,
            vec![TouchedCategory {
                id: categories[0].id,
                actual: 500.0
            }]
        );
    }

    #[test]
    fn test_amount_change_applies_delta() {
        let mut categories = vec![category(800.0)];
        let old = posting(&categories[0], 500.0);
        let new = posting(&categories[0], 700.0);

        rebook(&mut categories, Some(old), Some(new));
        assert_eq!(categories[0].actual, 1000.0);
    }

    #[test]
    fn test_unchanged_amount_touches_nothing() {
        let mut categories = vec![category(800.0)];
        let same = posting(&categories[0], 500.0);

        assert!(rebook(&mut categories, Some(same), Some(same)).is_empty());
        assert_eq!(categories[0].actual, 800.0);
    }

    #[test]
    fn test_move_between_categories() {
        let mut categories = vec![category(500.0), category(100.0)];
        let old = posting(&categories[0], 300.0);
        let new = posting(&categories[1], 350.0);

        let touched = rebook(&mut categories, Some(old), Some(new));
        assert_eq!(categories[0].actual, 200.0);
        assert_eq!(categories[1].actual, 450.0);
        assert_eq!(touched.len(), 2);
    }

    #[test]
    fn test_delete_debits_category() {
        let mut categories = vec![category(1000.0)];
        let old = posting(&categories[0], 700.0);

        rebook(&mut categories, Some(old), None);
        assert_eq!(categories[0].actual, 300.0);
    }

    #[test]
    fn test_overdrawn_total_is_not_clamped() {
        let mut categories = vec![category(100.0)];
        let old = posting(&categories[0], 250.0);

        let touched = rebook(&mut categories, Some(old), None);
        assert_eq!(categories[0].actual, -150.0);
        assert_eq!(touched[0].actual, -150.0);
    }

    #[test]
    fn test_missing_category_is_skipped() {
        let mut categories = vec![category(10.0)];
        let orphan = Posting {
            category_id: Uuid::new_v4(),
            amount: 5.0,
        };

        assert!(rebook(&mut categories, Some(orphan), None).is_empty());
        assert_eq!(categories[0].actual, 10.0);
    }
}
