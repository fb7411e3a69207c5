//! Derived metrics over the current snapshot.
//!
//! Everything here is a pure function of members, categories and expenses, cheap
//! enough to recompute on every render.

use super::model::{Category, Expense, Member};
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Balances within this distance of zero count as settled
pub const SETTLEMENT_EPSILON: f64 = 0.01;

/// Sum of category budgets
#[must_use]
pub fn total_category_planned(categories: &[Category]) -> f64 {
    categories.iter().map(|c| c.planned).sum()
}

/// Sum of planned member contributions (the master budget)
#[must_use]
pub fn total_member_planned(members: &[Member]) -> f64 {
    members.iter().map(|m| m.planned).sum()
}

/// Sum of category running totals
#[must_use]
pub fn total_actual(categories: &[Category]) -> f64 {
    categories.iter().map(|c| c.actual).sum()
}

/// Sum of what members have actually given
#[must_use]
pub fn total_given(members: &[Member]) -> f64 {
    members.iter().map(|m| m.given).sum()
}

/// Share of the master budget already spent, rounded to a whole percent.
/// Zero when there is no master budget.
#[must_use]
pub fn spent_percent(total_actual: f64, total_member_planned: f64) -> f64 {
    if total_member_planned <= 0.0 {
        return 0.0;
    }
    (total_actual / total_member_planned * 100.0).round()
}

/// Rounds to two decimal places.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// All headline totals in one place
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetTotals {
    /// Sum of category budgets
    pub category_planned: f64,
    /// Sum of planned member contributions
    pub member_planned: f64,
    /// Sum of category running totals
    pub actual: f64,
    /// Sum of given contributions
    pub given: f64,
    /// Cash on hand: given minus spent
    pub cash_balance: f64,
    /// Master budget minus spent
    pub budget_remaining: f64,
    /// Whole-percent share of the master budget spent
    pub spent_percent: f64,
}

impl BudgetTotals {
    /// Computes every total from the snapshot.
    #[must_use]
    pub fn compute(members: &[Member], categories: &[Category]) -> Self {
        let member_planned = total_member_planned(members);
        let actual = total_actual(categories);
        let given = total_given(members);
        Self {
            category_planned: total_category_planned(categories),
            member_planned,
            actual,
            given,
            cash_balance: given - actual,
            budget_remaining: member_planned - actual,
            spent_percent: spent_percent(actual, member_planned),
        }
    }

    /// Traffic-light reading of the spend rate
    #[must_use]
    pub fn health(&self) -> BudgetHealth {
        BudgetHealth::from_spent_percent(self.spent_percent)
    }
}

/// Traffic-light status of the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetHealth {
    /// Under half spent
    Healthy,
    /// Under 80% spent
    OnTrack,
    /// 80% or more spent
    OverBudgetRisk,
}

impl BudgetHealth {
    /// Classifies a spent percentage.
    #[must_use]
    pub fn from_spent_percent(percent: f64) -> Self {
        if percent < 50.0 {
            Self::Healthy
        } else if percent < 80.0 {
            Self::OnTrack
        } else {
            Self::OverBudgetRisk
        }
    }

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::OnTrack => "On Track",
            Self::OverBudgetRisk => "Over Budget Risk",
        }
    }
}

/// A member's position under the equal-split model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberBalance {
    /// Member id
    pub member_id: Uuid,
    /// Member name
    pub name: String,
    /// Given minus per-person share; positive means the group owes them
    pub balance: f64,
}

/// Equal share of the total spend, undefined for fewer than two members.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn per_person_share(total_actual: f64, member_count: usize) -> Option<f64> {
    (member_count >= 2).then(|| total_actual / member_count as f64)
}

/// Per-member balances; empty when fewer than two members.
#[must_use]
pub fn member_balances(members: &[Member], total_actual: f64) -> Vec<MemberBalance> {
    let Some(share) = per_person_share(total_actual, members.len()) else {
        return Vec::new();
    };
    members
        .iter()
        .map(|m| MemberBalance {
            member_id: m.id,
            name: m.name.clone(),
            balance: m.given - share,
        })
        .collect()
}

/// A suggested transfer between two members
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    /// Paying member id
    pub from_id: Uuid,
    /// Paying member name
    pub from: String,
    /// Receiving member id
    pub to_id: Uuid,
    /// Receiving member name
    pub to: String,
    /// Amount, rounded to cents
    pub amount: f64,
}

/// Greedy settlement: the largest debtor pays the largest creditor until one of
/// them is square, then moves on.
///
/// Not guaranteed to minimise the number of transfers; ties keep the order the
/// balances were given in.
#[must_use]
pub fn suggest_settlements(balances: &[MemberBalance]) -> Vec<Settlement> {
    let mut creditors: Vec<(&MemberBalance, f64)> = balances
        .iter()
        .filter(|b| b.balance > SETTLEMENT_EPSILON)
        .map(|b| (b, b.balance))
        .collect();
    creditors.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut debtors: Vec<(&MemberBalance, f64)> = balances
        .iter()
        .filter(|b| b.balance < -SETTLEMENT_EPSILON)
        .map(|b| (b, b.balance))
        .collect();
    debtors.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut settlements = Vec::new();
    let mut next_creditor = 0;
    for (debtor, remaining) in &mut debtors {
        while *remaining < -SETTLEMENT_EPSILON && next_creditor < creditors.len() {
            let (creditor, surplus) = &mut creditors[next_creditor];
            let amount = (-*remaining).min(*surplus);
            if amount > SETTLEMENT_EPSILON {
                settlements.push(Settlement {
                    from_id: debtor.member_id,
                    from: debtor.name.clone(),
                    to_id: creditor.member_id,
                    to: creditor.name.clone(),
                    amount: round_cents(amount),
                });
            }
            *remaining += amount;
            *surplus -= amount;
            if *surplus <= SETTLEMENT_EPSILON {
                next_creditor += 1;
            }
        }
    }
    settlements
}

/// Where today falls within the trip
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripProgress {
    /// Length of the trip in days, inclusive, at least 1
    pub total_days: i64,
    /// Days since the start (negative before it)
    pub days_elapsed: i64,
    /// Days left, never negative
    pub days_remaining: i64,
    /// Days until the start (negative once started)
    pub days_to_start: i64,
    /// Elapsed share of the trip, clamped to 0..=100
    pub progress_percent: f64,
    /// Today lies within the trip
    pub is_ongoing: bool,
    /// Today is on or after the start
    pub has_started: bool,
}

impl TripProgress {
    /// Computes progress for `today`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        let span = (end - start).num_days();
        let total_days = (span + 1).max(1);
        let days_elapsed = (today - start).num_days();
        let progress_percent = if span > 0 {
            (days_elapsed as f64 / span as f64 * 100.0).clamp(0.0, 100.0)
        } else if today >= start {
            100.0
        } else {
            0.0
        };

        Self {
            total_days,
            days_elapsed,
            days_remaining: (total_days - days_elapsed).max(0),
            days_to_start: (start - today).num_days(),
            progress_percent,
            is_ongoing: today >= start && today <= end,
            has_started: today >= start,
        }
    }
}

/// Headline facts for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickStats {
    /// Category with the highest running total, with that total
    pub top_category: Option<(String, f64)>,
    /// Member who paid the most, with the amount
    pub top_spender: Option<(String, f64)>,
    /// Total spend divided by member count
    pub average_per_member: f64,
}

impl QuickStats {
    /// Computes the stats. Spend per member is matched on `paid_by == name`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(members: &[Member], categories: &[Category], expenses: &[Expense]) -> Self {
        let top_category = categories
            .iter()
            .fold(None::<&Category>, |best, c| match best {
                Some(b) if b.actual >= c.actual => Some(b),
                _ => Some(c),
            })
            .map(|c| (c.name.clone(), c.actual));

        let top_spender = members
            .iter()
            .map(|m| {
                let spent: f64 = expenses
                    .iter()
                    .filter(|e| e.paid_by == m.name)
                    .map(|e| e.amount)
                    .sum();
                (m, spent)
            })
            .filter(|(_, spent)| *spent > 0.0)
            .fold(None::<(&Member, f64)>, |best, candidate| match best {
                Some(b) if b.1 >= candidate.1 => Some(b),
                _ => Some(candidate),
            })
            .map(|(m, spent)| (m.name.clone(), spent));

        let average_per_member = if members.is_empty() {
            0.0
        } else {
            total_actual(categories) / members.len() as f64
        };

        Self {
            top_category,
            top_spender,
            average_per_member,
        }
    }
}

/// One row of the planned-versus-actual breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    /// Category name
    pub name: String,
    /// Budgeted amount
    pub planned: f64,
    /// Running total
    pub actual: f64,
    /// Planned minus actual
    pub difference: f64,
    /// Hex colour
    pub color: String,
    /// Icon tag
    pub icon: String,
}

/// Breakdown rows for categories that have a budget or any spend.
#[must_use]
pub fn category_summaries(categories: &[Category]) -> Vec<CategorySummary> {
    categories
        .iter()
        .filter(|c| c.planned > 0.0 || c.actual > 0.0)
        .map(|c| CategorySummary {
            name: c.name.clone(),
            planned: c.planned,
            actual: c.actual,
            difference: c.planned - c.actual,
            color: c.color.clone(),
            icon: c.icon.clone(),
        })
        .collect()
}
