//! Text rendering of the trip dashboard.
//!
//! Everything here formats data computed elsewhere (`metrics`, `TripState`); no
//! function in this module changes state.

use super::{
    metrics::{QuickStats, TripProgress, category_summaries},
    model::Category,
    state::TripState,
};
use crate::config::preferences::{SortColumn, SortDirection, UiPreferences};
use chrono::NaiveDate;
use std::{
    cmp::Ordering,
    fmt::{self, Write},
};

/// Formats an amount with its currency code, like `INR 1,250.00`.
#[must_use]
pub fn format_amount(amount: f64, currency: &str) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}{currency} {grouped}.{cents}")
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // clamped_progress is in [0, 100] and length is small, so the cast cannot overflow
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.0}%")
}

/// Orders categories for the budget table. No sort column keeps insertion order.
#[must_use]
pub fn sort_categories<'a>(
    categories: &'a [Category],
    preferences: &UiPreferences,
) -> Vec<&'a Category> {
    let mut sorted: Vec<&Category> = categories.iter().collect();
    let Some(column) = preferences.sort_column else {
        return sorted;
    };

    sorted.sort_by(|a, b| {
        let ordering = compare_by(column, a, b);
        match preferences.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

fn compare_by(column: SortColumn, a: &Category, b: &Category) -> Ordering {
    match column {
        SortColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortColumn::Planned => a.planned.total_cmp(&b.planned),
        SortColumn::Actual => a.actual.total_cmp(&b.actual),
        SortColumn::Diff => (a.planned - a.actual).total_cmp(&(b.planned - b.actual)),
    }
}

/// Renders the full dashboard as plain text.
#[must_use]
pub fn render_dashboard(state: &TripState, preferences: &UiPreferences, today: NaiveDate) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_dashboard(&mut out, state, preferences, today);
    out
}

#[allow(clippy::too_many_lines)]
fn write_dashboard(
    out: &mut String,
    state: &TripState,
    preferences: &UiPreferences,
    today: NaiveDate,
) -> fmt::Result {
    let trip = state.trip();
    let currency = trip.currency.as_str();
    let money = |amount: f64| format_amount(amount, currency);
    let totals = state.totals();
    let progress = TripProgress::compute(trip.start_date, trip.end_date, today);
    let stats = QuickStats::compute(state.members(), state.categories(), state.expenses());

    writeln!(out, "== {} ==", trip.name)?;
    writeln!(
        out,
        "{} to {} ({} days){}",
        trip.start_date,
        trip.end_date,
        progress.total_days,
        if state.is_synced() { "" } else { "  [offline]" }
    )?;
    if progress.has_started {
        writeln!(
            out,
            "Trip progress {} with {} days left",
            format_progress_bar(progress.progress_percent, None),
            progress.days_remaining
        )?;
    } else {
        writeln!(out, "Starts in {} days", progress.days_to_start)?;
    }

    writeln!(out)?;
    writeln!(out, "Master budget:    {}", money(totals.member_planned))?;
    writeln!(out, "Category budget:  {}", money(totals.category_planned))?;
    writeln!(out, "Spent:            {}", money(totals.actual))?;
    writeln!(out, "Collected:        {}", money(totals.given))?;
    writeln!(out, "Cash on hand:     {}", money(totals.cash_balance))?;
    writeln!(out, "Budget remaining: {}", money(totals.budget_remaining))?;
    writeln!(
        out,
        "Spent {} {}",
        format_progress_bar(totals.spent_percent, None),
        totals.health().label()
    )?;

    writeln!(out)?;
    writeln!(out, "-- Categories --")?;
    for category in sort_categories(state.categories(), preferences) {
        writeln!(
            out,
            "{:<28} planned {:>16}  actual {:>16}  diff {:>16}",
            category.name,
            money(category.planned),
            money(category.actual),
            money(category.planned - category.actual)
        )?;
    }
    let orphans = state.orphaned_expenses();
    if !orphans.is_empty() {
        let orphaned: f64 = orphans.iter().map(|e| e.amount).sum();
        writeln!(
            out,
            "{} expenses ({}) point at deleted categories",
            orphans.len(),
            money(orphaned)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "-- Members --")?;
    for member in state.members() {
        writeln!(
            out,
            "{:<16} planned {:>14}  given {:>14}",
            member.name,
            money(member.planned),
            money(member.given)
        )?;
    }

    let balances = state.member_balances();
    if !balances.is_empty() {
        writeln!(out)?;
        writeln!(out, "-- Balances --")?;
        for balance in &balances {
            writeln!(out, "{:<16} {:>14}", balance.name, money(balance.balance))?;
        }
        let settlements = state.settlements();
        if settlements.is_empty() {
            writeln!(out, "All settled up")?;
        }
        for s in settlements {
            writeln!(out, "{} pays {} {}", s.from, s.to, money(s.amount))?;
        }
    }

    writeln!(out)?;
    writeln!(out, "-- Quick stats --")?;
    match &stats.top_category {
        Some((name, amount)) => {
            writeln!(out, "Top category: {name} ({})", money(*amount))?;
        }
        None => {
            writeln!(out, "Top category: N/A")?;
        }
    }
    match &stats.top_spender {
        Some((name, amount)) => {
            writeln!(out, "Top spender:  {name} ({})", money(*amount))?;
        }
        None => {
            writeln!(out, "Top spender:  N/A")?;
        }
    }
    writeln!(out, "Per person:   {}", money(stats.average_per_member))?;
    let charted = category_summaries(state.categories()).len();
    writeln!(out, "Categories with activity: {charted}")?;

    let recent: Vec<_> = state.expenses().iter().take(5).collect();
    if !recent.is_empty() {
        writeln!(out)?;
        writeln!(out, "-- Recent expenses --")?;
        for expense in recent {
            let category = state
                .category(expense.category_id)
                .map_or("(deleted)", |c| c.name.as_str());
            writeln!(
                out,
                "{} | {} | {} | paid by {}",
                money(expense.amount),
                expense.title,
                category,
                expense.paid_by
            )?;
        }
    }

    let itinerary = state.itinerary();
    if !itinerary.is_empty() {
        writeln!(out)?;
        writeln!(out, "-- Itinerary --")?;
        for event in itinerary {
            let time = event
                .time
                .map_or_else(String::new, |t| format!(" {}", t.format("%H:%M")));
            writeln!(out, "{}{time} {} @ {}", event.date, event.title, event.location)?;
        }
    }

    Ok(())
}
