use indexmap::IndexMap;
use serde::Serialize;

use crate::schemas::{Category, ExpenseRecord, Participant, ParticipantId};

/// Net amount per participant, relative to the designated user.
///
/// Positive: the designated user owes that participant.
/// Negative: that participant owes the designated user.
/// Keys follow the current roster order.
pub type BalanceMapping = IndexMap<ParticipantId, f64>;

/// Balances at or below this magnitude count as settled when gating removals.
pub const BALANCE_EPSILON: f64 = 0.1;

/// The designated user fronted `share` for the participant: they owe more.
fn lent(share: f64) -> f64 {
    -share
}

/// The participant fronted `share` for the designated user.
fn borrowed(share: f64) -> f64 {
    share
}

pub fn compute_balances(
    participants: &[Participant],
    expenses: &[ExpenseRecord],
    current_user_id: &str,
) -> BalanceMapping {
    // The key set is the current roster, whatever the history references
    let mut contributions: IndexMap<&str, Vec<f64>> = participants
        .iter()
        .filter(|participant| participant.id != current_user_id)
        .map(|participant| (participant.id.as_str(), Vec::new()))
        .collect();

    for expense in expenses {
        let share = expense.share();
        if expense.paid_by == current_user_id {
            for receiver in &expense.split_with {
                if receiver == current_user_id {
                    continue;
                }
                if let Some(entries) = contributions.get_mut(receiver.as_str()) {
                    entries.push(lent(share));
                }
            }
        } else if expense.split_with.iter().any(|id| id == current_user_id) {
            if let Some(entries) = contributions.get_mut(expense.paid_by.as_str()) {
                entries.push(borrowed(share));
            }
        }
    }

    // Summing in a canonical order keeps the result bit-identical for any
    // permutation of `expenses`.
    let balances: BalanceMapping = contributions
        .into_iter()
        .map(|(id, mut entries)| {
            entries.sort_by(f64::total_cmp);
            (id.to_string(), entries.into_iter().fold(0.0, |sum, entry| sum + entry))
        })
        .collect();

    tracing::debug!(
        participants = balances.len(),
        expenses = expenses.len(),
        "balances recomputed"
    );
    balances
}

/// Whether removing `id` would drop a balance worth confirming first.
pub fn has_pending_balance(balances: &BalanceMapping, id: &str) -> bool {
    balances
        .get(id)
        .is_some_and(|balance| balance.abs() > BALANCE_EPSILON)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// What the designated user owes everybody else.
    pub total_owe: f64,
    /// What everybody else owes the designated user.
    pub total_owed: f64,
}

pub fn compute_totals(balances: &BalanceMapping) -> Totals {
    balances
        .values()
        .fold(Totals::default(), |mut totals, &balance| {
            if balance > 0.0 {
                totals.total_owe += balance;
            } else if balance < 0.0 {
                totals.total_owed -= balance;
            }
            totals
        })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
}

/// Spending per category, in the order categories first appear.
pub fn category_breakdown(expenses: &[ExpenseRecord]) -> Vec<CategoryTotal> {
    let mut totals: IndexMap<Category, f64> = IndexMap::new();
    for expense in expenses {
        *totals.entry(expense.category).or_insert(0.0) += expense.amount;
    }
    totals
        .into_iter()
        .map(|(category, amount)| CategoryTotal { category, amount })
        .collect()
}
