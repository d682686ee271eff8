use crate::balance::BalanceMapping;
use crate::schemas::Settlement;

/// Turns every open balance into one transfer with the designated user.
///
/// Balances are only tracked against the designated user, so there are no
/// peer-to-peer debts to net out: each non-zero entry settles on its own.
/// Transfers keep the order of the mapping.
pub fn simplify(balances: &BalanceMapping, current_user_id: &str) -> Vec<Settlement> {
    let mut settlements = Vec::new();

    for (participant, &balance) in balances {
        let mut from = current_user_id.to_string();
        let mut to = participant.clone();
        // A negative balance means the participant owes, so the direction flips
        if balance < 0.0 {
            std::mem::swap(&mut from, &mut to);
        } else if balance == 0.0 || balance.is_nan() {
            continue;
        }

        settlements.push(Settlement {
            from,
            to,
            amount: balance.abs(),
        });
    }

    settlements
}
