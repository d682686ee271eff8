use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rupeesplit::{
    compute_balances, simplify, Category, ExpenseDraft, ExpenseRecord, Participant, Settlement,
    CURRENT_USER_ID,
};

fn roster(friends: usize) -> Vec<Participant> {
    let mut participants = vec![Participant::new(CURRENT_USER_ID, "You")];
    for idx in 1..=friends {
        participants.push(Participant::new(format!("f-{idx}"), format!("Friend {idx}")));
    }
    participants
}

fn member_id(idx: usize) -> String {
    if idx == 0 {
        CURRENT_USER_ID.to_string()
    } else {
        format!("f-{idx}")
    }
}

fn build_expenses(
    member_count: usize,
    amounts: &[u32],
    payer_indexes: &[usize],
    split_masks: &[u8],
) -> Vec<ExpenseRecord> {
    let date = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    amounts
        .iter()
        .enumerate()
        .map(|(idx, amount)| {
            let payer = payer_indexes.get(idx).copied().unwrap_or(0) % member_count;
            let mask = split_masks.get(idx).copied().unwrap_or(1) as usize;
            let mut split_with: Vec<String> = (0..member_count)
                .filter(|member| mask & (1 << member) != 0)
                .map(member_id)
                .collect();
            if split_with.is_empty() {
                split_with.push(member_id(payer));
            }

            ExpenseRecord::new(
                format!("e-{idx}"),
                ExpenseDraft {
                    description: format!("expense {idx}"),
                    // Cents, so shares are rarely exact.
                    amount: f64::from(*amount) / 100.0,
                    paid_by: member_id(payer),
                    split_with,
                    category: Category::Others,
                },
                date,
            )
            .unwrap()
        })
        .collect()
}

fn expenses_strategy() -> impl Strategy<Value = (usize, Vec<ExpenseRecord>)> {
    (
        1usize..=5,
        prop::collection::vec(0u32..=1_000_000, 0..=25),
        prop::collection::vec(0usize..=5, 25),
        prop::collection::vec(any::<u8>(), 25),
    )
        .prop_map(|(friends, amounts, payers, masks)| {
            let expenses = build_expenses(friends + 1, &amounts, &payers, &masks);
            (friends, expenses)
        })
}

proptest! {
    #[test]
    fn order_does_not_matter(
        (friends, expenses, shuffled) in expenses_strategy().prop_flat_map(|(friends, expenses)| {
            (Just(friends), Just(expenses.clone()), Just(expenses).prop_shuffle())
        })
    ) {
        let participants = roster(friends);
        let in_order = compute_balances(&participants, &expenses, CURRENT_USER_ID);
        let permuted = compute_balances(&participants, &shuffled, CURRENT_USER_ID);
        prop_assert_eq!(in_order, permuted);
    }
}

proptest! {
    #[test]
    fn one_settlement_per_open_balance((friends, expenses) in expenses_strategy()) {
        let balances = compute_balances(&roster(friends), &expenses, CURRENT_USER_ID);
        let settlements = simplify(&balances, CURRENT_USER_ID);

        let open = balances.values().filter(|balance| **balance != 0.0).count();
        prop_assert_eq!(settlements.len(), open);

        for settlement in settlements {
            prop_assert!(settlement.amount > 0.0);
            if settlement.from == CURRENT_USER_ID {
                prop_assert_eq!(balances[settlement.to.as_str()], settlement.amount);
            } else {
                prop_assert_eq!(settlement.to.as_str(), CURRENT_USER_ID);
                prop_assert_eq!(balances[settlement.from.as_str()], -settlement.amount);
            }
        }
    }
}

proptest! {
    #[test]
    fn removed_friends_never_reappear(
        (friends, expenses) in expenses_strategy(),
        removed in 1usize..=5,
    ) {
        let mut participants = roster(friends);
        let removed_id = member_id(removed);
        participants.retain(|participant| participant.id != removed_id);

        let balances = compute_balances(&participants, &expenses, CURRENT_USER_ID);
        prop_assert!(!balances.contains_key(removed_id.as_str()));
        prop_assert_eq!(balances.len(), participants.len() - 1);
    }
}

proptest! {
    #[test]
    fn two_party_split_is_half(amount in 0u32..=10_000_000) {
        let amount = f64::from(amount) / 100.0;
        let participants = roster(1);

        let mut user_paid = build_expenses(2, &[0], &[0], &[0b11]);
        user_paid[0].amount = amount;
        let balances = compute_balances(&participants, &user_paid, CURRENT_USER_ID);
        prop_assert_eq!(balances["f-1"], -amount / 2.0);

        let mut friend_paid = user_paid.clone();
        friend_paid[0].paid_by = "f-1".to_string();
        let balances = compute_balances(&participants, &friend_paid, CURRENT_USER_ID);
        prop_assert_eq!(balances["f-1"], amount / 2.0);
    }
}

#[test]
fn dinner_for_three() {
    let participants = vec![
        Participant::new(CURRENT_USER_ID, "You"),
        Participant::new("f-1", "Rahul"),
        Participant::new("f-2", "Priya"),
    ];
    let expenses = vec![ExpenseRecord::new(
        "e-1",
        ExpenseDraft {
            description: "Dinner at Social".to_string(),
            amount: 2400.0,
            paid_by: CURRENT_USER_ID.to_string(),
            split_with: vec![CURRENT_USER_ID.to_string(), "f-1".to_string(), "f-2".to_string()],
            category: Category::Food,
        },
        Utc::now(),
    )
    .unwrap()];

    let balances = compute_balances(&participants, &expenses, CURRENT_USER_ID);
    assert_eq!(balances["f-1"], -800.0);
    assert_eq!(balances["f-2"], -800.0);

    assert_eq!(
        simplify(&balances, CURRENT_USER_ID),
        vec![
            Settlement {
                from: "f-1".to_string(),
                to: CURRENT_USER_ID.to_string(),
                amount: 800.0,
            },
            Settlement {
                from: "f-2".to_string(),
                to: CURRENT_USER_ID.to_string(),
                amount: 800.0,
            },
        ]
    );
}

#[test]
fn friend_fronts_a_cab() {
    let participants = vec![
        Participant::new(CURRENT_USER_ID, "You"),
        Participant::new("f-1", "Rahul"),
        Participant::new("f-2", "Priya"),
    ];
    let expenses = vec![ExpenseRecord::new(
        "e-1",
        ExpenseDraft {
            description: "Cab".to_string(),
            amount: 300.0,
            paid_by: "f-1".to_string(),
            split_with: vec![CURRENT_USER_ID.to_string(), "f-1".to_string()],
            category: Category::Travel,
        },
        Utc::now(),
    )
    .unwrap()];

    let balances = compute_balances(&participants, &expenses, CURRENT_USER_ID);
    assert_eq!(balances["f-1"], 150.0);
    assert_eq!(balances["f-2"], 0.0);
}
