use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ResultSplit, SplitError};

pub type ParticipantId = String;

/// Identifier of the participant every balance is expressed against.
pub const CURRENT_USER_ID: &str = "user-0";

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub avatar: String,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            avatar: avatar_url(&name),
            name,
        }
    }
}

const AVATAR_HOST: &str = "https://picsum.photos";

/// Placeholder avatar seeded by the participant's name.
pub fn avatar_url(seed: &str) -> String {
    let Ok(mut url) = Url::parse(AVATAR_HOST) else {
        return format!("{AVATAR_HOST}/100/100");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().extend(["seed", seed, "100", "100"]);
    }
    url.into()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Category {
    #[default]
    Food,
    Travel,
    Rent,
    Entertainment,
    Shopping,
    Others,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Travel,
        Category::Rent,
        Category::Entertainment,
        Category::Shopping,
        Category::Others,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Travel => "Travel",
            Category::Rent => "Rent",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Others => "Others",
        }
    }

    /// Exact, case-sensitive lookup by the serialized name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == name)
    }
}

/// The caller-supplied part of a new expense.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: f64,
    pub paid_by: ParticipantId,
    pub split_with: Vec<ParticipantId>,
    #[serde(default)]
    pub category: Category,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", try_from = "StoredExpense")]
pub struct ExpenseRecord {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub paid_by: ParticipantId,
    pub split_with: Vec<ParticipantId>,
    pub date: DateTime<Utc>,
    pub category: Category,
}

impl ExpenseRecord {
    /// Builds a record, refusing drafts the balance calculator must never see.
    pub fn new(id: impl Into<String>, draft: ExpenseDraft, date: DateTime<Utc>) -> ResultSplit<Self> {
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(SplitError::InvalidExpense(
                "description is empty".to_string(),
            ));
        }
        if !draft.amount.is_finite() || draft.amount < 0.0 {
            return Err(SplitError::InvalidExpense(format!(
                "amount {} is not a non-negative number",
                draft.amount
            )));
        }
        if draft.split_with.is_empty() {
            return Err(SplitError::InvalidExpense(
                "nobody to split the expense with".to_string(),
            ));
        }

        // Selecting the same participant twice must not skew the share.
        let mut split_with: Vec<ParticipantId> = Vec::with_capacity(draft.split_with.len());
        for id in draft.split_with {
            if !split_with.contains(&id) {
                split_with.push(id);
            }
        }

        Ok(Self {
            id: id.into(),
            description: description.to_string(),
            amount: draft.amount,
            paid_by: draft.paid_by,
            split_with,
            date,
            category: draft.category,
        })
    }

    /// What each member of the split set owes for this expense.
    pub fn share(&self) -> f64 {
        self.amount / self.split_with.len() as f64
    }
}

/// Wire shape of a persisted expense, checked again on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredExpense {
    id: String,
    description: String,
    amount: f64,
    paid_by: ParticipantId,
    split_with: Vec<ParticipantId>,
    date: DateTime<Utc>,
    category: Category,
}

impl TryFrom<StoredExpense> for ExpenseRecord {
    type Error = SplitError;

    fn try_from(stored: StoredExpense) -> ResultSplit<Self> {
        let draft = ExpenseDraft {
            description: stored.description,
            amount: stored.amount,
            paid_by: stored.paid_by,
            split_with: stored.split_with,
            category: stored.category,
        };
        ExpenseRecord::new(stored.id, draft, stored.date)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Settlement {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(amount: f64, split_with: &[&str]) -> ExpenseDraft {
        ExpenseDraft {
            description: "Dinner".to_string(),
            amount,
            paid_by: CURRENT_USER_ID.to_string(),
            split_with: split_with.iter().map(|id| id.to_string()).collect(),
            category: Category::Food,
        }
    }

    #[test]
    fn rejects_empty_split_set() {
        let err = ExpenseRecord::new("e-1", draft(100.0, &[]), Utc::now()).unwrap_err();
        assert!(matches!(err, SplitError::InvalidExpense(_)));
    }

    #[test]
    fn rejects_negative_and_nan_amounts() {
        assert!(ExpenseRecord::new("e-1", draft(-1.0, &["f-1"]), Utc::now()).is_err());
        assert!(ExpenseRecord::new("e-1", draft(f64::NAN, &["f-1"]), Utc::now()).is_err());
    }

    #[test]
    fn rejects_blank_description() {
        let mut blank = draft(10.0, &["f-1"]);
        blank.description = "   ".to_string();
        assert!(ExpenseRecord::new("e-1", blank, Utc::now()).is_err());
    }

    #[test]
    fn accepts_zero_amount() {
        let record = ExpenseRecord::new("e-1", draft(0.0, &["f-1"]), Utc::now()).unwrap();
        assert_eq!(record.share(), 0.0);
    }

    #[test]
    fn duplicate_split_members_count_once() {
        let record =
            ExpenseRecord::new("e-1", draft(90.0, &["user-0", "f-1", "f-1"]), Utc::now()).unwrap();
        assert_eq!(record.split_with, vec!["user-0", "f-1"]);
        assert_eq!(record.share(), 45.0);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let record = ExpenseRecord::new("e-1", draft(10.0, &["f-1"]), Utc::now()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["paidBy"], "user-0");
        assert_eq!(json["splitWith"][0], "f-1");
        assert_eq!(json["category"], "Food");
    }

    #[test]
    fn category_lookup_is_exact() {
        assert_eq!(Category::from_name("Travel"), Some(Category::Travel));
        assert_eq!(Category::from_name("travel"), None);
        assert_eq!(Category::from_name("Groceries"), None);
    }

    #[test]
    fn avatar_url_encodes_name() {
        assert_eq!(
            avatar_url("Rahul Sharma"),
            "https://picsum.photos/seed/Rahul%20Sharma/100/100"
        );
        assert_eq!(
            avatar_url("AC/DC #1"),
            "https://picsum.photos/seed/AC%2FDC%20%231/100/100"
        );
    }

    #[test]
    fn stored_records_are_validated() {
        let record: ExpenseRecord = serde_json::from_value(serde_json::json!({
            "id": "e-1",
            "description": "Dinner",
            "amount": 90.0,
            "paidBy": "user-0",
            "splitWith": ["user-0", "f-1", "f-1"],
            "date": "2024-01-01T12:00:00Z",
            "category": "Food"
        }))
        .unwrap();
        assert_eq!(record.split_with, vec!["user-0", "f-1"]);
        assert_eq!(record.share(), 45.0);

        let negative = serde_json::json!({
            "id": "e-2",
            "description": "Refund",
            "amount": -10.0,
            "paidBy": "user-0",
            "splitWith": ["f-1"],
            "date": "2024-01-01T12:00:00Z",
            "category": "Food"
        });
        assert!(serde_json::from_value::<ExpenseRecord>(negative).is_err());
    }
}
