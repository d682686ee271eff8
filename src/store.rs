//! Participants and expenses, persisted through a key-value backend.
//!
//! The two collections live under independent keys and are written back as a
//! whole, as JSON arrays, whenever one of them changes. Balances and
//! settlements are never stored: [`RecordStore::balances`] and
//! [`RecordStore::settlements`] recompute them on every call.
use std::collections::HashMap;

use async_trait::async_trait;
use bson::doc;
use chrono::Utc;
use mongodb::{options::ReplaceOptions, Client, Collection};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    balance::{compute_balances, BalanceMapping},
    error::{ResultSplit, SplitError},
    schemas::{Category, ExpenseDraft, ExpenseRecord, Participant, Settlement, CURRENT_USER_ID},
    settlement::simplify,
};

pub const PARTICIPANTS_KEY: &str = "rupeeSplit_friends";
pub const EXPENSES_KEY: &str = "rupeeSplit_expenses";

/// A string-to-string store the collections are serialized into.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> ResultSplit<Option<String>>;
    async fn set(&self, key: &str, value: String) -> ResultSplit<()>;
}

/// Process-local backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> ResultSplit<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> ResultSplit<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> ResultSplit<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> ResultSplit<()> {
        (**self).set(key, value).await
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
struct KeyValueDocument {
    key: String,
    value: String,
}

/// Backend keeping one `{ key, value }` document per key in MongoDB.
#[derive(Clone, Debug)]
pub struct MongoStore {
    collection: Collection<KeyValueDocument>,
}

impl MongoStore {
    pub const COLLECTION: &'static str = "KeyValues";

    pub fn new(client: &Client, database: &str) -> Self {
        Self {
            collection: client.database(database).collection(Self::COLLECTION),
        }
    }

    pub async fn connect(uri: &str, database: &str) -> ResultSplit<Self> {
        let client = Client::with_uri_str(uri).await?;
        tracing::info!("Connected to MongoDB, using database {database}");
        Ok(Self::new(&client, database))
    }
}

#[async_trait]
impl KeyValueStore for MongoStore {
    async fn get(&self, key: &str) -> ResultSplit<Option<String>> {
        let document = self.collection.find_one(doc! { "key": key }, None).await?;
        Ok(document.map(|document| document.value))
    }

    async fn set(&self, key: &str, value: String) -> ResultSplit<()> {
        let document = KeyValueDocument {
            key: key.to_string(),
            value,
        };
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(doc! { "key": key }, document, options)
            .await?;
        Ok(())
    }
}

/// Roster used the first time the store is opened on an empty backend.
pub fn default_participants() -> Vec<Participant> {
    vec![
        Participant {
            id: CURRENT_USER_ID.to_string(),
            name: "You".to_string(),
            avatar: "https://picsum.photos/seed/me/100/100".to_string(),
        },
        Participant {
            id: "f-1".to_string(),
            name: "Rahul Sharma".to_string(),
            avatar: "https://picsum.photos/seed/rahul/100/100".to_string(),
        },
        Participant {
            id: "f-2".to_string(),
            name: "Priya Singh".to_string(),
            avatar: "https://picsum.photos/seed/priya/100/100".to_string(),
        },
        Participant {
            id: "f-3".to_string(),
            name: "Aniket Gupta".to_string(),
            avatar: "https://picsum.photos/seed/aniket/100/100".to_string(),
        },
    ]
}

pub fn default_expenses() -> Vec<ExpenseRecord> {
    vec![ExpenseRecord {
        id: "e-1".to_string(),
        description: "Dinner at Social".to_string(),
        amount: 2400.0,
        paid_by: CURRENT_USER_ID.to_string(),
        split_with: vec![
            CURRENT_USER_ID.to_string(),
            "f-1".to_string(),
            "f-2".to_string(),
        ],
        date: Utc::now(),
        category: Category::Food,
    }]
}

pub struct RecordStore<B> {
    backend: B,
    participants: Vec<Participant>,
    expenses: Vec<ExpenseRecord>,
}

impl<B: KeyValueStore> RecordStore<B> {
    /// Loads both collections, seeding the defaults for any missing key.
    pub async fn open(backend: B) -> ResultSplit<Self> {
        let participants = match load(&backend, PARTICIPANTS_KEY).await? {
            Some(participants) => participants,
            None => {
                tracing::info!("No participants stored, seeding the default roster");
                default_participants()
            }
        };
        let expenses = match load(&backend, EXPENSES_KEY).await? {
            Some(expenses) => expenses,
            None => {
                tracing::info!("No expenses stored, seeding the default expenses");
                default_expenses()
            }
        };

        let store = Self {
            backend,
            participants,
            expenses,
        };
        store.persist_participants().await?;
        store.persist_expenses().await?;
        Ok(store)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Newest first.
    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn balances(&self) -> BalanceMapping {
        compute_balances(&self.participants, &self.expenses, CURRENT_USER_ID)
    }

    pub fn settlements(&self) -> Vec<Settlement> {
        simplify(&self.balances(), CURRENT_USER_ID)
    }

    pub async fn add_participant(&mut self, name: &str) -> ResultSplit<Participant> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SplitError::InvalidParticipant("name is empty".to_string()));
        }

        let participant = Participant::new(format!("f-{}", Uuid::new_v4()), name);
        self.participants.push(participant.clone());
        if let Err(err) = self.persist_participants().await {
            self.participants.pop();
            return Err(err);
        }

        tracing::info!(id = %participant.id, "participant added");
        Ok(participant)
    }

    /// Removes the participant unconditionally; gating on a pending balance
    /// is up to the caller.
    pub async fn remove_participant(&mut self, id: &str) -> ResultSplit<Participant> {
        if id == CURRENT_USER_ID {
            return Err(SplitError::InvalidParticipant(
                "the current user cannot be removed".to_string(),
            ));
        }
        let index = self
            .participants
            .iter()
            .position(|participant| participant.id == id)
            .ok_or_else(|| SplitError::NotFound(id.to_string()))?;

        let removed = self.participants.remove(index);
        if let Err(err) = self.persist_participants().await {
            self.participants.insert(index, removed);
            return Err(err);
        }

        tracing::info!(id, "participant removed");
        Ok(removed)
    }

    pub async fn add_expense(&mut self, draft: ExpenseDraft) -> ResultSplit<ExpenseRecord> {
        let expense = ExpenseRecord::new(format!("e-{}", Uuid::new_v4()), draft, Utc::now())?;

        self.expenses.insert(0, expense.clone());
        if let Err(err) = self.persist_expenses().await {
            self.expenses.remove(0);
            return Err(err);
        }

        tracing::info!(id = %expense.id, amount = expense.amount, "expense added");
        Ok(expense)
    }

    pub async fn remove_expense(&mut self, id: &str) -> ResultSplit<ExpenseRecord> {
        let index = self
            .expenses
            .iter()
            .position(|expense| expense.id == id)
            .ok_or_else(|| SplitError::NotFound(id.to_string()))?;

        let removed = self.expenses.remove(index);
        if let Err(err) = self.persist_expenses().await {
            self.expenses.insert(index, removed);
            return Err(err);
        }

        tracing::info!(id, "expense removed");
        Ok(removed)
    }

    async fn persist_participants(&self) -> ResultSplit<()> {
        save(&self.backend, PARTICIPANTS_KEY, &self.participants).await
    }

    async fn persist_expenses(&self) -> ResultSplit<()> {
        save(&self.backend, EXPENSES_KEY, &self.expenses).await
    }
}

async fn load<T: DeserializeOwned>(
    backend: &impl KeyValueStore,
    key: &str,
) -> ResultSplit<Option<Vec<T>>> {
    match backend.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

async fn save<T: Serialize>(backend: &impl KeyValueStore, key: &str, records: &[T]) -> ResultSplit<()> {
    let raw = serde_json::to_string(records)?;
    backend.set(key, raw).await
}
