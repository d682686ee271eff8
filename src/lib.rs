//! Shared-expense tracking for a small group, seen from one designated user.
//!
//! [`balance::compute_balances`] and [`settlement::simplify`] are pure
//! functions over participants and expenses; [`store::RecordStore`] keeps
//! those records in a key-value backend, and [`api`] serves them over HTTP.
pub mod api;
pub mod balance;
pub mod error;
pub mod format;
pub mod parser;
pub mod schemas;
pub mod settings;
pub mod settlement;
pub mod store;

pub use balance::{compute_balances, BalanceMapping};
pub use error::{ResultSplit, SplitError};
pub use schemas::{
    Category, ExpenseDraft, ExpenseRecord, Participant, ParticipantId, Settlement,
    CURRENT_USER_ID,
};
pub use settlement::simplify;
pub use store::{KeyValueStore, MemoryStore, MongoStore, RecordStore};
