//! Errors the record store and the HTTP layer can return.
//!
//! The balance calculator and the debt simplifier never fail: stale
//! identifiers are ignored and malformed expenses are refused long before
//! they reach them, by [`ExpenseRecord::new`].
//!
//! [`ExpenseRecord::new`]: crate::schemas::ExpenseRecord::new
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

pub type ResultSplit<T> = Result<T, SplitError>;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Invalid expense: {0}")]
    InvalidExpense(String),
    #[error("Invalid participant: {0}")]
    InvalidParticipant(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] mongodb::error::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl PartialEq for SplitError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidExpense(a), Self::InvalidExpense(b)) => a == b,
            (Self::InvalidParticipant(a), Self::InvalidParticipant(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            (Self::Serialization(a), Self::Serialization(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl ResponseError for SplitError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidExpense(_) | Self::InvalidParticipant(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
