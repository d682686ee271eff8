//! Free-text expense parsing through an external AI service.
//!
//! Whatever comes back from the service is untrusted: it is validated field by
//! field in [`ParsedExpense::from_response`] before any of it reaches the data
//! model, and every failure collapses into "no result".
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::schemas::{Category, Participant, ParticipantId};

/// Category used when the service answers with something outside the enumeration.
pub const FALLBACK_CATEGORY: Category = Category::Others;

/// A validated best-effort guess at an expense.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedExpense {
    pub description: String,
    pub amount: f64,
    pub category: Category,
    pub mentioned_names: Vec<String>,
}

impl ParsedExpense {
    /// Validates a raw response object. `None` if a required field is missing
    /// or has the wrong shape.
    pub fn from_response(value: &Value) -> Option<Self> {
        let description = value.get("description")?.as_str()?.trim();
        if description.is_empty() {
            return None;
        }

        let amount = value.get("amount")?.as_f64()?;
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }

        let category = value
            .get("category")
            .and_then(Value::as_str)
            .and_then(Category::from_name)
            .unwrap_or(FALLBACK_CATEGORY);

        let mentioned_names = value
            .get("mentionedNames")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            description: description.to_string(),
            amount,
            category,
            mentioned_names,
        })
    }
}

/// Pre-selects split participants from the names the service picked up.
///
/// A participant matches when any fragment is a case-insensitive substring of
/// their name. On a match the current user is always included first; with no
/// match the result is empty and the caller keeps its own selection.
pub fn match_participants(
    names: &[String],
    participants: &[Participant],
    current_user_id: &str,
) -> Vec<ParticipantId> {
    let fragments: Vec<String> = names
        .iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let matched: Vec<&Participant> = participants
        .iter()
        .filter(|participant| {
            let name = participant.name.to_lowercase();
            fragments.iter().any(|fragment| name.contains(fragment))
        })
        .collect();
    if matched.is_empty() {
        return Vec::new();
    }

    let mut selected = vec![current_user_id.to_string()];
    for participant in matched {
        if !selected.contains(&participant.id) {
            selected.push(participant.id.clone());
        }
    }
    selected
}

#[async_trait]
pub trait ExpenseParser: Send + Sync {
    /// Best-effort parse of `input`; `None` when nothing usable came back.
    async fn parse(&self, input: &str) -> Option<ParsedExpense>;
}

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// [`ExpenseParser`] backed by the Gemini `generateContent` endpoint.
#[derive(Clone, Debug)]
pub struct GeminiParser {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiParser {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body(input: &str) -> Value {
        let categories: Vec<&str> = Category::ALL.iter().map(|category| category.as_str()).collect();
        let prompt = format!(
            "Parse the following expense description into a JSON object: \"{input}\". \
             Available categories: {}. If the user specifies names, identify them.",
            categories.join(", ")
        );

        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "description": { "type": "STRING" },
                        "amount": { "type": "NUMBER" },
                        "category": { "type": "STRING" },
                        "mentionedNames": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["description", "amount", "category"]
                }
            }
        })
    }

    async fn generate(&self, input: &str) -> Result<Option<Value>, reqwest::Error> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response: Value = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(input))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(text) = response
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
        else {
            return Ok(None);
        };

        match serde_json::from_str(text.trim()) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!("AI response is not valid JSON: {err}");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ExpenseParser for GeminiParser {
    async fn parse(&self, input: &str) -> Option<ParsedExpense> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let value = match self.generate(input).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                tracing::warn!("AI parsing returned no text");
                return None;
            }
            Err(err) => {
                tracing::warn!("AI parsing failed: {err}");
                return None;
            }
        };

        let parsed = ParsedExpense::from_response(&value);
        if parsed.is_none() {
            tracing::warn!("AI response rejected: {value}");
        }
        parsed
    }
}
