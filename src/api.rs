use std::sync::Arc;

use actix_web::{delete, get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    balance::{category_breakdown, compute_totals, has_pending_balance, CategoryTotal, Totals},
    error::SplitError,
    format::format_currency,
    parser::{match_participants, ExpenseParser, ParsedExpense},
    schemas::{ExpenseDraft, ExpenseRecord, ParticipantId, CURRENT_USER_ID},
    store::{KeyValueStore, RecordStore},
};

/// Number of expenses shown in the summary's recent activity.
const RECENT_EXPENSES: usize = 5;

pub type SharedBackend = Arc<dyn KeyValueStore>;

pub struct AppState {
    pub store: Mutex<RecordStore<SharedBackend>>,
    pub parser: Option<Arc<dyn ExpenseParser>>,
}

impl AppState {
    pub fn new(store: RecordStore<SharedBackend>, parser: Option<Arc<dyn ExpenseParser>>) -> Self {
        Self {
            store: Mutex::new(store),
            parser,
        }
    }
}

#[derive(Deserialize, Serialize)]
struct ParticipantNameJson {
    name: String,
}

#[derive(Deserialize)]
struct RemoveParticipantQuery {
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PendingBalanceJson {
    id: ParticipantId,
    pending_balance: f64,
    formatted: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryJson {
    #[serde(flatten)]
    totals: Totals,
    total_owe_formatted: String,
    total_owed_formatted: String,
    categories: Vec<CategoryTotal>,
    recent: Vec<ExpenseRecord>,
}

#[derive(Deserialize)]
struct ParseRequestJson {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParseResponseJson {
    #[serde(flatten)]
    candidate: ParsedExpense,
    split_with: Vec<ParticipantId>,
}

#[get("/participants")]
async fn list_participants(state: web::Data<AppState>) -> HttpResponse {
    let store = state.store.lock().await;
    HttpResponse::Ok().json(store.participants())
}

#[post("/participants")]
async fn add_participant(
    state: web::Data<AppState>,
    json: web::Json<ParticipantNameJson>,
) -> Result<HttpResponse, SplitError> {
    let mut store = state.store.lock().await;
    let participant = store.add_participant(&json.name).await?;
    Ok(HttpResponse::Created().json(participant))
}

/// Removing somebody with an open balance needs `?confirm=true`.
#[delete("/participants/{id}")]
async fn remove_participant(
    state: web::Data<AppState>,
    id: web::Path<String>,
    query: web::Query<RemoveParticipantQuery>,
) -> Result<HttpResponse, SplitError> {
    let id = id.into_inner();
    let mut store = state.store.lock().await;

    let balances = store.balances();
    if !query.confirm && has_pending_balance(&balances, &id) {
        let pending_balance = balances.get(&id).copied().unwrap_or_default();
        tracing::info!(id = %id, pending_balance, "removal needs confirmation");
        return Ok(HttpResponse::Conflict().json(PendingBalanceJson {
            formatted: format_currency(pending_balance.abs()),
            id,
            pending_balance,
        }));
    }

    let removed = store.remove_participant(&id).await?;
    Ok(HttpResponse::Ok().json(removed))
}

#[get("/expenses")]
async fn list_expenses(state: web::Data<AppState>) -> HttpResponse {
    let store = state.store.lock().await;
    HttpResponse::Ok().json(store.expenses())
}

#[post("/expenses")]
async fn add_expense(
    state: web::Data<AppState>,
    draft: web::Json<ExpenseDraft>,
) -> Result<HttpResponse, SplitError> {
    let mut store = state.store.lock().await;
    let expense = store.add_expense(draft.into_inner()).await?;
    Ok(HttpResponse::Created().json(expense))
}

#[delete("/expenses/{id}")]
async fn remove_expense(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, SplitError> {
    let mut store = state.store.lock().await;
    let removed = store.remove_expense(&id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(removed))
}

#[get("/balances")]
async fn get_balances(state: web::Data<AppState>) -> HttpResponse {
    let store = state.store.lock().await;
    HttpResponse::Ok().json(store.balances())
}

#[get("/settlements")]
async fn get_settlements(state: web::Data<AppState>) -> HttpResponse {
    let store = state.store.lock().await;
    HttpResponse::Ok().json(store.settlements())
}

#[get("/summary")]
async fn get_summary(state: web::Data<AppState>) -> HttpResponse {
    let store = state.store.lock().await;
    let totals = compute_totals(&store.balances());
    HttpResponse::Ok().json(SummaryJson {
        total_owe_formatted: format_currency(totals.total_owe),
        total_owed_formatted: format_currency(totals.total_owed),
        totals,
        categories: category_breakdown(store.expenses()),
        recent: store.expenses().iter().take(RECENT_EXPENSES).cloned().collect(),
    })
}

/// `204 No Content` whenever there is nothing to suggest, including when no
/// parser is configured.
#[post("/expenses/parse")]
async fn parse_expense(
    state: web::Data<AppState>,
    json: web::Json<ParseRequestJson>,
) -> HttpResponse {
    let Some(parser) = state.parser.clone() else {
        return HttpResponse::NoContent().finish();
    };
    // The store stays unlocked while the service is working
    let Some(candidate) = parser.parse(&json.text).await else {
        return HttpResponse::NoContent().finish();
    };

    let store = state.store.lock().await;
    let split_with = match_participants(
        &candidate.mentioned_names,
        store.participants(),
        CURRENT_USER_ID,
    );
    HttpResponse::Ok().json(ParseResponseJson {
        candidate,
        split_with,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_participants)
        .service(add_participant)
        .service(remove_participant)
        .service(list_expenses)
        .service(parse_expense)
        .service(add_expense)
        .service(remove_expense)
        .service(get_balances)
        .service(get_settlements)
        .service(get_summary);
}
