use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use rupeesplit::{
    api::{self, AppState, SharedBackend},
    parser::{ExpenseParser, GeminiParser},
    settings::{Settings, Storage},
    MemoryStore, MongoStore, RecordStore,
};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("rupeesplit={}", settings.app.level))
        .init();

    let backend: SharedBackend = match &settings.storage {
        Storage::Memory => {
            tracing::warn!("Using in-memory storage, nothing survives a restart");
            Arc::new(MemoryStore::new())
        }
        Storage::Mongodb { uri, database } => {
            tracing::info!("Using the following URI: {uri}");
            Arc::new(MongoStore::connect(uri, database).await?)
        }
    };
    let store = RecordStore::open(backend).await?;

    let parser: Option<Arc<dyn ExpenseParser>> = match &settings.gemini {
        Some(gemini) => {
            tracing::info!("Found gemini settings, AI parsing enabled");
            Some(Arc::new(GeminiParser::new(
                gemini.api_key.clone(),
                gemini.model.clone(),
                gemini.timeout(),
            )?))
        }
        None => None,
    };

    let state = web::Data::new(AppState::new(store, parser));
    let addr = (settings.server.bind.clone(), settings.server.port);
    tracing::info!("Listening on {}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
