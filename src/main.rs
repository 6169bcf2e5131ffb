use std::sync::Arc;

use coachgrind_backend::api::{self, AppState};
use coachgrind_backend::config::Config;
use coachgrind_backend::db::RecordStore;
use coachgrind_backend::insight::InsightService;
use coachgrind_backend::llm::OpenAiClient;
use coachgrind_backend::metrics;
use coachgrind_backend::session::SessionManager;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();
    metrics::register_metrics();

    if config.openai_api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; analysis will serve fallback defaults");
    }

    let store = RecordStore::new(&config.database_url)
        .await
        .expect("Failed to initialize record store");
    let store = Arc::new(store);

    let model = OpenAiClient::new(
        &config.openai_base_url,
        &config.openai_api_key,
        &config.openai_model,
    )
    .expect("Failed to build model client");

    let state = AppState {
        store: store.clone(),
        sessions: SessionManager::new(store),
        insight: Arc::new(InsightService::new(Arc::new(model))),
        catalog_dir: config.catalog_dir.clone(),
    };

    let app = api::router(state).layer(api::cors_layer(&config.allowed_origins));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to port {}: {e}", config.port));

    tracing::info!("CoachGrind backend listening on port {}", config.port);
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
