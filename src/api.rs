// HTTP API routes: plays, playbooks, sheets, analysis, and service plumbing.

use axum::{
    extract::{Json, Path, Query, State},
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth;
use crate::catalog::{self, CONCEPTS_FILE, FORMATIONS_FILE};
use crate::db::{RecordStore, PLAYBOOKS, PLAYS, PLAYSHEETS};
use crate::error::ApiError;
use crate::insight::InsightService;
use crate::metrics;
use crate::models::{entity_id, play_id, Play, PlaySheet, Playbook, Route, StoredPlay};
use crate::session::SessionManager;

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SavePlayRequest {
    pub play: Play,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_category() -> String {
    "offense".to_string()
}

#[derive(Deserialize)]
pub struct CreatePlaybookRequest {
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddPlayRequest {
    pub play_id: String,
}

#[derive(Deserialize)]
pub struct CreateSheetRequest {
    pub name: String,
    pub situation: String,
    #[serde(default)]
    pub play_ids: Vec<String>,
}

#[derive(Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct AnalyzePlayRequest {
    pub play_name: String,
    pub formation: String,
    #[serde(default = "crate::models::default_personnel")]
    pub personnel: String,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub concept: Option<String>,
}

#[derive(Deserialize)]
pub struct GeneratePlayRequest {
    pub description: String,
}

#[derive(Deserialize)]
pub struct CounterPlayRequest {
    pub defensive_scheme: String,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub sessions: SessionManager,
    pub insight: Arc<InsightService>,
    pub catalog_dir: PathBuf,
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        // Plays
        .route("/plays", get(list_plays))
        .route("/plays/save", post(save_play))
        .route("/plays/library/formations", get(get_formations))
        .route("/plays/library/concepts", get(get_concepts))
        .route("/plays/{id}", get(get_play).delete(delete_play))
        // Playbooks and sheets
        .route("/playbook", get(list_playbooks))
        .route("/playbook/create", post(create_playbook))
        .route("/playbook/sheets", get(list_sheets))
        .route("/playbook/sheets/create", post(create_sheet))
        .route("/playbook/export/{id}", get(export_playbook))
        .route("/playbook/{id}/add-play", post(add_play_to_playbook))
        // Auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        // Analysis
        .route("/analysis/analyze", post(analyze_play))
        .route("/analysis/generate", post(generate_play))
        .route("/analysis/suggest-counters", post(suggest_counter_plays))
        .with_state(state)
}

/// CORS layer restricted to the configured origin allow-list.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

// ── Service handlers ──────────────────────────────────────────────────

async fn root() -> Json<Value> {
    Json(json!({ "message": "CoachGrind API is running", "version": "0.1.0" }))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "coachgrind-backend" }))
}

async fn get_metrics() -> String {
    metrics::gather_metrics()
}

// ── Play handlers ─────────────────────────────────────────────────────

async fn list_plays(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let plays: Vec<StoredPlay> = state.store.list(PLAYS).await?;
    Ok(Json(json!({ "success": true, "plays": plays })))
}

async fn get_play(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let play: StoredPlay = state
        .store
        .get(PLAYS, &id)
        .await?
        .ok_or(ApiError::NotFound("Play"))?;
    Ok(Json(json!({ "success": true, "play": play })))
}

async fn save_play(
    State(state): State<AppState>,
    Json(req): Json<SavePlayRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.play.name.trim().is_empty() {
        return Err(ApiError::BadRequest("play name is required"));
    }

    // Route origins are not validated against the player list; a dangling
    // reference is worth a warning but never a rejection.
    for route in &req.play.routes {
        if let Some(origin) = &route.from_player {
            if !req.play.players.iter().any(|p| &p.id == origin) {
                tracing::warn!(
                    "Play '{}': route '{}' references unknown player id '{}'",
                    req.play.name,
                    route.label,
                    origin
                );
            }
        }
    }

    let id = play_id(&req.category, &req.play.name);
    let stored = StoredPlay {
        id: id.clone(),
        play: req.play,
        category: req.category,
        tags: req.tags,
    };
    state.store.put(PLAYS, &id, &stored).await?;

    Ok(Json(json!({ "success": true, "play_id": id })))
}

async fn delete_play(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.store.delete(PLAYS, &id).await? {
        return Err(ApiError::NotFound("Play"));
    }
    Ok(Json(json!({ "success": true, "message": "Play deleted" })))
}

async fn get_formations(State(state): State<AppState>) -> Json<Value> {
    let formations = catalog::load_catalog(&state.catalog_dir, FORMATIONS_FILE);
    Json(json!({ "success": true, "formations": formations }))
}

async fn get_concepts(State(state): State<AppState>) -> Json<Value> {
    let concepts = catalog::load_catalog(&state.catalog_dir, CONCEPTS_FILE);
    Json(json!({ "success": true, "concepts": concepts }))
}

// ── Playbook handlers ─────────────────────────────────────────────────

async fn list_playbooks(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let playbooks: Vec<Playbook> = state.store.list(PLAYBOOKS).await?;
    Ok(Json(json!({ "success": true, "playbooks": playbooks })))
}

async fn create_playbook(
    State(state): State<AppState>,
    Json(req): Json<CreatePlaybookRequest>,
) -> Result<Json<Value>, ApiError> {
    let playbook = Playbook {
        id: entity_id("pb"),
        name: req.name,
        team: req.team,
        season: req.season,
        description: req.description,
        created_at: Utc::now().to_rfc3339(),
        plays: Vec::new(),
    };
    state.store.put(PLAYBOOKS, &playbook.id, &playbook).await?;
    Ok(Json(json!({ "success": true, "playbook_id": playbook.id })))
}

async fn add_play_to_playbook(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddPlayRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut playbook: Playbook = state
        .store
        .get(PLAYBOOKS, &id)
        .await?
        .ok_or(ApiError::NotFound("Playbook"))?;

    // Set-like append. The play id is deliberately not checked against the
    // plays collection.
    if !playbook.plays.contains(&req.play_id) {
        playbook.plays.push(req.play_id);
        state.store.put(PLAYBOOKS, &id, &playbook).await?;
    }

    Ok(Json(json!({ "success": true, "message": "Play added to playbook" })))
}

async fn create_sheet(
    State(state): State<AppState>,
    Json(req): Json<CreateSheetRequest>,
) -> Result<Json<Value>, ApiError> {
    let sheet = PlaySheet {
        id: entity_id("sheet"),
        name: req.name,
        situation: req.situation,
        play_ids: req.play_ids,
        created_at: Utc::now().to_rfc3339(),
    };
    state.store.put(PLAYSHEETS, &sheet.id, &sheet).await?;
    Ok(Json(json!({ "success": true, "sheet_id": sheet.id })))
}

async fn list_sheets(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sheets: Vec<PlaySheet> = state.store.list(PLAYSHEETS).await?;
    Ok(Json(json!({ "success": true, "sheets": sheets })))
}

async fn export_playbook(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ExportParams>,
) -> Result<Json<Value>, ApiError> {
    let playbook: Playbook = state
        .store
        .get(PLAYBOOKS, &id)
        .await?
        .ok_or(ApiError::NotFound("Playbook"))?;

    // Actual rendering is not implemented; the raw playbook is passed through.
    let format = params.format.unwrap_or_else(|| "pdf".to_string());
    Ok(Json(json!({
        "success": true,
        "message": format!("Export to {format} will be implemented"),
        "playbook": playbook,
    })))
}

// ── Analysis handlers ─────────────────────────────────────────────────

async fn analyze_play(
    State(state): State<AppState>,
    Json(req): Json<AnalyzePlayRequest>,
) -> Json<Value> {
    let analysis = state
        .insight
        .analyze_play(
            &req.play_name,
            &req.formation,
            &req.personnel,
            &req.routes,
            req.concept.as_deref(),
        )
        .await;
    Json(json!({ "success": true, "analysis": analysis }))
}

async fn generate_play(
    State(state): State<AppState>,
    Json(req): Json<GeneratePlayRequest>,
) -> Result<Json<Value>, ApiError> {
    let play = state
        .insight
        .generate_play(&req.description)
        .await
        .map_err(|e| ApiError::Generation(format!("Failed to generate play: {e}")))?;
    Ok(Json(json!({ "success": true, "play": play })))
}

async fn suggest_counter_plays(
    State(state): State<AppState>,
    Json(req): Json<CounterPlayRequest>,
) -> Json<Value> {
    let suggestions = state.insight.suggest_counter_plays(&req.defensive_scheme).await;
    Json(json!({ "success": true, "suggestions": suggestions }))
}
