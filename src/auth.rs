// Authentication: password hashing, signup/login/logout, profile handlers,
// and the bearer-session extractor.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::db::USERS;
use crate::error::ApiError;
use crate::models::{entity_id, Role, Subscription, User, UserPublic};
use crate::session::SessionIdentity;

// ── Password hashing ─────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Failed to hash password: {e}"))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| format!("Invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Verify a login attempt against the stored credential. Unknown emails and
/// wrong passwords are indistinguishable to the caller.
pub async fn validate_credentials(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<Option<User>, ApiError> {
    let user: Option<User> = state.store.get(USERS, email).await?;
    let Some(user) = user else {
        return Ok(None);
    };
    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(Some(user)),
        Ok(false) => Ok(None),
        Err(e) => Err(ApiError::Internal(e)),
    }
}

// ── Axum extractor: SessionAuth ──────────────────────────────────────

/// Extracts the session identity from the `Authorization: Bearer` header.
/// Usage: `SessionAuth(identity)` in handler parameters.
#[derive(Debug, Clone)]
pub struct SessionAuth(pub SessionIdentity);

impl FromRequestParts<AppState> for SessionAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or(ApiError::Unauthenticated("Missing Authorization header"))?;
        let identity = state.sessions.validate(token).await?;
        Ok(SessionAuth(identity))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

// ── Request types ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub subscription: Option<Subscription>,
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.email.is_empty() || req.password.is_empty() || req.name.is_empty() {
        return Err(ApiError::BadRequest("email, password, and name are required"));
    }

    let existing: Option<User> = state.store.get(USERS, &req.email).await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User already exists"));
    }

    let password_hash = hash_password(&req.password).map_err(ApiError::Internal)?;
    let user = User {
        id: entity_id("user"),
        email: req.email.clone(),
        password_hash,
        name: req.name,
        team: req.team,
        role: req.role,
        subscription: Subscription::Free,
        created_at: Utc::now().to_rfc3339(),
    };
    state.store.put(USERS, &user.email, &user).await?;

    // Signing up logs the user in.
    let session_token = state.sessions.create(&user.id, &user.email).await?;

    Ok(Json(json!({
        "success": true,
        "user_id": user.id,
        "session_token": session_token,
        "user": UserPublic::from(&user),
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = validate_credentials(&state, &req.email, &req.password)
        .await?
        .ok_or(ApiError::Unauthenticated("Invalid credentials"))?;

    let session_token = state.sessions.create(&user.id, &user.email).await?;

    Ok(Json(json!({
        "success": true,
        "session_token": session_token,
        "user": UserPublic::from(&user),
    })))
}

/// Logout always succeeds, with or without a token to revoke.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    if let Some(token) = bearer_token(&headers) {
        if let Err(e) = state.sessions.revoke(token).await {
            tracing::error!("Failed to revoke session: {e}");
        }
    }
    Json(json!({ "success": true, "message": "Logged out successfully" }))
}

pub async fn get_profile(
    SessionAuth(identity): SessionAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let user: User = state
        .store
        .get(USERS, &identity.email)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(json!({ "success": true, "user": UserPublic::from(&user) })))
}

pub async fn update_profile(
    SessionAuth(identity): SessionAuth,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut user: User = state
        .store
        .get(USERS, &identity.email)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    user.name = req.name;
    user.team = req.team;
    user.role = req.role;
    if let Some(subscription) = req.subscription {
        user.subscription = subscription;
    }
    state.store.put(USERS, &user.email, &user).await?;

    Ok(Json(json!({ "success": true, "message": "Profile updated" })))
}
